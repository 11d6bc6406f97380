use actix_cors::Cors;
use actix_web::{http, web, App, HttpServer};
use std::env;
use tracing::warn;
use tracing_actix_web::TracingLogger;

use zouk_backend::game_management::session::{seed_active_game, ActiveGame};
use zouk_backend::live::UpdateHub;
use zouk_backend::{configure_routes, connect_and_migrate_from_env, init_tracing, load_dotenv};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    load_dotenv();
    init_tracing();

    let db = connect_and_migrate_from_env().await;

    let active = web::Data::new(ActiveGame::default());
    if let Err(err) = seed_active_game(&db, &active).await {
        warn!(%err, "could not seed active game handle");
    }
    let hub = web::Data::new(UpdateHub::default());
    let db = web::Data::new(db);

    HttpServer::new(move || {
        let frontend_origin = env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| {
            warn!("CORS_ALLOWED_ORIGIN not set, using default");
            "http://localhost:3000".to_string()
        });

        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![http::header::AUTHORIZATION, http::header::ACCEPT])
            .allowed_header(http::header::CONTENT_TYPE)
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .app_data(db.clone())
            .app_data(active.clone())
            .app_data(hub.clone())
            .configure(configure_routes)
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
