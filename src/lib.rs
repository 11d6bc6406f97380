pub mod bootstrap;
pub mod dto;
pub mod entity;
pub mod error;
pub mod game_management;
pub mod live;

pub use bootstrap::{connect_and_migrate_from_env, init_tracing, load_dotenv};

use actix_web::web;

use game_management::{
    close_game, get_leaderboard, get_state, join_game, move_seat, remove_player, reset_game,
    reset_game_full, start_game, submit_actual, submit_bid,
};
use live::subscribe_events;

/// Configure all routes for the application
pub fn configure_routes(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(index).service(
        web::scope("/api")
            .service(join_game)
            .service(start_game)
            .service(submit_bid)
            .service(submit_actual)
            .service(get_state)
            .service(get_leaderboard)
            .service(move_seat)
            .service(remove_player)
            .service(close_game)
            .service(reset_game)
            .service(reset_game_full)
            .service(subscribe_events),
    );
}

#[actix_web::get("/")]
async fn index() -> impl actix_web::Responder {
    "Zouk scorekeeper"
}
