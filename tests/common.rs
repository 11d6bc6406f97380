use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::env;
use std::sync::Once;
use tokio::sync::OnceCell;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zouk_backend::bootstrap::redact_db_url;

static INIT: Once = Once::new();
static MIGRATED: OnceCell<()> = OnceCell::const_new();

pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,actix_web=info,sea_orm=info"));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    });
}

/// Test bootstrap that loads .env, ensures *_test database, inits tracing, connects+migrates once
pub async fn test_bootstrap() -> DatabaseConnection {
    load_dotenv();
    ensure_test_db();
    init_tracing_for_tests();
    connect_and_migrate_from_env().await
}

fn load_dotenv() {
    let _ = dotenv::dotenv();
}

fn ensure_test_db() {
    let url = env::var("DATABASE_URL").expect("DATABASE_URL is required for tests");
    assert!(
        url.contains("_test"),
        "Refusing to run unless DATABASE_URL points to a *_test database. Current: {url}"
    );
}

// Each test runs on its own runtime, so the pool is built per test rather
// than cached in a static. Migrations still run once per process.
async fn connect_and_migrate_from_env() -> DatabaseConnection {
    let database_url =
        env::var("DATABASE_URL").expect("DATABASE_URL must be set before starting backend");

    info!("Database URL: {}", redact_db_url(&database_url));

    let db: DatabaseConnection = Database::connect(&database_url)
        .await
        .expect("DB connect failed");

    MIGRATED
        .get_or_init(|| async {
            Migrator::up(&db, None).await.expect("Migrator::up failed");
        })
        .await;

    db
}
