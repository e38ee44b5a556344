use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;

use vitalsync_backend::config::settings::{get_config, get_jwt_settings};
use vitalsync_backend::run;
use vitalsync_backend::services::DrainScheduler;
use vitalsync_backend::store::postgres::PgHealthStore;
use vitalsync_backend::store::{DeviceRegistry, SampleStore};
use vitalsync_backend::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Panic if we can't read the config
    let config = get_config().expect("Failed to read the config.");

    let subscriber = get_subscriber(
        "vitalsync-backend".into(),
        config.application.log_level.clone(),
        std::io::stdout,
    );
    init_subscriber(subscriber);

    let jwt_settings = get_jwt_settings(&config);

    // Only try to establish connection when actually used
    let connection_pool = PgPoolOptions::new()
        .max_connections(32)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_lazy(config.database.connection_string().expose_secret())
        .expect("Failed to create Postgres connection pool");

    if let Err(e) = sqlx::migrate!("./migrations").run(&connection_pool).await {
        tracing::error!("Failed to run database migrations: {}", e);
        std::process::exit(1);
    }

    let pg_store = Arc::new(PgHealthStore::new(connection_pool));
    let devices: Arc<dyn DeviceRegistry> = pg_store.clone();
    let store: Arc<dyn SampleStore> = pg_store;

    let drain_scheduler = match DrainScheduler::new(devices.clone(), store.clone()).await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            tracing::error!("Failed to create drain scheduler: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = drain_scheduler.start().await {
        tracing::error!("Failed to start drain scheduler: {}", e);
        std::process::exit(1);
    }

    let address = format!(
        "{}:{}",
        config.application.host, config.application.port
    );
    let listener = TcpListener::bind(&address)?;

    run(listener, devices, store, jwt_settings)?.await
}
