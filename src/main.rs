use finanger::auth::{SessionService, SystemClock};
use finanger::configuration::get_configuration;
use finanger::domain::category;
use finanger::domain::user::PgUserStore;
use finanger::startup::run;
use finanger::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(configuration.database.max_connections)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
        })?;

    category::seed_defaults(&pool).await.map_err(|e| {
        tracing::error!("Failed to seed default categories: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Seeding error")
    })?;

    let store = Arc::new(PgUserStore::new(pool.clone()));
    let session = SessionService::new(store, &configuration.auth, Arc::new(SystemClock))
        .map_err(|e| {
            tracing::error!("Failed to build session service: {}", e);
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid hash cost")
        })?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!(
        address = %address,
        base_path = %configuration.application.base_path(),
        "Server listening"
    );

    let server = run(listener, pool, session, configuration)?;
    server.await
}
