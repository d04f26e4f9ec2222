use std::net::TcpListener;

use sqlx::postgres::PgPoolOptions;

use bookshelf::cache::RedisCache;
use bookshelf::configuration::get_configuration;
use bookshelf::email_client::{EmailClient, SenderEmail};
use bookshelf::startup::run;
use bookshelf::telemetry::init_telemetry;

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

    let connection_string = configuration.database.connection_string();
    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    tracing::info!("Database connection pool created successfully");

    // Revocation markers live in Redis; without it every logout and
    // refresh check would silently stop working, so fail closed
    let cache = RedisCache::connect(&configuration.redis)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to Redis: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Redis connection error",
            )
        })?;

    match cache.health_check().await {
        Ok(true) => tracing::info!("Redis connection verified"),
        _ => {
            tracing::error!("Redis did not answer PING");
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Redis health check failed",
            ));
        }
    }

    let sender = SenderEmail::parse(configuration.email.sender.clone()).map_err(|e| {
        tracing::error!("Invalid sender address in configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid sender address")
    })?;
    let email_client = EmailClient::new(
        configuration.email.base_url.clone(),
        sender,
        reqwest::Client::new(),
    );

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, pool, cache, email_client, configuration)?;
    tracing::info!("Server started successfully");

    server.await
}
