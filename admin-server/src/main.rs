use axum_crud_admin::{AdminLayer, SessionKeys};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

mod config;
mod database;

use config::{ConfigError, ServerConfig};

const DEFAULT_LOG_FILTER: &str = "axum_crud_admin=info,admin_server=info,tower_http=info";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to connect to database: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("database setup failed: {0}")]
    Setup(#[from] axum_crud_admin::DatabaseError),

    #[error("failed to create admin account: {0}")]
    Bootstrap(#[from] axum_crud_admin::Error),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    if let Err(error) = run().await {
        tracing::error!(%error, "server stopped");
        return Err(error);
    }
    Ok(())
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::from_env()?;
    if config.uses_default_secret() {
        tracing::warn!("SESSION_SECRET is not set, using an insecure development secret");
    }

    let pool = database::connect(&config).await?;
    let provider = database::setup(pool, &config).await?;

    let sessions = SessionKeys::new(config.session_secret.as_bytes()).secure(config.secure_cookies);
    let app = AdminLayer::new(provider, sessions)
        .with_tools(config.tools_enabled)
        .into_router();

    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    tracing::info!("Server running at http://{}", config.bind_address);
    tracing::info!("Admin available at http://{}/admin", config.bind_address);
    if config.tools_enabled {
        tracing::info!("Tools available at http://{}/tools", config.bind_address);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
