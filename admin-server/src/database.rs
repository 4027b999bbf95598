use axum_crud_admin::{ensure_admin_account, PostgresProvider};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;

use crate::config::ServerConfig;
use crate::ServerError;

/// Open the pool
///
/// Every pooled connection carries a server-side `statement_timeout`
/// matching the configured query timeout.
pub async fn connect(config: &ServerConfig) -> Result<PgPool, ServerError> {
    let statement_timeout = config.query_timeout.as_millis().to_string();
    let options = PgConnectOptions::from_str(&config.database_url)?
        .options([("statement_timeout", statement_timeout.as_str())]);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.query_timeout)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Create the schema and the bootstrap account
pub async fn setup(pool: PgPool, config: &ServerConfig) -> Result<PostgresProvider, ServerError> {
    let provider = PostgresProvider::new(pool).with_query_timeout(config.query_timeout);
    provider.run_migrations().await?;

    ensure_admin_account(&provider).await?;
    Ok(provider)
}
