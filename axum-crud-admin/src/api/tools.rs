//! Maintenance tools: database reset, seed and the raw SQL endpoint
//!
//! Mounted only when tools are enabled. These are the only handlers that
//! need a [`MaintenanceProvider`].

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Router,
};

use super::{sql_tool_handler, AppState};
use crate::database::traits::{DatabaseProvider, MaintenanceProvider};
use crate::error::AppError;
use crate::fixtures::{fixtures, MANAGED_TABLES};
use crate::session::Session;
use crate::views;

/// Routes under `/tools`
pub fn tools_routes<DB>() -> Router<AppState<DB>>
where
    DB: DatabaseProvider + MaintenanceProvider,
{
    Router::new()
        .route("/tools", get(tools_page_handler::<DB>))
        .route("/tools/db-clear", get(db_clear_handler::<DB>))
        .route("/tools/seed", get(seed_handler::<DB>))
        .route("/tools/sql", get(sql_tool_handler::<DB>))
}

/// Handler for GET /tools
async fn tools_page_handler<DB: DatabaseProvider>(
    State(state): State<AppState<DB>>,
    mut session: Session,
) -> Result<impl IntoResponse, AppError> {
    let current_user = state.current_user(&session).await?;
    let flashes = session.take_flashes();
    let html = views::tools_page(&flashes, current_user.as_ref().map(|user| user.login.as_str()));
    Ok((session, Html(html)))
}

/// Handler for GET /tools/db-clear
///
/// Empties every managed table and redirects back to `/tools`.
async fn db_clear_handler<DB: MaintenanceProvider>(
    State(state): State<AppState<DB>>,
    mut session: Session,
) -> impl IntoResponse {
    match state.database.clear_tables(MANAGED_TABLES).await {
        Ok(()) => {
            tracing::info!(tables = ?MANAGED_TABLES, "database cleared");
            session.add_flash("Database cleared successfully.");
        }
        Err(error) => {
            tracing::error!(%error, "failed to clear database");
            session.add_flash(format!("Error clearing database: {}", error));
        }
    }
    (session, Redirect::to("/tools"))
}

/// Handler for GET /tools/seed
///
/// Inserts the fixture set and redirects back to `/tools`. Seeding a
/// database that already holds the fixtures fails on the unique keys and
/// leaves it untouched.
async fn seed_handler<DB: MaintenanceProvider>(
    State(state): State<AppState<DB>>,
    mut session: Session,
) -> impl IntoResponse {
    let result = match fixtures().await {
        Ok(fixtures) => state.database.insert_fixtures(&fixtures).await.map_err(AppError::from),
        Err(error) => Err(AppError::from(error)),
    };

    match result {
        Ok(()) => {
            tracing::info!("database seeded");
            session.add_flash("Database seeded successfully.");
        }
        Err(error) => {
            tracing::error!(%error, "failed to seed database");
            session.add_flash(format!("Error seeding database: {}", error));
        }
    }
    (session, Redirect::to("/tools"))
}
