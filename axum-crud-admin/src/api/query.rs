//! Raw SQL query execution endpoint

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use super::AppState;
use crate::database::traits::DatabaseProvider;
use crate::schema::{SqlToolQuery, ToolResponse};

/// Handler for GET /tools/sql
///
/// Executes the `q` parameter verbatim and returns every produced row.
///
/// # Security Warning
///
/// This endpoint allows executing ANY SQL statement including INSERT, UPDATE,
/// DELETE and DDL. It is only mounted when the maintenance tools are enabled.
///
/// Response (success, 200):
/// ```json
/// { "q": "select 1", "out": [{ "?column?": 1 }] }
/// ```
///
/// Statements without a result set return `"out": []`.
///
/// Response (error, 500):
/// ```json
/// { "error": "Error executing SQL query: ERROR: syntax error at or near \"1\" (SQLSTATE 42601)" }
/// ```
///
/// A missing or empty `q` is rejected with 400 before anything runs.
pub async fn sql_tool_handler<DB: DatabaseProvider>(
    State(state): State<AppState<DB>>,
    Query(params): Query<SqlToolQuery>,
) -> Response {
    let Some(sql) = params.q.filter(|q| !q.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ToolResponse::Failure {
                error: "Missing 'q' parameter".to_string(),
            }),
        )
            .into_response();
    };

    tracing::info!(sql = %sql, "executing SQL query");

    match state.database.execute_query(&sql).await {
        Ok(out) => {
            tracing::debug!(rows = out.len(), "SQL query succeeded");
            (StatusCode::OK, Json(ToolResponse::Success { q: sql, out })).into_response()
        }
        Err(error) => {
            tracing::warn!(%error, "failed to execute SQL query");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ToolResponse::Failure {
                    error: format!("Error executing SQL query: {}", error),
                }),
            )
                .into_response()
        }
    }
}
