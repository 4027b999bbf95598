//! Handler-level errors and their HTTP mapping

use crate::database::DatabaseError;
use crate::password::PasswordError;
use crate::validation::FieldError;
use crate::views;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Rejected before any storage call
    #[error("{}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// Lookup by identifier found nothing; carries the resource name
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Passed through from the database layer untouched
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Internal(String),
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(error) if error.is_unique_violation() => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// One operator-facing line per problem
    pub fn messages(&self) -> Vec<String> {
        match self {
            AppError::Validation(errors) => errors.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(error: PasswordError) -> Self {
        AppError::Internal(error.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Html(views::error_page(&self.messages(), None))).into_response()
    }
}
