//! HTTP handlers
//!
//! Every handler shares [`AppState`]: the database provider and the session
//! signing keys. Admin handlers additionally receive the [`CurrentUser`]
//! that [`auth::require_login`] resolved for the request.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::Redirect,
};
use std::sync::Arc;

use crate::crud::CrudService;
use crate::database::traits::DatabaseProvider;
use crate::error::AppError;
use crate::resource::User;
use crate::session::{Session, SessionKeys};

pub mod auth;
pub mod public;
pub mod query;
pub mod resources;
pub mod tools;

pub use auth::require_login;
pub use query::sql_tool_handler;
pub use resources::resource_routes;
pub use tools::tools_routes;

/// State shared by every handler
pub struct AppState<DB> {
    pub database: Arc<DB>,
    pub sessions: SessionKeys,
}

impl<DB> Clone for AppState<DB> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

impl<DB> FromRef<AppState<DB>> for SessionKeys {
    fn from_ref(state: &AppState<DB>) -> Self {
        state.sessions.clone()
    }
}

impl<DB: DatabaseProvider> AppState<DB> {
    /// Load the account the session is logged in as
    ///
    /// A session pointing at a deleted account yields `None`.
    pub async fn current_user(&self, session: &Session) -> Result<Option<User>, AppError> {
        match session.user_id() {
            Some(user_id) => CrudService::find::<User, DB>(&*self.database, user_id).await,
            None => Ok(None),
        }
    }
}

/// The logged-in operator, placed in request extensions by
/// [`require_login`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| Redirect::to("/login"))
    }
}
