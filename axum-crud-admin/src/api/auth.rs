//! Login, logout and the admin gate

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use super::{AppState, CurrentUser};
use crate::crud::CrudService;
use crate::database::traits::DatabaseProvider;
use crate::error::AppError;
use crate::password::verify_password;
use crate::resource::User;
use crate::session::Session;
use crate::views;

/// Where a successful login lands
const AFTER_LOGIN: &str = "/admin/users";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

/// Handler for GET /login
pub async fn login_form_handler<DB: DatabaseProvider>(
    State(state): State<AppState<DB>>,
    mut session: Session,
) -> Result<Response, AppError> {
    if state.current_user(&session).await?.is_some() {
        return Ok(Redirect::to(AFTER_LOGIN).into_response());
    }

    let flashes = session.take_flashes();
    Ok((session, Html(views::login_page(&[], &flashes))).into_response())
}

/// Handler for POST /login
pub async fn login_submit_handler<DB: DatabaseProvider>(
    State(state): State<AppState<DB>>,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if state.current_user(&session).await?.is_some() {
        return Ok(Redirect::to(AFTER_LOGIN).into_response());
    }

    let user = CrudService::find_by::<User, DB>(&*state.database, "login", &form.login).await?;
    let authenticated = match user {
        Some(user) => verify_password(&form.password, &user.password)
            .await?
            .then_some(user),
        None => None,
    };

    match authenticated {
        Some(user) => {
            tracing::info!(login = %user.login, "logged in");
            session.log_in(user.id);
            Ok((session, Redirect::to(AFTER_LOGIN)).into_response())
        }
        None => {
            tracing::warn!(login = %form.login, "rejected login");
            let errors = ["Invalid username or password".to_string()];
            Ok((StatusCode::UNAUTHORIZED, Html(views::login_page(&errors, &[]))).into_response())
        }
    }
}

/// Handler for GET /logout
pub async fn logout_handler(mut session: Session) -> impl IntoResponse {
    session.log_out();
    session.add_flash("Logged out");
    (session, Redirect::to(AFTER_LOGIN))
}

/// Reject requests without a live session
///
/// The session's account is reloaded on every request; a session whose
/// account has been deleted is cleared. The loaded account is handed to
/// handlers as [`CurrentUser`].
pub async fn require_login<DB: DatabaseProvider>(
    State(state): State<AppState<DB>>,
    mut session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    if session.user_id().is_none() {
        return Redirect::to("/login").into_response();
    }

    match state.current_user(&session).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Ok(None) => {
            tracing::debug!(user_id = ?session.user_id(), "session refers to a missing account");
            session.log_out();
            (session, Redirect::to("/login")).into_response()
        }
        Err(error) => error.into_response(),
    }
}
