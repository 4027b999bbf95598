//! Admin CRUD handlers, generic over the managed [`Resource`]

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};

use super::{AppState, CurrentUser};
use crate::crud::CrudService;
use crate::database::traits::DatabaseProvider;
use crate::error::AppError;
use crate::resource::{FormValues, Resource, User};
use crate::session::Session;
use crate::views;

/// Routes under `/admin/<collection>`
///
/// Both the `/new` and `/create` spellings accept a create, and both
/// `/{id}/edit` and `/{id}/update` accept an update.
pub fn resource_routes<R: Resource, DB: DatabaseProvider>() -> Router<AppState<DB>> {
    let index = R::index_path();

    Router::new()
        .route(&index, get(index_handler::<R, DB>))
        .route(
            &format!("{}/new", index),
            get(new_handler::<R>).post(create_handler::<R, DB>),
        )
        .route(&format!("{}/create", index), post(create_handler::<R, DB>))
        .route(&format!("{}/{{id}}", index), get(show_handler::<R, DB>))
        .route(
            &format!("{}/{{id}}/edit", index),
            get(edit_handler::<R, DB>).post(update_handler::<R, DB>),
        )
        .route(&format!("{}/{{id}}/update", index), post(update_handler::<R, DB>))
        .route(&format!("{}/{{id}}/delete", index), post(delete_handler::<R, DB>))
}

/// Non-numeric ids can never match a row
fn parse_id<R: Resource>(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::NotFound(R::NAME))
}

/// Re-render a rejected form with the submitted values and every message
fn rejected_form<R: Resource>(id: Option<i64>, values: &FormValues, error: AppError, user: &User) -> Response {
    if matches!(error, AppError::NotFound(_)) {
        return error.into_response();
    }

    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!(resource = R::NAME, %error, "write failed");
    } else {
        tracing::info!(resource = R::NAME, %error, "write rejected");
    }

    let html = views::resource_form::<R>(id, values, &error.messages(), Some(&user.login));
    (status, Html(html)).into_response()
}

async fn index_handler<R: Resource, DB: DatabaseProvider>(
    State(state): State<AppState<DB>>,
    CurrentUser(user): CurrentUser,
    mut session: Session,
) -> Result<impl IntoResponse, AppError> {
    let records = CrudService::list::<R, DB>(&*state.database).await?;
    let flashes = session.take_flashes();
    let html = views::resource_index(&records, &flashes, Some(&user.login));
    Ok((session, Html(html)))
}

async fn new_handler<R: Resource>(CurrentUser(user): CurrentUser) -> Html<String> {
    Html(views::resource_form::<R>(None, &FormValues::new(), &[], Some(&user.login)))
}

async fn create_handler<R: Resource, DB: DatabaseProvider>(
    State(state): State<AppState<DB>>,
    CurrentUser(user): CurrentUser,
    mut session: Session,
    Form(values): Form<FormValues>,
) -> Response {
    match CrudService::create::<R, DB>(&*state.database, &values).await {
        Ok(record) => {
            tracing::info!(resource = R::NAME, id = record.id(), "record created");
            session.add_flash(format!("{} was added.", R::NAME));
            (session, Redirect::to(&R::index_path())).into_response()
        }
        Err(error) => rejected_form::<R>(None, &values, error, &user),
    }
}

async fn show_handler<R: Resource, DB: DatabaseProvider>(
    State(state): State<AppState<DB>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_id::<R>(&id)?;
    let record = CrudService::show::<R, DB>(&*state.database, id).await?;
    Ok(Html(views::resource_show(&record, Some(&user.login))))
}

async fn edit_handler<R: Resource, DB: DatabaseProvider>(
    State(state): State<AppState<DB>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_id::<R>(&id)?;
    let record = CrudService::show::<R, DB>(&*state.database, id).await?;
    Ok(Html(views::resource_form::<R>(
        Some(id),
        &record.form_values(),
        &[],
        Some(&user.login),
    )))
}

async fn update_handler<R: Resource, DB: DatabaseProvider>(
    State(state): State<AppState<DB>>,
    CurrentUser(user): CurrentUser,
    mut session: Session,
    Path(id): Path<String>,
    Form(values): Form<FormValues>,
) -> Response {
    let id = match parse_id::<R>(&id) {
        Ok(id) => id,
        Err(error) => return error.into_response(),
    };

    match CrudService::update::<R, DB>(&*state.database, id, &values).await {
        Ok(record) => {
            tracing::info!(resource = R::NAME, id = record.id(), "record updated");
            session.add_flash(format!("{} was edited.", R::NAME));
            (session, Redirect::to(&R::index_path())).into_response()
        }
        Err(error) => rejected_form::<R>(Some(id), &values, error, &user),
    }
}

async fn delete_handler<R: Resource, DB: DatabaseProvider>(
    State(state): State<AppState<DB>>,
    mut session: Session,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id::<R>(&id) {
        Ok(id) => id,
        Err(error) => return error.into_response(),
    };

    match CrudService::delete::<R, DB>(&*state.database, id).await {
        Ok(_) => {
            tracing::info!(resource = R::NAME, id, "record deleted");
            session.add_flash(format!("{} was deleted.", R::NAME));
        }
        Err(error) => {
            tracing::error!(resource = R::NAME, id, %error, "delete failed");
            session.add_flash(error.to_string());
        }
    }
    (session, Redirect::to(&R::index_path())).into_response()
}
