//! Public site: the page list and individual pages by slug

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse},
};

use super::AppState;
use crate::crud::CrudService;
use crate::database::traits::DatabaseProvider;
use crate::error::AppError;
use crate::resource::{Page, Resource};
use crate::session::Session;
use crate::views;

/// Handler for GET /
pub async fn index_handler<DB: DatabaseProvider>(
    State(state): State<AppState<DB>>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let current_user = state.current_user(&session).await?;
    let pages = CrudService::list::<Page, DB>(&*state.database).await?;
    Ok(Html(views::public_index(
        &pages,
        current_user.as_ref().map(|user| user.login.as_str()),
    )))
}

/// Handler for GET /pages/{slug}
pub async fn page_handler<DB: DatabaseProvider>(
    State(state): State<AppState<DB>>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let current_user = state.current_user(&session).await?;
    let page = CrudService::find_by::<Page, DB>(&*state.database, "slug", &slug)
        .await?
        .ok_or(AppError::NotFound(Page::NAME))?;
    Ok(Html(views::public_page(
        &page,
        current_user.as_ref().map(|user| user.login.as_str()),
    )))
}

#[cfg(test)]
mod tests {
    use crate::api::tests::{body_text, get, seeded_router};
    use crate::testing::MemoryProvider;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_page_by_slug() {
        let router = seeded_router(MemoryProvider::new()).await;

        let response = get(&router, "/pages/about", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("<h1>about</h1>"));
        assert!(html.contains("This is the about page."));
    }

    #[tokio::test]
    async fn test_missing_page_is_not_found() {
        let router = seeded_router(MemoryProvider::new()).await;

        let response = get(&router, "/pages/missing", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Page not found"));
    }

    #[tokio::test]
    async fn test_index_lists_pages() {
        let router = seeded_router(MemoryProvider::new()).await;

        let html = body_text(get(&router, "/", None).await).await;
        assert!(html.contains(r#"<ul data-selenium="page-list">"#));
        assert!(html.contains(r#"<a href="/pages/about">about</a>"#));
    }
}
