//! AdminLayer - Main Axum integration layer
//!
//! This module provides the main entry point for mounting the admin, the
//! public site and the optional maintenance tools into an Axum application.

use crate::database::traits::{DatabaseProvider, MaintenanceProvider};
use crate::resource::{Page, User};
use crate::session::SessionKeys;
use axum::{middleware, response::Redirect, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[cfg(feature = "postgres")]
use crate::database::postgres::PostgresProvider;

use crate::api::{
    auth::{login_form_handler, login_submit_handler, logout_handler},
    public, require_login, resource_routes, tools_routes, AppState,
};

/// Main layer for serving the admin application
///
/// # Example
///
/// ```rust,no_run
/// use axum_crud_admin::{AdminLayer, SessionKeys};
/// use sqlx::PgPool;
///
/// # async fn example() {
/// let pool = PgPool::connect("postgres://localhost/appdb").await.unwrap();
/// let admin = AdminLayer::postgres(pool, SessionKeys::new(b"secret"));
/// let app = axum::Router::new().merge(admin.into_router());
/// # }
/// ```
pub struct AdminLayer<DB> {
    database: Arc<DB>,
    sessions: SessionKeys,
    tools: bool,
}

impl<DB> AdminLayer<DB>
where
    DB: DatabaseProvider + MaintenanceProvider,
{
    /// Create a new admin over the given provider
    ///
    /// Maintenance tools start disabled.
    pub fn new(database: DB, sessions: SessionKeys) -> Self {
        Self {
            database: Arc::new(database),
            sessions,
            tools: false,
        }
    }

    /// Mount `/tools/*`
    ///
    /// # Security Warning
    ///
    /// The tools can wipe the database and run arbitrary SQL without a
    /// login. Only enable them for test deployments.
    pub fn with_tools(mut self, enabled: bool) -> Self {
        self.tools = enabled;
        self
    }

    /// Convert into an Axum Router that can be merged
    ///
    /// The returned router includes:
    /// - The public site at `/` and `/pages/{slug}`
    /// - Login and logout at `/login` and `/logout`
    /// - The admin at `/admin/*`, behind the login gate
    /// - The maintenance tools at `/tools/*`, when enabled
    /// - Request tracing middleware
    pub fn into_router(self) -> Router {
        let state = AppState {
            database: self.database,
            sessions: self.sessions,
        };

        // Note: Axum 0.8 uses {param} syntax instead of :param
        let admin_router = Router::new()
            .merge(resource_routes::<Page, DB>())
            .merge(resource_routes::<User, DB>())
            .route_layer(middleware::from_fn_with_state(state.clone(), require_login::<DB>));

        let mut router = Router::new()
            .route("/", get(public::index_handler::<DB>))
            .route("/pages/{slug}", get(public::page_handler::<DB>))
            .route(
                "/login",
                get(login_form_handler::<DB>).post(login_submit_handler::<DB>),
            )
            .route("/logout", get(logout_handler))
            .route("/admin", get(|| async { Redirect::to("/admin/users") }))
            .merge(admin_router);

        if self.tools {
            tracing::warn!("maintenance tools are enabled under /tools");
            router = router.merge(tools_routes::<DB>());
        }

        router.layer(TraceLayer::new_for_http()).with_state(state)
    }
}

#[cfg(feature = "postgres")]
impl AdminLayer<PostgresProvider> {
    /// Create a new admin for PostgreSQL
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    /// * `sessions` - Session signing keys
    pub fn postgres(pool: sqlx::PgPool, sessions: SessionKeys) -> Self {
        Self::new(PostgresProvider::new(pool), sessions)
    }
}
