//! # axum-crud-admin
//!
//! A small server-rendered admin for pages and user accounts, easily
//! integrable as an Axum router.
//!
//! ## Features
//!
//! - Generic create, list, show, edit and delete for every managed resource
//! - Field validation before any write; uniqueness enforced by the database
//! - Session login with Argon2id password hashes
//! - Public site listing pages by slug
//! - Optional maintenance tools: database reset, fixture seeding and raw SQL
//!   execution returning JSON
//!
//! ## Security Warning
//!
//! **The maintenance tools are for test deployments only!**
//!
//! - No authentication on `/tools/*`
//! - Raw query execution allows full database access (INSERT/UPDATE/DELETE/DDL)
//! - Reset removes every row without confirmation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum_crud_admin::{AdminLayer, PostgresProvider, SessionKeys};
//! use sqlx::PgPool;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = PgPool::connect("postgres://localhost/appdb")
//!         .await
//!         .unwrap();
//!
//!     let provider = PostgresProvider::new(pool);
//!     provider.run_migrations().await.unwrap();
//!
//!     let app = AdminLayer::new(provider, SessionKeys::new(b"change-me"))
//!         .with_tools(false)
//!         .into_router();
//!
//!     // Serve the application...
//! }
//! ```

// Public modules
pub mod api;
pub mod crud;
pub mod database;
pub mod error;
pub mod fixtures;
pub mod layer;
pub mod password;
pub mod resource;
pub mod schema;
pub mod session;
pub mod validation;
pub mod views;

#[cfg(test)]
mod testing;

// Public exports
pub use crud::CrudService;
pub use fixtures::ensure_admin_account;
pub use layer::AdminLayer;
pub use resource::{Page, Resource, User};
pub use schema::{QueryRow, ToolResponse};
pub use session::SessionKeys;

// Re-export database providers
pub use database::traits::{DatabaseError, DatabaseProvider, MaintenanceProvider};

#[cfg(feature = "postgres")]
pub use database::postgres::PostgresProvider;

// Error type
pub use error::AppError as Error;

pub type Result<T> = std::result::Result<T, Error>;
