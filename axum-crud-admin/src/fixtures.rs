//! Seed data and the bootstrap account

use crate::crud::CrudService;
use crate::database::{DatabaseProvider, Fixture};
use crate::error::AppError;
use crate::password::{hash_password, PasswordError};
use crate::resource::{FormValues, Page, Resource, User};
use crate::schema::SqlValue;
use chrono::Utc;

/// Tables emptied by the clear tool
pub const MANAGED_TABLES: &[&str] = &[User::TABLE, Page::TABLE];

pub const ADMIN_LOGIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin";

/// The fixture set inserted by the seed tool
pub async fn fixtures() -> Result<Vec<Fixture>, PasswordError> {
    let now = Utc::now();
    let password = hash_password(ADMIN_PASSWORD).await?;

    Ok(vec![
        Fixture {
            table: User::TABLE,
            changes: vec![
                ("login", SqlValue::Text(ADMIN_LOGIN.to_string())),
                ("password", SqlValue::Text(password)),
                ("created_at", SqlValue::Timestamp(now)),
                ("updated_at", SqlValue::Timestamp(now)),
            ],
        },
        Fixture {
            table: Page::TABLE,
            changes: vec![
                ("slug", SqlValue::Text("about".to_string())),
                ("content", SqlValue::Text("This is the about page.".to_string())),
                ("created_at", SqlValue::Timestamp(now)),
                ("updated_at", SqlValue::Timestamp(now)),
            ],
        },
    ])
}

/// Create the default account when no user exists yet
///
/// # Returns
///
/// Whether an account was created
pub async fn ensure_admin_account<DB: DatabaseProvider>(database: &DB) -> Result<bool, AppError> {
    if !CrudService::list::<User, DB>(database).await?.is_empty() {
        return Ok(false);
    }

    let values: FormValues = [("login", ADMIN_LOGIN), ("password", ADMIN_PASSWORD)]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    let user: User = CrudService::create(database, &values).await?;
    tracing::warn!(login = %user.login, "created default account, change its password");
    Ok(true)
}
