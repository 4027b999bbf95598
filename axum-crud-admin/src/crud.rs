//! Generic CRUD execution for any [`Resource`]
//!
//! Validation happens here, before storage. Uniqueness is left to the
//! database: a duplicate surfaces as the engine's own error, which also
//! settles concurrent duplicate creates.

use crate::database::DatabaseProvider;
use crate::error::AppError;
use crate::password::hash_password;
use crate::resource::{FormValues, InputKind, Resource};
use crate::schema::{Changes, SqlValue};
use crate::validation::{validate, WriteMode};
use chrono::Utc;

pub struct CrudService;

impl CrudService {
    /// Every row ordered by ascending id
    pub async fn list<R: Resource, DB: DatabaseProvider>(database: &DB) -> Result<Vec<R>, AppError> {
        let rows = database.fetch_all(R::TABLE).await?;
        rows.into_iter()
            .map(|row| R::from_row(row).map_err(AppError::from))
            .collect()
    }

    /// Fetch one row by id
    pub async fn find<R: Resource, DB: DatabaseProvider>(
        database: &DB,
        id: i64,
    ) -> Result<Option<R>, AppError> {
        let row = database.fetch_by_id(R::TABLE, id).await?;
        Ok(row.map(R::from_row).transpose()?)
    }

    /// Fetch one row by a column value
    pub async fn find_by<R: Resource, DB: DatabaseProvider>(
        database: &DB,
        column: &str,
        value: &str,
    ) -> Result<Option<R>, AppError> {
        let row = database.fetch_by_column(R::TABLE, column, value).await?;
        Ok(row.map(R::from_row).transpose()?)
    }

    /// Fetch one row by id, treating absence as not-found
    pub async fn show<R: Resource, DB: DatabaseProvider>(database: &DB, id: i64) -> Result<R, AppError> {
        Self::find(database, id)
            .await?
            .ok_or(AppError::NotFound(R::NAME))
    }

    /// Validate and insert; returns the stored row
    pub async fn create<R: Resource, DB: DatabaseProvider>(
        database: &DB,
        values: &FormValues,
    ) -> Result<R, AppError> {
        validate(R::FIELDS, values, WriteMode::Create).map_err(AppError::Validation)?;

        let changes = Self::changes::<R>(values, WriteMode::Create).await?;
        let row = database.insert(R::TABLE, &changes).await?;
        Ok(R::from_row(row)?)
    }

    /// Load, validate and update; returns the stored row
    pub async fn update<R: Resource, DB: DatabaseProvider>(
        database: &DB,
        id: i64,
        values: &FormValues,
    ) -> Result<R, AppError> {
        Self::show::<R, DB>(database, id).await?;
        validate(R::FIELDS, values, WriteMode::Update).map_err(AppError::Validation)?;

        let changes = Self::changes::<R>(values, WriteMode::Update).await?;
        // The row may vanish between the load and the write
        let row = database
            .update(R::TABLE, id, &changes)
            .await?
            .ok_or(AppError::NotFound(R::NAME))?;
        Ok(R::from_row(row)?)
    }

    /// Delete by id
    ///
    /// Deleting an absent row is a successful no-op.
    ///
    /// # Returns
    ///
    /// Whether a row was actually removed
    pub async fn delete<R: Resource, DB: DatabaseProvider>(database: &DB, id: i64) -> Result<bool, AppError> {
        let removed = database.delete(R::TABLE, id).await?;
        if removed == 0 {
            tracing::debug!(resource = R::NAME, id, "delete of absent row ignored");
        }
        Ok(removed > 0)
    }

    /// Column assignments for a validated form
    ///
    /// Password inputs are hashed; blank fields that keep their value on
    /// update are left out. Timestamps are set here, not by the caller.
    async fn changes<R: Resource>(values: &FormValues, mode: WriteMode) -> Result<Changes, AppError> {
        let now = Utc::now();
        let mut changes = Changes::with_capacity(R::FIELDS.len() + 2);

        for field in R::FIELDS {
            let value = values.get(field.name).map(String::as_str).unwrap_or("");
            if value.is_empty() && mode == WriteMode::Update && field.blank_keeps_value {
                continue;
            }

            let stored = match field.input {
                InputKind::Password => hash_password(value).await?,
                InputKind::Text | InputKind::TextArea => value.to_string(),
            };
            changes.push((field.name, SqlValue::Text(stored)));
        }

        if mode == WriteMode::Create {
            changes.push(("created_at", SqlValue::Timestamp(now)));
        }
        changes.push(("updated_at", SqlValue::Timestamp(now)));

        Ok(changes)
    }
}
