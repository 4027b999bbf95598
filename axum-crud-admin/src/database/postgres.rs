//! PostgreSQL database provider implementation

use crate::database::marshal::{marshal_row, marshal_rows};
use crate::database::traits::{DatabaseError, DatabaseProvider, Fixture, MaintenanceProvider};
use crate::schema::{Changes, QueryRow, SqlValue};
use async_trait::async_trait;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;

/// Default upper bound for a single database call
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Statements creating the managed tables
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS "user" (
        id BIGSERIAL PRIMARY KEY,
        login VARCHAR(80) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS page (
        id BIGSERIAL PRIMARY KEY,
        slug TEXT NOT NULL UNIQUE,
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// PostgreSQL database provider
pub struct PostgresProvider {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresProvider {
    /// Create a new PostgreSQL provider
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Bound every database call by `timeout`
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// The underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the managed tables when they do not exist yet
    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            self.timed(sqlx::query(statement).execute(&self.pool)).await?;
        }
        Ok(())
    }

    /// Quote an identifier to prevent SQL injection
    fn quote_identifier(identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    /// Build `INSERT ... RETURNING *` for the given columns
    fn build_insert(table: &str, changes: &Changes) -> String {
        let columns: Vec<String> = changes
            .iter()
            .map(|(column, _)| Self::quote_identifier(column))
            .collect();
        let placeholders: Vec<String> = (1..=changes.len()).map(|index| format!("${}", index)).collect();

        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
            Self::quote_identifier(table),
            columns.join(", "),
            placeholders.join(", ")
        )
    }

    /// Build `UPDATE ... WHERE id = $n RETURNING *`; the id binds last
    fn build_update(table: &str, changes: &Changes) -> String {
        let assignments: Vec<String> = changes
            .iter()
            .enumerate()
            .map(|(index, (column, _))| format!("{} = ${}", Self::quote_identifier(column), index + 1))
            .collect();

        format!(
            "UPDATE {} SET {} WHERE \"id\" = ${} RETURNING *",
            Self::quote_identifier(table),
            assignments.join(", "),
            changes.len() + 1
        )
    }

    /// Build a single `TRUNCATE` covering every table
    fn build_truncate(tables: &[&str]) -> String {
        let quoted: Vec<String> = tables.iter().map(|table| Self::quote_identifier(table)).collect();
        format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", quoted.join(", "))
    }

    fn bind_changes<'q>(
        mut query: Query<'q, Postgres, PgArguments>,
        changes: &'q Changes,
    ) -> Query<'q, Postgres, PgArguments> {
        for (_, value) in changes {
            query = match value {
                SqlValue::Text(text) => query.bind(text.as_str()),
                SqlValue::Integer(number) => query.bind(*number),
                SqlValue::Timestamp(timestamp) => query.bind(*timestamp),
            };
        }
        query
    }

    /// Run a database call under the configured timeout
    async fn timed<T, F>(&self, call: F) -> Result<T, DatabaseError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, call).await {
            Ok(result) => result.map_err(DatabaseError::from),
            Err(_) => {
                tracing::warn!(timeout = ?self.query_timeout, "database call timed out");
                Err(DatabaseError::Timeout)
            }
        }
    }
}

#[async_trait]
impl DatabaseProvider for PostgresProvider {
    async fn execute_query(&self, sql: &str) -> Result<Vec<QueryRow>, DatabaseError> {
        let start_time = std::time::Instant::now();

        // Simple query protocol: the text reaches the server untouched and
        // may contain several statements
        let rows = self.timed(sqlx::raw_sql(sql).fetch_all(&self.pool)).await?;

        tracing::debug!(
            rows = rows.len(),
            elapsed_milliseconds = start_time.elapsed().as_millis() as u64,
            "raw query executed"
        );

        marshal_rows(&rows)
    }

    async fn fetch_all(&self, table: &str) -> Result<Vec<QueryRow>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM {} ORDER BY \"id\" ASC",
            Self::quote_identifier(table)
        );
        let rows = self.timed(sqlx::query(&sql).fetch_all(&self.pool)).await?;
        marshal_rows(&rows)
    }

    async fn fetch_by_id(&self, table: &str, id: i64) -> Result<Option<QueryRow>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM {} WHERE \"id\" = $1",
            Self::quote_identifier(table)
        );
        let row = self
            .timed(sqlx::query(&sql).bind(id).fetch_optional(&self.pool))
            .await?;
        row.as_ref().map(marshal_row).transpose()
    }

    async fn fetch_by_column(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<QueryRow>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = $1 ORDER BY \"id\" ASC LIMIT 1",
            Self::quote_identifier(table),
            Self::quote_identifier(column)
        );
        let row = self
            .timed(sqlx::query(&sql).bind(value).fetch_optional(&self.pool))
            .await?;
        row.as_ref().map(marshal_row).transpose()
    }

    async fn insert(&self, table: &str, changes: &Changes) -> Result<QueryRow, DatabaseError> {
        let sql = Self::build_insert(table, changes);
        let query = Self::bind_changes(sqlx::query(&sql), changes);
        let row = self.timed(query.fetch_one(&self.pool)).await?;
        marshal_row(&row)
    }

    async fn update(
        &self,
        table: &str,
        id: i64,
        changes: &Changes,
    ) -> Result<Option<QueryRow>, DatabaseError> {
        let sql = Self::build_update(table, changes);
        let query = Self::bind_changes(sqlx::query(&sql), changes).bind(id);
        let row = self.timed(query.fetch_optional(&self.pool)).await?;
        row.as_ref().map(marshal_row).transpose()
    }

    async fn delete(&self, table: &str, id: i64) -> Result<u64, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE \"id\" = $1", Self::quote_identifier(table));
        let result = self
            .timed(sqlx::query(&sql).bind(id).execute(&self.pool))
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl MaintenanceProvider for PostgresProvider {
    async fn clear_tables(&self, tables: &[&'static str]) -> Result<(), DatabaseError> {
        if tables.is_empty() {
            return Ok(());
        }
        let sql = Self::build_truncate(tables);
        self.timed(sqlx::query(&sql).execute(&self.pool)).await?;
        Ok(())
    }

    async fn insert_fixtures(&self, fixtures: &[Fixture]) -> Result<(), DatabaseError> {
        let statements: Vec<String> = fixtures
            .iter()
            .map(|fixture| Self::build_insert(fixture.table, &fixture.changes))
            .collect();

        self.timed(async {
            let mut transaction = self.pool.begin().await?;
            for (fixture, sql) in fixtures.iter().zip(&statements) {
                Self::bind_changes(sqlx::query(sql), &fixture.changes)
                    .execute(&mut *transaction)
                    .await?;
            }
            transaction.commit().await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(PostgresProvider::quote_identifier("user"), "\"user\"");
        assert_eq!(
            PostgresProvider::quote_identifier("table\"name"),
            "\"table\"\"name\""
        );
    }

    #[test]
    fn test_build_insert() {
        let changes: Changes = vec![
            ("slug", SqlValue::Text("about".to_string())),
            ("content", SqlValue::Text("hello".to_string())),
            ("created_at", SqlValue::Timestamp(Utc::now())),
        ];
        assert_eq!(
            PostgresProvider::build_insert("page", &changes),
            "INSERT INTO \"page\" (\"slug\", \"content\", \"created_at\") VALUES ($1, $2, $3) RETURNING *"
        );
    }

    #[test]
    fn test_build_update_binds_id_last() {
        let changes: Changes = vec![
            ("login", SqlValue::Text("admin".to_string())),
            ("updated_at", SqlValue::Timestamp(Utc::now())),
        ];
        assert_eq!(
            PostgresProvider::build_update("user", &changes),
            "UPDATE \"user\" SET \"login\" = $1, \"updated_at\" = $2 WHERE \"id\" = $3 RETURNING *"
        );
    }

    #[test]
    fn test_build_truncate() {
        assert_eq!(
            PostgresProvider::build_truncate(&["user", "page"]),
            "TRUNCATE TABLE \"user\", \"page\" RESTART IDENTITY CASCADE"
        );
    }
}
