//! Database provider traits
//!
//! These traits define the interface that all database implementations must provide.

use crate::schema::{Changes, QueryRow};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// SQLSTATE raised for a unique constraint violation
pub const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE raised for a syntax error
pub const SYNTAX_ERROR: &str = "42601";

/// Database provider trait for raw queries and row-level persistence
///
/// Every method borrows a connection for the duration of one statement.
/// Rows come back already marshaled, so callers never see driver types.
#[async_trait]
pub trait DatabaseProvider: Send + Sync + 'static {
    /// Execute raw SQL text exactly as given
    ///
    /// # Security Warning
    ///
    /// This allows executing any SQL statement including INSERT, UPDATE, DELETE
    /// and DDL. It is only reachable through the maintenance tools.
    ///
    /// # Returns
    ///
    /// Every returned row, in engine order. Statements without a result set
    /// return an empty vector.
    async fn execute_query(&self, sql: &str) -> Result<Vec<QueryRow>, DatabaseError>;

    /// Fetch every row of a table ordered by ascending `id`
    async fn fetch_all(&self, table: &str) -> Result<Vec<QueryRow>, DatabaseError>;

    /// Fetch the row with the given `id`
    async fn fetch_by_id(&self, table: &str, id: i64) -> Result<Option<QueryRow>, DatabaseError>;

    /// Fetch the first row whose `column` equals `value`
    async fn fetch_by_column(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<QueryRow>, DatabaseError>;

    /// Insert a row and return it as stored
    async fn insert(&self, table: &str, changes: &Changes) -> Result<QueryRow, DatabaseError>;

    /// Update the row with the given `id` and return it as stored
    ///
    /// Returns `None` when no row has that `id`.
    async fn update(
        &self,
        table: &str,
        id: i64,
        changes: &Changes,
    ) -> Result<Option<QueryRow>, DatabaseError>;

    /// Delete the row with the given `id`
    ///
    /// # Returns
    ///
    /// Number of rows removed (0 when the row was already absent)
    async fn delete(&self, table: &str, id: i64) -> Result<u64, DatabaseError>;
}

/// Privileged maintenance operations
///
/// Kept apart from [`DatabaseProvider`] so that only the tools router can
/// reach unchecked bulk deletes and fixture inserts.
#[async_trait]
pub trait MaintenanceProvider: Send + Sync + 'static {
    /// Remove every row from every listed table, regardless of references
    async fn clear_tables(&self, tables: &[&'static str]) -> Result<(), DatabaseError>;

    /// Insert fixture rows in a single transaction, bypassing validation
    async fn insert_fixtures(&self, fixtures: &[Fixture]) -> Result<(), DatabaseError>;
}

/// A row inserted by the seed operation
#[derive(Debug, Clone)]
pub struct Fixture {
    pub table: &'static str,
    pub changes: Changes,
}

/// Structured error reported by the database engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    /// Severity as reported by the engine (`ERROR`, `FATAL`, ...)
    pub severity: String,

    /// Primary human-readable message
    pub message: String,

    /// SQLSTATE code, when the engine reported one
    pub code: Option<String>,

    /// Constraint that rejected the statement, when known
    pub constraint: Option<String>,
}

impl EngineError {
    pub fn new(severity: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: severity.into(),
            message: message.into(),
            code: None,
            constraint: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    /// Whether a unique constraint rejected the write
    pub fn is_unique_violation(&self) -> bool {
        self.code.as_deref() == Some(UNIQUE_VIOLATION)
    }

    #[cfg(feature = "postgres")]
    fn from_postgres(error: &sqlx::postgres::PgDatabaseError) -> Self {
        use sqlx::postgres::PgSeverity;

        let severity = match error.severity() {
            PgSeverity::Panic => "PANIC",
            PgSeverity::Fatal => "FATAL",
            PgSeverity::Error => "ERROR",
            PgSeverity::Warning => "WARNING",
            PgSeverity::Notice => "NOTICE",
            PgSeverity::Debug => "DEBUG",
            PgSeverity::Info => "INFO",
            PgSeverity::Log => "LOG",
        };

        let mut engine_error = Self::new(severity, error.message()).with_code(error.code());
        engine_error.constraint = error.constraint().map(str::to_string);
        engine_error
    }

    fn from_driver(error: &dyn sqlx::error::DatabaseError) -> Self {
        #[cfg(feature = "postgres")]
        if let Some(postgres_error) = error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
            return Self::from_postgres(postgres_error);
        }

        let mut engine_error = Self::new("ERROR", error.message());
        engine_error.code = error.code().map(|code| code.into_owned());
        engine_error.constraint = error.constraint().map(str::to_string);
        engine_error
    }
}

/// Renders as `ERROR: <message> (SQLSTATE <code>)`
impl fmt::Display for EngineError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.severity, self.message)?;
        if let Some(code) = &self.code {
            write!(formatter, " (SQLSTATE {})", code)?;
        }
        Ok(())
    }
}

/// Database error type
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The engine rejected the statement
    #[error("{0}")]
    Engine(EngineError),

    /// Connection, protocol or pool failure
    #[error("Database error: {0}")]
    Connection(String),

    /// Query timeout
    #[error("query timeout exceeded")]
    Timeout,

    /// A row could not be converted
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DatabaseError {
    /// Whether a unique constraint rejected the write
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DatabaseError::Engine(error) if error.is_unique_violation())
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(database_error) => {
                DatabaseError::Engine(EngineError::from_driver(database_error.as_ref()))
            }
            sqlx::Error::PoolTimedOut => DatabaseError::Timeout,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseError::Serialization(error.to_string())
            }
            other => DatabaseError::Connection(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(error: serde_json::Error) -> Self {
        DatabaseError::Serialization(error.to_string())
    }
}
