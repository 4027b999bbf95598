//! In-memory [`DatabaseProvider`] for unit tests
//!
//! Behaves like the Postgres schema for the managed tables: ascending ids
//! from 1, unique `user.login` and `page.slug` reported with the engine's
//! wording, `TRUNCATE ... RESTART IDENTITY` semantics on clear. Raw SQL is
//! scripted per statement text.

use crate::database::traits::{SYNTAX_ERROR, UNIQUE_VIOLATION};
use crate::database::{DatabaseError, DatabaseProvider, EngineError, Fixture, MaintenanceProvider};
use crate::schema::{Changes, QueryRow};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Unique column per managed table
const UNIQUE_COLUMNS: &[(&str, &str)] = &[("user", "login"), ("page", "slug")];

#[derive(Default, Clone)]
struct Table {
    next_id: i64,
    rows: Vec<QueryRow>,
}

#[derive(Default)]
pub struct MemoryProvider {
    tables: Mutex<HashMap<String, Table>>,
    queries: HashMap<String, Result<Vec<QueryRow>, EngineError>>,
    writes: AtomicUsize,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the result of one raw SQL text
    pub fn with_query(mut self, sql: &str, rows: Vec<QueryRow>) -> Self {
        self.queries.insert(sql.to_string(), Ok(rows));
        self
    }

    /// Script a raw SQL text that the engine rejects
    pub fn with_failing_query(mut self, sql: &str, error: EngineError) -> Self {
        self.queries.insert(sql.to_string(), Err(error));
        self
    }

    /// Number of successful insert, update and delete calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn row_id(row: &QueryRow) -> Option<i64> {
        row.get("id").and_then(Value::as_i64)
    }

    fn check_unique(table_name: &str, table: &Table, row: &QueryRow) -> Result<(), DatabaseError> {
        let Some((_, column)) = UNIQUE_COLUMNS.iter().find(|(name, _)| *name == table_name) else {
            return Ok(());
        };
        let Some(value) = row.get(column) else {
            return Ok(());
        };

        let taken = table.rows.iter().any(|existing| {
            Self::row_id(existing) != Self::row_id(row) && existing.get(column) == Some(value)
        });
        if taken {
            let constraint = format!("{}_{}_key", table_name, column);
            return Err(DatabaseError::Engine(
                EngineError::new(
                    "ERROR",
                    format!("duplicate key value violates unique constraint \"{}\"", constraint),
                )
                .with_code(UNIQUE_VIOLATION)
                .with_constraint(constraint),
            ));
        }
        Ok(())
    }

    fn insert_into(
        tables: &mut HashMap<String, Table>,
        table_name: &str,
        changes: &Changes,
    ) -> Result<QueryRow, DatabaseError> {
        let table = tables.entry(table_name.to_string()).or_default();

        let mut row = QueryRow::with_capacity(changes.len() + 1);
        row.insert("id", Value::from(table.next_id + 1));
        for (column, value) in changes {
            row.insert(*column, value.to_json());
        }

        Self::check_unique(table_name, table, &row)?;
        table.next_id += 1;
        table.rows.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl DatabaseProvider for MemoryProvider {
    async fn execute_query(&self, sql: &str) -> Result<Vec<QueryRow>, DatabaseError> {
        match self.queries.get(sql) {
            Some(Ok(rows)) => Ok(rows.clone()),
            Some(Err(error)) => Err(DatabaseError::Engine(error.clone())),
            None => Err(DatabaseError::Engine(
                EngineError::new("ERROR", format!("syntax error at or near \"{}\"", sql))
                    .with_code(SYNTAX_ERROR),
            )),
        }
    }

    async fn fetch_all(&self, table: &str) -> Result<Vec<QueryRow>, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        let mut rows = tables
            .get(table)
            .map(|table| table.rows.clone())
            .unwrap_or_default();
        rows.sort_by_key(Self::row_id);
        Ok(rows)
    }

    async fn fetch_by_id(&self, table: &str, id: i64) -> Result<Option<QueryRow>, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .get(table)
            .and_then(|table| table.rows.iter().find(|row| Self::row_id(row) == Some(id)))
            .cloned())
    }

    async fn fetch_by_column(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<QueryRow>, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .get(table)
            .and_then(|table| {
                table
                    .rows
                    .iter()
                    .find(|row| row.get(column).and_then(Value::as_str) == Some(value))
            })
            .cloned())
    }

    async fn insert(&self, table: &str, changes: &Changes) -> Result<QueryRow, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let row = Self::insert_into(&mut tables, table, changes)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        id: i64,
        changes: &Changes,
    ) -> Result<Option<QueryRow>, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(stored) = tables.get_mut(table) else {
            return Ok(None);
        };
        let Some(position) = stored.rows.iter().position(|row| Self::row_id(row) == Some(id)) else {
            return Ok(None);
        };

        let mut row = stored.rows[position].clone();
        for (column, value) in changes {
            row.insert(*column, value.to_json());
        }
        Self::check_unique(table, stored, &row)?;

        stored.rows[position] = row.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(Some(row))
    }

    async fn delete(&self, table: &str, id: i64) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(stored) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = stored.rows.len();
        stored.rows.retain(|row| Self::row_id(row) != Some(id));
        let removed = (before - stored.rows.len()) as u64;
        if removed > 0 {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }
}

#[async_trait]
impl MaintenanceProvider for MemoryProvider {
    async fn clear_tables(&self, tables: &[&'static str]) -> Result<(), DatabaseError> {
        let mut stored = self.tables.lock().unwrap();
        for table in tables {
            stored.insert(table.to_string(), Table::default());
        }
        Ok(())
    }

    async fn insert_fixtures(&self, fixtures: &[Fixture]) -> Result<(), DatabaseError> {
        let mut stored = self.tables.lock().unwrap();
        // Work on a copy so a failing fixture leaves nothing behind
        let mut staged = stored.clone();
        for fixture in fixtures {
            Self::insert_into(&mut staged, fixture.table, &fixture.changes)?;
        }
        *stored = staged;
        Ok(())
    }
}
