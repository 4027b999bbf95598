//! Database abstraction layer
//!
//! This module provides a database-agnostic interface for raw query
//! execution, row-level persistence and privileged maintenance.

pub mod traits;

#[cfg(feature = "postgres")]
pub mod marshal;

#[cfg(feature = "postgres")]
pub mod postgres;

// Re-export the main traits
pub use traits::{DatabaseError, DatabaseProvider, EngineError, Fixture, MaintenanceProvider};
