#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Relational storage for parks, facilities, and trails.
//!
//! The [`store::ParkStore`] trait is the single write seam the loaders talk
//! to. [`duckdb_store::DuckDbStore`] is the production implementation;
//! [`memory_store::MemoryStore`] is a pure in-process store used for dry
//! runs and tests.

pub mod duckdb_store;
pub mod memory_store;
pub mod schema;
pub mod store;

pub use duckdb_store::DuckDbStore;
pub use memory_store::MemoryStore;
pub use store::ParkStore;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Filesystem error while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A table the loader writes to does not exist.
    #[error("Table {table} does not exist (run with --init-schema to create it)")]
    MissingTable {
        /// Name of the missing table.
        table: &'static str,
    },

    /// Transaction bookkeeping error (e.g. commit without begin).
    #[error("Transaction error: {message}")]
    Transaction {
        /// Description of what went wrong.
        message: String,
    },
}
