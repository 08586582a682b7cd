#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Library for loading the NYC Parks open datasets (park properties,
//! athletic facilities, and trails) into the `FindMyPark` database.
//!
//! The load runs as three sequential passes, see [`pipeline::run_pipeline`].
//! Each pass reads a CSV source, normalizes every row, filters rows whose
//! park reference is unknown, and writes the survivors through a
//! [`ParkStore`](findmypark_database::ParkStore) inside one transaction.

pub mod config;
pub mod filter;
pub mod geometry;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod source;

use std::fmt::Write as _;
use std::path::PathBuf;

use findmypark_database::DbError;
use findmypark_ingest_models::SkipReason;

/// Errors that abort a load run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Store error outside of a single row write (commit, snapshot, ...).
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// The CSV source could not be opened or parsed.
    #[error("Failed to read CSV {}: {source}", .path.display())]
    Csv {
        /// Source file.
        path: PathBuf,
        /// Underlying reader error.
        #[source]
        source: csv::Error,
    },

    /// Filesystem error.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML configuration is malformed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Why a single source row (or generated record) was not written.
///
/// Row errors never abort a pass. Each one maps to a [`SkipReason`] and is
/// tallied in the pass report.
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    /// The key column is missing, blank, or `"nan"`.
    #[error("Missing key column {column}")]
    MissingKey {
        /// Key column name.
        column: &'static str,
    },

    /// The row references a park that is not in the committed park set.
    #[error("Unknown park {park_id}")]
    UnknownPark {
        /// Referenced key.
        park_id: String,
    },

    /// The geometry column could not be turned into a centroid.
    #[error("No usable geometry on line {line}")]
    NoGeometry {
        /// Source line number.
        line: u64,
    },

    /// A later row in the same source carries the same key.
    #[error("Duplicate key {key} superseded by a later row")]
    DuplicateKey {
        /// Duplicated key.
        key: String,
    },

    /// A value could not be coerced to the column type.
    #[error("Invalid value {value:?} in column {column}")]
    InvalidValue {
        /// Column name.
        column: &'static str,
        /// Offending raw value.
        value: String,
    },

    /// The store rejected the write.
    #[error("Write failed for {key}")]
    Write {
        /// Key of the record being written.
        key: String,
        /// Store error.
        #[source]
        source: DbError,
    },
}

impl RowError {
    /// Skip category this error is tallied under.
    #[must_use]
    pub const fn reason(&self) -> SkipReason {
        match self {
            Self::MissingKey { .. } => SkipReason::MissingKey,
            Self::UnknownPark { .. } => SkipReason::UnknownPark,
            Self::NoGeometry { .. } => SkipReason::NoGeometry,
            Self::DuplicateKey { .. } => SkipReason::DuplicateKey,
            Self::InvalidValue { .. } => SkipReason::InvalidValue,
            Self::Write { .. } => SkipReason::WriteFailed,
        }
    }
}

/// Formats an error followed by every error in its `source()` chain.
#[must_use]
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        let _ = write!(out, ": caused by: {cause}");
        current = cause.source();
    }
    out
}
