#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Load configuration, per-pass reports, and progress types.

pub mod progress;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use findmypark_park_models::{CategoryCount, Distribution};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Configuration for a full load run.
///
/// Every field has a default, so an empty TOML document (or no config file
/// at all) yields a usable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Path of the `DuckDB` database file to load into.
    pub database: PathBuf,
    /// Directory containing the three source CSV files.
    pub data_dir: PathBuf,
    /// File name of the park properties dataset.
    pub parks_file: String,
    /// File name of the athletic facilities dataset.
    pub facilities_file: String,
    /// File name of the trails dataset.
    pub trails_file: String,
    /// Emit a progress log line every this many rows (0 disables).
    pub progress_interval: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("data/findmypark.duckdb"),
            data_dir: PathBuf::from("data"),
            parks_file: "Parks_Properties.csv".to_string(),
            facilities_file: "Athletic_Facilities.csv".to_string(),
            trails_file: "Parks_Trails.csv".to_string(),
            progress_interval: 500,
        }
    }
}

impl ImportConfig {
    /// Full path of the source file for a dataset.
    #[must_use]
    pub fn source_path(&self, dataset: Dataset) -> PathBuf {
        let file = match dataset {
            Dataset::Parks => &self.parks_file,
            Dataset::Facilities => &self.facilities_file,
            Dataset::Trails => &self.trails_file,
        };
        self.data_dir.join(file)
    }
}

/// One of the three source datasets, in load order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Parks,
    Facilities,
    Trails,
}

/// Why a source row (or, for facilities, a generated record) was not
/// written.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// Key column missing, blank, or `"nan"`.
    MissingKey,
    /// Foreign key not present in the committed park set.
    UnknownPark,
    /// Geometry could not be parsed into a centroid.
    NoGeometry,
    /// Row superseded by a later row with the same key.
    DuplicateKey,
    /// A value could not be coerced (e.g. non-numeric acreage).
    InvalidValue,
    /// The store rejected the write.
    WriteFailed,
}

/// Outcome of one loader pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    /// Dataset this pass loaded.
    pub dataset: Dataset,
    /// Number of source rows read.
    pub rows_read: u64,
    /// Number of rows that passed validation and reached the writer.
    pub admitted: u64,
    /// Number of records written.
    pub inserted: u64,
    /// Skip tally by reason.
    pub skipped: BTreeMap<SkipReason, u64>,
    /// Wall-clock duration of the pass.
    pub duration: Duration,
}

impl PassReport {
    /// Creates an empty report for a dataset.
    #[must_use]
    pub const fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            rows_read: 0,
            admitted: 0,
            inserted: 0,
            skipped: BTreeMap::new(),
            duration: Duration::ZERO,
        }
    }

    /// Tallies one skip.
    pub fn skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    /// Number of skips recorded for a reason.
    #[must_use]
    pub fn skipped_for(&self, reason: SkipReason) -> u64 {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    /// Total skips across all reasons.
    #[must_use]
    pub fn skipped_total(&self) -> u64 {
        self.skipped.values().sum()
    }
}

/// Result of a complete run across all three datasets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// One report per completed pass, in load order.
    pub passes: Vec<PassReport>,
    /// Post-load distributions, in report order.
    pub distributions: Vec<(Distribution, Vec<CategoryCount>)>,
}

impl RunSummary {
    /// Report for a dataset, if its pass completed.
    #[must_use]
    pub fn pass(&self, dataset: Dataset) -> Option<&PassReport> {
        self.passes.iter().find(|p| p.dataset == dataset)
    }
}
