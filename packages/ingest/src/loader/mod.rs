//! The three loader passes and the bookkeeping they share.
//!
//! Every loader has the same shape: read rows, normalize, filter, write the
//! survivors inside one transaction, commit. Row-level failures are
//! recorded on a [`PassTracker`] and never abort the pass.

pub mod facility;
pub mod park;
pub mod trail;

use std::sync::Arc;
use std::time::Instant;

use findmypark_database::ParkStore;
use findmypark_ingest_models::progress::ProgressCallback;
use findmypark_ingest_models::{Dataset, PassReport};

use crate::source::RawRecord;
use crate::{IngestError, RowError, error_chain};

pub use facility::FacilityLoader;
pub use park::ParkLoader;
pub use trail::TrailLoader;

/// A single loader pass over one dataset.
pub trait Loader {
    /// Dataset this loader consumes.
    fn dataset(&self) -> Dataset;

    /// Loads `records` into `store` and commits.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] if the transaction cannot be opened or
    /// committed, or the park snapshot cannot be read. Row failures are
    /// tallied on `tracker` instead.
    fn load(
        &self,
        store: &mut dyn ParkStore,
        records: &[RawRecord],
        tracker: &mut PassTracker,
    ) -> Result<(), IngestError>;
}

/// Accumulates a [`PassReport`] and drives progress output for one pass.
pub struct PassTracker {
    report: PassReport,
    progress: Arc<dyn ProgressCallback>,
    interval: u64,
    total: u64,
    started: Instant,
}

impl PassTracker {
    /// Starts tracking a pass over `total` rows.
    ///
    /// `interval` is the number of rows between progress log lines; `0`
    /// disables them.
    #[must_use]
    pub fn new(
        dataset: Dataset,
        total: usize,
        progress: Arc<dyn ProgressCallback>,
        interval: u64,
    ) -> Self {
        let total = u64::try_from(total).unwrap_or(u64::MAX);
        progress.set_total(total);
        Self {
            report: PassReport::new(dataset),
            progress,
            interval,
            total,
            started: Instant::now(),
        }
    }

    /// Records that one source row was read.
    pub fn row_read(&mut self) {
        self.report.rows_read += 1;
        self.progress.inc(1);

        let processed = self.report.rows_read;
        if self.interval > 0 && processed % self.interval == 0 {
            log::info!(
                "{}: processed {processed}/{} rows ({} written, {} skipped)",
                self.report.dataset,
                self.total,
                self.report.inserted,
                self.report.skipped_total(),
            );
            self.progress.set_message(format!(
                "{}: {} written, {} skipped",
                self.report.dataset,
                self.report.inserted,
                self.report.skipped_total()
            ));
        }
    }

    /// Records that a row passed validation.
    pub const fn admitted(&mut self) {
        self.report.admitted += 1;
    }

    /// Records a written record.
    pub const fn inserted(&mut self) {
        self.report.inserted += 1;
    }

    /// Records a rejected row or record.
    ///
    /// Invalid values and write failures are logged at `warn`; the other
    /// reasons are routine for these datasets and only logged at `debug`.
    pub fn reject(&mut self, err: &RowError) {
        match err {
            RowError::InvalidValue { .. } | RowError::Write { .. } => {
                log::warn!("{}: skipped row: {}", self.report.dataset, error_chain(err));
            }
            RowError::MissingKey { .. }
            | RowError::UnknownPark { .. }
            | RowError::NoGeometry { .. }
            | RowError::DuplicateKey { .. } => {
                log::debug!("{}: skipped row: {err}", self.report.dataset);
            }
        }
        self.report.skip(err.reason());
    }

    /// Stops the clock and returns the finished report.
    #[must_use]
    pub fn finish(mut self) -> PassReport {
        self.report.duration = self.started.elapsed();
        self.progress.finish(format!(
            "{}: {} written, {} skipped",
            self.report.dataset,
            self.report.inserted,
            self.report.skipped_total()
        ));
        self.report
    }
}
