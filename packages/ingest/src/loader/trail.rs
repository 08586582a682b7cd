//! Trails pass.

use findmypark_database::ParkStore;
use findmypark_ingest_models::Dataset;
use findmypark_park_models::{
    DEFAULT_TRAIL_DIFFICULTY, DIFFICULTY_MAX_LEN, TRAIL_NAME_MAX_LEN, TRAIL_SURFACE_MAX_LEN,
    Trail, UNKNOWN, WIDTH_FT_MAX_LEN,
};

use super::{Loader, PassTracker};
use crate::filter::ReferentialFilter;
use crate::normalize::{MARKER_TRUE, is_truthy, truncate};
use crate::source::RawRecord;
use crate::{IngestError, RowError};

/// Key column referencing the owning park.
pub const KEY_COLUMN: &str = "ParkID";

/// Loads trails for parks committed by the park pass.
#[derive(Debug, Clone, Copy)]
pub struct TrailLoader {
    marker_true: &'static [&'static str],
}

impl Default for TrailLoader {
    fn default() -> Self {
        Self::new(MARKER_TRUE)
    }
}

impl TrailLoader {
    /// Creates a loader that reads `TrailMarkersInstalled` against
    /// `marker_true`.
    #[must_use]
    pub const fn new(marker_true: &'static [&'static str]) -> Self {
        Self { marker_true }
    }

    /// Normalizes one source row into a [`Trail`] for an admitted park.
    #[must_use]
    pub fn normalize(&self, record: &RawRecord, park_id: &str) -> Trail {
        let trail_name = record.get("Trail_Name").map_or_else(
            || match record.get("Park_Name") {
                Some(park_name) => format!("Trail at {park_name}"),
                None => format!("Trail at Park {park_id}"),
            },
            ToString::to_string,
        );

        Trail {
            park_id: park_id.to_string(),
            trail_name: truncate(&trail_name, TRAIL_NAME_MAX_LEN),
            width_ft: record
                .get("Width_ft")
                .map(|w| truncate(w, WIDTH_FT_MAX_LEN)),
            surface: truncate(
                record.get("Surface").unwrap_or(UNKNOWN),
                TRAIL_SURFACE_MAX_LEN,
            ),
            difficulty: truncate(
                record.get("Difficulty").unwrap_or(DEFAULT_TRAIL_DIFFICULTY),
                DIFFICULTY_MAX_LEN,
            ),
            has_trail_markers: is_truthy(record.raw("TrailMarkersInstalled"), self.marker_true),
        }
    }
}

impl Loader for TrailLoader {
    fn dataset(&self) -> Dataset {
        Dataset::Trails
    }

    fn load(
        &self,
        store: &mut dyn ParkStore,
        records: &[RawRecord],
        tracker: &mut PassTracker,
    ) -> Result<(), IngestError> {
        let filter = ReferentialFilter::load(store)?;
        log::info!("Trails: {} valid parks", filter.park_count());

        store.begin()?;
        for record in records {
            tracker.row_read();
            let park_id = match filter.admit(KEY_COLUMN, record.raw(KEY_COLUMN)) {
                Ok(park_id) => park_id,
                Err(e) => {
                    tracker.reject(&e);
                    continue;
                }
            };
            tracker.admitted();

            let trail = self.normalize(record, &park_id);
            match store.insert_trail(&trail) {
                Ok(()) => tracker.inserted(),
                Err(source) => tracker.reject(&RowError::Write {
                    key: format!("{park_id}/{}", trail.trail_name),
                    source,
                }),
            }
        }
        store.commit()?;

        Ok(())
    }
}
