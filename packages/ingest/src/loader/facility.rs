//! Athletic facilities pass.
//!
//! A source row describes one physical field and carries one boolean column
//! per sport it supports. Each true flag becomes its own `Facility` record,
//! so a single row fans out to anywhere between zero and
//! [`FacilityType::ALL`]`.len()` records.

use findmypark_database::ParkStore;
use findmypark_ingest_models::Dataset;
use findmypark_park_models::{
    DIMENSIONS_MAX_LEN, FIELD_CONDITION_MAX_LEN, Facility, FacilityType, SURFACE_TYPE_MAX_LEN,
    UNKNOWN,
};

use super::{Loader, PassTracker};
use crate::filter::ReferentialFilter;
use crate::normalize::{FLAG_TRUE, is_truthy, truncate};
use crate::source::RawRecord;
use crate::{IngestError, RowError};

/// Key column referencing the owning park.
pub const KEY_COLUMN: &str = "GISPROPNUM";

/// Loads athletic facilities for parks committed by the park pass.
#[derive(Debug, Clone, Copy)]
pub struct FacilityLoader {
    flags: &'static [FacilityType],
}

impl Default for FacilityLoader {
    fn default() -> Self {
        Self::new(FacilityType::ALL)
    }
}

impl FacilityLoader {
    /// Creates a loader that fans out over `flags`.
    #[must_use]
    pub const fn new(flags: &'static [FacilityType]) -> Self {
        Self { flags }
    }

    /// One [`Facility`] per true flag column of `record`.
    #[must_use]
    pub fn expand(&self, record: &RawRecord, park_id: &str) -> Vec<Facility> {
        let dimensions = record
            .get("DIMENSIONS")
            .map(|d| truncate(d, DIMENSIONS_MAX_LEN));
        let surface_type = truncate(
            record.get("SURFACE_TYPE").unwrap_or(UNKNOWN),
            SURFACE_TYPE_MAX_LEN,
        );
        let field_condition = truncate(
            record.get("FEATURESTATUS").unwrap_or(UNKNOWN),
            FIELD_CONDITION_MAX_LEN,
        );
        let is_lighted = is_truthy(record.raw("FIELD_LIGHTED"), FLAG_TRUE);
        let is_accessible = is_truthy(record.raw("ACCESSIBLE"), FLAG_TRUE);

        self.flags
            .iter()
            .filter(|flag| is_truthy(record.raw(flag.source_column()), FLAG_TRUE))
            .map(|&facility_type| Facility {
                park_id: park_id.to_string(),
                facility_type,
                dimensions: dimensions.clone(),
                surface_type: surface_type.clone(),
                is_lighted,
                is_accessible,
                field_condition: field_condition.clone(),
            })
            .collect()
    }
}

impl Loader for FacilityLoader {
    fn dataset(&self) -> Dataset {
        Dataset::Facilities
    }

    fn load(
        &self,
        store: &mut dyn ParkStore,
        records: &[RawRecord],
        tracker: &mut PassTracker,
    ) -> Result<(), IngestError> {
        let filter = ReferentialFilter::load(store)?;
        log::info!("Facilities: {} valid parks", filter.park_count());

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

            for facility in self.expand(record, &park_id) {
                match store.insert_facility(&facility) {
                    Ok(()) => tracker.inserted(),
                    Err(source) => tracker.reject(&RowError::Write {
                        key: format!("{park_id}/{}", facility.facility_type),
                        source,
                    }),
                }
            }
        }
        store.commit()?;

        Ok(())
    }
}
