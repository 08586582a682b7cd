//! Park properties pass.

use std::collections::BTreeMap;

use findmypark_database::ParkStore;
use findmypark_ingest_models::Dataset;
use findmypark_park_models::{
    Borough, PARK_ID_MAX_LEN, PARK_NAME_MAX_LEN, PARK_TYPE_MAX_LEN, Park, ZIPCODE_MAX_LEN,
};

use super::{Loader, PassTracker};
use crate::geometry::extract_centroid;
use crate::normalize::{first_present, first_zipcode, parse_decimal, truncate};
use crate::source::RawRecord;
use crate::{IngestError, RowError};

/// Key column of the park properties dataset.
pub const KEY_COLUMN: &str = "GISPROPNUM";
/// Boundary geometry column (WKT multipolygon).
pub const GEOMETRY_COLUMN: &str = "multipolygon";
/// Name columns, in order of preference.
pub const NAME_COLUMNS: &[&str] = &["SIGNNAME", "NAME311"];

/// Loads park properties, upserting on `park_id`.
#[derive(Debug, Clone, Copy)]
pub struct ParkLoader {
    borough_of: fn(&str) -> Option<Borough>,
}

impl Default for ParkLoader {
    fn default() -> Self {
        Self::new(Borough::from_code)
    }
}

impl ParkLoader {
    /// Creates a loader with the given borough code table.
    #[must_use]
    pub const fn new(borough_of: fn(&str) -> Option<Borough>) -> Self {
        Self { borough_of }
    }

    /// Normalizes one source row into a [`Park`].
    ///
    /// Geometry is checked first: a row without a usable boundary is dropped
    /// before its key is looked at.
    ///
    /// # Errors
    ///
    /// Returns [`RowError::NoGeometry`], [`RowError::MissingKey`], or
    /// [`RowError::InvalidValue`] (non-numeric acreage).
    pub fn normalize(&self, record: &RawRecord) -> Result<Park, RowError> {
        let centroid = record
            .get(GEOMETRY_COLUMN)
            .and_then(extract_centroid)
            .ok_or(RowError::NoGeometry { line: record.line })?;

        let park_id = record
            .get(KEY_COLUMN)
            .map(|id| truncate(id, PARK_ID_MAX_LEN))
            .ok_or(RowError::MissingKey { column: KEY_COLUMN })?;

        let acres = parse_decimal("ACRES", record.raw("ACRES"))?;

        let park_name = first_present(record, NAME_COLUMNS).map_or_else(
            || format!("Park {park_id}"),
            |name| truncate(name, PARK_NAME_MAX_LEN),
        );

        Ok(Park {
            park_name,
            park_size: acres,
            borough: record.get("BOROUGH").and_then(self.borough_of),
            zipcode: first_zipcode(record.raw("ZIPCODE"), ZIPCODE_MAX_LEN),
            latitude: centroid.latitude,
            longitude: centroid.longitude,
            park_type: record
                .get("TYPECATEGORY")
                .map(|t| truncate(t, PARK_TYPE_MAX_LEN)),
            acres,
            is_waterfront: record
                .get("WATERFRONT")
                .is_some_and(|w| w.eq_ignore_ascii_case("true")),
            park_id,
        })
    }
}

impl Loader for ParkLoader {
    fn dataset(&self) -> Dataset {
        Dataset::Parks
    }

    fn load(
        &self,
        store: &mut dyn ParkStore,
        records: &[RawRecord],
        tracker: &mut PassTracker,
    ) -> Result<(), IngestError> {
        let mut parks = Vec::with_capacity(records.len());
        for record in records {
            tracker.row_read();
            match self.normalize(record) {
                Ok(park) => parks.push(park),
                Err(e) => tracker.reject(&e),
            }
        }

        // Last occurrence of a key wins.
        let last_index: BTreeMap<&str, usize> = parks
            .iter()
            .enumerate()
            .map(|(i, park)| (park.park_id.as_str(), i))
            .collect();
        let mut unique = Vec::with_capacity(last_index.len());
        for (i, park) in parks.iter().enumerate() {
            if last_index.get(park.park_id.as_str()) == Some(&i) {
                unique.push(park);
            } else {
                tracker.reject(&RowError::DuplicateKey {
                    key: park.park_id.clone(),
                });
            }
        }

        log::info!(
            "Parks: {} unique parks with usable geometry out of {} rows",
            unique.len(),
            records.len()
        );

        store.begin()?;
        for park in unique {
            tracker.admitted();
            match store.upsert_park(park) {
                Ok(()) => tracker.inserted(),
                Err(source) => tracker.reject(&RowError::Write {
                    key: park.park_id.clone(),
                    source,
                }),
            }
        }
        store.commit()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use findmypark_database::MemoryStore;
    use findmypark_ingest_models::SkipReason;
    use findmypark_ingest_models::progress::null_progress;

    use super::*;
    use crate::loader::test_support::FailingStore;

    const SQUARE: &str = "MULTIPOLYGON (((-73.98 40.79, -73.96 40.79, -73.96 40.81, -73.98 40.81, -73.98 40.79)))";

    fn row(line: u64, pairs: &[(&str, &str)]) -> RawRecord {
        RawRecord::from_pairs(line, pairs.iter().copied())
    }

    fn run(store: &mut dyn ParkStore, records: &[RawRecord]) -> findmypark_ingest_models::PassReport {
        let mut tracker = PassTracker::new(Dataset::Parks, records.len(), null_progress(), 0);
        ParkLoader::default().load(store, records, &mut tracker).unwrap();
        tracker.finish()
    }

    #[test]
    fn riverside_example() {
        let record = row(
            2,
            &[
                ("GISPROPNUM", "X001"),
                ("SIGNNAME", ""),
                ("NAME311", "Riverside"),
                ("multipolygon", SQUARE),
                ("BOROUGH", "M"),
                ("WATERFRONT", "True"),
                ("ACRES", "12.5"),
                ("ZIPCODE", "10024, 10025"),
                ("TYPECATEGORY", "Flagship Park"),
            ],
        );

        let park = ParkLoader::default().normalize(&record).unwrap();
        assert_eq!(park.park_id, "X001");
        assert_eq!(park.park_name, "Riverside");
        assert_eq!(park.borough, Some(Borough::Manhattan));
        assert!(park.is_waterfront);
        assert!((park.latitude - 40.80).abs() < 1e-7);
        assert!((park.longitude - -73.97).abs() < 1e-7);
        assert_eq!(park.zipcode.as_deref(), Some("10024"));
        assert_eq!(park.park_size, Some(12.5));
        assert_eq!(park.acres, Some(12.5));
        assert_eq!(park.park_type.as_deref(), Some("Flagship Park"));
    }

    #[test]
    fn name_falls_back_to_id() {
        let record = row(2, &[("GISPROPNUM", "Q099"), ("multipolygon", SQUARE)]);
        let park = ParkLoader::default().normalize(&record).unwrap();
        assert_eq!(park.park_name, "Park Q099");
        assert_eq!(park.borough, None);
        assert!(!park.is_waterfront);
        assert_eq!(park.acres, None);
    }

    #[test]
    fn unknown_borough_code_is_null() {
        let record = row(
            2,
            &[("GISPROPNUM", "Z001"), ("multipolygon", SQUARE), ("BOROUGH", "Z")],
        );
        assert_eq!(ParkLoader::default().normalize(&record).unwrap().borough, None);
    }

    #[test]
    fn geometry_is_checked_before_key() {
        let record = row(7, &[("GISPROPNUM", "nan"), ("multipolygon", "POLYGON ((")]);
        assert!(matches!(
            ParkLoader::default().normalize(&record),
            Err(RowError::NoGeometry { line: 7 })
        ));

        let record = row(8, &[("GISPROPNUM", " nan "), ("multipolygon", SQUARE)]);
        assert!(matches!(
            ParkLoader::default().normalize(&record),
            Err(RowError::MissingKey { column: "GISPROPNUM" })
        ));
    }

    #[test]
    fn every_row_is_inserted_or_skipped() {
        let records = vec![
            row(2, &[("GISPROPNUM", "M001"), ("multipolygon", SQUARE)]),
            row(3, &[("GISPROPNUM", ""), ("multipolygon", SQUARE)]),
            row(4, &[("GISPROPNUM", "M002"), ("multipolygon", "garbage")]),
            row(5, &[("GISPROPNUM", "M003"), ("multipolygon", SQUARE), ("ACRES", "lots")]),
            row(6, &[("GISPROPNUM", "M001"), ("multipolygon", SQUARE), ("SIGNNAME", "Later")]),
        ];

        let mut store = MemoryStore::new();
        let report = run(&mut store, &records);

        assert_eq!(report.rows_read, 5);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped_for(SkipReason::MissingKey), 1);
        assert_eq!(report.skipped_for(SkipReason::NoGeometry), 1);
        assert_eq!(report.skipped_for(SkipReason::InvalidValue), 1);
        assert_eq!(report.skipped_for(SkipReason::DuplicateKey), 1);
        assert_eq!(report.inserted + report.skipped_total(), report.rows_read);
        assert_eq!(store.parks()["M001"].park_name, "Later");
    }

    #[test]
    fn rerun_is_idempotent_and_keeps_rating() {
        let first = vec![row(
            2,
            &[("GISPROPNUM", "M037"), ("multipolygon", SQUARE), ("SIGNNAME", "Riverside")],
        )];
        let second = vec![row(
            2,
            &[("GISPROPNUM", "M037"), ("multipolygon", SQUARE), ("SIGNNAME", "Riverside Park")],
        )];

        let mut store = MemoryStore::new();
        run(&mut store, &first);
        assert!(store.set_avg_rating("M037", 4.5));
        run(&mut store, &second);

        assert_eq!(store.parks().len(), 1);
        assert_eq!(store.parks()["M037"].park_name, "Riverside Park");
        assert_eq!(store.avg_rating("M037"), Some(4.5));
    }

    #[test]
    fn write_failure_skips_only_that_park() {
        let records = vec![
            row(2, &[("GISPROPNUM", "M001"), ("multipolygon", SQUARE)]),
            row(3, &[("GISPROPNUM", "M002"), ("multipolygon", SQUARE)]),
        ];

        let mut store = FailingStore::failing_on(MemoryStore::new(), &["M001"]);
        let report = run(&mut store, &records);

        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped_for(SkipReason::WriteFailed), 1);
        assert!(store.inner.parks().contains_key("M002"));
        assert!(!store.inner.parks().contains_key("M001"));
    }
}
