//! Runs the three loader passes in dependency order.
//!
//! Parks must be committed before facilities and trails are filtered
//! against them, so the passes run strictly one after another on a single
//! store. A pass that fails is rolled back; the passes before it stay
//! committed.

use std::sync::Arc;

use findmypark_database::ParkStore;
use findmypark_ingest_models::progress::ProgressCallback;
use findmypark_ingest_models::{Dataset, ImportConfig, RunSummary};
use findmypark_park_models::Distribution;

use crate::IngestError;
use crate::loader::{FacilityLoader, Loader, ParkLoader, PassTracker, TrailLoader};
use crate::source::read_csv;

/// Creates the progress sink for a pass.
pub type ProgressFactory<'a> = &'a dyn Fn(Dataset) -> Arc<dyn ProgressCallback>;

/// A configured load run.
///
/// The summary is kept on the pipeline so that the passes completed before
/// a failure can still be reported.
pub struct Pipeline<'a> {
    config: &'a ImportConfig,
    loaders: Vec<Box<dyn Loader>>,
    summary: RunSummary,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline with the park, facility, and trail loaders.
    #[must_use]
    pub fn new(config: &'a ImportConfig) -> Self {
        Self::with_loaders(
            config,
            vec![
                Box::new(ParkLoader::default()),
                Box::new(FacilityLoader::default()),
                Box::new(TrailLoader::default()),
            ],
        )
    }

    /// Creates a pipeline with an explicit loader list, run in order.
    #[must_use]
    pub fn with_loaders(config: &'a ImportConfig, loaders: Vec<Box<dyn Loader>>) -> Self {
        Self {
            config,
            loaders,
            summary: RunSummary::default(),
        }
    }

    /// Runs every pass, then gathers the post-load distributions.
    ///
    /// # Errors
    ///
    /// Returns the first [`IngestError`]; the failing pass is rolled back
    /// and later passes are not run.
    pub fn run(
        &mut self,
        store: &mut dyn ParkStore,
        progress: ProgressFactory<'_>,
    ) -> Result<(), IngestError> {
        for loader in &self.loaders {
            let dataset = loader.dataset();
            let path = self.config.source_path(dataset);
            log::info!("{dataset}: reading {}", path.display());

            let records = read_csv(&path)?;
            log::info!("{dataset}: {} rows", records.len());

            let mut tracker = PassTracker::new(
                dataset,
                records.len(),
                progress(dataset),
                self.config.progress_interval,
            );
            if let Err(e) = loader.load(store, &records, &mut tracker) {
                if let Err(rollback) = store.rollback() {
                    log::error!("{dataset}: rollback failed: {rollback}");
                }
                return Err(e);
            }

            let report = tracker.finish();
            log::info!(
                "{dataset}: {} written, {} skipped in {:.1}s",
                report.inserted,
                report.skipped_total(),
                report.duration.as_secs_f64()
            );
            self.summary.passes.push(report);
        }

        for &distribution in Distribution::ALL {
            let counts = store.distribution(distribution)?;
            self.summary.distributions.push((distribution, counts));
        }

        Ok(())
    }

    /// The summary of the passes completed so far.
    #[must_use]
    pub const fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Consumes the pipeline, returning its summary.
    #[must_use]
    pub fn into_summary(self) -> RunSummary {
        self.summary
    }
}

/// Runs parks, then facilities, then trails against `store`.
///
/// # Errors
///
/// Returns [`IngestError`] if a source cannot be read or a pass cannot be
/// committed.
pub fn run_pipeline(
    store: &mut dyn ParkStore,
    config: &ImportConfig,
    progress: ProgressFactory<'_>,
) -> Result<RunSummary, IngestError> {
    let mut pipeline = Pipeline::new(config);
    pipeline.run(store, progress)?;
    Ok(pipeline.into_summary())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use findmypark_database::{DbError, DuckDbStore, MemoryStore};
    use findmypark_ingest_models::SkipReason;
    use findmypark_ingest_models::progress::null_progress;
    use findmypark_park_models::{CategoryCount, Facility, Park, Trail};

    use super::*;

    const PARKS: &str = "\
GISPROPNUM,SIGNNAME,NAME311,BOROUGH,ZIPCODE,ACRES,TYPECATEGORY,WATERFRONT,multipolygon
X001,,Riverside,M,\"10024, 10025\",266.79,Flagship Park,True,\"MULTIPOLYGON (((-73.98 40.79, -73.96 40.79, -73.96 40.81, -73.98 40.81, -73.98 40.79)))\"
B073,Prospect Park,,B,11215,526.25,Flagship Park,false,\"MULTIPOLYGON (((-73.98 40.65, -73.96 40.65, -73.96 40.67, -73.98 40.67, -73.98 40.65)))\"
nan,Ghost,,Q,,,,,\"MULTIPOLYGON (((-73.8 40.7, -73.7 40.7, -73.7 40.8, -73.8 40.8, -73.8 40.7)))\"
Q001,Broken,,Q,,,,,POLYGON ((
";

    const FACILITIES: &str = "\
GISPROPNUM,BASKETBALL,TENNIS,HANDBALL,DIMENSIONS,SURFACE_TYPE,FIELD_LIGHTED,ACCESSIBLE,FEATURESTATUS
X001,TRUE,TRUE,FALSE,94x50,Asphalt,TRUE,TRUE,Active
ZZZ,TRUE,FALSE,FALSE,,,,,
B073,FALSE,FALSE,TRUE,,,,,
";

    const TRAILS: &str = "\
ParkID,Trail_Name,Park_Name,Width_ft,Surface,Difficulty,TrailMarkersInstalled
B073,,Prospect Park,5,Dirt,Moderate,Yes
X001,Riverside Walk,,,Paved,,no
Q001,Orphan,,,,,
";

    fn write_sources(dir: &Path) -> ImportConfig {
        std::fs::write(dir.join("parks.csv"), PARKS).unwrap();
        std::fs::write(dir.join("facilities.csv"), FACILITIES).unwrap();
        std::fs::write(dir.join("trails.csv"), TRAILS).unwrap();
        ImportConfig {
            database: dir.join("findmypark.duckdb"),
            data_dir: dir.to_path_buf(),
            parks_file: "parks.csv".to_string(),
            facilities_file: "facilities.csv".to_string(),
            trails_file: "trails.csv".to_string(),
            progress_interval: 2,
        }
    }

    fn no_progress(_: Dataset) -> Arc<dyn ProgressCallback> {
        null_progress()
    }

    fn count(store: &DuckDbStore, sql: &str) -> i64 {
        store
            .connection()
            .query_row(sql, [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn full_run_against_duckdb() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_sources(dir.path());
        let mut store = DuckDbStore::open_in_memory().unwrap();

        let summary = run_pipeline(&mut store, &config, &no_progress).unwrap();

        let parks = summary.pass(Dataset::Parks).unwrap();
        assert_eq!(parks.rows_read, 4);
        assert_eq!(parks.inserted, 2);
        assert_eq!(parks.skipped_for(SkipReason::MissingKey), 1);
        assert_eq!(parks.skipped_for(SkipReason::NoGeometry), 1);

        let facilities = summary.pass(Dataset::Facilities).unwrap();
        assert_eq!(facilities.rows_read, 3);
        assert_eq!(facilities.inserted, 3);
        assert_eq!(facilities.skipped_for(SkipReason::UnknownPark), 1);

        let trails = summary.pass(Dataset::Trails).unwrap();
        assert_eq!(trails.inserted, 2);
        assert_eq!(trails.skipped_for(SkipReason::UnknownPark), 1);

        let (name, borough, waterfront): (String, String, bool) = store
            .connection()
            .query_row(
                "SELECT park_name, borough, is_waterfront FROM Park WHERE park_id = 'X001'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(name, "Riverside");
        assert_eq!(borough, "Manhattan");
        assert!(waterfront);

        let trail_name: String = store
            .connection()
            .query_row(
                "SELECT trail_name FROM Trail WHERE park_id = 'B073'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(trail_name, "Trail at Prospect Park");

        assert_eq!(
            count(
                &store,
                "SELECT COUNT(*) FROM Facility WHERE park_id NOT IN (SELECT park_id FROM Park)"
            ),
            0
        );
        assert_eq!(
            count(
                &store,
                "SELECT COUNT(*) FROM Trail WHERE park_id NOT IN (SELECT park_id FROM Park)"
            ),
            0
        );

        let (distribution, difficulties) = &summary.distributions[2];
        assert_eq!(*distribution, Distribution::TrailDifficulty);
        assert!(difficulties.contains(&CategoryCount {
            category: "Unkown".to_string(),
            count: 1
        }));
    }

    #[test]
    fn rejected_park_does_not_lose_the_pass() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_sources(dir.path());
        let mut store = DuckDbStore::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                "DROP TABLE Park;
                 CREATE TABLE Park (
                     park_id VARCHAR(50) PRIMARY KEY,
                     park_name VARCHAR(200) NOT NULL,
                     park_size DECIMAL(10, 2),
                     borough VARCHAR,
                     zipcode VARCHAR(10),
                     latitude DOUBLE NOT NULL,
                     longitude DOUBLE NOT NULL,
                     park_type VARCHAR(50),
                     acres DECIMAL(10, 2),
                     is_waterfront BOOLEAN DEFAULT FALSE,
                     avg_rating DECIMAL(3, 2),
                     CHECK (park_id <> 'X001')
                 );",
            )
            .unwrap();

        let summary = run_pipeline(&mut store, &config, &no_progress).unwrap();

        let parks = summary.pass(Dataset::Parks).unwrap();
        assert_eq!(parks.inserted, 1);
        assert_eq!(parks.skipped_for(SkipReason::WriteFailed), 1);
        assert_eq!(
            count(&store, "SELECT COUNT(*) FROM Park WHERE park_id = 'B073'"),
            1
        );
        assert_eq!(count(&store, "SELECT COUNT(*) FROM Park"), 1);

        let facilities = summary.pass(Dataset::Facilities).unwrap();
        assert_eq!(facilities.inserted, 1);
        assert_eq!(facilities.skipped_for(SkipReason::UnknownPark), 2);

        let trails = summary.pass(Dataset::Trails).unwrap();
        assert_eq!(trails.inserted, 1);
        assert_eq!(trails.skipped_for(SkipReason::UnknownPark), 2);
        assert_eq!(count(&store, "SELECT COUNT(*) FROM Trail"), 1);
    }

    #[test]
    fn second_run_keeps_parks_and_duplicates_children() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_sources(dir.path());
        let mut store = DuckDbStore::open_in_memory().unwrap();

        run_pipeline(&mut store, &config, &no_progress).unwrap();
        store
            .connection()
            .execute_batch("UPDATE Park SET avg_rating = 3.75 WHERE park_id = 'B073'")
            .unwrap();
        run_pipeline(&mut store, &config, &no_progress).unwrap();

        assert_eq!(count(&store, "SELECT COUNT(*) FROM Park"), 2);
        assert_eq!(count(&store, "SELECT COUNT(*) FROM Facility"), 6);
        assert_eq!(count(&store, "SELECT COUNT(*) FROM Trail"), 4);
        let rating: f64 = store
            .connection()
            .query_row(
                "SELECT CAST(avg_rating AS DOUBLE) FROM Park WHERE park_id = 'B073'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!((rating - 3.75).abs() < 1e-9);
    }

    #[test]
    fn missing_source_stops_before_later_passes() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_sources(dir.path());
        std::fs::remove_file(dir.path().join("facilities.csv")).unwrap();

        let mut store = MemoryStore::new();
        let mut pipeline = Pipeline::new(&config);
        let err = pipeline.run(&mut store, &no_progress).unwrap_err();

        assert!(matches!(err, IngestError::Csv { .. }));
        assert_eq!(pipeline.summary().passes.len(), 1);
        assert_eq!(store.parks().len(), 2);
        assert!(store.trails().is_empty());
    }

    /// Accepts every write but refuses to commit.
    #[derive(Default)]
    struct CommitFails {
        inner: MemoryStore,
        rolled_back: bool,
    }

    impl ParkStore for CommitFails {
        fn park_ids(&self) -> Result<std::collections::BTreeSet<String>, DbError> {
            self.inner.park_ids()
        }

        fn begin(&mut self) -> Result<(), DbError> {
            self.inner.begin()
        }

        fn upsert_park(&mut self, park: &Park) -> Result<(), DbError> {
            self.inner.upsert_park(park)
        }

        fn insert_facility(&mut self, facility: &Facility) -> Result<(), DbError> {
            self.inner.insert_facility(facility)
        }

        fn insert_trail(&mut self, trail: &Trail) -> Result<(), DbError> {
            self.inner.insert_trail(trail)
        }

        fn commit(&mut self) -> Result<(), DbError> {
            Err(DbError::Transaction {
                message: "disk full".to_string(),
            })
        }

        fn rollback(&mut self) -> Result<(), DbError> {
            self.rolled_back = true;
            self.inner.rollback()
        }

        fn distribution(
            &self,
            distribution: Distribution,
        ) -> Result<Vec<CategoryCount>, DbError> {
            self.inner.distribution(distribution)
        }
    }

    #[test]
    fn failed_commit_rolls_back_and_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_sources(dir.path());

        let mut store = CommitFails::default();
        let err = run_pipeline(&mut store, &config, &no_progress).unwrap_err();

        assert!(matches!(err, IngestError::Database(DbError::Transaction { .. })));
        assert!(store.rolled_back);
        assert!(store.inner.parks().is_empty());
    }
}
