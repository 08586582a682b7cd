//! `DuckDB`-backed [`ParkStore`].
//!
//! One connection serves the whole run. Transactions are driven with
//! explicit `BEGIN`/`COMMIT` statements so they can span many trait calls.
//!
//! `DuckDB` invalidates the whole transaction when a statement fails. To
//! keep a single rejected row from discarding the rest of a pass, the store
//! remembers every write made in the open transaction; after a failed
//! write it rolls back, begins again, and replays the remembered writes.

use std::collections::BTreeSet;
use std::path::Path;

use duckdb::{Connection, params};
use findmypark_park_models::{
    CategoryCount, Distribution, Facility, INITIAL_AVG_RATING, Park, Trail,
};

use crate::{DbError, ParkStore, schema};

/// A write made inside the open transaction.
enum Staged {
    Park(Park),
    Facility(Facility),
    Trail(Trail),
}

/// A [`ParkStore`] backed by a `DuckDB` connection.
pub struct DuckDbStore {
    conn: Connection,
    in_transaction: bool,
    staged: Vec<Staged>,
    /// Set when the open transaction could not be restored after a failed
    /// write. Such a transaction can only be rolled back.
    poisoned: bool,
}

impl DuckDbStore {
    /// Opens (or creates) the database file at `path`.
    ///
    /// When `init_schema` is set, missing tables are created; otherwise the
    /// tables must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection fails or the schema is missing.
    pub fn open(path: &Path, init_schema: bool) -> Result<Self, DbError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn, init_schema)
    }

    /// Opens a private in-memory database with the schema created.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or schema creation fails.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::from_connection(Connection::open_in_memory()?, true)
    }

    fn from_connection(conn: Connection, init_schema: bool) -> Result<Self, DbError> {
        if init_schema {
            schema::create_schema(&conn)?;
        }
        schema::verify_schema(&conn)?;

        Ok(Self {
            conn,
            in_transaction: false,
            staged: Vec::new(),
            poisoned: false,
        })
    }

    /// The underlying connection, for ad-hoc queries.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Closes the connection, rolling back any open transaction first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the rollback or close fails.
    pub fn close(mut self) -> Result<(), DbError> {
        self.rollback()?;
        self.conn.close().map_err(|(_, e)| DbError::DuckDb(e))
    }

    fn exec(conn: &Connection, write: &Staged) -> Result<(), DbError> {
        match write {
            Staged::Park(park) => Self::exec_park(conn, park),
            Staged::Facility(facility) => Self::exec_facility(conn, facility),
            Staged::Trail(trail) => Self::exec_trail(conn, trail),
        }
    }

    /// Executes a write. Inside a transaction, a failed write is undone by
    /// restarting the transaction with the earlier writes replayed.
    fn write(&mut self, write: Staged) -> Result<(), DbError> {
        if self.poisoned {
            return Err(DbError::Transaction {
                message: "transaction could not be restored after a failed write".to_string(),
            });
        }

        let Err(e) = Self::exec(&self.conn, &write) else {
            if self.in_transaction {
                self.staged.push(write);
            }
            return Ok(());
        };

        if self.in_transaction
            && let Err(restart) = self.restart_transaction()
        {
            log::error!("Failed to restore transaction after a rejected write: {restart}");
            self.poisoned = true;
        }
        Err(e)
    }

    fn restart_transaction(&self) -> Result<(), DbError> {
        self.conn.execute_batch("ROLLBACK; BEGIN TRANSACTION;")?;
        log::debug!("Replaying {} staged writes", self.staged.len());
        for write in &self.staged {
            Self::exec(&self.conn, write)?;
        }
        Ok(())
    }

    fn end_transaction(&mut self) {
        self.in_transaction = false;
        self.poisoned = false;
        self.staged.clear();
    }

    fn exec_park(conn: &Connection, park: &Park) -> Result<(), DbError> {
        conn.execute(
            "INSERT INTO Park (
                park_id, park_name, park_size, borough, zipcode,
                latitude, longitude, park_type, acres, is_waterfront,
                avg_rating
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (park_id) DO UPDATE SET
                park_name = EXCLUDED.park_name,
                park_size = EXCLUDED.park_size,
                borough = EXCLUDED.borough,
                zipcode = EXCLUDED.zipcode,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                park_type = EXCLUDED.park_type,
                acres = EXCLUDED.acres,
                is_waterfront = EXCLUDED.is_waterfront",
            params![
                park.park_id,
                park.park_name,
                park.park_size,
                park.borough.map(|b| b.to_string()),
                park.zipcode,
                park.latitude,
                park.longitude,
                park.park_type,
                park.acres,
                park.is_waterfront,
                INITIAL_AVG_RATING,
            ],
        )?;
        Ok(())
    }

    fn exec_facility(conn: &Connection, facility: &Facility) -> Result<(), DbError> {
        conn.execute(
            "INSERT INTO Facility (
                park_id, facility_type, dimensions, surface_type,
                is_lighted, is_accessible, field_condition,
                avg_facility_rating, total_facility_reviews
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 0.00, 0)",
            params![
                facility.park_id,
                facility.facility_type.to_string(),
                facility.dimensions,
                facility.surface_type,
                facility.is_lighted,
                facility.is_accessible,
                facility.field_condition,
            ],
        )?;
        Ok(())
    }

    fn exec_trail(conn: &Connection, trail: &Trail) -> Result<(), DbError> {
        conn.execute(
            "INSERT INTO Trail (
                park_id, trail_name, width_ft, surface,
                difficulty, has_trail_markers,
                avg_trail_rating, total_trail_reviews
            ) VALUES (?, ?, ?, ?, ?, ?, 0.00, 0)",
            params![
                trail.park_id,
                trail.trail_name,
                trail.width_ft,
                trail.surface,
                trail.difficulty,
                trail.has_trail_markers,
            ],
        )?;
        Ok(())
    }
}

impl ParkStore for DuckDbStore {
    fn park_ids(&self) -> Result<BTreeSet<String>, DbError> {
        let mut stmt = self.conn.prepare("SELECT DISTINCT park_id FROM Park")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(ids)
    }

    fn begin(&mut self) -> Result<(), DbError> {
        if self.in_transaction {
            return Err(DbError::Transaction {
                message: "transaction already open".to_string(),
            });
        }
        self.conn.execute_batch("BEGIN TRANSACTION;")?;
        self.in_transaction = true;
        self.poisoned = false;
        self.staged.clear();
        Ok(())
    }

    fn upsert_park(&mut self, park: &Park) -> Result<(), DbError> {
        self.write(Staged::Park(park.clone()))
    }

    fn insert_facility(&mut self, facility: &Facility) -> Result<(), DbError> {
        self.write(Staged::Facility(facility.clone()))
    }

    fn insert_trail(&mut self, trail: &Trail) -> Result<(), DbError> {
        self.write(Staged::Trail(trail.clone()))
    }

    fn commit(&mut self) -> Result<(), DbError> {
        if !self.in_transaction {
            return Err(DbError::Transaction {
                message: "commit without an open transaction".to_string(),
            });
        }
        if self.poisoned {
            self.rollback()?;
            return Err(DbError::Transaction {
                message: "transaction was rolled back after a failed write".to_string(),
            });
        }

        match self.conn.execute_batch("COMMIT;") {
            Ok(()) => {
                self.end_transaction();
                log::debug!("Committed transaction");
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK;") {
                    log::warn!("Rollback after failed commit also failed: {rollback}");
                }
                self.end_transaction();
                Err(e.into())
            }
        }
    }

    fn rollback(&mut self) -> Result<(), DbError> {
        if !self.in_transaction {
            return Ok(());
        }
        self.end_transaction();
        self.conn.execute_batch("ROLLBACK;")?;
        log::warn!("Rolled back open transaction");
        Ok(())
    }

    fn distribution(&self, distribution: Distribution) -> Result<Vec<CategoryCount>, DbError> {
        let (table, column) = match distribution {
            Distribution::ParkBorough => ("Park", "borough"),
            Distribution::FacilityType => ("Facility", "facility_type"),
            Distribution::TrailDifficulty => ("Trail", "difficulty"),
            Distribution::TrailSurface => ("Trail", "surface"),
        };
        let limit = distribution
            .limit()
            .map_or_else(String::new, |n| format!(" LIMIT {n}"));

        let mut stmt = self.conn.prepare(&format!(
            "SELECT COALESCE({column}, 'Unknown') AS category, COUNT(*) AS n
             FROM {table}
             GROUP BY 1
             ORDER BY n DESC, category{limit}"
        ))?;

        let counts = stmt
            .query_map([], |row| {
                let count: i64 = row.get(1)?;
                Ok(CategoryCount {
                    category: row.get(0)?,
                    count: u64::try_from(count).unwrap_or(0),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}
