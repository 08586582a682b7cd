//! Table definitions for the `Park`, `Facility`, and `Trail` tables.
//!
//! The loader assumes these tables already exist. [`create_schema`] is only
//! used to bootstrap an empty database file (`--init-schema`) and by tests.

use duckdb::Connection;

use crate::DbError;

/// Tables the loader writes to.
pub const TABLES: &[&str] = &["Park", "Facility", "Trail"];

/// Creates the three tables (and their id sequences) if they are missing.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails.
pub fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE SEQUENCE IF NOT EXISTS facility_id_seq START 1;
        CREATE SEQUENCE IF NOT EXISTS trail_id_seq START 1;

        CREATE TABLE IF NOT EXISTS Park (
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
            avg_rating DECIMAL(3, 2)
        );

        CREATE TABLE IF NOT EXISTS Facility (
            facility_id INTEGER PRIMARY KEY DEFAULT nextval('facility_id_seq'),
            park_id VARCHAR(50) NOT NULL,
            facility_type VARCHAR NOT NULL,
            dimensions VARCHAR(100),
            surface_type VARCHAR(50),
            is_lighted BOOLEAN DEFAULT FALSE,
            is_accessible BOOLEAN DEFAULT FALSE,
            field_condition VARCHAR(200),
            avg_facility_rating DECIMAL(3, 2) DEFAULT 0.00,
            total_facility_reviews INTEGER DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS Trail (
            trail_id INTEGER PRIMARY KEY DEFAULT nextval('trail_id_seq'),
            park_id VARCHAR(50) NOT NULL,
            trail_name VARCHAR(200),
            width_ft VARCHAR(50),
            surface VARCHAR(50),
            difficulty VARCHAR(200),
            has_trail_markers BOOLEAN DEFAULT FALSE,
            avg_trail_rating DECIMAL(3, 2) DEFAULT 0.00,
            total_trail_reviews INTEGER DEFAULT 0
        );",
    )?;

    Ok(())
}

/// Verifies that every table in [`TABLES`] exists.
///
/// # Errors
///
/// Returns [`DbError::MissingTable`] naming the first absent table, or
/// [`DbError::DuckDb`] if the catalog query fails.
pub fn verify_schema(conn: &Connection) -> Result<(), DbError> {
    let mut stmt = conn.prepare(
        "SELECT COUNT(*) FROM information_schema.tables
         WHERE lower(table_name) = lower(?)",
    )?;

    for &table in TABLES {
        let count: i64 = stmt.query_row([table], |row| row.get(0))?;
        if count == 0 {
            return Err(DbError::MissingTable { table });
        }
    }

    Ok(())
}
