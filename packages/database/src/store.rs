//! The write seam between the loaders and a relational store.

use std::collections::BTreeSet;

use findmypark_park_models::{CategoryCount, Distribution, Facility, Park, Trail};

use crate::DbError;

/// A store the loaders can read park keys from and write entities to.
///
/// Writes made between [`begin`](Self::begin) and [`commit`](Self::commit)
/// become visible together. A write that returns an error is not staged;
/// the caller may keep writing other rows.
pub trait ParkStore {
    /// Returns every `park_id` currently committed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    fn park_ids(&self) -> Result<BTreeSet<String>, DbError>;

    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a transaction is already open or the store
    /// refuses it.
    fn begin(&mut self) -> Result<(), DbError>;

    /// Inserts a park, or overwrites the mutable attributes of an existing
    /// park with the same `park_id`. `avg_rating` is only ever set on
    /// insert.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write is rejected.
    fn upsert_park(&mut self, park: &Park) -> Result<(), DbError>;

    /// Appends a facility row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write is rejected.
    fn insert_facility(&mut self, facility: &Facility) -> Result<(), DbError>;

    /// Appends a trail row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write is rejected.
    fn insert_trail(&mut self, trail: &Trail) -> Result<(), DbError>;

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if no transaction is open or the commit fails.
    fn commit(&mut self) -> Result<(), DbError>;

    /// Discards the open transaction. A no-op when none is open.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the rollback fails.
    fn rollback(&mut self) -> Result<(), DbError>;

    /// Row counts grouped by the distribution's category column, largest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    fn distribution(&self, distribution: Distribution) -> Result<Vec<CategoryCount>, DbError>;
}
