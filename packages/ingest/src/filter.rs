//! Referential filter for child records (facilities, trails).

use std::collections::BTreeSet;

use findmypark_database::{DbError, ParkStore};
use findmypark_park_models::PARK_ID_MAX_LEN;

use crate::RowError;
use crate::normalize::{present, truncate};

/// A snapshot of the committed park keys, taken once per child pass.
#[derive(Debug, Clone, Default)]
pub struct ReferentialFilter {
    park_ids: BTreeSet<String>,
}

impl ReferentialFilter {
    /// Reads the committed park keys from `store`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the key read fails.
    pub fn load(store: &dyn ParkStore) -> Result<Self, DbError> {
        Ok(Self::from_ids(store.park_ids()?))
    }

    /// Builds a filter from an explicit key set.
    #[must_use]
    pub const fn from_ids(park_ids: BTreeSet<String>) -> Self {
        Self { park_ids }
    }

    /// Number of known parks.
    #[must_use]
    pub fn park_count(&self) -> usize {
        self.park_ids.len()
    }

    /// Resolves the raw key of a child row to a known `park_id`.
    ///
    /// The key is truncated to the stored `park_id` width before lookup, the
    /// same way the parks pass truncates it.
    ///
    /// # Errors
    ///
    /// Returns [`RowError::MissingKey`] if the key is missing and
    /// [`RowError::UnknownPark`] if it is not in the snapshot.
    pub fn admit(&self, column: &'static str, raw: Option<&str>) -> Result<String, RowError> {
        let key = truncate(
            present(raw).ok_or(RowError::MissingKey { column })?,
            PARK_ID_MAX_LEN,
        );
        if self.park_ids.contains(&key) {
            Ok(key)
        } else {
            Err(RowError::UnknownPark { park_id: key })
        }
    }
}

#[cfg(test)]
mod tests {
    use findmypark_database::MemoryStore;
    use findmypark_park_models::Park;

    use super::*;

    fn filter() -> ReferentialFilter {
        ReferentialFilter::from_ids(["M037".to_string(), "B073".to_string()].into())
    }

    #[test]
    fn admits_known_keys() {
        assert_eq!(filter().admit("ParkID", Some(" M037 ")).unwrap(), "M037");
    }

    #[test]
    fn rejects_missing_keys() {
        for raw in [None, Some(""), Some("  "), Some("nan")] {
            assert!(matches!(
                filter().admit("ParkID", raw),
                Err(RowError::MissingKey { column: "ParkID" })
            ));
        }
    }

    #[test]
    fn admits_overlong_keys_by_their_stored_prefix() {
        let stored = "M".repeat(PARK_ID_MAX_LEN);
        let filter = ReferentialFilter::from_ids([stored.clone()].into());
        let raw = format!("{stored}0123456789");

        assert_eq!(filter.admit("ParkID", Some(&raw)).unwrap(), stored);
    }

    #[test]
    fn rejects_unknown_parks() {
        assert!(matches!(
            filter().admit("GISPROPNUM", Some("ZZZ")),
            Err(RowError::UnknownPark { park_id }) if park_id == "ZZZ"
        ));
    }

    #[test]
    fn loads_committed_keys_only() {
        let mut store = MemoryStore::new();
        store
            .upsert_park(&Park {
                park_id: "M037".to_string(),
                park_name: "Riverside".to_string(),
                park_size: None,
                borough: None,
                zipcode: None,
                latitude: 40.8,
                longitude: -73.97,
                park_type: None,
                acres: None,
                is_waterfront: false,
            })
            .unwrap();
        store.begin().unwrap();
        store
            .upsert_park(&Park {
                park_id: "B073".to_string(),
                park_name: "Prospect".to_string(),
                park_size: None,
                borough: None,
                zipcode: None,
                latitude: 40.66,
                longitude: -73.97,
                park_type: None,
                acres: None,
                is_waterfront: false,
            })
            .unwrap();

        let filter = ReferentialFilter::load(&store).unwrap();
        assert_eq!(filter.park_count(), 1);
        assert!(filter.admit("ParkID", Some("B073")).is_err());
    }
}
