//! In-process [`ParkStore`] with the same visibility rules as the
//! relational store: writes inside a transaction are staged and published
//! on commit.

use std::collections::{BTreeMap, BTreeSet};

use findmypark_park_models::{
    CategoryCount, Distribution, Facility, INITIAL_AVG_RATING, Park, Trail, UNKNOWN,
};

use crate::{DbError, ParkStore};

#[derive(Debug, Default)]
struct Staged {
    parks: Vec<Park>,
    facilities: Vec<Facility>,
    trails: Vec<Trail>,
}

/// A [`ParkStore`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    parks: BTreeMap<String, Park>,
    ratings: BTreeMap<String, f64>,
    facilities: Vec<Facility>,
    trails: Vec<Trail>,
    staged: Option<Staged>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed parks, keyed by `park_id`.
    #[must_use]
    pub const fn parks(&self) -> &BTreeMap<String, Park> {
        &self.parks
    }

    /// Committed facilities, in insertion order.
    #[must_use]
    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    /// Committed trails, in insertion order.
    #[must_use]
    pub fn trails(&self) -> &[Trail] {
        &self.trails
    }

    /// Current `avg_rating` of a committed park.
    #[must_use]
    pub fn avg_rating(&self, park_id: &str) -> Option<f64> {
        self.ratings.get(park_id).copied()
    }

    /// Sets the `avg_rating` of a committed park, as the review system
    /// would. Returns `false` if the park does not exist.
    pub fn set_avg_rating(&mut self, park_id: &str, rating: f64) -> bool {
        match self.ratings.get_mut(park_id) {
            Some(r) => {
                *r = rating;
                true
            }
            None => false,
        }
    }

    fn apply_park(&mut self, park: Park) {
        self.ratings
            .entry(park.park_id.clone())
            .or_insert(INITIAL_AVG_RATING);
        self.parks.insert(park.park_id.clone(), park);
    }
}

impl ParkStore for MemoryStore {
    fn park_ids(&self) -> Result<BTreeSet<String>, DbError> {
        Ok(self.parks.keys().cloned().collect())
    }

    fn begin(&mut self) -> Result<(), DbError> {
        if self.staged.is_some() {
            return Err(DbError::Transaction {
                message: "transaction already open".to_string(),
            });
        }
        self.staged = Some(Staged::default());
        Ok(())
    }

    fn upsert_park(&mut self, park: &Park) -> Result<(), DbError> {
        match &mut self.staged {
            Some(staged) => staged.parks.push(park.clone()),
            None => self.apply_park(park.clone()),
        }
        Ok(())
    }

    fn insert_facility(&mut self, facility: &Facility) -> Result<(), DbError> {
        match &mut self.staged {
            Some(staged) => staged.facilities.push(facility.clone()),
            None => self.facilities.push(facility.clone()),
        }
        Ok(())
    }

    fn insert_trail(&mut self, trail: &Trail) -> Result<(), DbError> {
        match &mut self.staged {
            Some(staged) => staged.trails.push(trail.clone()),
            None => self.trails.push(trail.clone()),
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DbError> {
        let staged = self.staged.take().ok_or_else(|| DbError::Transaction {
            message: "commit without an open transaction".to_string(),
        })?;

        for park in staged.parks {
            self.apply_park(park);
        }
        self.facilities.extend(staged.facilities);
        self.trails.extend(staged.trails);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DbError> {
        if self.staged.take().is_some() {
            log::warn!("Rolled back open transaction");
        }
        Ok(())
    }

    fn distribution(&self, distribution: Distribution) -> Result<Vec<CategoryCount>, DbError> {
        let mut groups: BTreeMap<String, u64> = BTreeMap::new();
        let mut tally = |category: Option<String>| {
            *groups
                .entry(category.unwrap_or_else(|| UNKNOWN.to_string()))
                .or_insert(0) += 1;
        };

        match distribution {
            Distribution::ParkBorough => self
                .parks
                .values()
                .for_each(|p| tally(p.borough.map(|b| b.to_string()))),
            Distribution::FacilityType => self
                .facilities
                .iter()
                .for_each(|f| tally(Some(f.facility_type.to_string()))),
            Distribution::TrailDifficulty => self
                .trails
                .iter()
                .for_each(|t| tally(Some(t.difficulty.clone()))),
            Distribution::TrailSurface => self
                .trails
                .iter()
                .for_each(|t| tally(Some(t.surface.clone()))),
        }

        let mut counts: Vec<CategoryCount> = groups
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();
        // Stable sort keeps categories alphabetical within equal counts.
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        if let Some(limit) = distribution.limit() {
            counts.truncate(limit);
        }

        Ok(counts)
    }
}
