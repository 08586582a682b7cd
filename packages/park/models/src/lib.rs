#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Park, facility, and trail entity types.
//!
//! These are the normalized, schema-conformant records written to the
//! `Park`, `Facility`, and `Trail` tables. Rating columns are owned by the
//! downstream review system; the loader only ever writes their initial
//! values.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Maximum length of a `park_id` (also used for the `park_id` foreign keys).
pub const PARK_ID_MAX_LEN: usize = 50;
/// Maximum length of `Park.park_name`.
pub const PARK_NAME_MAX_LEN: usize = 200;
/// Maximum length of `Park.zipcode`.
pub const ZIPCODE_MAX_LEN: usize = 10;
/// Maximum length of `Park.park_type`.
pub const PARK_TYPE_MAX_LEN: usize = 50;
/// Maximum length of `Facility.dimensions`.
pub const DIMENSIONS_MAX_LEN: usize = 100;
/// Maximum length of `Facility.surface_type`.
pub const SURFACE_TYPE_MAX_LEN: usize = 50;
/// Maximum length of `Facility.field_condition`.
pub const FIELD_CONDITION_MAX_LEN: usize = 200;
/// Maximum length of `Trail.trail_name`.
pub const TRAIL_NAME_MAX_LEN: usize = 200;
/// Maximum length of `Trail.width_ft`.
pub const WIDTH_FT_MAX_LEN: usize = 50;
/// Maximum length of `Trail.surface`.
pub const TRAIL_SURFACE_MAX_LEN: usize = 50;
/// Maximum length of `Trail.difficulty`.
pub const DIFFICULTY_MAX_LEN: usize = 200;

/// Placeholder written when a descriptive column is missing.
pub const UNKNOWN: &str = "Unknown";

/// Default trail difficulty.
///
/// The misspelling is what existing rows in the `Trail` table carry, so it
/// is kept as-is.
pub const DEFAULT_TRAIL_DIFFICULTY: &str = "Unkown";

/// Initial `avg_rating` value for a newly inserted park.
pub const INITIAL_AVG_RATING: f64 = 0.0;

/// New York City borough.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Borough {
    /// `M`
    Manhattan,
    /// `X`
    Bronx,
    /// `B`
    Brooklyn,
    /// `Q`
    Queens,
    /// `R`
    #[strum(serialize = "Staten Island")]
    #[serde(rename = "Staten Island")]
    StatenIsland,
}

impl Borough {
    /// Maps a single-letter NYC Parks borough code to a [`Borough`].
    ///
    /// Returns `None` for any code outside the five known letters.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "M" => Some(Self::Manhattan),
            "X" => Some(Self::Bronx),
            "B" => Some(Self::Brooklyn),
            "Q" => Some(Self::Queens),
            "R" => Some(Self::StatenIsland),
            _ => None,
        }
    }
}

/// Athletic facility type, one per boolean flag column in the athletic
/// facilities dataset.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum FacilityType {
    Basketball,
    Tennis,
    Soccer,
    Baseball,
    Softball,
    Volleyball,
    Handball,
    Pickleball,
    Hockey,
    Cricket,
    Rugby,
    Lacrosse,
    Bocce,
    Football,
    Track,
}

impl FacilityType {
    /// Every facility type, in flag-column order.
    pub const ALL: &[Self] = &[
        Self::Basketball,
        Self::Tennis,
        Self::Soccer,
        Self::Baseball,
        Self::Softball,
        Self::Volleyball,
        Self::Handball,
        Self::Pickleball,
        Self::Hockey,
        Self::Cricket,
        Self::Rugby,
        Self::Lacrosse,
        Self::Bocce,
        Self::Football,
        Self::Track,
    ];

    /// Name of the boolean source column that flags this facility type.
    #[must_use]
    pub const fn source_column(self) -> &'static str {
        match self {
            Self::Basketball => "BASKETBALL",
            Self::Tennis => "TENNIS",
            Self::Soccer => "REGULATION_SOCCER",
            Self::Baseball => "ADULT_BASEBALL",
            Self::Softball => "ADULT_SOFTBALL",
            Self::Volleyball => "VOLLEYBALL",
            Self::Handball => "HANDBALL",
            // The source dataset really does spell this one in mixed case.
            Self::Pickleball => "Pickleball",
            Self::Hockey => "HOCKEY",
            Self::Cricket => "CRICKET",
            Self::Rugby => "RUGBY",
            Self::Lacrosse => "LACROSSE",
            Self::Bocce => "BOCCE",
            Self::Football => "ADULT_FOOTBALL",
            Self::Track => "TRACK_AND_FIELD",
        }
    }
}

/// A park row as written to the `Park` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Park {
    /// NYC Parks GIS property number (e.g. "M037").
    pub park_id: String,
    /// Display name.
    pub park_name: String,
    /// Park size in acres (`park_size` column).
    pub park_size: Option<f64>,
    /// Borough, if the source code was recognized.
    pub borough: Option<Borough>,
    /// First ZIP code listed for the park.
    pub zipcode: Option<String>,
    /// Centroid latitude.
    pub latitude: f64,
    /// Centroid longitude.
    pub longitude: f64,
    /// Property type category (e.g. "Neighborhood Park").
    pub park_type: Option<String>,
    /// Acreage (`acres` column, same source as `park_size`).
    pub acres: Option<f64>,
    /// Whether the park touches the waterfront.
    pub is_waterfront: bool,
}

/// An athletic facility row as written to the `Facility` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    /// Owning park.
    pub park_id: String,
    /// Facility type.
    pub facility_type: FacilityType,
    /// Free-form field dimensions.
    pub dimensions: Option<String>,
    /// Playing surface (natural grass, synthetic, asphalt, ...).
    pub surface_type: String,
    /// Whether the field has lights.
    pub is_lighted: bool,
    /// Whether the facility is ADA accessible.
    pub is_accessible: bool,
    /// Field status as reported by the source.
    pub field_condition: String,
}

/// A trail row as written to the `Trail` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trail {
    /// Owning park.
    pub park_id: String,
    /// Trail name.
    pub trail_name: String,
    /// Trail width as reported by the source (free-form).
    pub width_ft: Option<String>,
    /// Trail surface (paved, dirt, gravel, ...).
    pub surface: String,
    /// Difficulty rating.
    pub difficulty: String,
    /// Whether trail markers are installed.
    pub has_trail_markers: bool,
}

/// A post-load distribution that can be reported after a run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Distribution {
    /// `Park` rows grouped by borough.
    ParkBorough,
    /// `Facility` rows grouped by facility type.
    FacilityType,
    /// `Trail` rows grouped by difficulty.
    TrailDifficulty,
    /// `Trail` rows grouped by surface, top 10 only.
    TrailSurface,
}

impl Distribution {
    /// Every distribution, in report order.
    pub const ALL: &[Self] = &[
        Self::ParkBorough,
        Self::FacilityType,
        Self::TrailDifficulty,
        Self::TrailSurface,
    ];

    /// Human-readable heading for summary output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ParkBorough => "Park borough statistics",
            Self::FacilityType => "Facility type statistics",
            Self::TrailDifficulty => "Trail difficulty statistics",
            Self::TrailSurface => "Trail surface statistics (top 10)",
        }
    }

    /// Maximum number of groups reported, if capped.
    #[must_use]
    pub const fn limit(self) -> Option<usize> {
        match self {
            Self::TrailSurface => Some(10),
            Self::ParkBorough | Self::FacilityType | Self::TrailDifficulty => None,
        }
    }
}

/// Row count for a single category value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Category value (`"Unknown"` for nulls).
    pub category: String,
    /// Number of rows.
    pub count: u64,
}
