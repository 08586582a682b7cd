//! Field normalization helpers shared by the three loaders.
//!
//! The source datasets encode "no value" several ways: an empty cell, a
//! whitespace-only cell, or the literal string `nan` left behind by an
//! earlier export step. [`present`] folds all of those into `None` and is
//! applied before any truncation or boolean coercion.

use crate::RowError;
use crate::source::RawRecord;

/// Allow-list for the `TRUE`/`FALSE` flag columns of the facilities dataset.
pub const FLAG_TRUE: &[&str] = &["TRUE"];

/// Allow-list for `TrailMarkersInstalled`, which mixes several encodings.
pub const MARKER_TRUE: &[&str] = &["TRUE", "YES", "1", "Y"];

/// Exclusive bound on a `DECIMAL(10, 2)` value once scaled to hundredths.
const SCALED_DECIMAL_LIMIT: f64 = 1e10;

/// Returns the trimmed value, or `None` if it is missing.
#[must_use]
pub fn present(value: Option<&str>) -> Option<&str> {
    let value = value?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(value)
    }
}

/// Whether `value` (trimmed, upper-cased) is in `allow_list`.
///
/// A missing value is `false`.
#[must_use]
pub fn is_truthy(value: Option<&str>, allow_list: &[&str]) -> bool {
    present(value).is_some_and(|v| {
        let upper = v.to_uppercase();
        allow_list.iter().any(|allowed| *allowed == upper)
    })
}

/// Truncates to at most `max_chars` characters.
#[must_use]
pub fn truncate(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

/// The first column in `columns` with a present value.
#[must_use]
pub fn first_present<'a>(record: &'a RawRecord, columns: &[&str]) -> Option<&'a str> {
    columns.iter().find_map(|column| record.get(column))
}

/// Parses a decimal column.
///
/// # Errors
///
/// Returns [`RowError::InvalidValue`] if the value is present but not a
/// finite number that fits the column.
pub fn parse_decimal(column: &'static str, value: Option<&str>) -> Result<Option<f64>, RowError> {
    let Some(value) = present(value) else {
        return Ok(None);
    };

    match value.replace(',', "").parse::<f64>() {
        // The column rounds to two places, so check the rounded value.
        Ok(n) if n.is_finite() && (n * 100.0).round().abs() < SCALED_DECIMAL_LIMIT => {
            Ok(Some(n))
        }
        _ => Err(RowError::InvalidValue {
            column,
            value: value.to_string(),
        }),
    }
}

/// First ZIP code of a comma-separated list.
#[must_use]
pub fn first_zipcode(value: Option<&str>, max_chars: usize) -> Option<String> {
    present(value)
        .and_then(|v| present(v.split(',').next()))
        .map(|zip| truncate(zip, max_chars))
}
