//! CSV source reading.
//!
//! Rows are read as raw byte records and decoded lossily, so a stray
//! non-UTF-8 byte in one cell never aborts a pass. Ragged rows are
//! accepted; cells past the header width are ignored and missing trailing
//! cells read as absent.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::IngestError;
use crate::normalize::present;

/// One source row keyed by (trimmed) header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based line number in the source file.
    pub line: u64,
    fields: BTreeMap<String, String>,
}

impl RawRecord {
    /// Builds a record from `(column, value)` pairs.
    #[must_use]
    pub fn from_pairs<K, V>(line: u64, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            line,
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The cell exactly as read, or `None` if the column is absent.
    #[must_use]
    pub fn raw(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// The trimmed cell, or `None` if it is missing (see [`present`]).
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        present(self.raw(column))
    }
}

/// Reads every row of the CSV file at `path`.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] if the file cannot be opened or a row
/// cannot be parsed.
pub fn read_csv(path: &Path) -> Result<Vec<RawRecord>, IngestError> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    read_rows(reader).map_err(|source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads every row from an in-memory or streaming CSV source.
///
/// # Errors
///
/// Returns [`csv::Error`] if a row cannot be parsed.
pub fn read_records<R: Read>(input: R) -> Result<Vec<RawRecord>, csv::Error> {
    read_rows(csv::ReaderBuilder::new().flexible(true).from_reader(input))
}

fn read_rows<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawRecord>, csv::Error> {
    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| {
            String::from_utf8_lossy(h)
                .trim_start_matches('\u{feff}')
                .trim()
                .to_string()
        })
        .collect();

    let mut records = Vec::new();
    for row in reader.byte_records() {
        let row = row?;
        let line = row.position().map_or(0, csv::Position::line);
        let fields = headers
            .iter()
            .zip(row.iter())
            .map(|(header, cell)| (header.clone(), String::from_utf8_lossy(cell).into_owned()))
            .collect();
        records.push(RawRecord { line, fields });
    }

    Ok(records)
}
