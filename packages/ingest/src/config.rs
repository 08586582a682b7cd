//! TOML configuration loading.
//!
//! Every key is optional:
//!
//! ```toml
//! database = "data/findmypark.duckdb"
//! data_dir = "data"
//! parks_file = "Parks_Properties.csv"
//! facilities_file = "Athletic_Facilities.csv"
//! trails_file = "Parks_Trails.csv"
//! progress_interval = 500
//! ```

use std::path::Path;

use findmypark_ingest_models::ImportConfig;

use crate::IngestError;

/// Loads the configuration file at `path`, or the defaults when `None`.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be read and
/// [`IngestError::Config`] if it is not valid TOML for [`ImportConfig`].
pub fn load_config(path: Option<&Path>) -> Result<ImportConfig, IngestError> {
    let Some(path) = path else {
        return Ok(ImportConfig::default());
    };

    let contents = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&contents)?;
    log::debug!("Loaded configuration from {}", path.display());

    Ok(config)
}

/// Parses a TOML configuration document.
///
/// # Errors
///
/// Returns [`IngestError::Config`] if the document is malformed.
pub fn parse_config(contents: &str) -> Result<ImportConfig, IngestError> {
    Ok(toml::from_str(contents)?)
}
