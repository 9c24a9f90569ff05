//! Data validation utilities.
//!
//! A data directory holds three RON files: `items.ron`, `global.ron` and
//! `zone_settings.ron`. Loading parses each one, then validates the tables
//! and the references between them.

use std::path::Path;

use aetheria_core::context::SimulationContext;
use aetheria_core::data::{GlobalData, ItemDatabase, ZoneSettings};
use aetheria_core::error::SimError;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Item database file name.
pub const ITEMS_FILE: &str = "items.ron";
/// Global tuning file name.
pub const GLOBAL_FILE: &str = "global.ron";
/// Zone generation settings file name.
pub const ZONE_SETTINGS_FILE: &str = "zone_settings.ron";

/// Errors that can occur while loading a data directory.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// Failed to read file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        /// Path to the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse RON file.
    #[error("Failed to parse RON file '{path}': {source}")]
    ParseError {
        /// Path to the file.
        path: String,
        /// Underlying parse error.
        #[source]
        source: ron::error::SpannedError,
    },

    /// The item database was rejected.
    #[error("Invalid item database '{path}': {source}")]
    ItemDatabase {
        /// Path to the file.
        path: String,
        /// Underlying error.
        #[source]
        source: SimError,
    },

    /// Cross-file validation failed.
    #[error("Validation failed: {errors:?}")]
    ValidationError {
        /// Every problem found.
        errors: Vec<String>,
    },
}

/// Result type for data loading operations.
pub type DataLoadResult<T> = Result<T, DataLoadError>;

fn read_file(path: &Path) -> DataLoadResult<String> {
    std::fs::read_to_string(path).map_err(|e| DataLoadError::IoError {
        path: path.display().to_string(),
        source: e,
    })
}

fn parse_file<T: DeserializeOwned>(path: &Path) -> DataLoadResult<T> {
    let contents = read_file(path)?;
    ron::from_str(&contents).map_err(|e| DataLoadError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load and validate the three data files in `dir`.
///
/// # Errors
///
/// Returns the first file that cannot be read or parsed, or every
/// validation problem found across the files.
pub fn load_context(dir: &Path) -> DataLoadResult<SimulationContext> {
    let items_path = dir.join(ITEMS_FILE);
    let items = ItemDatabase::from_ron(&read_file(&items_path)?).map_err(|e| {
        DataLoadError::ItemDatabase {
            path: items_path.display().to_string(),
            source: e,
        }
    })?;
    let global: GlobalData = parse_file(&dir.join(GLOBAL_FILE))?;
    let zone_settings: ZoneSettings = parse_file(&dir.join(ZONE_SETTINGS_FILE))?;

    let context = SimulationContext::new(items)
        .with_global(global)
        .with_zone_settings(zone_settings);
    match context.validate() {
        Ok(()) => {}
        Err(SimError::ValidationFailed(errors)) => {
            return Err(DataLoadError::ValidationError { errors })
        }
        Err(other) => return Err(DataLoadError::ValidationError { errors: vec![other.to_string()] }),
    }

    tracing::info!(
        "Loaded {} items and {} blueprints from {}",
        context.items.len(),
        context.items.blueprint_count(),
        dir.display()
    );
    Ok(context)
}

/// Validate all RON data files in a directory.
///
/// # Errors
///
/// Returns an error if any data file fails to load or validate.
pub fn validate_data_directory(path: &Path) -> DataLoadResult<()> {
    load_context(path).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aetheria_test_utils::fixtures::{GLOBAL_RON, ITEMS_RON, ZONE_SETTINGS_RON};
    use std::path::PathBuf;

    fn shipped_data() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/data")
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aetheria_tools_{name}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_shipped_data_is_valid() {
        let ctx = load_context(&shipped_data()).unwrap();
        assert!(!ctx.items.is_empty());
        assert!(validate_data_directory(&shipped_data()).is_ok());
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let err = validate_data_directory(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, DataLoadError::IoError { .. }));
    }

    #[test]
    fn test_bad_global_file_is_parse_error() {
        let dir = scratch_dir("bad_global");
        std::fs::write(dir.join(ITEMS_FILE), ITEMS_RON).unwrap();
        std::fs::write(dir.join(GLOBAL_FILE), "(docking_distance: \"far\")").unwrap();
        std::fs::write(dir.join(ZONE_SETTINGS_FILE), ZONE_SETTINGS_RON).unwrap();

        let err = load_context(&dir).unwrap_err();
        match err {
            DataLoadError::ParseError { path, .. } => assert!(path.ends_with(GLOBAL_FILE)),
            other => panic!("unexpected error: {other}"),
        }
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_unknown_station_hull_fails_validation() {
        let dir = scratch_dir("bad_station");
        std::fs::write(dir.join(ITEMS_FILE), ITEMS_RON).unwrap();
        std::fs::write(dir.join(GLOBAL_FILE), GLOBAL_RON).unwrap();
        std::fs::write(dir.join(ZONE_SETTINGS_FILE), "(station_hull: Some(999))").unwrap();

        let err = load_context(&dir).unwrap_err();
        assert!(matches!(err, DataLoadError::ValidationError { .. }), "{err}");
        std::fs::remove_dir_all(dir).unwrap();
    }
}
