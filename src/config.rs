use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Run-wide import settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Check station locations and district areas against the council boundary.
    pub validation_checks: bool,
    /// Locate stations that have no location at their postcode's centroid.
    pub use_postcode_centroids: bool,
    /// EPSG code of station geometry, and of district geometry unless the source overrides it.
    pub srid: u32,
    /// Directory holding one subdirectory of source files per council.
    pub data_root: Option<PathBuf>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            validation_checks: true,
            use_postcode_centroids: false,
            srid: 27700,
            data_root: None,
        }
    }
}

impl ImportOptions {
    /// Read options from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn with_data_root(mut self, data_root: impl Into<PathBuf>) -> Self {
        self.data_root = Some(data_root.into());
        self
    }

    pub fn without_checks(mut self) -> Self {
        self.validation_checks = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_keys_take_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"use_postcode_centroids": true, "data_root": "/data"}}"#).unwrap();

        let options = ImportOptions::from_json_file(file.path()).unwrap();
        assert!(options.validation_checks);
        assert!(options.use_postcode_centroids);
        assert_eq!(options.srid, 27700);
        assert_eq!(options.data_root, Some(PathBuf::from("/data")));
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let err = ImportOptions::from_json_file(Path::new("/nonexistent/options.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/options.json"));
    }
}
