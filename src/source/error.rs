use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while opening or parsing a source file. All are fatal to an import run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    /// The declared file type tag is not one the importer can read.
    #[error("unsupported file type: {0:?}")]
    UnsupportedFileType(String),
    /// The file was readable but its structure is not what the format requires.
    #[error("malformed source {path:?}: {reason}")]
    MalformedSource { path: PathBuf, reason: String },
    #[error("failed to read {path:?}: {source}")]
    Io { source: io::Error, path: PathBuf },
    #[error("failed to parse delimited text {path:?}: {source}")]
    Csv { source: polars::prelude::PolarsError, path: PathBuf },
    #[error("failed to parse JSON {path:?}: {source}")]
    Json { source: serde_json::Error, path: PathBuf },
    #[error("failed to read shapefile {path:?}: {source}")]
    Shapefile { source: shapefile::Error, path: PathBuf },
    #[error("failed to read archive {path:?}: {source}")]
    Zip { source: zip::result::ZipError, path: PathBuf },
    #[error("failed to parse KML {path:?}: {source}")]
    Kml { source: quick_xml::Error, path: PathBuf },
    /// The file is not valid in its declared text encoding.
    #[error("cannot decode {path:?} as {encoding}")]
    Encoding { encoding: String, path: PathBuf },
}

impl SourceError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedSource { path: path.into(), reason: reason.into() }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { source, path }
    }
}
