use std::{path::{Path, PathBuf}, sync::LazyLock};

use anyhow::{bail, Context, Result};
use log::debug;
use regex::Regex;

static DATED_DIR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex is valid"));

/// Directory a council's source files are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLocation {
    dir: Option<PathBuf>,
}

impl DataLocation {
    /// Source paths are used as given.
    pub fn unrooted() -> Self { Self { dir: None } }

    /// `<root>/<council_id>`, or its most recent `YYYY-MM-DD` subdirectory if it has any.
    pub fn resolve(root: &Path, council_id: &str) -> Result<Self> {
        let dir = root.join(council_id);
        if !dir.is_dir() {
            bail!("[location] no data directory for {council_id} at {}", dir.display());
        }

        let latest = std::fs::read_dir(&dir)
            .with_context(|| format!("[location] failed to list {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| DATED_DIR.is_match(name))
            .max();

        let dir = match latest {
            Some(date) => {
                debug!("[location] using {date} snapshot for {council_id}");
                dir.join(date)
            }
            None => dir,
        };
        Ok(Self { dir: Some(dir) })
    }

    #[inline] pub fn dir(&self) -> Option<&Path> { self.dir.as_deref() }

    /// Full path of a source file. Absolute paths are kept.
    pub fn path(&self, file: &Path) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.join(file),
            None => file.to_path_buf(),
        }
    }
}
