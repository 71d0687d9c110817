//! Hidden per-job scratch directory next to the destination
//!
//! Living in the destination's directory keeps the final rename on one
//! filesystem. The directory and everything in it is removed when the
//! workspace is dropped, on every exit path.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Temporary directory owned by one job
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    extension: String,
}

impl Workspace {
    /// Create a workspace beside `output`, named `<prefix><random>`.
    /// Missing parent directories of `output` are created.
    pub fn create(output: &Path, prefix: &str) -> std::io::Result<Self> {
        let parent = parent_dir(output);
        fs::create_dir_all(&parent)?;
        let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(&parent)?;
        let extension = output
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "mp4".to_string());
        debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir, extension })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the `index`-th extracted segment
    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.dir
            .path()
            .join(format!("segment_{:04}.{}", index, self.extension))
    }

    /// Concatenated output before metadata is applied
    pub fn joined_path(&self) -> PathBuf {
        self.dir.path().join(format!("joined.{}", self.extension))
    }

    /// Final candidate that gets renamed onto the destination
    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join(format!("output.{}", self.extension))
    }

    /// Remove the directory now and report failures instead of ignoring them
    pub fn close(self) -> std::io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!("Removed workspace {}", path.display());
        Ok(())
    }
}

/// Directory that will hold `output`
pub fn parent_dir(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Delete workspaces left behind by crashed runs in `dir`.
/// Returns the number of directories removed.
pub fn sweep_stale(dir: &Path, prefix: &str, max_age: Duration) -> usize {
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_dir() || !entry.file_name().to_string_lossy().starts_with(prefix) {
            continue;
        }
        let age = entry
            .metadata()
            .ok()
            .and_then(|meta| meta.modified().ok())
            .and_then(|modified| now.duration_since(modified).ok());
        match age {
            Some(age) if age >= max_age => match fs::remove_dir_all(entry.path()) {
                Ok(()) => {
                    info!("Removed stale workspace {}", entry.path().display());
                    removed += 1;
                }
                Err(e) => warn!(
                    "Could not remove stale workspace {}: {}",
                    entry.path().display(),
                    e
                ),
            },
            _ => {}
        }
    }
    removed
}
