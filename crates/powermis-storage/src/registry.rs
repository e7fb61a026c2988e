//! Registry of staged temporary files
//!
//! Every artifact written to temporary storage is registered here and
//! deleted once, when the process shuts down. Deletion failures are logged
//! and never abort the drain.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Outcome of [`TempArtifactRegistry::drain_all`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DrainReport {
    /// Files deleted
    pub removed: usize,
    /// Paths that no longer existed
    pub missing: usize,
    /// Paths whose deletion failed, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

impl DrainReport {
    /// Number of paths a deletion was attempted for
    pub fn attempted(&self) -> usize {
        self.removed + self.missing + self.failed.len()
    }
}

/// Process-wide set of staged file paths
#[derive(Debug, Default)]
pub struct TempArtifactRegistry {
    paths: Mutex<HashSet<PathBuf>>,
}

impl TempArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a path for deletion at shutdown.
    ///
    /// Returns `false` if the path was already tracked.
    pub fn register(&self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        debug!(path = %path.display(), "Registered temp artifact");
        self.paths.lock().insert(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.lock().contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.lock().is_empty()
    }

    /// Snapshot of the tracked paths
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().iter().cloned().collect()
    }

    /// Stop tracking `path` and delete it now.
    ///
    /// Returns `false` and leaves the file alone if the path was not tracked,
    /// for example because a drain already took it.
    pub fn discard(&self, path: &Path) -> bool {
        if !self.paths.lock().remove(path) {
            return false;
        }
        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "Discarded temp artifact"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to discard temp artifact"),
        }
        true
    }

    /// Delete every tracked path and empty the registry.
    ///
    /// Each path gets exactly one deletion attempt; a missing file or a
    /// failed deletion is logged and the drain moves on.
    pub fn drain_all(&self) -> DrainReport {
        let paths: Vec<PathBuf> = self.paths.lock().drain().collect();
        let mut report = DrainReport::default();

        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "Deleted temp artifact");
                    report.removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "Temp artifact already gone");
                    report.missing += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to delete temp artifact");
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        info!(
            removed = report.removed,
            missing = report.missing,
            failed = report.failed.len(),
            "Drained temp artifacts"
        );
        report
    }
}
