//! On-disk snapshots of the rate cache.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use travelfx_core::currency::{RateCache, RateCacheEntry};

use crate::error::RatesError;

/// Saves and loads rate cache entries as a JSON file.
///
/// Entries keep their original expiry, so a table restored after it expired
/// is only used as a stale fallback when the provider is unreachable.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads saved entries. A missing file is an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RatesError::SnapshotIo` if the file cannot be read and
    /// `RatesError::SnapshotFormat` if it is not a valid snapshot.
    pub fn load(&self) -> Result<Vec<RateCacheEntry>, RatesError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No rate snapshot found");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(RatesError::SnapshotIo {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| RatesError::SnapshotFormat {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes `entries`, replacing any previous snapshot.
    ///
    /// The file is written next to its final location and renamed into
    /// place, so readers never see a partial snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RatesError::SnapshotIo` if the file cannot be written.
    pub fn save(&self, entries: &[RateCacheEntry]) -> Result<(), RatesError> {
        let io_err = |source| RatesError::SnapshotIo {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_vec_pretty(entries).map_err(|source| {
            RatesError::SnapshotFormat {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;

        debug!(path = %self.path.display(), entries = entries.len(), "Saved rate snapshot");
        Ok(())
    }

    /// Seeds `cache` from the snapshot and returns how many entries were read.
    ///
    /// # Errors
    ///
    /// Same as [`SnapshotStore::load`].
    pub fn restore_into(&self, cache: &RateCache) -> Result<usize, RatesError> {
        let entries = self.load()?;
        let count = entries.len();
        cache.restore(entries);
        if count > 0 {
            info!(path = %self.path.display(), entries = count, "Restored rate snapshot");
        }
        Ok(count)
    }

    /// Saves every entry currently in `cache`.
    ///
    /// # Errors
    ///
    /// Same as [`SnapshotStore::save`].
    pub fn persist_from(&self, cache: &RateCache) -> Result<usize, RatesError> {
        let entries = cache.entries();
        self.save(&entries)?;
        Ok(entries.len())
    }
}
