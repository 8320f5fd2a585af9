//! Rates crate error types.

use std::path::PathBuf;

use thiserror::Error;
use travelfx_shared::AppError;

/// Errors raised while setting up the provider client or handling snapshots.
///
/// Failures of an individual fetch are reported as
/// [`travelfx_core::currency::RateSourceError`] instead.
#[derive(Debug, Error)]
pub enum RatesError {
    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// Snapshot file could not be read or written.
    #[error("Snapshot I/O failed for {path}: {source}")]
    SnapshotIo {
        /// Snapshot location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file exists but does not hold valid cache entries.
    #[error("Snapshot {path} is corrupt: {source}")]
    SnapshotFormat {
        /// Snapshot location.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl From<RatesError> for AppError {
    fn from(err: RatesError) -> Self {
        match err {
            RatesError::Client(_) => Self::Config(err.to_string()),
            RatesError::SnapshotIo { .. } | RatesError::SnapshotFormat { .. } => {
                Self::Internal(err.to_string())
            }
        }
    }
}
