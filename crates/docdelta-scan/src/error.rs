//! Error types for the scan crate.

use std::path::PathBuf;

/// Errors that abort a scan.
///
/// Per-file read failures do not appear here: they are recorded on the
/// file's [`crate::FileRecord`] and the scan continues.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The scan root does not exist.
    #[error("scan root not found: {0}")]
    RootNotFound(PathBuf),

    /// The scan root exists but its metadata could not be read.
    #[error("cannot stat scan root {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

/// Convenience alias for scan results.
pub type ScanResult<T> = Result<T, ScanError>;
