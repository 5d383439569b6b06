//! Error types for the dispatch crate.
//!
//! Per-file comparison failures never surface here; they are folded into
//! [`crate::DispatchOutcome::Failed`]. These errors abort a whole run.

use docdelta_scan::ScanError;
use docdelta_visual::VisualError;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// One of the trees could not be scanned.
    #[error("scan failed: {0}")]
    Scan(#[from] ScanError),

    /// The page pipeline could not be set up.
    #[error("visual pipeline setup failed: {0}")]
    Visual(#[from] VisualError),

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

/// Convenience alias for dispatch results.
pub type DispatchResult<T> = Result<T, DispatchError>;
