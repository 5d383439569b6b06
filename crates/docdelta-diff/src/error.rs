//! Error types for the diff crate.

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DiffError {
    /// One side could not be decoded as UTF-8 text.
    #[error("{side} input is not valid UTF-8 (invalid byte at offset {offset})")]
    Decode { side: &'static str, offset: usize },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
