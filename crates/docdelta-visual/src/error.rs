//! Error types for the visual diff pipeline.

use docdelta_types::FailureKind;

/// Errors that abort the comparison of a document pair.
#[derive(Debug, thiserror::Error)]
pub enum VisualError {
    /// Page text could not be extracted.
    #[error("text extraction failed for {document}: {reason}")]
    Extract { document: String, reason: String },

    /// A page could not be rasterized.
    #[error("rendering page {page} of {document} failed: {reason}")]
    Render {
        document: String,
        page: usize,
        reason: String,
    },

    /// An external tool exceeded its time budget.
    #[error("{operation} on {document} timed out after {secs}s")]
    Timeout {
        document: String,
        operation: &'static str,
        secs: u64,
    },

    /// The composite image could not be encoded.
    #[error("failed to encode composite for page {page}: {source}")]
    Encode {
        page: usize,
        #[source]
        source: image::ImageError,
    },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

impl VisualError {
    /// The failure classification reported to dispatch callers.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Extract { .. } => FailureKind::ExtractFailure,
            Self::Render { .. } | Self::Encode { .. } | Self::WorkerPool(_) => {
                FailureKind::RenderFailure
            }
            Self::Timeout { .. } => FailureKind::Timeout,
        }
    }
}

/// Convenience alias for visual pipeline results.
pub type VisualResult<T> = Result<T, VisualError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kinds() {
        let extract = VisualError::Extract {
            document: "a.pdf".into(),
            reason: "broken xref".into(),
        };
        assert_eq!(extract.failure_kind(), FailureKind::ExtractFailure);

        let timeout = VisualError::Timeout {
            document: "a.pdf".into(),
            operation: "pdftoppm",
            secs: 5,
        };
        assert_eq!(timeout.failure_kind(), FailureKind::Timeout);
        assert_eq!(timeout.to_string(), "pdftoppm on a.pdf timed out after 5s");

        let render = VisualError::Render {
            document: "b.pdf".into(),
            page: 3,
            reason: "exit status 1".into(),
        };
        assert_eq!(render.failure_kind(), FailureKind::RenderFailure);
    }
}
