use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of why a comparison unit failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No strategy exists for this content type.
    UnsupportedType,
    /// Content could not be decoded (e.g. invalid UTF-8 in a text file).
    DecodeFailure,
    /// The two sides do not share a content class or schema.
    SchemaMismatch,
    /// A page could not be rasterized.
    RenderFailure,
    /// Text or structure could not be extracted from a document.
    ExtractFailure,
    /// A file could not be read while hashing.
    HashFailure,
    /// A unit of work exceeded its time budget.
    Timeout,
}

impl FailureKind {
    /// Stable snake_case name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedType => "unsupported_type",
            Self::DecodeFailure => "decode_failure",
            Self::SchemaMismatch => "schema_mismatch",
            Self::RenderFailure => "render_failure",
            Self::ExtractFailure => "extract_failure",
            Self::HashFailure => "hash_failure",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed comparison: a kind plus a human-readable reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl DiffFailure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DiffFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.reason)
    }
}

/// The outcome of running one comparison strategy on one pair of inputs.
///
/// Every strategy result is normalized into exactly one of these three
/// shapes before it leaves the dispatcher.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DiffOutcome<T> {
    /// The inputs differ; the artifact describes how.
    Changed(T),
    /// The inputs were compared successfully and no difference was found.
    Unchanged,
    /// The comparison could not be completed.
    Failed(DiffFailure),
}

impl<T> DiffOutcome<T> {
    /// Shorthand for a failed outcome.
    pub fn failed(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self::Failed(DiffFailure::new(kind, reason))
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The failure, if this outcome is `Failed`.
    pub fn failure(&self) -> Option<&DiffFailure> {
        match self {
            Self::Failed(f) => Some(f),
            _ => None,
        }
    }

    /// The artifact, if this outcome is `Changed`.
    pub fn artifact(&self) -> Option<&T> {
        match self {
            Self::Changed(a) => Some(a),
            _ => None,
        }
    }

    /// Transform the artifact, keeping the other variants intact.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DiffOutcome<U> {
        match self {
            Self::Changed(a) => DiffOutcome::Changed(f(a)),
            Self::Unchanged => DiffOutcome::Unchanged,
            Self::Failed(e) => DiffOutcome::Failed(e),
        }
    }
}
