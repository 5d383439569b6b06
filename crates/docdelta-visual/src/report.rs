//! Output types of the visual diff pipeline.

use chrono::{DateTime, Utc};
use docdelta_types::{DiffOutcome, RunId};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box of one changed area, in page pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiffRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DiffRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Result for one page index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageDiffResult {
    /// 0-based page index.
    pub index: usize,
    /// Trimmed page text differs between the two sides.
    pub text_changed: bool,
    /// Changed areas, top-to-bottom then left-to-right.
    pub regions: Vec<DiffRegion>,
    /// PNG-encoded side-by-side composite. Not serialized; presentation
    /// layers write it out separately.
    #[serde(skip)]
    pub composite: Vec<u8>,
}

impl PageDiffResult {
    /// Returns `true` if this page has any text or pixel change.
    pub fn is_changed(&self) -> bool {
        self.text_changed || !self.regions.is_empty()
    }
}

/// Result of comparing two paginated documents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    pub left_name: String,
    pub right_name: String,
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub pages: Vec<PageDiffResult>,
}

impl DiffReport {
    /// An empty report stamped with the current time.
    pub fn new(run_id: RunId, left_name: impl Into<String>, right_name: impl Into<String>) -> Self {
        Self {
            left_name: left_name.into(),
            right_name: right_name.into(),
            run_id,
            generated_at: Utc::now(),
            pages: Vec::new(),
        }
    }

    pub fn changed_pages(&self) -> impl Iterator<Item = &PageDiffResult> {
        self.pages.iter().filter(|p| p.is_changed())
    }

    /// Returns `true` if no page changed. An empty report is unchanged.
    pub fn is_unchanged(&self) -> bool {
        self.changed_pages().next().is_none()
    }

    /// Normalize into the tri-state comparison outcome.
    pub fn into_outcome(self) -> DiffOutcome<DiffReport> {
        if self.is_unchanged() {
            DiffOutcome::Unchanged
        } else {
            DiffOutcome::Changed(self)
        }
    }
}
