//! Diff engines for docdelta.
//!
//! Compares tree snapshots, text content, and keyed entity maps, producing
//! plain in-memory structures that a presentation layer can render.
//!
//! # Key Types
//!
//! - [`ComparisonResult`] -- Four-way partition of two tree snapshots
//! - [`TextDiffView`] / [`DiffRun`] / [`SideBySideRow`] -- Line-level text diff
//! - [`MapDiff`] / [`MapChange`] -- Generic keyed-collection diff

pub mod error;
pub mod map_diff;
pub mod text_diff;
pub mod tree_diff;

pub use error::{DiffError, DiffResult};
pub use map_diff::{diff_maps, diff_maps_by, MapChange, MapDiff};
pub use text_diff::{diff_text, DiffRun, NumberedLine, RunTag, SideBySideRow, TextDiffView, TextHunk};
pub use tree_diff::{compare_snapshots, ComparisonResult, ComparisonStats};
