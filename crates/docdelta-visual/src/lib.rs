//! Page-level visual diff for paginated documents.
//!
//! Two documents are compared page by page (aligned by index). A cheap text
//! comparison flags pages whose extracted text changed; every page pair is
//! then rasterized, pixel-differenced, and annotated into a side-by-side
//! composite image.
//!
//! # Pipeline
//!
//! 1. Extract per-page text from both documents.
//! 2. Gate: mark pages whose trimmed text differs.
//! 3. Render each page index of both documents.
//! 4. Align sizes (white filler for missing pages, top-left padding).
//! 5. Threshold the grayscale difference and collect external regions.
//! 6. Outline regions, or draw a border on text-only changes.
//! 7. Label and concatenate both sides, encode as PNG.
//!
//! Document access sits behind the [`PagedDocument`] trait;
//! [`PopplerDocument`] implements it with the poppler command-line tools.

pub mod annotate;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod pixel_diff;
pub mod poppler;
pub mod raster;
pub mod regions;
pub mod report;

pub use document::{InMemoryDocument, PagedDocument};
pub use error::{VisualError, VisualResult};
pub use pipeline::PageDiffPipeline;
pub use pixel_diff::{diff_mask, DiffMask, DEFAULT_THRESHOLD};
pub use poppler::PopplerDocument;
pub use regions::external_regions;
pub use report::{DiffRegion, DiffReport, PageDiffResult};
