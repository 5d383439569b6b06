//! The page-by-page comparison pipeline.

use std::sync::Arc;

use docdelta_types::{DiffConfig, RunId};
use image::RgbImage;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::annotate;
use crate::document::PagedDocument;
use crate::error::{VisualError, VisualResult};
use crate::pixel_diff::{diff_mask, DEFAULT_THRESHOLD};
use crate::raster::align_pair;
use crate::regions::external_regions;
use crate::report::{DiffReport, PageDiffResult};

/// Compares two paginated documents page by page.
///
/// Pages are processed in parallel on a bounded pool. Each worker renders
/// one page index of both documents, diffs, annotates, and encodes it, so
/// at most one page pair per worker is held in memory. Any extraction or
/// render failure fails the whole comparison.
pub struct PageDiffPipeline {
    dpi: u32,
    threshold: u8,
    pool: Arc<rayon::ThreadPool>,
}

impl std::fmt::Debug for PageDiffPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageDiffPipeline")
            .field("dpi", &self.dpi)
            .field("threshold", &self.threshold)
            .field("workers", &self.pool.current_num_threads())
            .finish()
    }
}

impl PageDiffPipeline {
    /// Create a pipeline with its own worker pool sized from `config`.
    pub fn new(config: &DiffConfig) -> VisualResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.effective_workers())
            .thread_name(|i| format!("docdelta-page-{i}"))
            .build()
            .map_err(|e| VisualError::WorkerPool(e.to_string()))?;
        Ok(Self::with_pool(config, Arc::new(pool)))
    }

    /// Create a pipeline that shares an existing pool.
    pub fn with_pool(config: &DiffConfig, pool: Arc<rayon::ThreadPool>) -> Self {
        Self {
            dpi: config.dpi,
            threshold: DEFAULT_THRESHOLD,
            pool,
        }
    }

    /// Compare `left` against `right`.
    ///
    /// Pages are aligned by index; the shorter document is padded with
    /// blank pages. Two empty documents yield an empty report.
    pub fn compare(
        &self,
        run_id: RunId,
        left: &dyn PagedDocument,
        right: &dyn PagedDocument,
    ) -> VisualResult<DiffReport> {
        let left_texts = left.page_texts()?;
        let right_texts = right.page_texts()?;
        let page_count = left_texts.len().max(right_texts.len());

        info!(
            run_id = %run_id,
            left = left.name(),
            right = right.name(),
            left_pages = left_texts.len(),
            right_pages = right_texts.len(),
            "comparing documents"
        );

        let mut report = DiffReport::new(run_id, left.name(), right.name());
        if page_count == 0 {
            return Ok(report);
        }

        let gate = text_gate(&left_texts, &right_texts);
        let sides = PageSides {
            left,
            right,
            left_pages: left_texts.len(),
            right_pages: right_texts.len(),
        };

        report.pages = self.pool.install(|| {
            gate.par_iter()
                .enumerate()
                .map(|(index, &text_changed)| self.diff_page(&sides, index, text_changed))
                .collect::<VisualResult<Vec<_>>>()
        })?;

        info!(
            run_id = %run_id,
            pages = report.pages.len(),
            changed = report.changed_pages().count(),
            "document comparison complete"
        );
        Ok(report)
    }

    fn diff_page(
        &self,
        sides: &PageSides<'_>,
        index: usize,
        text_changed: bool,
    ) -> VisualResult<PageDiffResult> {
        let left = sides.render_left(index, self.dpi)?;
        let right = sides.render_right(index, self.dpi)?;
        let Some((mut left, mut right)) = align_pair(left, right) else {
            return Err(VisualError::Render {
                document: sides.left.name().to_string(),
                page: index,
                reason: "page missing on both sides".into(),
            });
        };

        let mask = diff_mask(&left, &right, self.threshold);
        let regions = external_regions(&mask);

        annotate::outline_regions(&mut left, &regions);
        annotate::outline_regions(&mut right, &regions);
        if text_changed && regions.is_empty() {
            annotate::draw_text_change_border(&mut left);
            annotate::draw_text_change_border(&mut right);
        }

        let composite = annotate::side_by_side(
            &annotate::label(&left, sides.left.name()),
            &annotate::label(&right, sides.right.name()),
        );
        let composite = annotate::encode_png(&composite)
            .map_err(|source| VisualError::Encode { page: index, source })?;

        debug!(
            page = index,
            text_changed,
            regions = regions.len(),
            changed_pixels = mask.changed_pixels(),
            "page compared"
        );

        Ok(PageDiffResult {
            index,
            text_changed,
            regions,
            composite,
        })
    }
}

/// Both documents with their page counts.
struct PageSides<'a> {
    left: &'a dyn PagedDocument,
    right: &'a dyn PagedDocument,
    left_pages: usize,
    right_pages: usize,
}

impl PageSides<'_> {
    fn render_left(&self, index: usize, dpi: u32) -> VisualResult<Option<RgbImage>> {
        if index < self.left_pages {
            self.left.render_page(index, dpi).map(Some)
        } else {
            Ok(None)
        }
    }

    fn render_right(&self, index: usize, dpi: u32) -> VisualResult<Option<RgbImage>> {
        if index < self.right_pages {
            self.right.render_page(index, dpi).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Per-page text change flags over the longer document. A page missing on
/// one side compares as empty text; surrounding whitespace is ignored.
pub fn text_gate(left: &[String], right: &[String]) -> Vec<bool> {
    let count = left.len().max(right.len());
    (0..count)
        .map(|i| {
            let a = left.get(i).map_or("", |s| s.trim());
            let b = right.get(i).map_or("", |s| s.trim());
            a != b
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{BORDER_COLOR, LABEL_HEIGHT, REGION_COLOR};
    use crate::document::InMemoryDocument;
    use crate::report::DiffRegion;
    use image::Rgb;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn pipeline() -> PageDiffPipeline {
        let config = DiffConfig {
            worker_threads: Some(2),
            ..DiffConfig::default()
        };
        PageDiffPipeline::new(&config).unwrap()
    }

    fn white(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
    }

    fn with_rect(w: u32, h: u32, x: u32, y: u32, size: u32) -> RgbImage {
        let mut img = white(w, h);
        for yy in y..y + size {
            for xx in x..x + size {
                img.put_pixel(xx, yy, BLACK);
            }
        }
        img
    }

    fn three_pages(name: &str) -> InMemoryDocument {
        InMemoryDocument::new(name)
            .with_page("page one", with_rect(120, 120, 10, 10, 20))
            .with_page("page two", with_rect(120, 120, 40, 40, 20))
            .with_page("page three", with_rect(120, 120, 70, 70, 20))
    }

    fn decode(page: &PageDiffResult) -> RgbImage {
        image::load_from_memory(&page.composite).unwrap().to_rgb8()
    }

    /// Fails rendering one specific page.
    struct BrokenPage {
        inner: InMemoryDocument,
        broken: usize,
    }

    impl PagedDocument for BrokenPage {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn page_texts(&self) -> VisualResult<Vec<String>> {
            self.inner.page_texts()
        }

        fn render_page(&self, index: usize, dpi: u32) -> VisualResult<RgbImage> {
            if index == self.broken {
                return Err(VisualError::Render {
                    document: self.name().to_string(),
                    page: index,
                    reason: "corrupt content stream".into(),
                });
            }
            self.inner.render_page(index, dpi)
        }
    }

    #[test]
    fn document_against_itself_has_no_changes() {
        let doc = three_pages("same.pdf");
        let report = pipeline().compare(RunId::new(), &doc, &doc).unwrap();

        assert_eq!(report.pages.len(), 3);
        for page in &report.pages {
            assert!(!page.text_changed);
            assert!(page.regions.is_empty());
            assert!(!page.composite.is_empty());
        }
        assert!(report.is_unchanged());
    }

    #[test]
    fn missing_trailing_page_is_flagged() {
        let full = three_pages("full.pdf");
        let short = InMemoryDocument::new("short.pdf")
            .with_page("page one", with_rect(120, 120, 10, 10, 20))
            .with_page("page two", with_rect(120, 120, 40, 40, 20));

        let report = pipeline().compare(RunId::new(), &full, &short).unwrap();
        assert_eq!(report.pages.len(), 3);
        assert!(!report.pages[0].is_changed());
        assert!(!report.pages[1].is_changed());

        let last = &report.pages[2];
        assert_eq!(last.index, 2);
        assert!(last.text_changed);
        assert_eq!(last.regions, vec![DiffRegion::new(70, 70, 20, 20)]);

        // The filler side matches the present page's size.
        let composite = decode(last);
        assert_eq!(composite.dimensions(), (240, 120 + LABEL_HEIGHT));
    }

    #[test]
    fn moved_rectangle_is_one_region() {
        let left = InMemoryDocument::new("a.pdf").with_page("same", with_rect(240, 240, 20, 20, 80));
        let right = InMemoryDocument::new("b.pdf").with_page("same", with_rect(240, 240, 70, 70, 80));

        let report = pipeline().compare(RunId::new(), &left, &right).unwrap();
        let page = &report.pages[0];
        assert!(!page.text_changed);
        assert_eq!(page.regions, vec![DiffRegion::new(20, 20, 130, 130)]);

        let composite = decode(page);
        assert_eq!(*composite.get_pixel(20, 20 + LABEL_HEIGHT), REGION_COLOR);
        assert_eq!(*composite.get_pixel(240 + 20, 20 + LABEL_HEIGHT), REGION_COLOR);
    }

    #[test]
    fn text_only_change_draws_border() {
        let left = InMemoryDocument::new("a.pdf").with_page("total: 10", white(100, 100));
        let right = InMemoryDocument::new("b.pdf").with_page("total: 11", white(100, 100));

        let report = pipeline().compare(RunId::new(), &left, &right).unwrap();
        let page = &report.pages[0];
        assert!(page.text_changed);
        assert!(page.regions.is_empty());
        assert!(page.is_changed());

        let composite = decode(page);
        assert_eq!(*composite.get_pixel(10, 10 + LABEL_HEIGHT), BORDER_COLOR);
        assert_eq!(*composite.get_pixel(100 + 10, 10 + LABEL_HEIGHT), BORDER_COLOR);
    }

    #[test]
    fn whitespace_only_text_change_is_ignored() {
        let left = InMemoryDocument::new("a.pdf").with_page("body\n", white(50, 50));
        let right = InMemoryDocument::new("b.pdf").with_page("  body  ", white(50, 50));
        let report = pipeline().compare(RunId::new(), &left, &right).unwrap();
        assert!(report.is_unchanged());
    }

    #[test]
    fn empty_documents_yield_empty_report() {
        let left = InMemoryDocument::new("a.pdf");
        let right = InMemoryDocument::new("b.pdf");
        let run_id = RunId::new();
        let report = pipeline().compare(run_id, &left, &right).unwrap();

        assert!(report.pages.is_empty());
        assert_eq!(report.run_id, run_id);
        assert!(report.into_outcome().is_unchanged());
    }

    #[test]
    fn unequal_page_sizes_pad_top_left() {
        let left = InMemoryDocument::new("a.pdf").with_page("p", white(100, 100));
        let right = InMemoryDocument::new("b.pdf").with_page("p", white(120, 80));

        let report = pipeline().compare(RunId::new(), &left, &right).unwrap();
        let page = &report.pages[0];
        assert!(page.regions.is_empty());
        assert_eq!(decode(page).dimensions(), (240, 100 + LABEL_HEIGHT));
    }

    #[test]
    fn render_failure_fails_the_whole_pair() {
        let broken = BrokenPage {
            inner: three_pages("broken.pdf"),
            broken: 1,
        };
        let good = three_pages("good.pdf");

        let err = pipeline().compare(RunId::new(), &good, &broken).unwrap_err();
        assert!(matches!(err, VisualError::Render { page: 1, .. }));
    }

    #[test]
    fn text_gate_treats_missing_pages_as_empty() {
        let a = vec!["x".to_string(), "  ".to_string()];
        let b = vec!["x".to_string()];
        assert_eq!(text_gate(&a, &b), vec![false, false]);

        let c = vec!["x".to_string(), "more".to_string()];
        assert_eq!(text_gate(&c, &b), vec![false, true]);
    }
}
