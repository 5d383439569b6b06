//! The paginated-document seam.

use image::RgbImage;

use crate::error::{VisualError, VisualResult};

/// A document that can be read page by page.
///
/// `page_texts` returns one entry per page, so its length is the page
/// count. `render_page` must be callable concurrently for different pages.
pub trait PagedDocument: Send + Sync {
    /// Display name, used in composite labels and logs.
    fn name(&self) -> &str;

    /// Extracted text of every page, in page order.
    fn page_texts(&self) -> VisualResult<Vec<String>>;

    /// Rasterize one page (0-based) at `dpi`.
    fn render_page(&self, index: usize, dpi: u32) -> VisualResult<RgbImage>;
}

/// A document held entirely in memory.
///
/// Pages are pre-rendered, so `dpi` is ignored. Useful for callers that
/// already have page rasters and for exercising the pipeline without
/// external tools.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDocument {
    name: String,
    pages: Vec<(String, RgbImage)>,
}

impl InMemoryDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pages: Vec::new(),
        }
    }

    /// Append a page.
    pub fn with_page(mut self, text: impl Into<String>, image: RgbImage) -> Self {
        self.pages.push((text.into(), image));
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl PagedDocument for InMemoryDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_texts(&self) -> VisualResult<Vec<String>> {
        Ok(self.pages.iter().map(|(text, _)| text.clone()).collect())
    }

    fn render_page(&self, index: usize, _dpi: u32) -> VisualResult<RgbImage> {
        self.pages
            .get(index)
            .map(|(_, image)| image.clone())
            .ok_or_else(|| VisualError::Render {
                document: self.name.clone(),
                page: index,
                reason: format!("page out of range ({} pages)", self.pages.len()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_pages() {
        let doc = InMemoryDocument::new("mem")
            .with_page("one", RgbImage::new(2, 2))
            .with_page("two", RgbImage::new(3, 3));

        assert_eq!(doc.name(), "mem");
        assert_eq!(doc.page_texts().unwrap(), vec!["one", "two"]);
        assert_eq!(doc.render_page(1, 200).unwrap().dimensions(), (3, 3));
        assert!(matches!(
            doc.render_page(2, 200),
            Err(VisualError::Render { page: 2, .. })
        ));
    }
}
