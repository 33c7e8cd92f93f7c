//! Document text layers.
//!
//! A [`TextLayer`] exposes what the extractors need from a document: page
//! count, page heights and the positioned glyphs of every page. Pages are
//! addressed by 0-based index.

#[cfg(any(test, feature = "testing"))]
pub mod builder;
mod extractor;
mod memory;

pub use extractor::PdfExtractor;
pub use memory::MemoryLayer;

use crate::error::PdfError;
use crate::layout::{group_lines, lines_to_text, CropRect, Glyph, GlyphIndex, TableDetector, TableGrid};
use crate::models::ExtractionConfig;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Glyphs and dimensions of one page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    pub glyphs: Vec<Glyph>,
}

impl Page {
    pub fn new(width: f64, height: f64, glyphs: Vec<Glyph>) -> Self {
        Self { width, height, glyphs }
    }
}

/// Read access to a document's positioned text.
pub trait TextLayer {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Page data by 0-based index.
    fn page(&self, page: usize) -> Result<&Page>;

    /// Height of a page in points.
    fn page_height(&self, page: usize) -> Result<f64> {
        Ok(self.page(page)?.height)
    }

    /// Glyphs of a page.
    fn glyphs(&self, page: usize) -> Result<&[Glyph]> {
        Ok(&self.page(page)?.glyphs)
    }

    /// Total number of glyphs across all pages.
    fn glyph_count(&self) -> usize {
        (0..self.page_count())
            .filter_map(|p| self.page(p).ok())
            .map(|p| p.glyphs.len())
            .sum()
    }

    /// Plain text inside a crop, lines top to bottom joined with `\n`.
    fn text_in(&self, page: usize, rect: CropRect, config: &ExtractionConfig) -> Result<String> {
        let glyphs = self.glyphs(page)?;
        let index = GlyphIndex::new(glyphs);
        let lines = group_lines(index.within(rect), config.line_merge_tolerance);
        Ok(lines_to_text(&lines, config.word_gap, "\n"))
    }

    /// Tables detected inside a crop.
    fn detect_tables(
        &self,
        page: usize,
        rect: CropRect,
        config: &ExtractionConfig,
    ) -> Result<Vec<TableGrid>> {
        let glyphs = self.glyphs(page)?;
        let index = GlyphIndex::new(glyphs);
        let detector = TableDetector::new(config.line_merge_tolerance, config.cell_gap);
        Ok(detector.detect(index.within(rect)))
    }
}
