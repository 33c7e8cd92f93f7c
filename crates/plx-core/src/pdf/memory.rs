//! In-memory text layer.

use super::{Page, Result, TextLayer};
use crate::error::PdfError;
use crate::layout::Glyph;

/// Text layer built from glyphs supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct MemoryLayer {
    pages: Vec<Page>,
}

impl MemoryLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page.
    pub fn with_page(mut self, width: f64, height: f64, glyphs: Vec<Glyph>) -> Self {
        self.pages.push(Page::new(width, height, glyphs));
        self
    }

    pub fn from_pages(pages: Vec<Page>) -> Self {
        Self { pages }
    }
}

impl TextLayer for MemoryLayer {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, page: usize) -> Result<&Page> {
        self.pages.get(page).ok_or(PdfError::InvalidPage(page))
    }
}
