//! Positioned glyph extraction using pdf-extract.

use std::panic::{catch_unwind, AssertUnwindSafe};

use pdf_extract::{output_doc, Document, MediaBox, OutputDev, OutputError, Transform};
use tracing::{debug, trace, warn};

use super::{Page, Result, TextLayer};
use crate::error::PdfError;
use crate::layout::Glyph;
use crate::models::LimitsConfig;

/// Text layer of a parsed PDF.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor {
    pages: Vec<Page>,
}

impl PdfExtractor {
    /// Load a PDF from bytes without resource limits.
    pub fn load(data: &[u8]) -> Result<Self> {
        let unlimited = LimitsConfig {
            max_pages: 0,
            max_glyphs: 0,
            ..LimitsConfig::default()
        };
        Self::load_with_limits(data, &unlimited)
    }

    /// Load a PDF from bytes, rejecting documents that exceed `limits`.
    pub fn load_with_limits(data: &[u8], limits: &LimitsConfig) -> Result<Self> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }
        if limits.max_pages > 0 && page_count > limits.max_pages {
            return Err(PdfError::TooManyPages {
                pages: page_count,
                limit: limits.max_pages,
            });
        }

        let mut collector = GlyphCollector::new(limits.max_glyphs);

        // The font decoders may panic on malformed font programs
        let outcome = catch_unwind(AssertUnwindSafe(|| output_doc(&doc, &mut collector)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(_)) if collector.limit_hit => {
                return Err(PdfError::TooManyGlyphs {
                    limit: limits.max_glyphs,
                });
            }
            Ok(Err(e)) => return Err(PdfError::TextExtraction(e.to_string())),
            Err(_) => {
                warn!("pdf-extract panicked while walking the text layer");
                return Err(PdfError::TextExtraction(
                    "text layer decoder panicked".to_string(),
                ));
            }
        }

        debug!(
            "Loaded PDF with {} pages, {} glyphs",
            collector.pages.len(),
            collector.total
        );
        Ok(Self {
            pages: collector.pages,
        })
    }
}

impl TextLayer for PdfExtractor {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, page: usize) -> Result<&Page> {
        self.pages.get(page).ok_or(PdfError::InvalidPage(page))
    }
}

/// Records every decoded character with its page position.
struct GlyphCollector {
    pages: Vec<Page>,
    origin: (f64, f64),
    total: usize,
    max_glyphs: usize,
    limit_hit: bool,
}

impl GlyphCollector {
    fn new(max_glyphs: usize) -> Self {
        Self {
            pages: Vec::new(),
            origin: (0.0, 0.0),
            total: 0,
            max_glyphs,
            limit_hit: false,
        }
    }
}

impl OutputDev for GlyphCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> std::result::Result<(), OutputError> {
        let width = media_box.urx - media_box.llx;
        let height = media_box.ury - media_box.lly;
        trace!("Page {}: {:.1}x{:.1}", page_num, width, height);
        self.origin = (media_box.llx, media_box.lly);
        self.pages.push(Page::new(width, height, Vec::new()));
        Ok(())
    }

    fn end_page(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> std::result::Result<(), OutputError> {
        if char.trim().is_empty() {
            return Ok(());
        }
        if self.max_glyphs > 0 && self.total >= self.max_glyphs {
            self.limit_hit = true;
            return Err(OutputError::IoError(std::io::Error::other(
                "glyph limit exceeded",
            )));
        }

        // Font size scaled by the text rendering matrix
        let sx = font_size * (trm.m11 + trm.m21);
        let sy = font_size * (trm.m12 + trm.m22);
        let scaled_size = (sx * sy).abs().sqrt();

        let glyph = Glyph::new(char, trm.m31 - self.origin.0, trm.m32 - self.origin.1)
            .with_width(width * scaled_size);

        if let Some(page) = self.pages.last_mut() {
            page.glyphs.push(glyph);
            self.total += 1;
        }
        Ok(())
    }

    fn begin_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::builder::PdfBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            PdfExtractor::load(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_glyph_positions() {
        let bytes = PdfBuilder::new()
            .page(595, 842)
            .text(72, 700, "PO 123")
            .build()
            .unwrap();
        let layer = PdfExtractor::load(&bytes).unwrap();

        assert_eq!(layer.page_count(), 1);
        assert_eq!(layer.page_height(0).unwrap(), 842.0);

        let glyphs = layer.glyphs(0).unwrap();
        assert_eq!(glyphs.len(), 5);
        assert_eq!(glyphs[0].text, "P");
        assert!((glyphs[0].x - 72.0).abs() < 0.01);
        assert!((glyphs[0].y - 700.0).abs() < 0.01);
        assert!(glyphs[0].width > 0.0);
        assert!(glyphs[1].x > glyphs[0].x);
    }

    #[test]
    fn test_page_limit() {
        let bytes = PdfBuilder::new()
            .page(595, 842)
            .text(72, 700, "one")
            .page(595, 842)
            .text(72, 700, "two")
            .build()
            .unwrap();
        let limits = LimitsConfig {
            max_pages: 1,
            ..LimitsConfig::default()
        };
        assert!(matches!(
            PdfExtractor::load_with_limits(&bytes, &limits),
            Err(PdfError::TooManyPages { pages: 2, limit: 1 })
        ));
    }

    #[test]
    fn test_glyph_limit() {
        let bytes = PdfBuilder::new()
            .page(595, 842)
            .text(72, 700, "ABCDEFGH")
            .build()
            .unwrap();
        let limits = LimitsConfig {
            max_glyphs: 4,
            ..LimitsConfig::default()
        };
        assert!(matches!(
            PdfExtractor::load_with_limits(&bytes, &limits),
            Err(PdfError::TooManyGlyphs { limit: 4 })
        ));
    }
}
