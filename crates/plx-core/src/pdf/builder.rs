//! Minimal PDF writer for tests: Helvetica text at fixed positions.

use pdf_extract::content::{Content, Operation};
use pdf_extract::{Dictionary, Document, Object, Stream};

use crate::error::PdfError;

const FONT_SIZE: i64 = 10;

#[derive(Debug, Clone)]
struct PendingPage {
    width: i64,
    height: i64,
    texts: Vec<(i64, i64, String)>,
}

/// Builds single-font text PDFs.
#[derive(Debug, Clone, Default)]
pub struct PdfBuilder {
    pages: Vec<PendingPage>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new page.
    pub fn page(mut self, width: i64, height: i64) -> Self {
        self.pages.push(PendingPage {
            width,
            height,
            texts: Vec::new(),
        });
        self
    }

    /// Draw `text` with its baseline starting at `(x, y)` on the current page.
    pub fn text(mut self, x: i64, y: i64, text: &str) -> Self {
        if self.pages.is_empty() {
            self = self.page(595, 842);
        }
        if let Some(page) = self.pages.last_mut() {
            page.texts.push((x, y, text.to_string()));
        }
        self
    }

    /// Serialize the document.
    pub fn build(self) -> Result<Vec<u8>, PdfError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut font = Dictionary::new();
        font.set("Type", Object::Name(b"Font".to_vec()));
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
        font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        let font_id = doc.add_object(Object::Dictionary(font));

        let mut fonts = Dictionary::new();
        fonts.set("F1", Object::Reference(font_id));
        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(fonts));
        let resources_id = doc.add_object(Object::Dictionary(resources));

        let mut kids = Vec::with_capacity(self.pages.len());
        for pending in &self.pages {
            let mut operations = Vec::new();
            for (x, y, text) in &pending.texts {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(FONT_SIZE)],
                ));
                operations.push(Operation::new(
                    "Td",
                    vec![Object::Integer(*x), Object::Integer(*y)],
                ));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(text.as_str())],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations }
                .encode()
                .map_err(|e| PdfError::Parse(e.to_string()))?;
            let content_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), content)));

            let mut page = Dictionary::new();
            page.set("Type", Object::Name(b"Page".to_vec()));
            page.set("Parent", Object::Reference(pages_id));
            page.set("Contents", Object::Reference(content_id));
            page.set("Resources", Object::Reference(resources_id));
            page.set(
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(pending.width),
                    Object::Integer(pending.height),
                ]),
            );
            kids.push(Object::Reference(doc.add_object(Object::Dictionary(page))));
        }

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(kids.len() as i64));
        pages.set("Kids", Object::Array(kids));
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(Object::Dictionary(catalog));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| PdfError::Parse(e.to_string()))?;
        Ok(bytes)
    }
}
