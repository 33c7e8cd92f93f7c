//! Error types for the plx-core library.

use thiserror::Error;

/// Main error type for the plx library.
#[derive(Error, Debug)]
pub enum PlxError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Template is malformed or inconsistent.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlxError {
    /// Whether the error was caused by the caller's input rather than by the
    /// document or the engine.
    pub fn is_user_error(&self) -> bool {
        matches!(self, PlxError::Template(_))
    }

    /// Whether the document exceeded one of the configured resource limits.
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(
            self,
            PlxError::Pdf(PdfError::TooManyPages { .. } | PdfError::TooManyGlyphs { .. })
        )
    }
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to walk the text layer.
    #[error("failed to extract text layer: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page index requested (0-based).
    #[error("invalid page index: {0}")]
    InvalidPage(usize),

    /// Document has more pages than allowed.
    #[error("document has {pages} pages, limit is {limit}")]
    TooManyPages { pages: usize, limit: usize },

    /// Document has more glyphs than allowed.
    #[error("document has more than {limit} glyphs")]
    TooManyGlyphs { limit: usize },
}

/// Errors raised while validating a template.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Template JSON could not be parsed.
    #[error("template JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Template defines no fields.
    #[error("template has no fields")]
    NoFields,

    /// Two fields share the same name.
    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    /// The configured anchor field is not part of the template.
    #[error("anchor field not found in template: {0}")]
    UnknownAnchor(String),

    /// A bounding box has non-finite coordinates.
    #[error("invalid bounding box for {field}: {reason}")]
    InvalidBox { field: String, reason: String },
}

/// Errors related to field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The extraction task failed before producing a result.
    #[error("extraction task failed: {0}")]
    Task(String),

    /// The extraction did not finish in time.
    #[error("extraction timed out after {0}s")]
    Timeout(u64),
}

/// Result type for the plx library.
pub type Result<T> = std::result::Result<T, PlxError>;
