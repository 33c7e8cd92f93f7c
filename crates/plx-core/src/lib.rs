//! Core library for template-driven PDF field extraction.
//!
//! This crate provides:
//! - A positioned-glyph text layer over PDFs (via pdf-extract)
//! - Region queries, line grouping and borderless table detection
//! - Single-position field extraction with numeric table normalization
//! - Repeated record scanning with size/quantity grid decoding

pub mod error;
pub mod extract;
pub mod layout;
pub mod models;
pub mod pdf;

pub use error::{PlxError, Result};
pub use extract::{
    extract_pdf, FieldExtractor, RepeatedRecordScanner, SinglePositionExtractor, SizeGridParser,
    TableNormalizer, TemplateExtractor,
};
pub use layout::{CoordinateMapper, CropRect, Glyph};
pub use models::{Extraction, FieldValue, PlxConfig, Record, SizeGrid, Template};
pub use pdf::{MemoryLayer, PdfExtractor, TextLayer};
