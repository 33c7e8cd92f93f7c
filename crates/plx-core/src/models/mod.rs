//! Data models: configuration, templates and extracted records.

pub mod config;
pub mod record;
pub mod template;

pub use config::{ExtractionConfig, LimitsConfig, PlxConfig, RecordAcceptance, RowMatchPolicy};
pub use record::{CellValue, Extraction, FieldValue, Record, SizeGrid, TableRow};
pub use template::{
    BBox, CellTemplate, FieldDescriptor, FieldKind, FieldPattern, Template, DEFAULT_SIZE_GRID_FIELD,
};
