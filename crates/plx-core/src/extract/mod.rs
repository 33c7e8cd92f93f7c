//! Template-driven field extraction.

mod normalize;
pub mod patterns;
mod repeated;
mod single;
mod size_grid;

pub use normalize::{coerce_cell, Coerced, TableNormalizer};
pub use patterns::{PatternFilter, PatternOutcome};
pub use repeated::{RecordLayout, RepeatedRecordScanner};
pub use single::SinglePositionExtractor;
pub use size_grid::SizeGridParser;

use std::time::Instant;

use tracing::{debug, info};

use crate::error::Result;
use crate::models::{Extraction, PlxConfig, Template};
use crate::pdf::{PdfExtractor, TextLayer};

/// Trait for template extractors.
pub trait FieldExtractor {
    /// Apply a template to a document's text layer.
    fn extract(&self, layer: &dyn TextLayer, template: &Template) -> Result<Extraction>;
}

/// Chooses single-position or repeated-record extraction from the template.
#[derive(Debug, Clone, Default)]
pub struct TemplateExtractor {
    config: PlxConfig,
}

impl TemplateExtractor {
    pub fn new(config: PlxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlxConfig {
        &self.config
    }

    /// Load a PDF under the configured limits and apply the template.
    pub fn extract_pdf(&self, data: &[u8], template: &Template) -> Result<Extraction> {
        let start = Instant::now();
        let layer = PdfExtractor::load_with_limits(data, &self.config.limits)?;
        let extraction = self.extract(&layer, template)?;
        info!(
            "Extracted {} field(s) from {} page(s) in {}ms",
            template.fields.len(),
            layer.page_count(),
            start.elapsed().as_millis()
        );
        Ok(extraction)
    }
}

impl FieldExtractor for TemplateExtractor {
    fn extract(&self, layer: &dyn TextLayer, template: &Template) -> Result<Extraction> {
        template.validate()?;
        let config = template.effective_config(&self.config.extraction)?;

        if template.repeated_record_mode {
            debug!("Repeated record mode, {} field(s)", template.fields.len());
            RepeatedRecordScanner::new(config).extract(layer, template)
        } else {
            debug!("Single position mode, {} field(s)", template.fields.len());
            SinglePositionExtractor::new(config).extract(layer, template)
        }
    }
}

/// Parse a template from JSON and apply it to a PDF.
pub fn extract_pdf(data: &[u8], template_json: &str, config: &PlxConfig) -> Result<Extraction> {
    let template = Template::from_json(template_json)?;
    TemplateExtractor::new(config.clone()).extract_pdf(data, &template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PlxError, TemplateError};
    use crate::pdf::builder::PdfBuilder;
    use pretty_assertions::assert_eq;

    const TEMPLATE: &str = r#"{
        "vendor": "ACME",
        "fields": [
            {"field": "po", "bbox": {"x0": 60, "y0": 710, "x1": 200, "y1": 690, "page": 0}, "type": "text"},
            {"field": "notes", "bbox": {"x0": 60, "y0": 710, "x1": 200, "y1": 690, "page": 4}, "type": "text"}
        ]
    }"#;

    #[test]
    fn test_extract_pdf_single_mode() {
        let bytes = PdfBuilder::new()
            .page(595, 842)
            .text(72, 700, "PO 4411")
            .build()
            .unwrap();

        let extraction = extract_pdf(&bytes, TEMPLATE, &PlxConfig::default()).unwrap();
        let json = serde_json::to_value(&extraction).unwrap();
        assert_eq!(json["data"]["po"], "PO 4411");
        assert!(json["data"]["notes"].is_null());
        assert!(json.get("products").is_none());
    }

    #[test]
    fn test_invalid_template_is_user_error() {
        let err = extract_pdf(b"%PDF-1.5", r#"{"fields": []}"#, &PlxConfig::default()).unwrap_err();
        assert!(matches!(err, PlxError::Template(TemplateError::NoFields)));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_page_limit_from_config() {
        let bytes = PdfBuilder::new()
            .page(595, 842)
            .text(72, 700, "one")
            .page(595, 842)
            .text(72, 700, "two")
            .build()
            .unwrap();
        let mut config = PlxConfig::default();
        config.limits.max_pages = 1;

        let err = extract_pdf(&bytes, TEMPLATE, &config).unwrap_err();
        assert!(err.is_limit_exceeded());
    }
}
