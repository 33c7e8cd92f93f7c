//! One value per field, read from the field's fixed region.

use tracing::{debug, trace};

use super::normalize::TableNormalizer;
use super::patterns::PatternFilter;
use super::FieldExtractor;
use crate::error::Result;
use crate::layout::CoordinateMapper;
use crate::models::{ExtractionConfig, Extraction, FieldDescriptor, FieldValue, Record, Template};
use crate::pdf::TextLayer;

/// Reads every field from its own box.
#[derive(Debug, Clone, Default)]
pub struct SinglePositionExtractor {
    config: ExtractionConfig,
    normalizer: TableNormalizer,
}

impl SinglePositionExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            normalizer: TableNormalizer::new(),
        }
    }

    /// Extract one field, read as a table when its `kind` says so.
    /// A page outside the document yields `Null`.
    pub fn extract_field(&self, layer: &dyn TextLayer, field: &FieldDescriptor) -> Result<FieldValue> {
        self.read_field(layer, field, field.is_table())
    }

    fn read_field(&self, layer: &dyn TextLayer, field: &FieldDescriptor, as_table: bool) -> Result<FieldValue> {
        let page = field.bbox.page;
        if page >= layer.page_count() {
            debug!(
                "Field {} is on page {} but document has {} pages",
                field.name,
                page,
                layer.page_count()
            );
            return Ok(FieldValue::Null);
        }

        let mapper = CoordinateMapper::new(layer.page_height(page)?);
        let rect = mapper.to_crop(&field.bbox);
        trace!("Field {} crop {:?}", field.name, rect);

        if as_table {
            let tables = layer.detect_tables(page, rect, &self.config)?;
            let rows = tables
                .first()
                .map(|table| self.normalizer.normalize(&table.as_grid()))
                .unwrap_or_default();
            return Ok(FieldValue::Table(rows));
        }

        let text = layer.text_in(page, rect, &self.config)?;
        let text = match field.regex() {
            Some(pattern) => PatternFilter::new(pattern).filter(text),
            None => text,
        };
        Ok(FieldValue::Text(text))
    }
}

impl FieldExtractor for SinglePositionExtractor {
    fn extract(&self, layer: &dyn TextLayer, template: &Template) -> Result<Extraction> {
        let mut data = Record::new();
        for field in &template.fields {
            let value = self.read_field(layer, field, template.is_table_field(field))?;
            data.insert(field.name.clone(), value);
        }
        Ok(Extraction::single(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::glyph_run;
    use crate::models::{BBox, FieldKind, FieldPattern};
    use crate::pdf::MemoryLayer;
    use pretty_assertions::assert_eq;

    fn field(name: &str, kind: FieldKind, bbox: (f64, f64, f64, f64), page: usize) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            bbox: BBox { x0: bbox.0, y0: bbox.1, x1: bbox.2, y1: bbox.3, page },
            kind,
            pattern: None,
        }
    }

    fn layer() -> MemoryLayer {
        let mut glyphs = glyph_run("PO 4411", 50.0, 760.0, 5.0);
        glyphs.extend(glyph_run("A1", 50.0, 600.0, 5.0));
        glyphs.extend(glyph_run("3", 100.0, 600.0, 5.0));
        glyphs.extend(glyph_run("B2", 50.0, 588.0, 5.0));
        glyphs.extend(glyph_run("2.5", 100.0, 588.0, 5.0));
        MemoryLayer::new().with_page(595.0, 842.0, glyphs)
    }

    #[test]
    fn test_text_field() {
        let extractor = SinglePositionExtractor::default();
        let value = extractor
            .extract_field(&layer(), &field("po", FieldKind::Text, (40.0, 770.0, 200.0, 750.0), 0))
            .unwrap();
        assert_eq!(value, FieldValue::Text("PO 4411".to_string()));
    }

    #[test]
    fn test_text_field_with_regex() {
        let mut descriptor = field("po", FieldKind::Text, (40.0, 770.0, 200.0, 750.0), 0);
        descriptor.pattern = Some(FieldPattern {
            regex: Some(r"PO\s+(\d+)".to_string()),
            ..FieldPattern::default()
        });
        let value = SinglePositionExtractor::default()
            .extract_field(&layer(), &descriptor)
            .unwrap();
        assert_eq!(value.as_text(), Some("4411"));
    }

    #[test]
    fn test_page_out_of_range_is_null() {
        let value = SinglePositionExtractor::default()
            .extract_field(&layer(), &field("po", FieldKind::Text, (40.0, 770.0, 200.0, 750.0), 1))
            .unwrap();
        assert_eq!(value, FieldValue::Null);
    }

    #[test]
    fn test_table_field() {
        let value = SinglePositionExtractor::default()
            .extract_field(&layer(), &field("lines", FieldKind::Table, (40.0, 610.0, 200.0, 580.0), 0))
            .unwrap();
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"0": "A1", "1": 3}, {"0": "B2", "1": 2.5}])
        );
    }

    #[test]
    fn test_table_field_without_table_is_empty() {
        let value = SinglePositionExtractor::default()
            .extract_field(&layer(), &field("lines", FieldKind::Table, (300.0, 500.0, 400.0, 400.0), 0))
            .unwrap();
        assert_eq!(value, FieldValue::Table(Vec::new()));
    }

    #[test]
    fn test_empty_region_is_empty_string() {
        let value = SinglePositionExtractor::default()
            .extract_field(&layer(), &field("po", FieldKind::Text, (300.0, 500.0, 400.0, 400.0), 0))
            .unwrap();
        assert_eq!(value, FieldValue::Text(String::new()));
    }

    #[test]
    fn test_size_grid_field_is_read_as_table() {
        let template = Template::from_json(
            r#"{"fields": [
                {"field": "size_grid", "bbox": {"x0": 40, "y0": 610, "x1": 200, "y1": 580}}
            ]}"#,
        )
        .unwrap();
        let extraction = SinglePositionExtractor::default()
            .extract(&layer(), &template)
            .unwrap();
        match extraction.data.get("size_grid") {
            Some(FieldValue::Table(rows)) => assert_eq!(rows.len(), 2),
            other => panic!("expected a table, got {:?}", other),
        }
    }
}
