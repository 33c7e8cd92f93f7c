//! Repeated record scanning.
//!
//! The template describes a single record instance. Every field region is
//! expressed relative to the record's reference line, and each page is
//! scanned top to bottom for lines where the whole layout fits again.

use tracing::{debug, trace};

use super::patterns::PatternFilter;
use super::size_grid::SizeGridParser;
use super::FieldExtractor;
use crate::error::Result;
use crate::layout::{group_lines, lines_to_text, CoordinateMapper, CropRect, Glyph, GlyphIndex};
use crate::models::{
    ExtractionConfig, Extraction, FieldDescriptor, FieldValue, Record, RecordAcceptance,
    RowMatchPolicy, Template,
};
use crate::pdf::TextLayer;

/// One field's region relative to the reference line.
#[derive(Debug, Clone)]
struct FieldLayout<'t> {
    field: &'t FieldDescriptor,
    rect: CropRect,
    as_table: bool,
    filter: Option<PatternFilter>,
}

/// Geometry of one record instance.
#[derive(Debug, Clone)]
pub struct RecordLayout<'t> {
    fields: Vec<FieldLayout<'t>>,
    anchor: usize,
    reference_y: f64,
    span: f64,
}

impl<'t> RecordLayout<'t> {
    /// Build the layout from the template boxes. The reference line starts
    /// at the highest field top.
    pub fn new(template: &'t Template) -> Self {
        let mapper = CoordinateMapper::new(0.0);
        let fields: Vec<FieldLayout<'t>> = template
            .fields
            .iter()
            .map(|field| FieldLayout {
                field,
                rect: mapper.to_crop(&field.bbox),
                as_table: template.is_table_field(field),
                filter: field.regex().map(PatternFilter::new),
            })
            .collect();

        let anchor_y = fields
            .iter()
            .map(|f| f.rect.y_top)
            .fold(f64::NEG_INFINITY, f64::max);
        let lowest = fields
            .iter()
            .map(|f| f.rect.y_bottom)
            .fold(f64::INFINITY, f64::min);

        Self {
            fields,
            anchor: template.anchor_index(),
            reference_y: anchor_y,
            span: (anchor_y - lowest).max(0.0),
        }
    }

    /// Move the reference line to the top text line of the template instance.
    ///
    /// Candidate rows are glyph baselines, so aligning the reference with the
    /// baseline the template boxes were drawn around keeps every region in
    /// place. Without glyphs inside the template boxes the line is unchanged.
    pub fn calibrate(mut self, glyphs: &[Glyph]) -> Self {
        let index = GlyphIndex::new(glyphs);
        let top_baseline = self
            .fields
            .iter()
            .flat_map(|f| index.within(f.rect))
            .map(|g| g.y)
            .fold(f64::NEG_INFINITY, f64::max);
        if top_baseline.is_finite() {
            trace!(
                "Reference line moved from {:.1} to {:.1}",
                self.reference_y, top_baseline
            );
            self.reference_y = top_baseline;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Vertical extent of one record.
    pub fn span(&self) -> f64 {
        self.span
    }

    /// Region of field `index` for a record whose reference line is at `row_y`.
    fn region(&self, index: usize, row_y: f64) -> CropRect {
        let rect = self.fields[index].rect;
        let shift = row_y - self.reference_y;
        CropRect {
            x_left: rect.x_left,
            y_bottom: rect.y_bottom + shift,
            x_right: rect.x_right,
            y_top: rect.y_top + shift,
        }
    }
}

/// Finds every repetition of the template's record on every page.
#[derive(Debug, Clone, Default)]
pub struct RepeatedRecordScanner {
    config: ExtractionConfig,
    grid_parser: SizeGridParser,
}

impl RepeatedRecordScanner {
    pub fn new(config: ExtractionConfig) -> Self {
        let grid_parser = SizeGridParser::new(&config);
        Self { config, grid_parser }
    }

    /// Scan all pages, returning records in page order then top to bottom.
    pub fn scan(&self, layer: &dyn TextLayer, template: &Template) -> Result<Vec<Record>> {
        let mut layout = RecordLayout::new(template);
        let reference_page = template.fields[template.anchor_index()].bbox.page;
        if reference_page < layer.page_count() {
            layout = layout.calibrate(layer.glyphs(reference_page)?);
        }

        let mut records = Vec::new();
        for page in 0..layer.page_count() {
            let page_records = self.scan_page(&layout, layer.glyphs(page)?);
            debug!("Page {}: {} record(s)", page, page_records.len());
            records.extend(page_records);
        }
        Ok(records)
    }

    /// Scan one page.
    pub fn scan_page(&self, layout: &RecordLayout<'_>, glyphs: &[Glyph]) -> Vec<Record> {
        if layout.is_empty() {
            return Vec::new();
        }
        let index = GlyphIndex::new(glyphs);
        self.find_rows(layout, &index)
            .into_iter()
            .filter_map(|row_y| self.extract_row(layout, &index, row_y))
            .collect()
    }

    /// Accepted reference lines, top to bottom.
    fn find_rows(&self, layout: &RecordLayout<'_>, index: &GlyphIndex<'_>) -> Vec<f64> {
        let spacing = self.config.min_row_spacing.unwrap_or(layout.span());
        let required = self.config.min_field_hits.min(layout.len());
        let mut accepted: Vec<f64> = Vec::new();

        for y in candidate_anchors(index, self.config.anchor_bucket) {
            if accepted.last().is_some_and(|last| last - y < spacing) {
                continue;
            }
            if !index.any_within(layout.region(layout.anchor, y)) {
                continue;
            }

            let hits = (0..layout.len())
                .filter(|&i| index.any_within(layout.region(i, y)))
                .count();
            let matched = match self.config.row_match {
                RowMatchPolicy::All => hits == layout.len() && hits >= required,
                RowMatchPolicy::Any => hits >= required,
            };
            trace!("Candidate {:.1}: {} of {} fields hit", y, hits, layout.len());
            if matched {
                accepted.push(y);
            }
        }
        accepted
    }

    fn extract_row(&self, layout: &RecordLayout<'_>, index: &GlyphIndex<'_>, row_y: f64) -> Option<Record> {
        let mut record = Record::new();
        for (i, field) in layout.fields.iter().enumerate() {
            let region = layout.region(i, row_y);
            let value = if field.as_table {
                self.grid_parser
                    .parse(index.within(region), region, field.field.pattern.as_ref())
                    .map(FieldValue::SizeGrid)
                    .unwrap_or(FieldValue::Null)
            } else {
                let lines = group_lines(index.within(region), self.config.line_merge_tolerance);
                let text = lines_to_text(&lines, self.config.word_gap, " ");
                let text = match &field.filter {
                    Some(filter) => filter.filter(text),
                    None => text,
                };
                FieldValue::Text(text)
            };
            record.insert(field.field.name.clone(), value);
        }

        let keep = match self.config.record_acceptance {
            RecordAcceptance::AllNonEmpty => record.iter().all(|(_, v)| !v.is_empty()),
            RecordAcceptance::AnyNonEmpty => record.iter().any(|(_, v)| !v.is_empty()),
        };
        if !keep {
            trace!("Row at {:.1} rejected by {:?}", row_y, self.config.record_acceptance);
            return None;
        }
        Some(record)
    }
}

/// One candidate per `bucket`-sized band of baselines (its highest), top to bottom.
fn candidate_anchors(index: &GlyphIndex<'_>, bucket: f64) -> Vec<f64> {
    let bucket = if bucket > 0.0 { bucket } else { 1.0 };
    let mut candidates = Vec::new();
    let mut last_key = None;
    for y in index.baselines_desc() {
        let key = (y / bucket).floor() as i64;
        if last_key != Some(key) {
            candidates.push(y);
            last_key = Some(key);
        }
    }
    candidates
}

impl FieldExtractor for RepeatedRecordScanner {
    fn extract(&self, layer: &dyn TextLayer, template: &Template) -> Result<Extraction> {
        let records = self.scan(layer, template)?;
        let names: Vec<&str> = template.fields.iter().map(|f| f.name.as_str()).collect();
        Ok(Extraction::repeated(&names, records))
    }
}
