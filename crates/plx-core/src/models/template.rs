//! Extraction templates: named regions on a page.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::config::ExtractionConfig;
use crate::error::TemplateError;

/// A caller-defined extraction template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Vendor the template was authored for.
    #[serde(default)]
    pub vendor: String,

    /// Field regions, in template order.
    pub fields: Vec<FieldDescriptor>,

    /// Scan for vertically repeated records instead of reading each region once.
    #[serde(default)]
    pub repeated_record_mode: bool,

    /// Field whose region validates a candidate record row.
    /// Defaults to the first field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_field: Option<String>,

    /// Template-specific overrides of the geometry heuristics, merged key by
    /// key over the operator's configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Map<String, Value>>,

    /// Field read as a size grid whatever its `kind`.
    #[serde(default = "default_size_grid_field")]
    pub size_grid_field: String,
}

/// Name of the field treated as a size grid when a template does not say otherwise.
pub const DEFAULT_SIZE_GRID_FIELD: &str = "size_grid";

fn default_size_grid_field() -> String {
    DEFAULT_SIZE_GRID_FIELD.to_string()
}

/// One named region of a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Field name used as the output key.
    #[serde(alias = "field")]
    pub name: String,

    /// Region of the field on its page.
    pub bbox: BBox,

    /// Whether the region holds free text or a table.
    #[serde(default, alias = "type")]
    pub kind: FieldKind,

    /// Optional post-processing and size grid hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<FieldPattern>,
}

/// Content kind of a field region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text.
    #[default]
    Text,
    /// Tabular content (a generic table, or a size grid in repeated mode).
    Table,
}

/// Axis-aligned rectangle plus a 0-based page index.
///
/// Coordinates are PDF points with the origin at the bottom-left corner of the
/// page, so `y0` is normally the top edge and `y1` the bottom edge. Corners may
/// be supplied in any order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    #[serde(default)]
    pub page: usize,
}

impl BBox {
    /// Left edge.
    pub fn left(&self) -> f64 {
        self.x0.min(self.x1)
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x0.max(self.x1)
    }

    /// Top edge (larger y).
    pub fn top(&self) -> f64 {
        self.y0.max(self.y1)
    }

    /// Bottom edge (smaller y).
    pub fn bottom(&self) -> f64 {
        self.y0.min(self.y1)
    }

    fn is_finite(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Per-field hints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPattern {
    /// Regex applied to extracted text; group 1 wins when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    /// Size-label cells captured from a reference page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub size_cells_template: Vec<CellTemplate>,

    /// Quantity cells captured from a reference page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qty_cells_template: Vec<CellTemplate>,

    /// Distance of the size row below the region's top edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_row_offset: Option<f64>,

    /// Distance of the quantity row below the region's top edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty_row_offset: Option<f64>,
}

impl FieldPattern {
    /// Whether stored column positions are available for the size grid.
    pub fn has_cell_templates(&self) -> bool {
        !self.size_cells_template.is_empty()
    }
}

/// A stored grid cell: label text and horizontal position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellTemplate {
    #[serde(default)]
    pub text: String,
    pub x_center: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_end: Option<f64>,
}

impl Template {
    /// Parse and validate a template from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        let template: Template = serde_json::from_str(json)?;
        template.validate()?;
        Ok(template)
    }

    /// Check structural consistency.
    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.fields.is_empty() {
            return Err(TemplateError::NoFields);
        }

        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(TemplateError::DuplicateField(field.name.clone()));
            }
            if !field.bbox.is_finite() {
                return Err(TemplateError::InvalidBox {
                    field: field.name.clone(),
                    reason: "coordinates must be finite numbers".to_string(),
                });
            }
        }

        if let Some(anchor) = &self.anchor_field {
            if !seen.contains(anchor.as_str()) {
                return Err(TemplateError::UnknownAnchor(anchor.clone()));
            }
        }

        // Overrides must fit the config types
        self.effective_config(&ExtractionConfig::default())?;
        Ok(())
    }

    /// Index of the anchor field in `fields`.
    pub fn anchor_index(&self) -> usize {
        self.anchor_field
            .as_deref()
            .and_then(|name| self.fields.iter().position(|f| f.name == name))
            .unwrap_or(0)
    }

    /// Heuristics to use for this template: `base` with the template's
    /// `settings` keys replaced. Keys the template omits keep their `base` value.
    pub fn effective_config(&self, base: &ExtractionConfig) -> Result<ExtractionConfig, TemplateError> {
        let Some(overrides) = &self.settings else {
            return Ok(base.clone());
        };

        let mut merged = serde_json::to_value(base)?;
        if let Some(object) = merged.as_object_mut() {
            for (key, value) in overrides {
                object.insert(key.clone(), value.clone());
            }
        }
        Ok(serde_json::from_value(merged)?)
    }

    /// Whether a field is read as a table: declared `table`, or the size grid field.
    pub fn is_table_field(&self, field: &FieldDescriptor) -> bool {
        field.is_table() || field.name == self.size_grid_field
    }
}

impl FieldDescriptor {
    /// Whether the field is declared as a table.
    pub fn is_table(&self) -> bool {
        self.kind == FieldKind::Table
    }

    /// The field's regex, if any.
    pub fn regex(&self) -> Option<&str> {
        self.pattern.as_ref().and_then(|p| p.regex.as_deref())
    }
}
