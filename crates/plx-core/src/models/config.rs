//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

/// Main configuration for plx.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlxConfig {
    /// Geometry heuristics used by the extractors.
    pub extraction: ExtractionConfig,

    /// Per-request resource limits.
    pub limits: LimitsConfig,

    /// HTTP server configuration.
    pub server: ServerConfig,
}

/// How a candidate row is validated against the template layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowMatchPolicy {
    /// Every field region must contain a glyph.
    #[default]
    All,
    /// Enough field regions must contain a glyph.
    Any,
}

/// Which extracted rows are kept as records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordAcceptance {
    /// Every field value must be non-empty.
    #[default]
    AllNonEmpty,
    /// At least one field value must be non-empty.
    AnyNonEmpty,
}

/// Geometry heuristics. All distances are PDF points.
///
/// These encode assumptions about font size and line spacing, so a template
/// may override them through its `settings` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractionConfig {
    /// Glyphs whose baselines round to the same multiple of this value share a text line.
    pub line_merge_tolerance: f64,

    /// Bucket size used to deduplicate candidate row anchors.
    pub anchor_bucket: f64,

    /// Minimum vertical distance between two accepted record rows.
    /// `None` uses the template's record span.
    pub min_row_spacing: Option<f64>,

    /// Horizontal distance between glyph starts that opens a new cell.
    pub cell_gap: f64,

    /// Horizontal gap between glyph end and next glyph start rendered as a space.
    pub word_gap: f64,

    /// Maximum distance for aligning a cell with a stored pattern column.
    pub pattern_match_tolerance: f64,

    /// Upper bound on the number of field hits required to accept a row.
    pub min_field_hits: usize,

    /// Row validation policy.
    pub row_match: RowMatchPolicy,

    /// Record acceptance policy.
    pub record_acceptance: RecordAcceptance,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            line_merge_tolerance: 1.0,
            anchor_bucket: 2.0,
            min_row_spacing: None,
            cell_gap: 15.0,
            word_gap: 1.5,
            pattern_match_tolerance: 20.0,
            min_field_hits: 3,
            row_match: RowMatchPolicy::All,
            record_acceptance: RecordAcceptance::AllNonEmpty,
        }
    }
}

/// Resource limits applied to every document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LimitsConfig {
    /// Maximum number of pages (0 = unlimited).
    pub max_pages: usize,

    /// Maximum number of glyphs across all pages (0 = unlimited).
    pub max_glyphs: usize,

    /// Wall-clock budget for one extraction in seconds.
    pub timeout_secs: u64,

    /// Maximum upload size in bytes.
    pub max_upload_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            max_glyphs: 250_000,
            timeout_secs: 30,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Address to bind.
    pub bind: String,

    /// Allow any origin (the template editor is served from a different host).
    pub permissive_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            permissive_cors: true,
        }
    }
}

impl PlxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PlxConfig =
            serde_json::from_str(r#"{"extraction": {"cellGap": 12.5}}"#).unwrap();
        assert_eq!(config.extraction.cell_gap, 12.5);
        assert_eq!(config.extraction.anchor_bucket, 2.0);
        assert_eq!(config.limits.max_pages, 50);
    }

    #[test]
    fn test_policy_names() {
        let config: ExtractionConfig =
            serde_json::from_str(r#"{"rowMatch": "any", "recordAcceptance": "anyNonEmpty"}"#)
                .unwrap();
        assert_eq!(config.row_match, RowMatchPolicy::Any);
        assert_eq!(config.record_acceptance, RecordAcceptance::AnyNonEmpty);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("plx-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let mut config = PlxConfig::default();
        config.limits.max_pages = 7;
        config.save(&path).unwrap();

        let loaded = PlxConfig::from_file(&path).unwrap();
        assert_eq!(loaded.limits.max_pages, 7);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
