//! Regex patterns shared by the extractors, and per-field regex filtering.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

lazy_static! {
    // Whole-cell numbers
    pub static ref INTEGER: Regex = Regex::new(r"^[+-]?\d+$").unwrap();

    pub static ref DECIMAL: Regex = Regex::new(
        r"^[+-]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][+-]?\d+)?$"
    ).unwrap();

    // Size grid quantities
    pub static ref DIGIT_RUN: Regex = Regex::new(r"\d+").unwrap();

    /// A row of quantities: digits plus the separators quantity rows carry.
    pub static ref NUMERIC_ROW: Regex = Regex::new(r"^[\d\s.,\-/*+]*\d[\d\s.,\-/*+]*$").unwrap();
}

/// Outcome of applying a field regex to extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternOutcome {
    /// Capture group 1, or the whole match when the regex has no groups.
    Matched(String),
    /// The regex did not match.
    NoMatch,
    /// The regex failed to compile.
    Invalid(String),
}

/// A field's compiled regex.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    source: String,
    compiled: Result<Regex, String>,
}

impl PatternFilter {
    pub fn new(pattern: &str) -> Self {
        Self {
            source: pattern.to_string(),
            compiled: Regex::new(pattern).map_err(|e| e.to_string()),
        }
    }

    /// Match `text` against the regex.
    pub fn apply(&self, text: &str) -> PatternOutcome {
        let regex = match &self.compiled {
            Ok(regex) => regex,
            Err(e) => return PatternOutcome::Invalid(e.clone()),
        };
        match regex.captures(text) {
            Some(caps) => {
                let matched = caps.get(1).or_else(|| caps.get(0));
                PatternOutcome::Matched(matched.map(|m| m.as_str().to_string()).unwrap_or_default())
            }
            None => PatternOutcome::NoMatch,
        }
    }

    /// Replace `text` by the matched part; keep it when the regex does not match or is invalid.
    pub fn filter(&self, text: String) -> String {
        match self.apply(&text) {
            PatternOutcome::Matched(matched) => matched.trim().to_string(),
            PatternOutcome::NoMatch => text,
            PatternOutcome::Invalid(e) => {
                warn!("Ignoring invalid field regex {:?}: {}", self.source, e);
                text
            }
        }
    }
}
