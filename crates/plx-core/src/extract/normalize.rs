//! Raw table grids to typed rows.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::trace;

use super::patterns::{DECIMAL, INTEGER};
use crate::models::{CellValue, TableRow};

/// Result of coercing one raw cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Integer(i64),
    Decimal(Decimal),
    /// Not a number; the original text is kept.
    Original(String),
    /// Missing or blank cell.
    Empty,
}

impl From<Coerced> for CellValue {
    fn from(value: Coerced) -> Self {
        match value {
            Coerced::Integer(n) => CellValue::Integer(n),
            Coerced::Decimal(d) => CellValue::Decimal(d),
            Coerced::Original(s) => CellValue::Text(s),
            Coerced::Empty => CellValue::Null,
        }
    }
}

/// Coerce a raw cell: integer, then decimal, else the original string.
pub fn coerce_cell(raw: Option<&str>) -> Coerced {
    let Some(raw) = raw else {
        return Coerced::Empty;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Coerced::Empty;
    }

    if INTEGER.is_match(trimmed) {
        if let Ok(n) = trimmed.trim_start_matches('+').parse::<i64>() {
            return Coerced::Integer(n);
        }
    }
    if DECIMAL.is_match(trimmed) {
        let parsed = Decimal::from_str(trimmed.trim_start_matches('+'))
            .or_else(|_| Decimal::from_scientific(trimmed));
        if let Ok(d) = parsed {
            return Coerced::Decimal(d);
        }
        trace!("Cell {:?} looks numeric but does not fit a decimal", trimmed);
    }
    Coerced::Original(raw.to_string())
}

/// Converts headerless grids into rows keyed by column position.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableNormalizer;

impl TableNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a row-major grid.
    pub fn normalize(&self, grid: &[Vec<Option<String>>]) -> Vec<TableRow> {
        grid.iter()
            .map(|row| {
                TableRow::new(
                    row.iter()
                        .map(|cell| coerce_cell(cell.as_deref()).into())
                        .collect(),
                )
            })
            .collect()
    }
}
