//! Extracted values and records.

use rust_decimal::Decimal;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Value extracted for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Field could not be read (e.g. page out of range, grid not found).
    Null,
    /// Free text.
    Text(String),
    /// Size label → quantity mapping.
    SizeGrid(SizeGrid),
    /// Normalized table rows.
    Table(Vec<TableRow>),
    /// Column-wise values of one field across repeated records.
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Whether the value carries no content.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::SizeGrid(grid) => grid.is_empty(),
            FieldValue::Table(rows) => rows.is_empty(),
            FieldValue::List(values) => values.is_empty(),
        }
    }

    /// Text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Size grid, if this is a grid value.
    pub fn as_size_grid(&self) -> Option<&SizeGrid> {
        match self {
            FieldValue::SizeGrid(grid) => Some(grid),
            _ => None,
        }
    }
}

/// One normalized table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Decimal(Decimal),
    Text(String),
}

/// One table row keyed by column position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    cells: Vec<CellValue>,
}

impl TableRow {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Cell at a column position.
    pub fn get(&self, column: usize) -> Option<&CellValue> {
        self.cells.get(column)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for TableRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, cell) in self.cells.iter().enumerate() {
            map.serialize_entry(&column.to_string(), cell)?;
        }
        map.end()
    }
}

/// Ordered size label → quantity mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeGrid {
    entries: Vec<(String, u64)>,
}

impl SizeGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a quantity. A repeated label keeps its first position and takes the new quantity.
    pub fn insert(&mut self, label: impl Into<String>, quantity: u64) {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = quantity,
            None => self.entries.push((label, quantity)),
        }
    }

    /// Quantity for a label.
    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, q)| *q)
    }

    /// Labels in column order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    /// Sum of all quantities.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, q)| q).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, u64)> for SizeGrid {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut grid = SizeGrid::new();
        for (label, quantity) in iter {
            grid.insert(label, quantity);
        }
        grid
    }
}

impl Serialize for SizeGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, quantity) in &self.entries {
            map.serialize_entry(label, quantity)?;
        }
        map.end()
    }
}

/// Field name → value, in template order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Result of applying a template to one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    /// Field values. In repeated mode each value is the column of that field across `products`.
    pub data: Record,

    /// Repeated records, present only in repeated mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Record>>,
}

impl Extraction {
    /// Build the single-position result.
    pub fn single(data: Record) -> Self {
        Self { data, products: None }
    }

    /// Build the repeated-mode result, deriving column-wise `data`.
    pub fn repeated(field_names: &[&str], products: Vec<Record>) -> Self {
        let mut data = Record::new();
        for name in field_names {
            let column = products
                .iter()
                .map(|record| record.get(name).cloned().unwrap_or(FieldValue::Null))
                .collect();
            data.insert(*name, FieldValue::List(column));
        }
        Self {
            data,
            products: Some(products),
        }
    }
}
