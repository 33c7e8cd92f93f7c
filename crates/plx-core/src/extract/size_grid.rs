//! Two-row size/quantity grids.
//!
//! A size grid is a row of size labels (`S M L`, `36 38 40`, ...) above or
//! below a row of quantities. Columns are recovered from cell positions, so
//! the labels and quantities need not be vertically aligned glyph by glyph.

use tracing::{debug, trace};

use super::patterns::{DIGIT_RUN, NUMERIC_ROW};
use crate::layout::{group_lines, split_cells, Cell, CropRect, Glyph};
use crate::models::{CellTemplate, ExtractionConfig, FieldPattern, SizeGrid};

/// One text row of the grid region.
#[derive(Debug, Clone)]
struct GridRow {
    y: f64,
    cells: Vec<Cell>,
}

impl GridRow {
    fn is_numeric(&self) -> bool {
        let text = self
            .cells
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        NUMERIC_ROW.is_match(&text)
    }
}

/// Decodes size grids from the glyphs of one region.
#[derive(Debug, Clone)]
pub struct SizeGridParser {
    line_tolerance: f64,
    cell_gap: f64,
    tolerance: f64,
}

impl Default for SizeGridParser {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

impl SizeGridParser {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            line_tolerance: config.line_merge_tolerance,
            cell_gap: config.cell_gap,
            tolerance: config.pattern_match_tolerance,
        }
    }

    /// Parse the glyphs of a grid region.
    ///
    /// `region` is the crop the glyphs were taken from; stored row offsets are
    /// measured from its top edge. Returns `None` when fewer than two rows are
    /// present or no size cells are found.
    pub fn parse<'a, I>(&self, glyphs: I, region: CropRect, pattern: Option<&FieldPattern>) -> Option<SizeGrid>
    where
        I: IntoIterator<Item = &'a Glyph>,
    {
        let rows: Vec<GridRow> = group_lines(glyphs, self.line_tolerance)
            .iter()
            .map(|line| GridRow {
                y: line.y,
                cells: split_cells(line, self.cell_gap),
            })
            .filter(|row| !row.cells.is_empty())
            .collect();

        if rows.len() < 2 {
            trace!("Size grid region has {} row(s)", rows.len());
            return None;
        }

        let grid = match pattern.filter(|p| p.has_cell_templates()) {
            Some(pattern) => self.parse_with_pattern(&rows, region, pattern),
            None => {
                let (size_row, qty_row) = classify_rows(&rows);
                match_by_overlap(size_row, qty_row)
            }
        };

        if grid.is_empty() {
            return None;
        }
        debug!("Size grid with {} columns, total {}", grid.len(), grid.total());
        Some(grid)
    }

    fn parse_with_pattern(&self, rows: &[GridRow], region: CropRect, pattern: &FieldPattern) -> SizeGrid {
        let (mut size_row, mut qty_row) = classify_rows(rows);
        if let Some(offset) = pattern.size_row_offset {
            size_row = nearest_row(rows, region.y_top - offset);
        }
        if let Some(offset) = pattern.qty_row_offset {
            qty_row = nearest_row(rows, region.y_top - offset);
        }

        let size_tmpl = &pattern.size_cells_template;
        let qty_tmpl = &pattern.qty_cells_template;

        size_row
            .cells
            .iter()
            .map(|size| {
                // Shift between the stored size column and its stored quantity cell
                let shift = nearest_template(size_tmpl, size.x_center)
                    .filter(|(_, t)| (t.x_center - size.x_center).abs() <= self.tolerance)
                    .and_then(|(i, t)| {
                        let qty = qty_tmpl
                            .get(i)
                            .filter(|_| qty_tmpl.len() == size_tmpl.len())
                            .or_else(|| nearest_template(qty_tmpl, t.x_center).map(|(_, q)| q))?;
                        Some(qty.x_center - t.x_center)
                    })
                    .unwrap_or(0.0);

                let expected = size.x_center + shift;
                let quantity = qty_row
                    .cells
                    .iter()
                    .map(|cell| (cell, (cell.x_center - expected).abs()))
                    .filter(|(_, distance)| *distance <= self.tolerance)
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(cell, _)| first_quantity(&cell.text))
                    .unwrap_or(0);

                (size.text.clone(), quantity)
            })
            .collect()
    }
}

/// Pick the size row and the quantity row.
///
/// The first row that is not numeric holds the sizes and the first numeric
/// row holds the quantities. When every row (or no row) is numeric, the two
/// topmost rows are used in that order.
fn classify_rows(rows: &[GridRow]) -> (&GridRow, &GridRow) {
    let size = rows.iter().find(|r| !r.is_numeric());
    let qty = rows.iter().find(|r| r.is_numeric());
    match (size, qty) {
        (Some(size), Some(qty)) => (size, qty),
        _ => (&rows[0], &rows[1]),
    }
}

fn nearest_row(rows: &[GridRow], y: f64) -> &GridRow {
    rows.iter()
        .min_by(|a, b| (a.y - y).abs().total_cmp(&(b.y - y).abs()))
        .unwrap_or(&rows[0])
}

fn nearest_template(cells: &[CellTemplate], x: f64) -> Option<(usize, &CellTemplate)> {
    cells
        .iter()
        .enumerate()
        .min_by(|a, b| (a.1.x_center - x).abs().total_cmp(&(b.1.x_center - x).abs()))
}

fn match_by_overlap(size_row: &GridRow, qty_row: &GridRow) -> SizeGrid {
    size_row
        .cells
        .iter()
        .map(|size| {
            let cell = qty_row.cells.iter().find(|q| q.overlaps(size)).or_else(|| {
                qty_row
                    .cells
                    .iter()
                    .min_by(|a, b| a.distance_to(size.x_center).total_cmp(&b.distance_to(size.x_center)))
            });
            let quantity = cell.map(|c| first_quantity(&c.text)).unwrap_or(0);
            (size.text.clone(), quantity)
        })
        .collect()
}

/// First run of digits in a cell, `0` when there is none.
fn first_quantity(text: &str) -> u64 {
    DIGIT_RUN
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::glyph_run;
    use pretty_assertions::assert_eq;

    const REGION: CropRect = CropRect {
        x_left: 0.0,
        y_bottom: 0.0,
        x_right: 200.0,
        y_top: 120.0,
    };

    /// Place each label so that its cell is centered on `x`.
    fn centered_row(y: f64, cells: &[(&str, f64)]) -> Vec<Glyph> {
        cells
            .iter()
            .flat_map(|(text, x)| {
                let width = text.chars().count() as f64 * 5.0;
                glyph_run(text, x - width / 2.0, y, 5.0)
            })
            .collect()
    }

    fn labels(grid: &SizeGrid) -> Vec<(String, u64)> {
        grid.labels()
            .map(|l| (l.to_string(), grid.get(l).unwrap_or_default()))
            .collect()
    }

    #[test]
    fn test_basic_grid() {
        let mut glyphs = centered_row(100.0, &[("S", 10.0), ("M", 30.0), ("L", 50.0)]);
        glyphs.extend(centered_row(88.0, &[("3", 10.0), ("5", 30.0), ("2", 50.0)]));

        let grid = SizeGridParser::default().parse(&glyphs, REGION, None).unwrap();
        assert_eq!(
            serde_json::to_string(&grid).unwrap(),
            r#"{"S":3,"M":5,"L":2}"#
        );
    }

    #[test]
    fn test_single_row_is_none() {
        let glyphs = centered_row(100.0, &[("S", 10.0), ("M", 30.0)]);
        assert!(SizeGridParser::default().parse(&glyphs, REGION, None).is_none());
    }

    #[test]
    fn test_quantity_row_above_sizes() {
        let mut glyphs = centered_row(100.0, &[("4", 10.0), ("1", 40.0)]);
        glyphs.extend(centered_row(88.0, &[("XS", 10.0), ("XL", 40.0)]));
        let grid = SizeGridParser::default().parse(&glyphs, REGION, None).unwrap();
        assert_eq!(
            labels(&grid),
            vec![("XS".to_string(), 4), ("XL".to_string(), 1)]
        );
    }

    #[test]
    fn test_all_numeric_rows_use_top_two() {
        let mut glyphs = centered_row(100.0, &[("36", 10.0), ("38", 40.0)]);
        glyphs.extend(centered_row(88.0, &[("2", 10.0), ("7", 40.0)]));
        let grid = SizeGridParser::default().parse(&glyphs, REGION, None).unwrap();
        assert_eq!(grid.get("36"), Some(2));
        assert_eq!(grid.get("38"), Some(7));
    }

    #[test]
    fn test_missing_quantity_takes_nearest() {
        let mut glyphs = centered_row(100.0, &[("S", 10.0), ("M", 60.0)]);
        glyphs.extend(centered_row(88.0, &[("6", 12.0)]));
        let grid = SizeGridParser::default().parse(&glyphs, REGION, None).unwrap();
        assert_eq!(grid.get("S"), Some(6));
        assert_eq!(grid.get("M"), Some(6));
    }

    #[test]
    fn test_non_digit_quantity_is_zero() {
        let mut glyphs = centered_row(100.0, &[("S", 10.0), ("M", 30.0)]);
        glyphs.extend(centered_row(88.0, &[("4", 10.0), ("-", 30.0)]));
        let grid = SizeGridParser::default().parse(&glyphs, REGION, None).unwrap();
        assert_eq!(grid.get("M"), Some(0));
    }

    #[test]
    fn test_pattern_alignment_with_shifted_quantities() {
        // Quantities sit 12pt to the right of their labels
        let mut glyphs = centered_row(100.0, &[("S", 10.0), ("M", 40.0), ("L", 70.0)]);
        glyphs.extend(centered_row(88.0, &[("3", 22.0), ("5", 52.0), ("2", 82.0)]));

        let cell = |text: &str, x: f64| CellTemplate {
            text: text.to_string(),
            x_center: x,
            x_start: None,
            x_end: None,
        };
        let pattern = FieldPattern {
            size_cells_template: vec![cell("S", 10.0), cell("M", 40.0), cell("L", 70.0)],
            qty_cells_template: vec![cell("3", 22.0), cell("5", 52.0), cell("2", 82.0)],
            size_row_offset: Some(20.0),
            qty_row_offset: Some(32.0),
            ..FieldPattern::default()
        };

        let grid = SizeGridParser::default()
            .parse(&glyphs, REGION, Some(&pattern))
            .unwrap();
        assert_eq!(
            labels(&grid),
            vec![
                ("S".to_string(), 3),
                ("M".to_string(), 5),
                ("L".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_pattern_unmatched_column_is_zero() {
        let mut glyphs = centered_row(100.0, &[("S", 10.0), ("M", 40.0)]);
        glyphs.extend(centered_row(88.0, &[("3", 10.0)]));

        let pattern = FieldPattern {
            size_cells_template: vec![CellTemplate {
                text: "S".to_string(),
                x_center: 10.0,
                x_start: None,
                x_end: None,
            }],
            ..FieldPattern::default()
        };
        let grid = SizeGridParser::default()
            .parse(&glyphs, REGION, Some(&pattern))
            .unwrap();
        assert_eq!(grid.get("S"), Some(3));
        assert_eq!(grid.get("M"), Some(0));
    }

    #[test]
    fn test_first_quantity() {
        assert_eq!(first_quantity("x12/4"), 12);
        assert_eq!(first_quantity("--"), 0);
    }
}
