//! Table detection from positioned glyphs.
//!
//! Borderless tables are recovered from text alignment alone: lines are split
//! into cells, the cells' horizontal extents are merged into column bands, and
//! every cell is placed into the band it falls in.

use tracing::{debug, trace};

use super::{group_lines, split_cells, Cell, Glyph};

/// A cell of a detected table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    /// Row index (0-based, top row first).
    pub row: usize,
    /// Column index (0-based).
    pub col: usize,
    /// Cell text.
    pub content: String,
    /// Horizontal extent `(x_start, x_end)`.
    pub span: (f64, f64),
}

/// A detected table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableGrid {
    pub num_rows: usize,
    pub num_cols: usize,
    pub cells: Vec<TableCell>,
}

impl TableGrid {
    /// Cells in a specific row.
    pub fn row(&self, row: usize) -> Vec<&TableCell> {
        self.cells.iter().filter(|c| c.row == row).collect()
    }

    /// Cells in a specific column.
    pub fn column(&self, col: usize) -> Vec<&TableCell> {
        self.cells.iter().filter(|c| c.col == col).collect()
    }

    /// The cell at a position.
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    /// Row-major grid of cell texts; `None` where no text was found.
    pub fn as_grid(&self) -> Vec<Vec<Option<String>>> {
        let mut grid = vec![vec![None; self.num_cols]; self.num_rows];
        for cell in &self.cells {
            if cell.row < self.num_rows && cell.col < self.num_cols {
                grid[cell.row][cell.col] = Some(cell.content.clone());
            }
        }
        grid
    }
}

/// Text-alignment table detector.
#[derive(Debug, Clone, Copy)]
pub struct TableDetector {
    line_tolerance: f64,
    cell_gap: f64,
    min_rows: usize,
}

impl Default for TableDetector {
    fn default() -> Self {
        Self {
            line_tolerance: 1.0,
            cell_gap: 15.0,
            min_rows: 2,
        }
    }
}

impl TableDetector {
    pub fn new(line_tolerance: f64, cell_gap: f64) -> Self {
        Self {
            line_tolerance,
            cell_gap,
            ..Self::default()
        }
    }

    /// Set the minimum number of lines a table needs.
    pub fn with_min_rows(mut self, min_rows: usize) -> Self {
        self.min_rows = min_rows.max(1);
        self
    }

    /// Detect tables among the given glyphs. Returns at most one table.
    pub fn detect<'a, I>(&self, glyphs: I) -> Vec<TableGrid>
    where
        I: IntoIterator<Item = &'a Glyph>,
    {
        let lines = group_lines(glyphs, self.line_tolerance);
        if lines.len() < self.min_rows {
            trace!("{} line(s) in region, no table", lines.len());
            return Vec::new();
        }

        let rows: Vec<Vec<Cell>> = lines
            .iter()
            .map(|line| split_cells(line, self.cell_gap))
            .collect();

        let bands = column_bands(rows.iter().flatten());
        let mut grid = TableGrid {
            num_rows: rows.len(),
            num_cols: bands.len(),
            cells: Vec::new(),
        };

        for (row_idx, cells) in rows.iter().enumerate() {
            for cell in cells {
                let Some(col) = band_of(&bands, cell) else {
                    continue;
                };
                match grid
                    .cells
                    .iter_mut()
                    .find(|c| c.row == row_idx && c.col == col)
                {
                    Some(existing) => {
                        existing.content.push(' ');
                        existing.content.push_str(&cell.text);
                        existing.span.1 = existing.span.1.max(cell.x_end);
                    }
                    None => grid.cells.push(TableCell {
                        row: row_idx,
                        col,
                        content: cell.text.clone(),
                        span: (cell.x_start, cell.x_end),
                    }),
                }
            }
        }

        debug!(
            "Detected table: {} rows x {} columns",
            grid.num_rows, grid.num_cols
        );
        vec![grid]
    }
}

/// Merge overlapping cell extents into disjoint column bands, left to right.
fn column_bands<'a>(cells: impl Iterator<Item = &'a Cell>) -> Vec<(f64, f64)> {
    let mut spans: Vec<(f64, f64)> = cells.map(|c| (c.x_start, c.x_end)).collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut bands: Vec<(f64, f64)> = Vec::new();
    for (start, end) in spans {
        match bands.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => bands.push((start, end)),
        }
    }
    bands
}

fn band_of(bands: &[(f64, f64)], cell: &Cell) -> Option<usize> {
    bands
        .iter()
        .position(|(start, end)| cell.x_start >= *start && cell.x_start <= *end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::glyph_run;
    use pretty_assertions::assert_eq;

    fn row(y: f64, cells: &[(&str, f64)]) -> Vec<Glyph> {
        cells
            .iter()
            .flat_map(|(text, x)| glyph_run(text, *x, y, 5.0))
            .collect()
    }

    #[test]
    fn test_detects_aligned_columns() {
        let mut glyphs = row(100.0, &[("A1", 10.0), ("3", 60.0), ("2.5", 110.0)]);
        glyphs.extend(row(80.0, &[("B22", 10.0), ("14", 60.0)]));

        let tables = TableDetector::default().detect(&glyphs);
        assert_eq!(tables.len(), 1);

        let grid = tables[0].as_grid();
        assert_eq!(
            grid,
            vec![
                vec![Some("A1".to_string()), Some("3".to_string()), Some("2.5".to_string())],
                vec![Some("B22".to_string()), Some("14".to_string()), None],
            ]
        );
        assert_eq!(tables[0].column(0).len(), 2);
        assert_eq!(tables[0].cell_at(1, 1).map(|c| c.content.as_str()), Some("14"));
    }

    #[test]
    fn test_single_line_is_not_a_table() {
        let glyphs = row(100.0, &[("A1", 10.0), ("3", 60.0)]);
        assert!(TableDetector::default().detect(&glyphs).is_empty());
    }

    #[test]
    fn test_empty_region() {
        let glyphs: Vec<Glyph> = Vec::new();
        assert!(TableDetector::default().detect(&glyphs).is_empty());
    }

    #[test]
    fn test_column_bands_merge() {
        let mut glyphs = row(100.0, &[("NAME", 10.0)]);
        glyphs.extend(row(80.0, &[("X", 20.0)]));
        let tables = TableDetector::default().detect(&glyphs);
        assert_eq!(tables[0].num_cols, 1);
        assert_eq!(tables[0].row(1)[0].content, "X");
    }
}
