//! Page geometry: glyphs, text lines, cells and region queries.

mod coords;
mod table;

pub use coords::{CoordinateMapper, CropRect};
pub use table::{TableDetector, TableGrid};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One character with its position on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    /// Character (occasionally a ligature) as decoded from the font.
    pub text: String,
    /// Left edge of the glyph.
    pub x: f64,
    /// Baseline height above the bottom edge of the page; larger is higher.
    pub y: f64,
    /// Advance width, 0 when unknown.
    #[serde(default)]
    pub width: f64,
}

impl Glyph {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width: 0.0,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Right edge of the glyph.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Whitespace glyphs carry no content and never count as region hits.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Lay out a string as consecutive glyphs with a fixed advance.
///
/// Spaces advance the pen without producing a glyph.
pub fn glyph_run(text: &str, x: f64, y: f64, advance: f64) -> Vec<Glyph> {
    text.chars()
        .enumerate()
        .filter(|(_, c)| !c.is_whitespace())
        .map(|(i, c)| Glyph::new(c.to_string(), x + i as f64 * advance, y).with_width(advance))
        .collect()
}

/// Glyphs sharing a baseline, sorted left to right.
#[derive(Debug, Clone)]
pub struct TextLine<'a> {
    /// Highest baseline among the line's glyphs.
    pub y: f64,
    pub glyphs: Vec<&'a Glyph>,
}

impl TextLine<'_> {
    /// Concatenate the line's characters, inserting a space where the gap
    /// between one glyph's end and the next glyph's start exceeds `word_gap`.
    pub fn text(&self, word_gap: f64) -> String {
        let mut out = String::new();
        let mut prev: Option<&Glyph> = None;
        for glyph in &self.glyphs {
            if let Some(p) = prev {
                if glyph.x - p.right() > word_gap {
                    out.push(' ');
                }
            }
            out.push_str(&glyph.text);
            prev = Some(glyph);
        }
        out
    }
}

fn line_key(y: f64, tolerance: f64) -> i64 {
    let tolerance = if tolerance > 0.0 { tolerance } else { 1.0 };
    (y / tolerance).round() as i64
}

/// Group glyphs into text lines by rounded baseline, top line first.
///
/// Same-line glyphs whose baselines differ slightly (font metrics, kerning)
/// land in the same line. Blank glyphs are skipped.
pub fn group_lines<'a, I>(glyphs: I, tolerance: f64) -> Vec<TextLine<'a>>
where
    I: IntoIterator<Item = &'a Glyph>,
{
    let mut buckets: BTreeMap<i64, Vec<&'a Glyph>> = BTreeMap::new();
    for glyph in glyphs.into_iter().filter(|g| !g.is_blank()) {
        buckets.entry(line_key(glyph.y, tolerance)).or_default().push(glyph);
    }

    buckets
        .into_values()
        .rev()
        .map(|mut glyphs| {
            glyphs.sort_by(|a, b| a.x.total_cmp(&b.x));
            let y = glyphs.iter().map(|g| g.y).fold(f64::NEG_INFINITY, f64::max);
            TextLine { y, glyphs }
        })
        .collect()
}

/// Join lines (top to bottom) with `separator`, trimming the result.
pub fn lines_to_text(lines: &[TextLine<'_>], word_gap: f64, separator: &str) -> String {
    lines
        .iter()
        .map(|line| line.text(word_gap))
        .collect::<Vec<_>>()
        .join(separator)
        .trim()
        .to_string()
}

/// A contiguous run of glyphs on one text line.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub x_start: f64,
    pub x_end: f64,
    pub x_center: f64,
}

impl Cell {
    fn from_glyphs(glyphs: &[&Glyph]) -> Option<Self> {
        let first = glyphs.first()?;
        let last = glyphs.last()?;
        let x_start = first.x;
        let x_end = last.right().max(x_start);
        Some(Self {
            text: glyphs.iter().map(|g| g.text.as_str()).collect(),
            x_start,
            x_end,
            x_center: (x_start + x_end) / 2.0,
        })
    }

    /// Whether the horizontal ranges of two cells touch or overlap.
    pub fn overlaps(&self, other: &Cell) -> bool {
        self.x_start <= other.x_end && other.x_start <= self.x_end
    }

    /// Smallest distance from this cell's center, start or end to `x`.
    pub fn distance_to(&self, x: f64) -> f64 {
        (self.x_center - x)
            .abs()
            .min((self.x_start - x).abs())
            .min((self.x_end - x).abs())
    }
}

/// Split a line into cells wherever consecutive glyph starts are more than
/// `cell_gap` apart.
pub fn split_cells(line: &TextLine<'_>, cell_gap: f64) -> Vec<Cell> {
    let mut cells = Vec::new();
    let mut run: Vec<&Glyph> = Vec::new();

    for glyph in &line.glyphs {
        if let Some(prev) = run.last() {
            if glyph.x - prev.x > cell_gap {
                cells.extend(Cell::from_glyphs(&run));
                run.clear();
            }
        }
        run.push(glyph);
    }
    cells.extend(Cell::from_glyphs(&run));
    cells
}

/// Non-blank glyphs of one page sorted by baseline, for band queries.
#[derive(Debug, Clone)]
pub struct GlyphIndex<'a> {
    glyphs: Vec<&'a Glyph>,
}

impl<'a> GlyphIndex<'a> {
    pub fn new(glyphs: &'a [Glyph]) -> Self {
        let mut glyphs: Vec<&'a Glyph> = glyphs.iter().filter(|g| !g.is_blank()).collect();
        glyphs.sort_by(|a, b| a.y.total_cmp(&b.y));
        Self { glyphs }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Glyphs whose origin lies in `rect`.
    pub fn within(&self, rect: CropRect) -> impl Iterator<Item = &'a Glyph> + '_ {
        let lo = self.glyphs.partition_point(|g| g.y < rect.y_bottom);
        let hi = self.glyphs.partition_point(|g| g.y <= rect.y_top).max(lo);
        self.glyphs[lo..hi]
            .iter()
            .copied()
            .filter(move |g| g.x >= rect.x_left && g.x <= rect.x_right)
    }

    /// Whether any glyph lies in `rect`.
    pub fn any_within(&self, rect: CropRect) -> bool {
        self.within(rect).next().is_some()
    }

    /// Baselines from the top of the page down.
    pub fn baselines_desc(&self) -> impl Iterator<Item = f64> + '_ {
        self.glyphs.iter().rev().map(|g| g.y)
    }
}
