//! Mapping template boxes into the text layer's coordinate space.
//!
//! The canonical space is PDF user space: points, origin at the bottom-left
//! corner of the page, `y` growing upwards. Template boxes are authored in the
//! same space (the editor stores `page_height - canvas_y`), so mapping is
//! corner normalization plus clamping to the page. Every extractor goes
//! through [`CoordinateMapper::to_crop`]; nothing else flips or reorders `y`.

use serde::{Deserialize, Serialize};

use super::Glyph;
use crate::models::template::BBox;

/// Crop rectangle in native coordinates. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x_left: f64,
    pub y_bottom: f64,
    pub x_right: f64,
    pub y_top: f64,
}

impl CropRect {
    /// Build a rectangle from two corners in any order.
    pub fn from_corners(xa: f64, ya: f64, xb: f64, yb: f64) -> Self {
        Self {
            x_left: xa.min(xb),
            y_bottom: ya.min(yb),
            x_right: xa.max(xb),
            y_top: ya.max(yb),
        }
    }

    pub fn width(&self) -> f64 {
        self.x_right - self.x_left
    }

    pub fn height(&self) -> f64 {
        self.y_top - self.y_bottom
    }

    /// Whether a point lies inside the rectangle.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x_left && x <= self.x_right && y >= self.y_bottom && y <= self.y_top
    }

    /// Whether a glyph's origin lies inside the rectangle.
    pub fn contains(&self, glyph: &Glyph) -> bool {
        self.contains_point(glyph.x, glyph.y)
    }
}

/// Converts caller boxes into crop rectangles for one page.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    page_height: f64,
}

impl CoordinateMapper {
    pub fn new(page_height: f64) -> Self {
        Self { page_height }
    }

    /// Normalize a caller box into `(x_left, y_bottom, x_right, y_top)`.
    pub fn to_crop(&self, bbox: &BBox) -> CropRect {
        let mut rect = CropRect::from_corners(bbox.x0, bbox.y0, bbox.x1, bbox.y1);
        if self.page_height > 0.0 {
            rect.y_bottom = rect.y_bottom.clamp(0.0, self.page_height);
            rect.y_top = rect.y_top.clamp(0.0, self.page_height);
        }
        rect
    }
}
