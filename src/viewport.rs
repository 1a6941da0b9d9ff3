//! Mapping between terminal cells and canvas coordinates.
//!
//! The canvas is `CANVAS_WIDTH` x `CANVAS_HEIGHT` with y growing downwards,
//! the same orientation as terminal rows.

use ratatui::layout::Rect;

use crate::geometry::{Point, CANVAS_HEIGHT, CANVAS_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    area: Rect,
}

impl Viewport {
    pub fn new(area: Rect) -> Self {
        Self { area }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn is_empty(&self) -> bool {
        self.area.width == 0 || self.area.height == 0
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.area.x
            && row >= self.area.y
            && column < self.area.x.saturating_add(self.area.width)
            && row < self.area.y.saturating_add(self.area.height)
    }

    /// Canvas point at the centre of a cell. Cells outside the area map past
    /// the canvas edge so a drag that leaves the box keeps tracking.
    pub fn to_canvas(&self, column: u16, row: u16) -> Option<Point> {
        if self.is_empty() {
            return None;
        }
        let cx = (column as f64 - self.area.x as f64 + 0.5) / self.area.width as f64;
        let cy = (row as f64 - self.area.y as f64 + 0.5) / self.area.height as f64;
        Some(Point::new(cx * CANVAS_WIDTH, cy * CANVAS_HEIGHT))
    }

    /// Cell containing a canvas point, clamped to the area
    pub fn to_cell(&self, p: Point) -> Option<(u16, u16)> {
        if self.is_empty() || !p.is_finite() {
            return None;
        }
        let fx = (p.x / CANVAS_WIDTH).clamp(0.0, 1.0);
        let fy = (p.y / CANVAS_HEIGHT).clamp(0.0, 1.0);
        let col = ((fx * self.area.width as f64) as u16).min(self.area.width - 1);
        let row = ((fy * self.area.height as f64) as u16).min(self.area.height - 1);
        Some((self.area.x + col, self.area.y + row))
    }
}
