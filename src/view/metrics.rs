//! Cell metrics and coordinate conversion
//!
//! Three coordinate systems meet here: pixel space (touch input, painting),
//! cell-grid space (columns, visible rows), and scrollback space (rows that
//! may be negative). Conversions depend on the current scroll offset, which
//! is always non-positive.

use crate::config::Margins;

/// Pixel geometry of one character cell plus the grid margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    /// Cell width in pixels, >= 1
    pub cell_width: i32,
    /// Cell height in pixels, >= 1
    pub cell_height: i32,
    /// Distance from the cell top to the text baseline origin, expressed as
    /// the (negative) font ascent. `top - cell_top` yields the baseline y.
    pub cell_top: i32,
    pub margins: Margins,
}

impl CellMetrics {
    pub fn new(cell_width: i32, cell_height: i32, cell_top: i32, margins: Margins) -> Self {
        Self {
            cell_width: cell_width.max(1),
            cell_height: cell_height.max(1),
            cell_top,
            margins,
        }
    }

    /// Derive (cols, rows) from a pixel size, excluding margins.
    pub fn grid_size(&self, width_px: i32, height_px: i32) -> (usize, usize) {
        let usable_w = width_px - self.margins.left - self.margins.right;
        let usable_h = height_px - self.margins.top - self.margins.bottom;
        let cols = (usable_w / self.cell_width).max(0) as usize;
        let rows = (usable_h / self.cell_height).max(0) as usize;
        (cols, rows)
    }

    /// Grid column under a pixel x coordinate.
    pub fn grid_col(&self, x: f32) -> i32 {
        ((x - self.margins.left as f32) / self.cell_width as f32).ceil() as i32
    }

    /// Scrollback-space row under a pixel y coordinate at the given scroll
    /// offset (non-positive pixels).
    pub fn grid_row(&self, y: f32, scroll_y: i32) -> i32 {
        let ch = self.cell_height;
        let local = ((y - ch as f32 - self.margins.top as f32) / ch as f32).ceil() as i32;
        local + scroll_y / ch
    }

    /// Pixel x of a grid column, clamped to the grid width.
    pub fn point_x(&self, col: i32, cols: usize) -> i32 {
        col.min(cols as i32) * self.cell_width + self.margins.left
    }

    /// Pixel y of the top of a scrollback-space row at the given scroll
    /// offset.
    pub fn point_y(&self, row: i32, scroll_y: i32) -> i32 {
        (row - scroll_y / self.cell_height) * self.cell_height + self.margins.top
    }
}
