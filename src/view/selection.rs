//! Text selection over the terminal grid
//!
//! The engine owns one selection rectangle in grid coordinates (rows may be
//! negative for scrollback) plus its visibility, and implements the clamp
//! and ordering rules for dragging either endpoint handle. It never touches
//! the scroll offset directly; when a drag walks off the viewport it returns
//! the offset the coordinator should move to.

use tracing::debug;

use crate::error::CopyError;
use crate::session::TerminalSession;
use crate::view::metrics::CellMetrics;

/// Selection endpoints in grid coordinates, inclusive on both ends.
/// `-1` on every field marks the unset state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRect {
    pub start_row: i32,
    pub start_col: i32,
    pub end_row: i32,
    pub end_col: i32,
}

impl SelectionRect {
    pub const UNSET: Self = Self {
        start_row: -1,
        start_col: -1,
        end_row: -1,
        end_col: -1,
    };

    pub fn is_unset(&self) -> bool {
        self.start_row == -1 && self.start_col == -1 && self.end_row == -1 && self.end_col == -1
    }
}

impl Default for SelectionRect {
    fn default() -> Self {
        Self::UNSET
    }
}

/// Which endpoint a drag is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionHandle {
    Start,
    End,
}

#[derive(Debug)]
pub struct SelectionEngine {
    rect: SelectionRect,
    visible: bool,
    max_copy_len: usize,
}

impl SelectionEngine {
    pub fn new(max_copy_len: usize) -> Self {
        Self {
            rect: SelectionRect::UNSET,
            visible: false,
            max_copy_len,
        }
    }

    pub fn rect(&self) -> SelectionRect {
        self.rect
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Initialize both endpoints to the word span under the touched cell
    /// and show the selection UI.
    pub fn start_from_word<S: TerminalSession + ?Sized>(
        &mut self,
        session: &S,
        row: i32,
        col: i32,
    ) {
        self.rect.start_row = row;
        self.rect.end_row = row;
        self.rect.start_col = session.word_offset(row, col, -1);
        self.rect.end_col = session.word_offset(row, col + 1, 1);
        self.visible = true;
        debug!(
            row,
            start_col = self.rect.start_col,
            end_col = self.rect.end_col,
            "selection started"
        );
    }

    /// Move one handle to the touch point at `(x, y)` in view pixels.
    ///
    /// Clamps in order: column into `[0, cols)`, row into
    /// `[-scrollback, rows)`, row to the scrolled-in bound,
    /// alternate-screen floor, the engine's valid-column snap, then the
    /// ordering invariant (the dragged handle is pulled to the other,
    /// never crosses). Returns the scroll offset the viewport should move
    /// to when the handle walked outside it (never on the alternate
    /// screen).
    #[allow(clippy::too_many_arguments)]
    pub fn update_handle<S: TerminalSession + ?Sized>(
        &mut self,
        session: &S,
        metrics: &CellMetrics,
        handle: SelectionHandle,
        x: f32,
        y: f32,
        scroll_y: i32,
        alt_screen: bool,
    ) -> Option<i32> {
        let cell_h = metrics.cell_height;
        let rows = session.rows() as i32;
        let cols = session.cols() as i32;
        let depth = session.scrollback_rows() as i32;
        let scroll_row = (scroll_y - metrics.margins.top) / cell_h + rows;

        let mut col = metrics.grid_col(x);
        let mut row = metrics.grid_row(y, scroll_y);

        if col < 0 {
            col = 0;
        } else if col > cols - 1 {
            col = cols - 1;
        }
        if row < -depth {
            row = -depth;
        } else if row > rows - 1 {
            row = rows - 1;
        }
        if row > scroll_row {
            row = scroll_row;
        }
        if alt_screen && row < 0 {
            row = 0;
        }
        col = session.valid_col(row, col);

        match handle {
            SelectionHandle::Start => {
                self.rect.start_row = row;
                self.rect.start_col = col;
                if self.rect.start_row > self.rect.end_row {
                    self.rect.start_row = self.rect.end_row;
                }
                if self.rect.start_row == self.rect.end_row
                    && self.rect.start_col > self.rect.end_col
                {
                    self.rect.start_col = self.rect.end_col;
                }
            }
            SelectionHandle::End => {
                self.rect.end_row = row;
                self.rect.end_col = col;
                if self.rect.start_row > self.rect.end_row {
                    self.rect.end_row = self.rect.start_row;
                }
                if self.rect.start_row == self.rect.end_row
                    && self.rect.start_col > self.rect.end_col
                {
                    self.rect.end_col = self.rect.start_col;
                }
            }
        }

        let mut new_scroll = scroll_y;
        if !alt_screen {
            let r = match handle {
                SelectionHandle::Start => self.rect.start_row,
                SelectionHandle::End => self.rect.end_row,
            };
            if r * cell_h <= scroll_y {
                new_scroll = r * cell_h;
            } else if (r - rows) * cell_h >= scroll_y {
                new_scroll += cell_h;
            }
        }

        (new_scroll != scroll_y).then_some(new_scroll)
    }

    /// Handle under the touch point, if any. Each handle's grab area hangs
    /// one cell wide either side and two cells tall below its endpoint,
    /// matching where the handle affordance is drawn.
    pub fn handle_at(
        &self,
        metrics: &CellMetrics,
        x: f32,
        y: f32,
        cols: usize,
        scroll_y: i32,
    ) -> Option<SelectionHandle> {
        if !self.visible || self.rect.is_unset() {
            return None;
        }
        let hit = |row: i32, col: i32| {
            let px = metrics.point_x(col, cols) as f32;
            let py = metrics.point_y(row + 1, scroll_y) as f32;
            let cw = metrics.cell_width as f32;
            let ch = metrics.cell_height as f32;
            x >= px - cw && x < px + cw && y >= py && y < py + 2.0 * ch
        };
        if hit(self.rect.start_row, self.rect.start_col) {
            Some(SelectionHandle::Start)
        } else if hit(self.rect.end_row, self.rect.end_col) {
            Some(SelectionHandle::End)
        } else {
            None
        }
    }

    /// Selected column range `[c1, c2)` intersecting `row` for the render
    /// pass, or None when the row is outside the selection.
    pub fn cols_for_row(&self, row: i32, cols: usize) -> Option<(i32, i32)> {
        if !self.visible || self.rect.is_unset() {
            return None;
        }
        if row < self.rect.start_row || row > self.rect.end_row {
            return None;
        }
        let c1 = if row == self.rect.start_row {
            self.rect.start_col
        } else {
            0
        };
        let c2 = if row == self.rect.end_row {
            self.rect.end_col
        } else {
            cols as i32
        };
        Some((c1, c2))
    }

    /// Extract the selected text. Row and column bounds are re-clamped by
    /// the accessor, so a rectangle computed before a resize stays safe.
    /// Selections longer than the copy cap are rejected outright.
    pub fn selection_text<S: TerminalSession + ?Sized>(
        &self,
        session: &S,
    ) -> Result<String, CopyError> {
        if self.rect.is_unset() {
            return Err(CopyError::Empty);
        }
        let text = session.get_text(
            self.rect.start_row,
            self.rect.end_row,
            self.rect.start_col,
            self.rect.end_col,
        );
        if text.is_empty() {
            return Err(CopyError::Empty);
        }
        if text.chars().count() > self.max_copy_len {
            return Err(CopyError::TooLarge {
                len: text.chars().count(),
                max: self.max_copy_len,
            });
        }
        Ok(text)
    }

    pub fn clear(&mut self) {
        self.rect = SelectionRect::UNSET;
        self.visible = false;
    }
}
