//! Engine session boundary
//!
//! The view never owns the character grid; it queries an external
//! terminal-emulation engine through the [`TerminalSession`] trait and
//! receives asynchronous damage notifications from the engine's worker
//! thread as [`SessionEvent`] records over an ordered channel.
//!
//! All trait calls must happen while holding the session-wide lock the view
//! wraps the session in, because the engine's worker thread mutates the same
//! buffers the accessors read.

use std::sync::mpsc;

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

pub use crate::error::SessionError;

/// Maximum number of codepoints a single cell run can carry.
pub const MAX_RUN_LEN: usize = 256;

/// A 24-bit color as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A run of adjacent grid cells sharing formatting attributes.
///
/// Produced fresh on every query; the view reuses one buffer across queries
/// within a render pass, never across frames, since the engine may mutate
/// the backing grid between frames.
#[derive(Debug, Clone)]
pub struct CellRun {
    data: Vec<char>,
    widths: Vec<u8>,
    /// Total number of grid columns the run covers, >= 1
    pub col_span: usize,
    pub fg: Rgb,
    pub bg: Rgb,
    pub bold: bool,
    pub underline: bool,
    pub strike: bool,
}

impl CellRun {
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(MAX_RUN_LEN),
            widths: Vec::with_capacity(MAX_RUN_LEN),
            col_span: 0,
            fg: Rgb::default(),
            bg: Rgb::default(),
            bold: false,
            underline: false,
            strike: false,
        }
    }

    /// Reset the run so the engine can refill it.
    pub fn clear(&mut self) {
        self.data.clear();
        self.widths.clear();
        self.col_span = 0;
        self.bold = false;
        self.underline = false;
        self.strike = false;
    }

    /// Append a codepoint, deriving its display width from the Unicode
    /// width tables. Returns false once the run is full.
    pub fn push(&mut self, cp: char) -> bool {
        let width = UnicodeWidthChar::width(cp).unwrap_or(0) as u8;
        self.push_with_width(cp, width)
    }

    /// Append a codepoint with an engine-reported display width (0, 1 or 2).
    pub fn push_with_width(&mut self, cp: char, width: u8) -> bool {
        if self.data.len() >= MAX_RUN_LEN {
            return false;
        }
        self.data.push(cp);
        self.widths.push(width);
        self.col_span += width as usize;
        true
    }

    pub fn codepoints(&self) -> &[char] {
        &self.data
    }

    pub fn widths(&self) -> &[u8] {
        &self.widths
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sum of per-codepoint widths. Equals `col_span` for any run the
    /// engine filled through `push`/`push_with_width`.
    pub fn width_sum(&self) -> usize {
        self.widths.iter().map(|&w| w as usize).sum()
    }
}

impl Default for CellRun {
    fn default() -> Self {
        Self::new()
    }
}

/// Soft modifier keys applied to dispatched input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(1);
    pub const ALT: Modifiers = Modifiers(1 << 1);
    pub const CTRL: Modifiers = Modifiers(1 << 2);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

/// Non-printing keys the view dispatches to the engine.
///
/// This is not a key mapping table; translating platform key codes into
/// these values is the host's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
}

/// Cursor state as last reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    pub row: i32,
    pub col: i32,
    pub visible: bool,
}

/// A rectangular region of the grid, rows in scrollback space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRect {
    pub start_row: i32,
    pub end_row: i32,
    pub start_col: i32,
    pub end_col: i32,
}

/// Notifications the engine's worker thread posts toward the render thread.
///
/// The worker never touches view state directly; the view drains these on
/// its own thread and applies the mutations, keeping a single writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A region of the grid changed and must be repainted.
    Damage(GridRect),
    /// A region was moved wholesale (scroll optimization); treated as damage.
    MoveRect { dst: GridRect, src: GridRect },
    /// The cursor moved or changed visibility.
    MoveCursor { row: i32, col: i32, visible: bool },
    /// The engine switched to or from the alternate screen buffer.
    AltScreen(bool),
    /// The bell rang.
    Bell,
}

/// Worker-thread half of the damage channel.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<SessionEvent>,
}

impl EventSink {
    /// Post an event toward the render thread. The return value is the
    /// liveness acknowledgement: false once the view side has gone away.
    pub fn post(&self, event: SessionEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Create the ordered event channel between the engine worker thread and
/// the render thread.
pub fn event_channel() -> (EventSink, mpsc::Receiver<SessionEvent>) {
    let (tx, rx) = mpsc::channel();
    (EventSink { tx }, rx)
}

/// Query/command interface to one terminal-emulation engine session.
///
/// Variants for different engine backends implement this same interface;
/// the view composes a session rather than subclassing one.
pub trait TerminalSession: Send {
    /// Visible row count.
    fn rows(&self) -> usize;

    /// Visible column count.
    fn cols(&self) -> usize;

    /// Current scrollback depth in rows. Changes on every engine mutation
    /// that produces or discards history.
    fn scrollback_rows(&self) -> usize;

    /// Resize the grid. Failure is fatal to the session.
    fn resize(&mut self, cols: usize, rows: usize) -> Result<(), SessionError>;

    /// Fill `out` with the maximal run of same-formatted cells starting at
    /// `(row, col)`. Rows may be negative (scrollback). Errors only when
    /// the session handle is invalid.
    fn cell_run(&self, row: i32, col: usize, out: &mut CellRun) -> Result<(), SessionError>;

    /// Append the text of one row span to `out`.
    fn line_text(&self, row: i32, start_col: usize, end_col: usize, out: &mut String);

    /// Word boundary at `(row, col)`: the nearest word edge scanning in
    /// `dir` (-1 backward, +1 forward), as a column.
    fn word_offset(&self, row: i32, col: i32, dir: i32) -> i32;

    /// Snap `col` to the nearest valid cell boundary on `row`, so that a
    /// selection endpoint never splits a multi-column glyph.
    fn valid_col(&self, row: i32, col: i32) -> i32;

    /// Dispatch a non-printing key. Returns whether the engine consumed it.
    fn dispatch_key(&mut self, modifiers: Modifiers, key: KeyCode) -> bool;

    /// Dispatch a printable codepoint. Returns whether the engine consumed it.
    fn dispatch_character(&mut self, modifiers: Modifiers, cp: char) -> bool;

    /// Default (foreground, background) colors.
    fn default_colors(&self) -> (Rgb, Rgb);

    fn set_default_colors(&mut self, fg: Rgb, bg: Rgb);

    /// Tear the session down. Idempotent; any call after the first is a no-op.
    fn release(&mut self);

    /// Extract the text of a grid rectangle.
    ///
    /// Rows below the deepest retained scrollback row clamp to that row;
    /// rows at or past the visible bottom clamp to the last visible row;
    /// columns clamp to the live column count. A line terminator is
    /// appended whenever a row's span reaches the full grid width.
    fn get_text(&self, start_row: i32, end_row: i32, start_col: i32, end_col: i32) -> String {
        let depth = self.scrollback_rows() as i32;
        let cols = self.cols() as i32;
        let start_row = start_row.max(-depth);
        let end_row = end_row.min(self.rows() as i32 - 1);
        let end_col = end_col.min(cols);

        let mut out = String::new();
        for row in start_row..=end_row {
            let col1 = if row == start_row { start_col.max(0) } else { 0 };
            let col2 = if row == end_row { end_col } else { cols };
            if col2 - col1 <= 0 {
                continue;
            }
            self.line_text(row, col1 as usize, col2 as usize, &mut out);
            if col2 == cols {
                out.push('\n');
            }
        }
        out
    }
}
