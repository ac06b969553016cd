//! Shared test fixture: an in-memory session standing in for the
//! emulation engine, plus a listener that records its callbacks.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use parking_lot::Mutex;
use terminal_view::config::ViewConfig;
use terminal_view::session::{
    event_channel, CellRun, EventSink, KeyCode, Modifiers, Rgb, SessionError, SessionEvent,
    TerminalSession,
};
use terminal_view::view::metrics::CellMetrics;
use terminal_view::view::ViewListener;

pub const FG: Rgb = Rgb::new(0xd0, 0xd0, 0xd0);
pub const BG: Rgb = Rgb::new(0x00, 0x00, 0x00);

/// Line-oriented fake engine. Visible rows index into `screen`, negative
/// rows into `history` from its end. Records every input dispatched to it.
pub struct FakeSession {
    pub cols: usize,
    pub rows: usize,
    pub screen: Vec<String>,
    pub history: Vec<String>,
    pub keys: Vec<(Modifiers, KeyCode)>,
    pub chars: Vec<(Modifiers, char)>,
    pub resize_calls: Vec<(usize, usize)>,
    pub fail_resize: bool,
    pub released: bool,
}

impl FakeSession {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            screen: Vec::new(),
            history: Vec::new(),
            keys: Vec::new(),
            chars: Vec::new(),
            resize_calls: Vec::new(),
            fail_resize: false,
            released: false,
        }
    }

    pub fn with_screen(mut self, lines: &[&str]) -> Self {
        self.screen = lines.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_history(mut self, depth: usize) -> Self {
        self.history = (0..depth).map(|i| format!("history {i}")).collect();
        self
    }

    fn line(&self, row: i32) -> &str {
        let text = if row < 0 {
            let idx = self.history.len() as i32 + row;
            self.history.get(idx as usize)
        } else {
            self.screen.get(row as usize)
        };
        text.map(|s| s.as_str()).unwrap_or("")
    }
}

impl TerminalSession for FakeSession {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn scrollback_rows(&self) -> usize {
        self.history.len()
    }

    fn resize(&mut self, cols: usize, rows: usize) -> Result<(), SessionError> {
        self.resize_calls.push((cols, rows));
        if self.fail_resize {
            return Err(SessionError::ResizeFailed { cols, rows });
        }
        self.cols = cols;
        self.rows = rows;
        Ok(())
    }

    fn cell_run(&self, row: i32, col: usize, out: &mut CellRun) -> Result<(), SessionError> {
        out.clear();
        out.fg = FG;
        out.bg = BG;
        out.push(self.line(row).chars().nth(col).unwrap_or('\0'));
        Ok(())
    }

    fn line_text(&self, row: i32, start_col: usize, end_col: usize, out: &mut String) {
        out.extend(
            self.line(row)
                .chars()
                .skip(start_col)
                .take(end_col.saturating_sub(start_col)),
        );
    }

    fn word_offset(&self, row: i32, col: i32, dir: i32) -> i32 {
        let chars: Vec<char> = self.line(row).chars().collect();
        let is_word =
            |i: i32| i >= 0 && (i as usize) < chars.len() && chars[i as usize].is_alphanumeric();
        let mut c = col;
        if dir < 0 {
            while is_word(c - 1) {
                c -= 1;
            }
        } else {
            while is_word(c + 1) {
                c += 1;
            }
        }
        c
    }

    fn valid_col(&self, _row: i32, col: i32) -> i32 {
        col.clamp(0, self.cols as i32)
    }

    fn dispatch_key(&mut self, modifiers: Modifiers, key: KeyCode) -> bool {
        self.keys.push((modifiers, key));
        true
    }

    fn dispatch_character(&mut self, modifiers: Modifiers, cp: char) -> bool {
        self.chars.push((modifiers, cp));
        true
    }

    fn default_colors(&self) -> (Rgb, Rgb) {
        (FG, BG)
    }

    fn set_default_colors(&mut self, _fg: Rgb, _bg: Rgb) {}

    fn release(&mut self) {
        self.released = true;
    }
}

/// Counts listener callbacks so tests can assert coalescing.
#[derive(Default)]
pub struct CallCounts {
    pub updates: usize,
    pub bells: usize,
    pub focus_requests: usize,
    pub modifier_changes: Vec<Modifiers>,
    pub resizes: Vec<(usize, usize)>,
}

pub struct RecordingListener(pub Arc<Mutex<CallCounts>>);

impl ViewListener for RecordingListener {
    fn on_update(&mut self) {
        self.0.lock().updates += 1;
    }
    fn on_bell(&mut self) {
        self.0.lock().bells += 1;
    }
    fn on_modifiers_changed(&mut self, modifiers: Modifiers) {
        self.0.lock().modifier_changes.push(modifiers);
    }
    fn on_request_focus(&mut self) {
        self.0.lock().focus_requests += 1;
    }
    fn on_resize(&mut self, cols: usize, rows: usize) {
        self.0.lock().resizes.push((cols, rows));
    }
}

/// 10x20 px cells, no margins: a 400x800 view is a 40x40 grid.
pub fn metrics() -> CellMetrics {
    CellMetrics::new(10, 20, -16, Default::default())
}

pub fn config() -> ViewConfig {
    ViewConfig::default()
}

pub fn session_pair(
    session: FakeSession,
) -> (Arc<Mutex<FakeSession>>, EventSink, Receiver<SessionEvent>) {
    let (sink, rx) = event_channel();
    (Arc::new(Mutex::new(session)), sink, rx)
}
