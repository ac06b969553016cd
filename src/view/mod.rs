//! Scrollable, selectable view over a terminal session
//!
//! [`TerminalView`] is the facade the host embeds: it owns the scroll
//! coordinator, fast-scroll indicator, selection engine and gesture
//! dispatcher, drains the session's damage queue, and drives the render
//! pass. All of its state lives on the host's frame loop; the only
//! cross-thread traffic is the event channel drained by the damage relay
//! and the session lock shared with the engine's worker thread.

pub mod fast_scroll;
pub mod gesture;
pub mod metrics;
pub mod relay;
pub mod render;
pub mod scroll;
pub mod selection;

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::ViewConfig;
use crate::error::{CopyError, SessionError};
use crate::session::{CellRun, CursorState, KeyCode, Modifiers, Rgb, SessionEvent, TerminalSession};

use fast_scroll::FastScroller;
use gesture::{GestureAction, GestureContext, GestureDispatcher, TouchEvent};
use metrics::CellMetrics;
use relay::DamageRelay;
use render::Surface;
use scroll::ScrollCoordinator;
use selection::SelectionEngine;

/// Host callbacks. All default to no-ops so hosts implement only what
/// they surface.
pub trait ViewListener {
    /// Content or cursor changed since the last frame
    fn on_update(&mut self) {}
    fn on_bell(&mut self) {}
    fn on_modifiers_changed(&mut self, modifiers: Modifiers) {
        let _ = modifiers;
    }
    /// A tap landed on empty content; the host should raise the keyboard
    fn on_request_focus(&mut self) {}
    /// The cell grid changed dimensions after a pixel resize
    fn on_resize(&mut self, cols: usize, rows: usize) {
        let _ = (cols, rows);
    }
}

pub struct TerminalView<S: TerminalSession> {
    session: Arc<Mutex<S>>,
    relay: DamageRelay,
    metrics: CellMetrics,
    scroll: ScrollCoordinator,
    fast_scroll: FastScroller,
    selection: SelectionEngine,
    gestures: GestureDispatcher,
    /// Scratch run reused across the render pass
    run: CellRun,
    cursor: CursorState,
    alt_screen: bool,
    background_alpha: u8,
    default_fg: Rgb,
    default_bg: Rgb,
    modifiers: Modifiers,
    view_width: i32,
    view_height: i32,
    cols: usize,
    rows: usize,
    needs_redraw: bool,
    listener: Option<Box<dyn ViewListener>>,
}

impl<S: TerminalSession> TerminalView<S> {
    pub fn new(
        session: Arc<Mutex<S>>,
        events: Receiver<SessionEvent>,
        metrics: CellMetrics,
        config: ViewConfig,
    ) -> Self {
        let (default_fg, default_bg) = session.lock().default_colors();
        Self {
            session,
            relay: DamageRelay::new(events),
            scroll: ScrollCoordinator::new(config.fling_friction),
            fast_scroll: FastScroller::new(&config),
            selection: SelectionEngine::new(config.max_copy_len),
            gestures: GestureDispatcher::new(&config),
            metrics,
            run: CellRun::new(),
            cursor: CursorState::default(),
            alt_screen: false,
            background_alpha: u8::MAX,
            default_fg,
            default_bg,
            modifiers: Modifiers::NONE,
            view_width: 0,
            view_height: 0,
            cols: 0,
            rows: 0,
            needs_redraw: true,
            listener: None,
        }
    }

    pub fn set_listener(&mut self, listener: Box<dyn ViewListener>) {
        self.listener = Some(listener);
    }

    /// Pixel size changed. Re-derives the grid, pushes the resize to the
    /// engine (failure is fatal to the session) and resets scroll and
    /// selection: the old offsets describe a geometry that no longer
    /// exists.
    pub fn set_size(&mut self, width: i32, height: i32, now: Instant) -> Result<(), SessionError> {
        self.view_width = width;
        self.view_height = height;
        self.fast_scroll.set_view_size(width, height);
        let (cols, rows) = self.metrics.grid_size(width, height);
        if cols != self.cols || rows != self.rows {
            self.session.lock().resize(cols, rows)?;
            self.cols = cols;
            self.rows = rows;
            info!(cols, rows, "view resized");
            if let Some(listener) = self.listener.as_mut() {
                listener.on_resize(cols, rows);
            }
        }
        self.reset_status(now);
        Ok(())
    }

    pub fn grid_size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Cancel momentum, snap back to the live edge and dismiss the
    /// selection. Runs after resize and any key or text input.
    pub fn reset_status(&mut self, now: Instant) {
        self.scroll.cancel_fling();
        self.scroll_to(0, now);
        if self.selection.is_visible() {
            self.selection.clear();
        }
        self.needs_redraw = true;
    }

    fn total_height(&self) -> i32 {
        let depth = self.session.lock().scrollback_rows() as i32;
        depth * self.metrics.cell_height
    }

    pub fn scroll_offset(&self) -> i32 {
        self.scroll.offset()
    }

    pub fn scroll_to(&mut self, y: i32, now: Instant) {
        let total = self.total_height();
        if self.scroll.scroll_to(y, total) {
            self.after_scroll(total, now);
        }
    }

    pub fn scroll_by(&mut self, dy: i32, now: Instant) {
        let total = self.total_height();
        if self.scroll.scroll_by(dy, total) {
            self.after_scroll(total, now);
        }
    }

    fn after_scroll(&mut self, total: i32, now: Instant) {
        self.fast_scroll
            .on_scroll(self.scroll.offset(), total, now);
        self.needs_redraw = true;
    }

    /// Feed one touch event through the gesture dispatcher and apply the
    /// resulting actions.
    pub fn on_touch(&mut self, event: TouchEvent) {
        let ctx = GestureContext {
            thumb_hit: self.fast_scroll.hit_test(event.x, event.y),
            handle_hit: self.selection.handle_at(
                &self.metrics,
                event.x,
                event.y,
                self.cols,
                self.scroll.offset(),
            ),
            alt_screen: self.alt_screen,
            scrollable: self.total_height() > 0,
            row_height: self.metrics.cell_height,
        };
        let actions = self.gestures.on_touch(event, ctx);
        for action in actions {
            self.apply(action, event.time);
        }
    }

    fn apply(&mut self, action: GestureAction, now: Instant) {
        match action {
            GestureAction::CancelFling => self.scroll.cancel_fling(),
            GestureAction::ThumbDragStart => self.fast_scroll.begin_drag(),
            GestureAction::ThumbDragMove { y } => {
                let total = self.total_height();
                if let Some(target) = self.fast_scroll.drag_to(y, total) {
                    if self.scroll.scroll_to(target, total) {
                        self.needs_redraw = true;
                    }
                }
            }
            GestureAction::ThumbDragEnd => {
                self.fast_scroll.end_drag(now);
                self.needs_redraw = true;
            }
            GestureAction::HandleDragMove { handle, x, y } => {
                let scroll_target = {
                    let session = self.session.lock();
                    self.selection.update_handle(
                        &*session,
                        &self.metrics,
                        handle,
                        x,
                        y,
                        self.scroll.offset(),
                        self.alt_screen,
                    )
                };
                if let Some(target) = scroll_target {
                    self.scroll_to(target, now);
                }
                self.needs_redraw = true;
            }
            GestureAction::ScrollBy { dy } => self.scroll_by(dy, now),
            GestureAction::ArrowKeys { count } => {
                // Drag-as-keys implies any selection is stale
                if self.selection.is_visible() {
                    self.selection.clear();
                    self.needs_redraw = true;
                }
                let key = if count > 0 {
                    KeyCode::ArrowDown
                } else {
                    KeyCode::ArrowUp
                };
                let mut session = self.session.lock();
                for _ in 0..count.abs() {
                    session.dispatch_key(Modifiers::NONE, key);
                }
            }
            GestureAction::Fling { velocity } => {
                self.scroll.start_fling(velocity, now, self.alt_screen);
            }
            GestureAction::Tap { .. } => {
                if self.selection.is_visible() {
                    self.selection.clear();
                    self.needs_redraw = true;
                } else if let Some(listener) = self.listener.as_mut() {
                    listener.on_request_focus();
                }
            }
            GestureAction::LongPress { x, y } => {
                let session = self.session.lock();
                // A press in a margin maps outside the grid; clamp it in
                let depth = session.scrollback_rows() as i32;
                let row = self
                    .metrics
                    .grid_row(y, self.scroll.offset())
                    .clamp(-depth, self.rows.saturating_sub(1) as i32);
                let col = self
                    .metrics
                    .grid_col(x)
                    .clamp(0, self.cols.saturating_sub(1) as i32);
                self.selection.start_from_word(&*session, row, col);
                drop(session);
                self.needs_redraw = true;
            }
        }
    }

    /// Dispatch a non-printing key with the current soft modifiers merged
    /// in, then reset scroll and selection.
    pub fn on_key(&mut self, key: KeyCode, modifiers: Modifiers, now: Instant) -> bool {
        let consumed = self
            .session
            .lock()
            .dispatch_key(self.modifiers | modifiers, key);
        self.reset_status(now);
        consumed
    }

    /// Send printable text one codepoint at a time, consuming the soft
    /// modifiers on the way out.
    pub fn send_text(&mut self, text: &str, now: Instant) {
        {
            let mut session = self.session.lock();
            for cp in text.chars() {
                session.dispatch_character(self.modifiers, cp);
            }
        }
        if !self.modifiers.is_empty() {
            self.set_modifiers(Modifiers::NONE);
        }
        self.reset_status(now);
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        if modifiers != self.modifiers {
            self.modifiers = modifiers;
            if let Some(listener) = self.listener.as_mut() {
                listener.on_modifiers_changed(modifiers);
            }
        }
    }

    /// One frame of cooperative work: drain the damage queue, fire a due
    /// long-press, tick the fling and the indicator fade. Returns true
    /// while another frame should be scheduled.
    pub fn on_frame(&mut self, now: Instant) -> bool {
        let summary = self.relay.drain();
        if let Some(cursor) = summary.cursor {
            self.cursor = cursor;
        }
        if let Some(alt) = summary.alt_screen {
            if alt != self.alt_screen {
                debug!(alt, "alternate screen toggled");
                self.alt_screen = alt;
                self.reset_status(now);
            }
        }
        if summary.content_changed {
            self.needs_redraw = true;
            if let Some(listener) = self.listener.as_mut() {
                listener.on_update();
            }
        }
        for _ in 0..summary.bells {
            if let Some(listener) = self.listener.as_mut() {
                listener.on_bell();
            }
        }

        if let Some(action) = self.gestures.poll(now) {
            self.apply(action, now);
        }

        let total = self.total_height();
        if self.scroll.on_frame(now, total) {
            self.after_scroll(total, now);
        }
        if self.fast_scroll.on_frame(now) {
            self.needs_redraw = true;
        }

        self.scroll.is_flinging()
            || self.fast_scroll.is_animating()
            || self.gestures.next_deadline().is_some()
            || self.needs_redraw
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    pub fn alt_screen(&self) -> bool {
        self.alt_screen
    }

    /// Paint the full view: visible rows from the scrolled-to position,
    /// the fill below the last row, and the fast-scroll thumb. Holds the
    /// session lock for the duration of the pass so the worker cannot
    /// mutate the grid mid-paint.
    pub fn draw(&mut self, surface: &mut dyn Surface) -> Result<(), SessionError> {
        let session = self.session.lock();
        let ch = self.metrics.cell_height;
        let start_row = self.scroll.offset() / ch;
        let cursor = self
            .cursor
            .visible
            .then_some((self.cursor.row, self.cursor.col));

        let mut top = self.metrics.margins.top;
        for row in start_row..start_row + self.rows as i32 {
            let sel = self.selection.cols_for_row(row, self.cols);
            render::draw_row(
                surface,
                &*session,
                &self.metrics,
                top,
                row,
                self.cols,
                cursor,
                sel,
                self.background_alpha,
                &mut self.run,
            )?;
            top += ch;
        }
        drop(session);

        // Band below the last full row (and the bottom margin)
        if top < self.view_height {
            surface.fill_rect(
                0,
                top,
                self.view_width,
                self.view_height - top,
                self.default_bg,
                self.background_alpha,
            );
        }

        if let Some(rect) = self.fast_scroll.thumb_rect() {
            surface.fill_rect(
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                self.default_fg,
                self.fast_scroll.alpha(),
            );
        }

        self.needs_redraw = false;
        Ok(())
    }

    pub fn selection_text(&self) -> Result<String, CopyError> {
        let session = self.session.lock();
        self.selection.selection_text(&*session)
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_visible()
    }

    pub fn clear_selection(&mut self) {
        if self.selection.is_visible() {
            self.selection.clear();
            self.needs_redraw = true;
        }
    }

    pub fn background_alpha(&self) -> u8 {
        self.background_alpha
    }

    pub fn set_background_alpha(&mut self, alpha: u8) {
        if alpha != self.background_alpha {
            self.background_alpha = alpha;
            self.needs_redraw = true;
        }
    }

    pub fn default_colors(&self) -> (Rgb, Rgb) {
        (self.default_fg, self.default_bg)
    }

    pub fn set_default_colors(&mut self, fg: Rgb, bg: Rgb) {
        self.default_fg = fg;
        self.default_bg = bg;
        self.session.lock().set_default_colors(fg, bg);
        self.needs_redraw = true;
    }

    /// Tear the session down. Idempotent at the engine's discretion; the
    /// view itself only forwards the request.
    pub fn release(&mut self) {
        self.session.lock().release();
    }
}
