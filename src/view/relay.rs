//! Damage relay
//!
//! The engine's worker thread posts [`SessionEvent`]s through an mpsc
//! channel; the relay drains them on the frame loop and coalesces a burst
//! into one summary, so any number of damage rectangles between frames
//! costs a single repaint and a single update callback. Cursor and
//! alternate-screen state cross the thread boundary here too, keeping all
//! mutation of view state on the frame loop.

use std::sync::mpsc::{Receiver, TryRecvError};

use tracing::trace;

use crate::session::{CursorState, SessionEvent};

/// Everything that arrived since the previous drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelaySummary {
    /// Any damage, rect move, or cursor move arrived
    pub content_changed: bool,
    /// Latest cursor state, if it moved
    pub cursor: Option<CursorState>,
    /// Latest alternate-screen flag, if it toggled
    pub alt_screen: Option<bool>,
    pub bells: usize,
    /// The sending side hung up; the session is gone
    pub disconnected: bool,
}

#[derive(Debug)]
pub struct DamageRelay {
    rx: Receiver<SessionEvent>,
}

impl DamageRelay {
    pub fn new(rx: Receiver<SessionEvent>) -> Self {
        Self { rx }
    }

    /// Drain all pending events without blocking.
    pub fn drain(&mut self) -> RelaySummary {
        let mut summary = RelaySummary::default();
        let mut drained = 0usize;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    drained += 1;
                    match event {
                        SessionEvent::Damage(_) | SessionEvent::MoveRect { .. } => {
                            summary.content_changed = true;
                        }
                        SessionEvent::MoveCursor { row, col, visible } => {
                            summary.content_changed = true;
                            summary.cursor = Some(CursorState { row, col, visible });
                        }
                        SessionEvent::AltScreen(on) => {
                            summary.alt_screen = Some(on);
                        }
                        SessionEvent::Bell => {
                            summary.bells += 1;
                        }
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    summary.disconnected = true;
                    break;
                }
            }
        }
        if drained > 0 {
            trace!(drained, "relay drained");
        }
        summary
    }
}
