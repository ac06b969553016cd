//! Fast-scroll indicator
//!
//! A thumb along the right edge that mirrors the scroll position, supports
//! direct dragging for coarse navigation through deep scrollback, and fades
//! out after a period of inactivity. Purely a state machine over pixel
//! geometry; drawing is left to the render pass.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::config::ViewConfig;

/// Fully opaque alpha for the visible thumb.
pub const ALPHA_MAX: u8 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbState {
    /// No scrollback, or the fade-out completed
    Hidden,
    /// Opaque, counting down to a fade
    Visible,
    /// Finger on the thumb; never fades while held
    Dragging,
    /// Alpha ramping down to zero
    FadingOut,
}

/// Pixel rectangle in view space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug)]
pub struct FastScroller {
    state: ThumbState,
    thumb_width: i32,
    thumb_height: i32,
    view_width: i32,
    view_height: i32,
    total_height: i32,
    thumb_y: i32,
    alpha: u8,
    /// When the current Visible period expires
    fade_deadline: Option<Instant>,
    /// When the fade ramp began
    fade_started: Option<Instant>,
    idle_delay: Duration,
    post_drag_delay: Duration,
    fade_duration: Duration,
}

impl FastScroller {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            state: ThumbState::Hidden,
            thumb_width: config.thumb_width.max(1),
            thumb_height: config.thumb_height.max(1),
            view_width: 0,
            view_height: 0,
            total_height: 0,
            thumb_y: 0,
            alpha: 0,
            fade_deadline: None,
            fade_started: None,
            idle_delay: Duration::from_millis(config.fade_idle_ms),
            post_drag_delay: Duration::from_millis(config.fade_after_drag_ms),
            fade_duration: Duration::from_millis(config.fade_duration_ms),
        }
    }

    pub fn set_view_size(&mut self, width: i32, height: i32) {
        self.view_width = width;
        self.view_height = height;
    }

    pub fn state(&self) -> ThumbState {
        self.state
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    /// Track the scroll position. Shows the thumb (restarting the idle
    /// countdown) whenever the offset moves, and hides it entirely when
    /// there is no scrollback to indicate.
    pub fn on_scroll(&mut self, scroll_y: i32, total_height: i32, now: Instant) {
        self.total_height = total_height;
        if total_height <= 0 {
            self.hide();
            return;
        }
        let travel = (self.view_height - self.thumb_height).max(0);
        // At scroll 0 the thumb rests pinned to the bottom of the track
        self.thumb_y = if scroll_y == 0 {
            travel
        } else {
            (travel as i64 * (total_height + scroll_y) as i64 / total_height as i64) as i32
        };
        if self.state != ThumbState::Dragging {
            self.show(now, self.idle_delay);
        }
    }

    /// Whether a touch at `(x, y)` lands on the thumb. The horizontal band
    /// is widened to three thumb widths so the target is reachable with a
    /// finger.
    pub fn hit_test(&self, x: f32, y: f32) -> bool {
        if self.state == ThumbState::Hidden {
            return false;
        }
        x > (self.view_width - self.thumb_width * 3) as f32
            && y >= self.thumb_y as f32
            && y < (self.thumb_y + self.thumb_height) as f32
    }

    pub fn begin_drag(&mut self) {
        trace!("thumb drag start");
        self.state = ThumbState::Dragging;
        self.alpha = ALPHA_MAX;
        self.fade_deadline = None;
        self.fade_started = None;
    }

    /// Move the thumb to follow the finger at pixel `y` and return the
    /// scroll offset the view should jump to. The thumb is clamped to its
    /// track; the offset is recovered by inverting the resting formula
    /// against `total_height`, the scrollback extent at this instant
    /// (history may have grown since the last scroll).
    pub fn drag_to(&mut self, y: f32, total_height: i32) -> Option<i32> {
        if self.state != ThumbState::Dragging || total_height <= 0 {
            return None;
        }
        self.total_height = total_height;
        let travel = (self.view_height - self.thumb_height).max(1);
        self.thumb_y = (y as i32 - self.thumb_height / 2).clamp(0, travel);
        let fraction = self.thumb_y as f32 / travel as f32;
        Some((-total_height as f32 * (1.0 - fraction)).round() as i32)
    }

    pub fn end_drag(&mut self, now: Instant) {
        trace!("thumb drag end");
        self.show(now, self.post_drag_delay);
    }

    /// Advance fade animation. Returns whether the caller needs to redraw.
    pub fn on_frame(&mut self, now: Instant) -> bool {
        match self.state {
            ThumbState::Visible => {
                if self.fade_deadline.is_some_and(|d| now >= d) {
                    self.state = ThumbState::FadingOut;
                    self.fade_started = Some(now);
                    self.fade_deadline = None;
                    true
                } else {
                    false
                }
            }
            ThumbState::FadingOut => {
                let Some(started) = self.fade_started else {
                    self.hide();
                    return true;
                };
                let elapsed = now.saturating_duration_since(started);
                if elapsed >= self.fade_duration {
                    self.hide();
                } else {
                    let remain = 1.0 - elapsed.as_secs_f32() / self.fade_duration.as_secs_f32();
                    self.alpha = (ALPHA_MAX as f32 * remain) as u8;
                }
                true
            }
            ThumbState::Hidden | ThumbState::Dragging => false,
        }
    }

    /// Whether a future frame will change state without further input.
    pub fn is_animating(&self) -> bool {
        matches!(self.state, ThumbState::FadingOut)
            || (self.state == ThumbState::Visible && self.fade_deadline.is_some())
    }

    /// Thumb rectangle to draw, or None while hidden.
    pub fn thumb_rect(&self) -> Option<PixelRect> {
        if self.state == ThumbState::Hidden {
            return None;
        }
        Some(PixelRect {
            x: self.view_width - self.thumb_width,
            y: self.thumb_y,
            width: self.thumb_width,
            height: self.thumb_height,
        })
    }

    fn show(&mut self, now: Instant, delay: Duration) {
        self.state = ThumbState::Visible;
        self.alpha = ALPHA_MAX;
        self.fade_deadline = Some(now + delay);
        self.fade_started = None;
    }

    fn hide(&mut self) {
        self.state = ThumbState::Hidden;
        self.alpha = 0;
        self.fade_deadline = None;
        self.fade_started = None;
    }
}
