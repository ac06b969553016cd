//! Scroll coordination and momentum fling
//!
//! The coordinator owns the vertical pixel scroll offset, keeps it inside
//! `[-total_height, 0]`, and drives the fling animation as a cooperative
//! task ticked from the render loop — never a separate thread. In
//! alternate-screen mode there is no scrollback; vertical drags are instead
//! converted into arrow-key repeats (see [`alt_drag_keys`]).

use std::time::Instant;

use tracing::debug;

/// Tracks the decay of one momentum fling.
///
/// Velocity decays exponentially (`v(t) = v0 * e^(-friction * t)`), giving
/// the closed-form position `v0/friction * (1 - e^(-friction * t))` from the
/// fling origin.
#[derive(Debug, Clone, Copy)]
struct Fling {
    initial_velocity: f32,
    friction: f32,
    started: Instant,
    origin: i32,
    last_pos: i32,
}

impl Fling {
    fn new(initial_velocity: f32, friction: f32, origin: i32, now: Instant) -> Self {
        Self {
            initial_velocity,
            friction,
            started: now,
            origin,
            last_pos: origin,
        }
    }

    fn position(&self, now: Instant) -> i32 {
        let t = now.saturating_duration_since(self.started).as_secs_f32();
        let travelled = self.initial_velocity / self.friction * (1.0 - (-self.friction * t).exp());
        self.origin + travelled.round() as i32
    }
}

/// Owns the vertical scroll offset and the optional in-flight fling.
#[derive(Debug)]
pub struct ScrollCoordinator {
    /// Pixel offset, always in `[-total_height, 0]`
    scroll_y: i32,
    friction: f32,
    fling: Option<Fling>,
}

impl ScrollCoordinator {
    pub fn new(friction: f32) -> Self {
        Self {
            scroll_y: 0,
            friction: friction.max(0.1),
            fling: None,
        }
    }

    /// Current pixel offset (non-positive).
    pub fn offset(&self) -> i32 {
        self.scroll_y
    }

    /// Clamp `y` into `[-total_height, 0]` and commit it. Returns whether
    /// the offset actually changed.
    pub fn scroll_to(&mut self, y: i32, total_height: i32) -> bool {
        let clamped = y.clamp(-total_height.max(0), 0);
        if clamped == self.scroll_y {
            return false;
        }
        self.scroll_y = clamped;
        true
    }

    /// Relative scroll; same clamping and change reporting as `scroll_to`.
    pub fn scroll_by(&mut self, delta: i32, total_height: i32) -> bool {
        self.scroll_to(self.scroll_y + delta, total_height)
    }

    /// Start a momentum fling with a signed initial velocity in scroll-space
    /// pixels per second (negative scrolls into history). Replaces any fling
    /// already running. No-op on the alternate screen, where there is no
    /// scrollback to fling through.
    pub fn start_fling(&mut self, initial_velocity: f32, now: Instant, alt_screen: bool) {
        if alt_screen {
            return;
        }
        debug!(initial_velocity, "fling start");
        self.fling = Some(Fling::new(
            initial_velocity,
            self.friction,
            self.scroll_y,
            now,
        ));
    }

    /// Cancel any in-flight fling. Idempotent; safe to call from
    /// gesture-start, a new fling start, or an external reset.
    pub fn cancel_fling(&mut self) {
        if self.fling.take().is_some() {
            debug!("fling cancelled");
        }
    }

    pub fn is_flinging(&self) -> bool {
        self.fling.is_some()
    }

    /// One cooperative animation tick. Returns whether the offset moved;
    /// when the trajectory settles (no position delta between ticks, or the
    /// offset pinned at a bound) the fling ends and deregisters itself.
    pub fn on_frame(&mut self, now: Instant, total_height: i32) -> bool {
        let Some(mut fling) = self.fling else {
            return false;
        };
        let pos = fling.position(now);
        let delta = pos - fling.last_pos;
        fling.last_pos = pos;
        let changed = self.scroll_to(self.scroll_y + delta, total_height);
        if delta == 0 || !changed {
            self.fling = None;
        } else {
            self.fling = Some(fling);
        }
        changed
    }
}

/// Convert accumulated alternate-screen drag pixels into arrow-key repeats.
///
/// Returns `(count, consumed_px)`: `count` is positive for down keys,
/// negative for up; `consumed_px` carries the same sign and must be
/// subtracted from the running accumulator so fractional-row drags persist
/// across input events instead of being dropped.
pub fn alt_drag_keys(accum: f32, row_height: i32) -> (i32, f32) {
    let rh = row_height.max(1) as f32;
    let count = (accum.abs() / rh) as i32;
    if count == 0 {
        return (0, 0.0);
    }
    let consumed = count as f32 * rh;
    if accum > 0.0 {
        (count, consumed)
    } else {
        (-count, -consumed)
    }
}
