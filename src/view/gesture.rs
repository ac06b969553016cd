//! Touch gesture arbitration
//!
//! Pure state machine over one in-flight touch sequence. The facade feeds
//! it [`TouchEvent`]s plus a [`GestureContext`] snapshot of what lies under
//! the finger and reads back [`GestureAction`]s to apply. Keeping the
//! dispatcher free of view state makes the arbitration rules directly
//! testable.
//!
//! Priority for a new sequence: fast-scroll thumb wins outright, then a
//! selection-handle drag, then free drag (scroll, or arrow-key synthesis on
//! the alternate screen), then tap / long-press resolution.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::config::ViewConfig;
use crate::view::scroll::alt_drag_keys;
use crate::view::selection::SelectionHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Debug, Clone, Copy)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub x: f32,
    pub y: f32,
    pub time: Instant,
}

/// What lies under the touch point, sampled by the facade at touch-down.
#[derive(Debug, Clone, Copy, Default)]
pub struct GestureContext {
    pub thumb_hit: bool,
    pub handle_hit: Option<SelectionHandle>,
    pub alt_screen: bool,
    pub scrollable: bool,
    pub row_height: i32,
}

/// Side effects the facade applies in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    CancelFling,
    ThumbDragStart,
    ThumbDragMove { y: f32 },
    ThumbDragEnd,
    HandleDragMove { handle: SelectionHandle, x: f32, y: f32 },
    /// Relative scroll in pixels, positive toward the live edge
    ScrollBy { dy: i32 },
    /// Synthetic arrow keys, positive count is Down
    ArrowKeys { count: i32 },
    /// Scroll-space velocity in px/s
    Fling { velocity: f32 },
    Tap { x: f32, y: f32 },
    LongPress { x: f32, y: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragTarget {
    Thumb,
    Handle(SelectionHandle),
    Free,
}

/// Velocity from a short sliding window of recent motion samples; old
/// samples are dropped so a pause before release kills the fling.
#[derive(Debug)]
struct VelocityTracker {
    samples: Vec<(Instant, f32)>,
}

const VELOCITY_WINDOW: Duration = Duration::from_millis(100);

impl VelocityTracker {
    fn new() -> Self {
        Self {
            samples: Vec::with_capacity(16),
        }
    }

    fn push(&mut self, time: Instant, y: f32) {
        self.samples
            .retain(|(t, _)| time.saturating_duration_since(*t) <= VELOCITY_WINDOW);
        self.samples.push((time, y));
    }

    /// Vertical velocity in px/s, positive downward.
    fn velocity(&self) -> f32 {
        let (Some(first), Some(last)) = (self.samples.first(), self.samples.last()) else {
            return 0.0;
        };
        let dt = last.0.saturating_duration_since(first.0).as_secs_f32();
        if dt <= 0.0 {
            return 0.0;
        }
        (last.1 - first.1) / dt
    }
}

/// One slot of per-gesture state, created on touch-down and cleared on
/// touch-up or cancel.
#[derive(Debug)]
struct DragState {
    target: DragTarget,
    anchor_x: f32,
    anchor_y: f32,
    last_y: f32,
    past_slop: bool,
    /// Whether the drag actually scrolled or synthesized keys
    used: bool,
    /// Unconsumed alternate-screen drag pixels, carried across move events
    alt_accum: f32,
    long_press_at: Option<Instant>,
    long_press_fired: bool,
    velocity: VelocityTracker,
    alt_screen: bool,
    scrollable: bool,
    row_height: i32,
}

#[derive(Debug)]
pub struct GestureDispatcher {
    touch_slop: f32,
    long_press_delay: Duration,
    min_fling_velocity: f32,
    max_fling_velocity: f32,
    drag: Option<DragState>,
}

impl GestureDispatcher {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            touch_slop: config.touch_slop,
            long_press_delay: Duration::from_millis(config.long_press_ms),
            min_fling_velocity: config.min_fling_velocity,
            max_fling_velocity: config.max_fling_velocity,
            drag: None,
        }
    }

    pub fn is_dragging_thumb(&self) -> bool {
        matches!(
            self.drag.as_ref().map(|d| d.target),
            Some(DragTarget::Thumb)
        )
    }

    pub fn on_touch(&mut self, event: TouchEvent, ctx: GestureContext) -> Vec<GestureAction> {
        match event.phase {
            TouchPhase::Down => self.on_down(event, ctx),
            TouchPhase::Move => self.on_move(event),
            TouchPhase::Up => self.on_up(event),
            TouchPhase::Cancel => self.on_cancel(),
        }
    }

    /// Fire a pending long-press once its delay elapses without the finger
    /// moving past slop. Called from the frame loop.
    pub fn poll(&mut self, now: Instant) -> Option<GestureAction> {
        let drag = self.drag.as_mut()?;
        let deadline = drag.long_press_at?;
        if now < deadline {
            return None;
        }
        drag.long_press_at = None;
        drag.long_press_fired = true;
        trace!("long press fired");
        Some(GestureAction::LongPress {
            x: drag.anchor_x,
            y: drag.anchor_y,
        })
    }

    /// Earliest instant `poll` could fire, for frame scheduling.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.drag.as_ref().and_then(|d| d.long_press_at)
    }

    fn on_down(&mut self, event: TouchEvent, ctx: GestureContext) -> Vec<GestureAction> {
        let mut actions = vec![GestureAction::CancelFling];
        let target = if ctx.thumb_hit {
            actions.push(GestureAction::ThumbDragStart);
            DragTarget::Thumb
        } else if let Some(handle) = ctx.handle_hit {
            DragTarget::Handle(handle)
        } else {
            DragTarget::Free
        };
        let mut velocity = VelocityTracker::new();
        velocity.push(event.time, event.y);
        self.drag = Some(DragState {
            target,
            anchor_x: event.x,
            anchor_y: event.y,
            last_y: event.y,
            past_slop: false,
            used: false,
            alt_accum: 0.0,
            long_press_at: (target == DragTarget::Free)
                .then(|| event.time + self.long_press_delay),
            long_press_fired: false,
            velocity,
            alt_screen: ctx.alt_screen,
            scrollable: ctx.scrollable,
            row_height: ctx.row_height,
        });
        actions
    }

    fn on_move(&mut self, event: TouchEvent) -> Vec<GestureAction> {
        let Some(drag) = self.drag.as_mut() else {
            return Vec::new();
        };
        match drag.target {
            DragTarget::Thumb => {
                drag.last_y = event.y;
                vec![GestureAction::ThumbDragMove { y: event.y }]
            }
            DragTarget::Handle(handle) => {
                drag.last_y = event.y;
                vec![GestureAction::HandleDragMove {
                    handle,
                    x: event.x,
                    y: event.y,
                }]
            }
            DragTarget::Free => {
                drag.velocity.push(event.time, event.y);
                if !drag.past_slop {
                    let dx = event.x - drag.anchor_x;
                    let dy = event.y - drag.anchor_y;
                    if dx.hypot(dy) <= self.touch_slop || drag.long_press_fired {
                        drag.last_y = event.y;
                        return Vec::new();
                    }
                    drag.past_slop = true;
                    drag.long_press_at = None;
                }
                // Positive when the finger moves up, toward the live edge
                let dy = drag.last_y - event.y;
                drag.last_y = event.y;
                if drag.alt_screen {
                    drag.alt_accum += dy;
                    let (count, consumed) = alt_drag_keys(drag.alt_accum, drag.row_height);
                    drag.alt_accum -= consumed;
                    if count != 0 {
                        drag.used = true;
                        vec![GestureAction::ArrowKeys { count }]
                    } else {
                        Vec::new()
                    }
                } else {
                    let step = dy as i32;
                    if step != 0 {
                        drag.used = true;
                        vec![GestureAction::ScrollBy { dy: step }]
                    } else {
                        Vec::new()
                    }
                }
            }
        }
    }

    fn on_up(&mut self, event: TouchEvent) -> Vec<GestureAction> {
        let Some(mut drag) = self.drag.take() else {
            return Vec::new();
        };
        match drag.target {
            DragTarget::Thumb => vec![GestureAction::ThumbDragEnd],
            DragTarget::Handle(_) => Vec::new(),
            DragTarget::Free => {
                if drag.past_slop && drag.used && !drag.alt_screen && drag.scrollable {
                    drag.velocity.push(event.time, event.y);
                    let touch_v = drag.velocity.velocity();
                    if touch_v.abs() >= self.min_fling_velocity {
                        // Finger velocity downward continues revealing history
                        let v = (-touch_v)
                            .clamp(-self.max_fling_velocity, self.max_fling_velocity);
                        return vec![GestureAction::Fling { velocity: v }];
                    }
                    Vec::new()
                } else if !drag.past_slop && !drag.long_press_fired {
                    vec![GestureAction::Tap {
                        x: drag.anchor_x,
                        y: drag.anchor_y,
                    }]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn on_cancel(&mut self) -> Vec<GestureAction> {
        match self.drag.take().map(|d| d.target) {
            Some(DragTarget::Thumb) => vec![GestureAction::ThumbDragEnd],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> GestureDispatcher {
        GestureDispatcher::new(&ViewConfig::default())
    }

    fn ev(phase: TouchPhase, x: f32, y: f32, t: Instant, ms: u64) -> TouchEvent {
        TouchEvent {
            phase,
            x,
            y,
            time: t + Duration::from_millis(ms),
        }
    }

    fn free_ctx() -> GestureContext {
        GestureContext {
            scrollable: true,
            row_height: 20,
            ..Default::default()
        }
    }

    #[test]
    fn test_down_cancels_fling() {
        let mut gd = dispatcher();
        let t = Instant::now();
        let actions = gd.on_touch(ev(TouchPhase::Down, 100.0, 100.0, t, 0), free_ctx());
        assert_eq!(actions, vec![GestureAction::CancelFling]);
    }

    #[test]
    fn test_thumb_wins_over_everything() {
        let mut gd = dispatcher();
        let t = Instant::now();
        let ctx = GestureContext {
            thumb_hit: true,
            handle_hit: Some(SelectionHandle::Start),
            scrollable: true,
            row_height: 20,
            ..Default::default()
        };
        let actions = gd.on_touch(ev(TouchPhase::Down, 390.0, 100.0, t, 0), ctx);
        assert_eq!(
            actions,
            vec![GestureAction::CancelFling, GestureAction::ThumbDragStart]
        );
        assert!(gd.is_dragging_thumb());
        let actions = gd.on_touch(ev(TouchPhase::Move, 390.0, 300.0, t, 16), ctx);
        assert_eq!(actions, vec![GestureAction::ThumbDragMove { y: 300.0 }]);
        let actions = gd.on_touch(ev(TouchPhase::Up, 390.0, 300.0, t, 32), ctx);
        assert_eq!(actions, vec![GestureAction::ThumbDragEnd]);
        // No long-press can fire from a thumb sequence
        assert!(gd.poll(t + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_handle_drag_follows_finger_until_release() {
        let mut gd = dispatcher();
        let t = Instant::now();
        let ctx = GestureContext {
            handle_hit: Some(SelectionHandle::End),
            scrollable: true,
            row_height: 20,
            ..Default::default()
        };
        gd.on_touch(ev(TouchPhase::Down, 140.0, 80.0, t, 0), ctx);
        let actions = gd.on_touch(ev(TouchPhase::Move, 200.0, 120.0, t, 16), ctx);
        assert_eq!(
            actions,
            vec![GestureAction::HandleDragMove {
                handle: SelectionHandle::End,
                x: 200.0,
                y: 120.0
            }]
        );
        // A handle drag never turns into a fling or tap
        assert!(gd.on_touch(ev(TouchPhase::Up, 200.0, 120.0, t, 500), ctx).is_empty());
    }

    #[test]
    fn test_sub_slop_release_is_tap() {
        let mut gd = dispatcher();
        let t = Instant::now();
        gd.on_touch(ev(TouchPhase::Down, 100.0, 100.0, t, 0), free_ctx());
        gd.on_touch(ev(TouchPhase::Move, 105.0, 104.0, t, 50), free_ctx());
        let actions = gd.on_touch(ev(TouchPhase::Up, 105.0, 104.0, t, 80), free_ctx());
        assert_eq!(actions, vec![GestureAction::Tap { x: 100.0, y: 100.0 }]);
    }

    #[test]
    fn test_drag_past_slop_scrolls_and_kills_tap() {
        let mut gd = dispatcher();
        let t = Instant::now();
        gd.on_touch(ev(TouchPhase::Down, 100.0, 200.0, t, 0), free_ctx());
        // 30px downward exceeds the 16px slop: first recognized move scrolls
        let actions = gd.on_touch(ev(TouchPhase::Move, 100.0, 230.0, t, 16), free_ctx());
        assert_eq!(actions, vec![GestureAction::ScrollBy { dy: -30 }]);
        // Long press no longer pending
        assert!(gd.poll(t + Duration::from_secs(5)).is_none());
        // Slow release: velocity below threshold, no fling, no tap
        let actions = gd.on_touch(ev(TouchPhase::Up, 100.0, 230.0, t, 600), free_ctx());
        assert!(actions.is_empty());
    }

    #[test]
    fn test_fast_release_flings_with_inverted_velocity() {
        let mut gd = dispatcher();
        let t = Instant::now();
        gd.on_touch(ev(TouchPhase::Down, 100.0, 400.0, t, 0), free_ctx());
        // Finger sweeping downward at ~2000 px/s
        for i in 1..=6 {
            gd.on_touch(
                ev(TouchPhase::Move, 100.0, 400.0 + 32.0 * i as f32, t, 16 * i as u64),
                free_ctx(),
            );
        }
        let actions = gd.on_touch(ev(TouchPhase::Up, 100.0, 592.0, t, 96), free_ctx());
        assert_eq!(actions.len(), 1);
        let GestureAction::Fling { velocity } = actions[0] else {
            panic!("expected fling, got {:?}", actions[0]);
        };
        assert!(velocity < -1000.0, "downward sweep flings into history");
    }

    #[test]
    fn test_fling_clamped_to_max() {
        let mut gd = dispatcher();
        let t = Instant::now();
        gd.on_touch(ev(TouchPhase::Down, 100.0, 0.0, t, 0), free_ctx());
        gd.on_touch(ev(TouchPhase::Move, 100.0, 900.0, t, 16), free_ctx());
        let actions = gd.on_touch(ev(TouchPhase::Up, 100.0, 900.0, t, 32), free_ctx());
        assert_eq!(actions, vec![GestureAction::Fling { velocity: -8000.0 }]);
    }

    #[test]
    fn test_no_fling_when_not_scrollable() {
        let mut gd = dispatcher();
        let t = Instant::now();
        let ctx = GestureContext {
            scrollable: false,
            row_height: 20,
            ..Default::default()
        };
        gd.on_touch(ev(TouchPhase::Down, 100.0, 0.0, t, 0), ctx);
        gd.on_touch(ev(TouchPhase::Move, 100.0, 400.0, t, 16), ctx);
        let actions = gd.on_touch(ev(TouchPhase::Up, 100.0, 400.0, t, 32), ctx);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_alt_screen_drag_synthesizes_keys_with_remainder() {
        let mut gd = dispatcher();
        let t = Instant::now();
        let ctx = GestureContext {
            alt_screen: true,
            scrollable: false,
            row_height: 20,
            ..Default::default()
        };
        gd.on_touch(ev(TouchPhase::Down, 100.0, 300.0, t, 0), ctx);
        // 45px upward in two moves: 2 down-arrows, 5px carried over
        let actions = gd.on_touch(ev(TouchPhase::Move, 100.0, 270.0, t, 16), ctx);
        assert_eq!(actions, vec![GestureAction::ArrowKeys { count: 1 }]);
        let actions = gd.on_touch(ev(TouchPhase::Move, 100.0, 255.0, t, 32), ctx);
        assert_eq!(actions, vec![GestureAction::ArrowKeys { count: 1 }]);
        // 5px remain: another 15px completes the third row
        let actions = gd.on_touch(ev(TouchPhase::Move, 100.0, 240.0, t, 48), ctx);
        assert_eq!(actions, vec![GestureAction::ArrowKeys { count: 1 }]);
        // Release never flings on the alternate screen
        let actions = gd.on_touch(ev(TouchPhase::Up, 100.0, 240.0, t, 64), ctx);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_alt_screen_downward_drag_sends_up_keys() {
        let mut gd = dispatcher();
        let t = Instant::now();
        let ctx = GestureContext {
            alt_screen: true,
            row_height: 20,
            ..Default::default()
        };
        gd.on_touch(ev(TouchPhase::Down, 100.0, 100.0, t, 0), ctx);
        let actions = gd.on_touch(ev(TouchPhase::Move, 100.0, 145.0, t, 16), ctx);
        assert_eq!(actions, vec![GestureAction::ArrowKeys { count: -2 }]);
    }

    #[test]
    fn test_long_press_fires_once_after_delay() {
        let mut gd = dispatcher();
        let t = Instant::now();
        gd.on_touch(ev(TouchPhase::Down, 100.0, 100.0, t, 0), free_ctx());
        assert!(gd.poll(t + Duration::from_millis(499)).is_none());
        assert_eq!(
            gd.poll(t + Duration::from_millis(500)),
            Some(GestureAction::LongPress { x: 100.0, y: 100.0 })
        );
        assert!(gd.poll(t + Duration::from_millis(600)).is_none());
        // Release after a long-press is neither tap nor fling
        let actions = gd.on_touch(ev(TouchPhase::Up, 100.0, 100.0, t, 700), free_ctx());
        assert!(actions.is_empty());
    }

    #[test]
    fn test_motion_after_long_press_does_not_scroll() {
        let mut gd = dispatcher();
        let t = Instant::now();
        gd.on_touch(ev(TouchPhase::Down, 100.0, 100.0, t, 0), free_ctx());
        gd.poll(t + Duration::from_millis(500));
        // Post-long-press movement stays with the selection flow; slop
        // classification is suppressed for the rest of the sequence
        let actions = gd.on_touch(ev(TouchPhase::Move, 100.0, 160.0, t, 550), free_ctx());
        assert!(actions.is_empty());
    }

    #[test]
    fn test_cancel_clears_sequence() {
        let mut gd = dispatcher();
        let t = Instant::now();
        gd.on_touch(ev(TouchPhase::Down, 100.0, 100.0, t, 0), free_ctx());
        assert!(gd.on_touch(ev(TouchPhase::Cancel, 0.0, 0.0, t, 16), free_ctx()).is_empty());
        assert!(gd.poll(t + Duration::from_secs(1)).is_none());
        // Stray move after cancel is ignored
        assert!(gd.on_touch(ev(TouchPhase::Move, 100.0, 300.0, t, 32), free_ctx()).is_empty());
    }

    #[test]
    fn test_velocity_window_drops_stale_samples() {
        let mut gd = dispatcher();
        let t = Instant::now();
        gd.on_touch(ev(TouchPhase::Down, 100.0, 0.0, t, 0), free_ctx());
        // Fast sweep, then a long hold before release
        gd.on_touch(ev(TouchPhase::Move, 100.0, 300.0, t, 50), free_ctx());
        gd.on_touch(ev(TouchPhase::Move, 100.0, 300.0, t, 400), free_ctx());
        gd.on_touch(ev(TouchPhase::Move, 100.0, 300.0, t, 600), free_ctx());
        let actions = gd.on_touch(ev(TouchPhase::Up, 100.0, 300.0, t, 700), free_ctx());
        assert!(actions.is_empty(), "held release must not fling: {actions:?}");
    }
}
