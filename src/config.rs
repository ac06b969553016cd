//! Configuration for the terminal view

use serde::{Deserialize, Serialize};

/// Pixel margins between the view edges and the character grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

/// Tunables for gestures, fling physics, and the fast-scroll indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Movement threshold in pixels before a touch becomes a drag
    pub touch_slop: f32,
    /// Delay before a stationary press fires a long-press
    pub long_press_ms: u64,
    /// Release velocity below this never starts a fling (px/s)
    pub min_fling_velocity: f32,
    /// Release velocity is clamped to this (px/s)
    pub max_fling_velocity: f32,
    /// Exponential decay constant for fling velocity (1/s)
    pub fling_friction: f32,
    /// Idle time before the fast-scroll thumb starts fading
    pub fade_idle_ms: u64,
    /// Shorter fade delay after releasing a thumb drag
    pub fade_after_drag_ms: u64,
    /// Duration of the fade-out alpha ramp
    pub fade_duration_ms: u64,
    /// Fast-scroll thumb width in pixels
    pub thumb_width: i32,
    /// Fast-scroll thumb height in pixels
    pub thumb_height: i32,
    /// Selections longer than this many characters are rejected on copy
    pub max_copy_len: usize,
    /// Margins around the character grid
    pub margins: Margins,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            touch_slop: 16.0,
            long_press_ms: 500,
            min_fling_velocity: 50.0,
            max_fling_velocity: 8000.0,
            fling_friction: 3.0,
            fade_idle_ms: 1500,
            fade_after_drag_ms: 1000,
            fade_duration_ms: 250,
            thumb_width: 16,
            thumb_height: 64,
            max_copy_len: 99 * 1024,
            margins: Margins::default(),
        }
    }
}

impl ViewConfig {
    /// Load a configuration from a JSON document. Missing fields fall back
    /// to their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
