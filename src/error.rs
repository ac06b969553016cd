//! Error types for the view core.
//!
//! Coordinate arithmetic never errors; out-of-range rows and columns are
//! clamped at the point of use. Errors here cover the two cases that cannot
//! be clamped away: a dead engine session and an oversized copy request.

use thiserror::Error;

/// Fatal, session-invalidating failures at the engine boundary.
///
/// A session that reports one of these must be discarded; the view makes no
/// attempt to recover or retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The engine session handle is no longer valid.
    #[error("terminal session is closed")]
    Closed,

    /// The engine rejected a resize request.
    #[error("engine rejected resize to {cols}x{rows}")]
    ResizeFailed { cols: usize, rows: usize },
}

/// Failures when extracting selected text for the clipboard.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CopyError {
    /// No selection rectangle is set.
    #[error("no active selection")]
    Empty,

    /// The selection exceeds the copy cap. Oversized selections are
    /// rejected outright rather than truncated.
    #[error("selection of {len} characters exceeds the copy limit of {max}")]
    TooLarge { len: usize, max: usize },
}
