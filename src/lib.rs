//! Terminal view core
//!
//! Rendering and interaction layer for an external terminal-emulation
//! engine reached through the [`session::TerminalSession`] trait. This
//! crate owns everything between raw touch/key input and painted cells:
//!
//! - `session`: the engine boundary (cell runs, input dispatch, events)
//! - `view`: scroll coordination with momentum fling, fast-scroll
//!   indicator, text selection, gesture arbitration, damage coalescing
//!   and the line render pass
//! - `config`: tunables for gestures, fling physics and indicator fades
//!
//! It contains no escape-sequence parsing, grid storage or pty handling;
//! those live on the engine side of the boundary.

pub mod config;
pub mod error;
pub mod session;
pub mod view;

pub use config::ViewConfig;
pub use session::TerminalSession;
pub use view::TerminalView;
