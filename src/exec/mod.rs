// src/exec/mod.rs

//! Exec channel configuration.
//!
//! - [`session`] builds the per-exec [`ExecSession`] options.
//! - [`terminal`] abstracts the caller's terminal state (stdin TTY, size) so
//!   session building can be driven by injected values in tests.

pub mod session;
pub mod terminal;

pub use session::ExecSession;
pub use terminal::{FixedTerminal, HostTerminal, TerminalProbe};
