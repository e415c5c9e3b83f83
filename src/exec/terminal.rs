// src/exec/terminal.rs

use std::io::IsTerminal;

/// Source of the caller's terminal state.
pub trait TerminalProbe: Send + Sync {
    fn stdin_is_terminal(&self) -> bool;

    /// `(width, height)` in columns/rows, if obtainable.
    fn size(&self) -> Option<(u16, u16)>;
}

/// The terminal this process is attached to.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostTerminal;

impl TerminalProbe for HostTerminal {
    fn stdin_is_terminal(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn size(&self) -> Option<(u16, u16)> {
        match crossterm::terminal::size() {
            Ok((w, h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

/// Fixed terminal state, for tests and non-interactive embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTerminal {
    pub stdin_is_terminal: bool,
    pub size: Option<(u16, u16)>,
}

impl FixedTerminal {
    pub fn new(stdin_is_terminal: bool, size: Option<(u16, u16)>) -> Self {
        Self {
            stdin_is_terminal,
            size,
        }
    }

    /// No TTY and no known size.
    pub fn detached() -> Self {
        Self::new(false, None)
    }
}

impl TerminalProbe for FixedTerminal {
    fn stdin_is_terminal(&self) -> bool {
        self.stdin_is_terminal
    }

    fn size(&self) -> Option<(u16, u16)> {
        self.size
    }
}
