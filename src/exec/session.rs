// src/exec/session.rs

use crate::exec::terminal::TerminalProbe;

/// Options for a single exec call inside a running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecSession {
    /// Run the command in place of the process's entrypoint.
    pub entrypoint: bool,
    pub width: Option<u16>,
    pub height: Option<u16>,
    /// `Some(false)` disables TTY allocation; `None` leaves the platform
    /// default (allocated).
    pub tty: Option<bool>,
}

impl ExecSession {
    /// Build a session from explicit terminal state.
    pub fn build(stdin_is_terminal: bool, size: Option<(u16, u16)>) -> Self {
        let (width, height) = match size {
            Some((w, h)) => (Some(w), Some(h)),
            None => (None, None),
        };

        Self {
            entrypoint: true,
            width,
            height,
            tty: if stdin_is_terminal { None } else { Some(false) },
        }
    }

    /// Query `probe` now and build a session from its answers.
    pub fn probe(probe: &dyn TerminalProbe) -> Self {
        Self::build(probe.stdin_is_terminal(), probe.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::FixedTerminal;

    #[test]
    fn interactive_terminal_keeps_default_tty_and_sets_size() {
        let session = ExecSession::build(true, Some((120, 40)));
        assert!(session.entrypoint);
        assert_eq!(session.width, Some(120));
        assert_eq!(session.height, Some(40));
        assert_eq!(session.tty, None);
    }

    #[test]
    fn piped_stdin_disables_tty_and_unknown_size_stays_unset() {
        let session = ExecSession::build(false, None);
        assert!(session.entrypoint);
        assert_eq!(session.width, None);
        assert_eq!(session.height, None);
        assert_eq!(session.tty, Some(false));
    }

    #[test]
    fn probe_reads_injected_state() {
        let term = FixedTerminal::new(false, Some((80, 24)));
        assert_eq!(ExecSession::probe(&term), ExecSession::build(false, Some((80, 24))));
    }
}
