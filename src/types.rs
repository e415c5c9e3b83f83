use std::fmt;

use serde::{Deserialize, Serialize};

/// Default lifetime, in seconds, of the placeholder process on the platform.
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 3600;

/// Identifier of an immutable, already-built release of an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseRef(String);

impl ReleaseRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How long the placeholder process is kept alive server-side, in seconds.
///
/// A value of zero is treated as "not set" and falls back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTimeout(u64);

impl RunTimeout {
    pub fn from_secs(secs: u64) -> Self {
        if secs == 0 {
            Self::default()
        } else {
            Self(secs)
        }
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Inert command that holds the process slot for the whole timeout.
    pub fn placeholder_command(&self) -> String {
        format!("sleep {}", self.0)
    }
}

impl Default for RunTimeout {
    fn default() -> Self {
        RunTimeout(DEFAULT_RUN_TIMEOUT_SECS)
    }
}

/// Outcome of one service's test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    /// The service declares no test command.
    Skipped,
    /// The test command ran and exited with this code.
    Exited(i32),
}
