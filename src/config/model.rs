// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::lifecycle::ReadinessPolicy;
use crate::types::{RunTimeout, DEFAULT_RUN_TIMEOUT_SECS};

/// Configuration exactly as read from a TOML file.
///
/// ```toml
/// [config]
/// app = "shop"
/// timeout = 1800
/// state_dir = ".svctest"
///
/// [readiness]
/// initial_interval = "1s"
/// max_interval = "5s"
/// deadline = "5m"
/// ```
///
/// All sections are optional and have reasonable defaults. Convert into a
/// [`ConfigFile`] with `ConfigFile::try_from` to get validated, typed values.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub readiness: ReadinessSection,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Application name used when `--app` is not given.
    #[serde(default)]
    pub app: Option<String>,

    /// Lifetime of the placeholder process in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Where the local platform keeps releases.
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

fn default_timeout() -> u64 {
    DEFAULT_RUN_TIMEOUT_SECS
}

fn default_state_dir() -> String {
    ".svctest".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            app: None,
            timeout: default_timeout(),
            state_dir: default_state_dir(),
        }
    }
}

/// `[readiness]` section. Durations use `ms`, `s`, `m` or `h` suffixes.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadinessSection {
    #[serde(default = "default_initial_interval")]
    pub initial_interval: String,

    #[serde(default = "default_max_interval")]
    pub max_interval: String,

    #[serde(default = "default_deadline")]
    pub deadline: String,
}

fn default_initial_interval() -> String {
    "1s".to_string()
}

fn default_max_interval() -> String {
    "5s".to_string()
}

fn default_deadline() -> String {
    "5m".to_string()
}

impl Default for ReadinessSection {
    fn default() -> Self {
        Self {
            initial_interval: default_initial_interval(),
            max_interval: default_max_interval(),
            deadline: default_deadline(),
        }
    }
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (or `Default`), so
/// every instance satisfies the checks in `validate.rs`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub app: Option<String>,
    pub timeout: RunTimeout,
    pub state_dir: PathBuf,
    pub readiness: ReadinessPolicy,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        app: Option<String>,
        timeout: RunTimeout,
        state_dir: PathBuf,
        readiness: ReadinessPolicy,
    ) -> Self {
        Self {
            app,
            timeout,
            state_dir,
            readiness,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app: None,
            timeout: RunTimeout::default(),
            state_dir: PathBuf::from(default_state_dir()),
            readiness: ReadinessPolicy::default(),
        }
    }
}
