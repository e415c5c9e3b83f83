// src/errors.rs

//! Crate-wide error type.
//!
//! Every variant is terminal to a test run: the first failure in manifest
//! order stops the remaining services and is surfaced as-is to `main`.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SvctestError {
    #[error("build failed: {0:#}")]
    Build(anyhow::Error),

    #[error("manifest lookup failed: {0:#}")]
    Manifest(anyhow::Error),

    #[error("could not start process for service '{service}': {source:#}")]
    Spawn {
        service: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("process {process} did not reach running state within {waited:?}")]
    ReadinessTimeout { process: String, waited: Duration },

    #[error("process {process} exited with code {code} before it was running")]
    ProcessExited { process: String, code: i32 },

    #[error("exec in process {process} failed: {source:#}")]
    ExecTransport {
        process: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("test for service '{service}' failed: exit {code}")]
    TestFailure { service: String, code: i32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SvctestError {
    /// Exit code of the failing test, if this error is a test failure.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            SvctestError::TestFailure { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SvctestError>;
