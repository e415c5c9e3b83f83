// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `svctest`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "svctest",
    version,
    about = "Run each service's test command inside a process of a release.",
    long_about = None
)]
pub struct CliArgs {
    /// Source directory to build from.
    ///
    /// Default: the current working directory.
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Application name.
    ///
    /// If omitted, `[config].app` or the source directory's name is used.
    #[arg(short, long, value_name = "NAME")]
    pub app: Option<String>,

    /// Description recorded with the build.
    #[arg(short, long, value_name = "TEXT")]
    pub description: Option<String>,

    /// Use an existing release to run tests (skips the build).
    #[arg(long, value_name = "ID")]
    pub release: Option<String>,

    /// Seconds the placeholder process stays alive (0 = default).
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Svctest.toml` in the current working directory. A missing
    /// default file is not an error.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SVCTEST_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve the release and print which tests would run, but run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
