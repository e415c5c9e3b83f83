// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod lifecycle;
pub mod logging;
pub mod manifest;
pub mod platform;
pub mod release;
pub mod runner;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_or_default};
use crate::errors::{Result, SvctestError};
use crate::exec::HostTerminal;
use crate::manifest::{Manifest, is_valid_name};
use crate::platform::{BuildOptions, LocalPlatform};
use crate::runner::{TestPlan, prepare, run_tests};
use crate::types::{ReleaseRef, RunTimeout};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the local platform
/// - release resolution + manifest lookup
/// - the sequential test run
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;
    let plan = plan_from_args(&args, &cfg)?;
    debug!(?plan, "test plan");

    let platform = Arc::new(LocalPlatform::new(cfg.state_dir.clone()));

    if args.dry_run {
        let (release, manifest) = prepare(platform.as_ref(), &plan).await?;
        print_dry_run(&plan, &release, &manifest);
        return Ok(());
    }

    let summary = run_tests(platform, Arc::new(HostTerminal), &plan).await?;
    info!(
        tested = summary.tested(),
        skipped = summary.skipped(),
        "all tests passed"
    );
    Ok(())
}

/// Merge CLI flags over the config file.
pub fn plan_from_args(args: &CliArgs, cfg: &ConfigFile) -> Result<TestPlan> {
    let source_dir = args.dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let app = app_name(args.app.as_deref(), cfg, &source_dir)?;

    let timeout = match args.timeout {
        Some(secs) if secs > 0 => RunTimeout::from_secs(secs),
        _ => cfg.timeout,
    };

    Ok(TestPlan {
        app,
        release: args.release.clone(),
        source_dir,
        build: BuildOptions {
            description: args.description.clone(),
        },
        timeout,
        readiness: cfg.readiness,
    })
}

/// `--app`, then `[config].app`, then the source directory's name.
fn app_name(flag: Option<&str>, cfg: &ConfigFile, source_dir: &Path) -> Result<String> {
    let name = match flag.or(cfg.app.as_deref()) {
        Some(name) => name.to_string(),
        None => {
            let dir = std::fs::canonicalize(source_dir)?;
            dir.file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .ok_or_else(|| {
                    SvctestError::Config(format!(
                        "cannot derive an app name from {:?}; pass --app",
                        source_dir
                    ))
                })?
        }
    };

    if !is_valid_name(&name) {
        return Err(SvctestError::Config(format!(
            "invalid app name '{}'; pass --app",
            name
        )));
    }
    Ok(name)
}

fn print_dry_run(plan: &TestPlan, release: &ReleaseRef, manifest: &Manifest) {
    println!("svctest dry-run");
    println!("  app = {}", plan.app);
    println!("  release = {}", release);
    println!("  timeout = {}s", plan.timeout.as_secs());
    println!();

    println!("services ({}):", manifest.services.len());
    for service in &manifest.services {
        if service.has_test() {
            println!("  - {}: {}", service.name, service.test);
        } else {
            println!("  - {} (no test)", service.name);
        }
    }

    debug!("dry-run complete (no processes started)");
}
