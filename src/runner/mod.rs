// src/runner/mod.rs

//! Whole-run orchestration.
//!
//! [`prepare`] resolves the release and its manifest; [`TestRun::run_all`]
//! then walks the services in manifest order, one full process lifecycle at
//! a time, and stops at the first failure.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::errors::{Result, SvctestError};
use crate::exec::{ExecSession, TerminalProbe};
use crate::lifecycle::{LifecycleCoordinator, ReadinessPolicy};
use crate::manifest::{Manifest, ServiceSpec, fetch_manifest};
use crate::platform::{BuildOptions, Platform};
use crate::release::resolve_release;
use crate::types::{ReleaseRef, RunTimeout, TestOutcome};

/// Everything needed to run one invocation's tests.
#[derive(Debug, Clone)]
pub struct TestPlan {
    pub app: String,
    /// Existing release to use; `None` (or empty) builds `source_dir`.
    pub release: Option<String>,
    pub source_dir: PathBuf,
    pub build: BuildOptions,
    pub timeout: RunTimeout,
    pub readiness: ReadinessPolicy,
}

/// Per-service outcomes of a run in which every test passed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub results: Vec<(String, TestOutcome)>,
}

impl RunSummary {
    pub fn tested(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, o)| matches!(o, TestOutcome::Exited(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, o)| *o == TestOutcome::Skipped)
            .count()
    }
}

/// Sequential, fail-fast test runner over a manifest's services.
pub struct TestRun<P: Platform + ?Sized + 'static> {
    coordinator: LifecycleCoordinator<P>,
    terminal: Arc<dyn TerminalProbe>,
}

impl<P: Platform + ?Sized + 'static> TestRun<P> {
    pub fn new(coordinator: LifecycleCoordinator<P>, terminal: Arc<dyn TerminalProbe>) -> Self {
        Self {
            coordinator,
            terminal,
        }
    }

    /// Run every declared test in order.
    ///
    /// Returns the first coordinator error unchanged, or
    /// [`SvctestError::TestFailure`] for the first non-zero exit. Services
    /// after a failure are never started.
    pub async fn run_all(&self, services: &[ServiceSpec]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for service in services {
            if !service.has_test() {
                summary.results.push((service.name.clone(), TestOutcome::Skipped));
                continue;
            }

            println!("Running {} on {}", service.test, service.name);
            info!(
                service = %service.name,
                command = %service.test,
                release = %self.coordinator.release(),
                "running test"
            );

            // Re-queried per service; the terminal may have been resized.
            let session = ExecSession::probe(self.terminal.as_ref());
            let outcome = self.coordinator.run_test(service, &session).await?;

            if let TestOutcome::Exited(code) = outcome {
                if code != 0 {
                    return Err(SvctestError::TestFailure {
                        service: service.name.clone(),
                        code,
                    });
                }
            }
            summary.results.push((service.name.clone(), outcome));
        }

        Ok(summary)
    }
}

/// Resolve the plan's release and fetch its manifest.
pub async fn prepare<P>(platform: &P, plan: &TestPlan) -> Result<(ReleaseRef, Manifest)>
where
    P: Platform + ?Sized,
{
    let release = resolve_release(
        platform,
        &plan.app,
        plan.release.as_deref(),
        &plan.source_dir,
        &plan.build,
    )
    .await?;
    let manifest = fetch_manifest(platform, &plan.app, &release).await?;
    Ok((release, manifest))
}

/// Resolve, fetch and run: the full test command.
pub async fn run_tests<P>(
    platform: Arc<P>,
    terminal: Arc<dyn TerminalProbe>,
    plan: &TestPlan,
) -> Result<RunSummary>
where
    P: Platform + ?Sized + 'static,
{
    let (release, manifest) = prepare(platform.as_ref(), plan).await?;

    let coordinator = LifecycleCoordinator::new(
        platform,
        plan.app.clone(),
        release,
        plan.timeout,
        plan.readiness,
    );
    TestRun::new(coordinator, terminal)
        .run_all(&manifest.services)
        .await
}
