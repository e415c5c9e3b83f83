// src/lifecycle/mod.rs

//! Per-service process lifecycle: spawn a placeholder process, wait for it
//! to be running, exec the test inside it, and always stop it afterwards.
//!
//! - [`guard`] owns the "always stop" part.
//! - [`readiness`] owns the bounded wait for the running state.

pub mod guard;
pub mod readiness;

use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{Result, SvctestError};
use crate::exec::ExecSession;
use crate::manifest::ServiceSpec;
use crate::platform::{Platform, ProcessHandle, ProcessRunOptions};
use crate::types::{ReleaseRef, RunTimeout, TestOutcome};

pub use guard::ProcessGuard;
pub use readiness::{ReadinessPolicy, wait_for_running};

/// Runs one service's test at a time against a fixed app and release.
pub struct LifecycleCoordinator<P: Platform + ?Sized + 'static> {
    platform: Arc<P>,
    app: String,
    release: ReleaseRef,
    timeout: RunTimeout,
    readiness: ReadinessPolicy,
}

impl<P: Platform + ?Sized + 'static> LifecycleCoordinator<P> {
    pub fn new(
        platform: Arc<P>,
        app: impl Into<String>,
        release: ReleaseRef,
        timeout: RunTimeout,
        readiness: ReadinessPolicy,
    ) -> Self {
        Self {
            platform,
            app: app.into(),
            release,
            timeout,
            readiness,
        }
    }

    pub fn release(&self) -> &ReleaseRef {
        &self.release
    }

    /// Run `service`'s test command inside a fresh placeholder process.
    ///
    /// A non-zero exit is returned as `TestOutcome::Exited(code)`, not as an
    /// error. Once the spawn succeeds, the process receives exactly one stop
    /// request whatever happens afterwards.
    pub async fn run_test(
        &self,
        service: &ServiceSpec,
        session: &ExecSession,
    ) -> Result<TestOutcome> {
        if !service.has_test() {
            debug!(service = %service.name, "no test command; skipping");
            return Ok(TestOutcome::Skipped);
        }

        let opts = ProcessRunOptions {
            command: self.timeout.placeholder_command(),
            release: self.release.clone(),
        };
        let handle = self
            .platform
            .process_run(&self.app, &service.name, opts)
            .await
            .map_err(|source| SvctestError::Spawn {
                service: service.name.clone(),
                source,
            })?;

        info!(
            service = %service.name,
            process = %handle.id,
            release = %handle.release,
            "placeholder process started"
        );

        let guard = ProcessGuard::new(
            Arc::clone(&self.platform),
            self.app.clone(),
            handle.id.clone(),
        );
        let result = self.wait_and_exec(&handle, service, session).await;
        guard.release().await;
        result
    }

    async fn wait_and_exec(
        &self,
        handle: &ProcessHandle,
        service: &ServiceSpec,
        session: &ExecSession,
    ) -> Result<TestOutcome> {
        wait_for_running(self.platform.as_ref(), &self.app, &handle.id, &self.readiness).await?;

        let code = self
            .platform
            .process_exec(&self.app, &handle.id, &service.test, session)
            .await
            .map_err(|source| SvctestError::ExecTransport {
                process: handle.id.clone(),
                source,
            })?;

        info!(
            service = %service.name,
            process = %handle.id,
            exit_code = code,
            "test command exited"
        );
        Ok(TestOutcome::Exited(code))
    }
}
