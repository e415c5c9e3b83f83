#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use svctest::lifecycle::ReadinessPolicy;
use svctest::manifest::{Manifest, ServiceSpec};
use svctest::platform::BuildOptions;
use svctest::runner::TestPlan;
use svctest::types::RunTimeout;

/// Builder for `Manifest` to simplify test setup.
pub struct ManifestBuilder {
    services: Vec<ServiceSpec>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self { services: vec![] }
    }

    /// Add a service; an empty `test` means the service has no test.
    pub fn service(mut self, name: &str, test: &str) -> Self {
        self.services.push(ServiceSpec::new(name, test));
        self
    }

    pub fn build(self) -> Manifest {
        Manifest::new(self.services)
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Readiness policy that polls every millisecond and gives up quickly.
pub fn fast_readiness() -> ReadinessPolicy {
    ReadinessPolicy {
        initial_interval: Duration::from_millis(1),
        max_interval: Duration::from_millis(4),
        deadline: Duration::from_millis(50),
    }
}

/// Builder for `TestPlan`.
pub struct TestPlanBuilder {
    plan: TestPlan,
}

impl TestPlanBuilder {
    pub fn new(app: &str) -> Self {
        Self {
            plan: TestPlan {
                app: app.to_string(),
                release: None,
                source_dir: PathBuf::from("."),
                build: BuildOptions::default(),
                timeout: RunTimeout::default(),
                readiness: fast_readiness(),
            },
        }
    }

    pub fn release(mut self, release: &str) -> Self {
        self.plan.release = Some(release.to_string());
        self
    }

    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plan.source_dir = dir.into();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.plan.build.description = Some(description.to_string());
        self
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.plan.timeout = RunTimeout::from_secs(secs);
        self
    }

    pub fn readiness(mut self, policy: ReadinessPolicy) -> Self {
        self.plan.readiness = policy;
        self
    }

    pub fn build(self) -> TestPlan {
        self.plan
    }
}
