// src/manifest/model.rs

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::manifest::validate::validate_manifest;

/// Name of the manifest file a source directory must contain.
pub const MANIFEST_FILE_NAME: &str = "svctest-manifest.toml";

/// One service declared by a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,

    /// Test command; empty means "no test for this service".
    #[serde(default)]
    pub test: String,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, test: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            test: test.into(),
        }
    }

    pub fn has_test(&self) -> bool {
        !self.test.is_empty()
    }
}

/// Ordered list of services. Order is execution order.
///
/// ```toml
/// [[service]]
/// name = "web"
///
/// [[service]]
/// name = "worker"
/// test = "pytest"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default, rename = "service")]
    pub services: Vec<ServiceSpec>,
}

impl Manifest {
    pub fn new(services: Vec<ServiceSpec>) -> Self {
        Self { services }
    }

    /// Parse and validate manifest TOML.
    pub fn parse(contents: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(contents)?;
        validate_manifest(&manifest)?;
        Ok(manifest)
    }

    pub fn service(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.iter().find(|s| s.name == name)
    }
}
