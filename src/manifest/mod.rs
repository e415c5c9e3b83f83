// src/manifest/mod.rs

//! Release manifests: which services a release has and how to test them.
//!
//! - [`model`] holds `ServiceSpec` / `Manifest` and the on-disk file format.
//! - [`validate`] checks names and uniqueness.
//! - [`fetch`] asks the platform for a release's manifest.

pub mod fetch;
pub mod model;
pub mod validate;

pub use fetch::fetch_manifest;
pub use model::{MANIFEST_FILE_NAME, Manifest, ServiceSpec};
pub use validate::{is_valid_name, validate_manifest};
