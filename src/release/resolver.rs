// src/release/resolver.rs

use std::path::Path;

use tracing::info;

use crate::errors::{Result, SvctestError};
use crate::platform::{BuildOptions, Platform};
use crate::types::ReleaseRef;

/// Return `supplied` unchanged if it is non-empty, otherwise build
/// `source_dir` and return the new release.
///
/// Build failures are wrapped in [`SvctestError::Build`] and never retried.
pub async fn resolve_release<P>(
    platform: &P,
    app: &str,
    supplied: Option<&str>,
    source_dir: &Path,
    opts: &BuildOptions,
) -> Result<ReleaseRef>
where
    P: Platform + ?Sized,
{
    if let Some(release) = supplied.filter(|r| !r.is_empty()) {
        info!(app, release, "using existing release");
        return Ok(ReleaseRef::new(release));
    }

    info!(app, source = ?source_dir, "building release");
    let release = platform
        .build(app, source_dir, opts)
        .await
        .map_err(SvctestError::Build)?;

    info!(app, release = %release, "build complete");
    Ok(release)
}
