// src/manifest/fetch.rs

use tracing::debug;

use crate::errors::{Result, SvctestError};
use crate::manifest::model::Manifest;
use crate::platform::Platform;
use crate::types::ReleaseRef;

/// Fetch the manifest of `release`. Platform failures become
/// [`SvctestError::Manifest`].
pub async fn fetch_manifest<P>(platform: &P, app: &str, release: &ReleaseRef) -> Result<Manifest>
where
    P: Platform + ?Sized,
{
    let manifest = platform
        .release_manifest(app, release)
        .await
        .map_err(SvctestError::Manifest)?;

    debug!(
        app,
        release = %release,
        services = manifest.services.len(),
        "fetched release manifest"
    );
    Ok(manifest)
}
