// src/lifecycle/guard.rs

//! Scoped ownership of a platform process.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::platform::Platform;

/// Owns a started process and makes sure it is stopped exactly once.
///
/// The normal path is [`ProcessGuard::release`], which awaits the stop. If
/// the guard is dropped without being released (the owning future was
/// dropped, or a panic unwound through it), `Drop` hands the stop to the
/// current tokio runtime instead.
///
/// Stop failures are logged and swallowed: they must never mask the outcome
/// of the test itself.
pub struct ProcessGuard<P: Platform + ?Sized + 'static> {
    platform: Arc<P>,
    app: String,
    process: Option<String>,
}

impl<P: Platform + ?Sized + 'static> ProcessGuard<P> {
    pub fn new(platform: Arc<P>, app: impl Into<String>, process: impl Into<String>) -> Self {
        Self {
            platform,
            app: app.into(),
            process: Some(process.into()),
        }
    }

    /// Stop the process now and wait for the request to finish.
    pub async fn release(mut self) {
        if let Some(id) = self.process.take() {
            stop_quietly(self.platform.as_ref(), &self.app, &id).await;
        }
    }
}

impl<P: Platform + ?Sized + 'static> Drop for ProcessGuard<P> {
    fn drop(&mut self) {
        let Some(id) = self.process.take() else {
            return;
        };

        match Handle::try_current() {
            Ok(handle) => {
                let platform = Arc::clone(&self.platform);
                let app = self.app.clone();
                handle.spawn(async move {
                    stop_quietly(platform.as_ref(), &app, &id).await;
                });
            }
            Err(_) => {
                warn!(process = %id, "no async runtime available; process was not stopped");
            }
        }
    }
}

async fn stop_quietly<P: Platform + ?Sized>(platform: &P, app: &str, id: &str) {
    match platform.process_stop(app, id).await {
        Ok(()) => debug!(process = %id, "process stopped"),
        Err(e) => warn!(process = %id, error = %e, "failed to stop process"),
    }
}
