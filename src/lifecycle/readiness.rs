// src/lifecycle/readiness.rs

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use crate::errors::{Result, SvctestError};
use crate::platform::{Platform, ProcessStatus};

/// How to poll for a process to become running.
///
/// The poll interval starts at `initial_interval` and doubles after every
/// poll, capped at `max_interval`. Polling stops once `deadline` has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub deadline: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(5),
            deadline: Duration::from_secs(5 * 60),
        }
    }
}

/// Block until process `id` reports [`ProcessStatus::Running`].
///
/// Fails with:
/// - [`SvctestError::ProcessExited`] if it exits before running,
/// - [`SvctestError::ExecTransport`] if the status query fails,
/// - [`SvctestError::ReadinessTimeout`] once the deadline passes.
pub async fn wait_for_running<P>(
    platform: &P,
    app: &str,
    id: &str,
    policy: &ReadinessPolicy,
) -> Result<()>
where
    P: Platform + ?Sized,
{
    let started = Instant::now();
    // `None`: the deadline lies beyond what `Instant` can represent.
    let deadline = started.checked_add(policy.deadline);
    let mut interval = policy.initial_interval;
    let mut polls: u32 = 0;

    loop {
        polls += 1;
        let status = platform
            .process_get(app, id)
            .await
            .map_err(|source| SvctestError::ExecTransport {
                process: id.to_string(),
                source,
            })?;

        match status {
            ProcessStatus::Running => {
                debug!(process = %id, polls, "process is running");
                return Ok(());
            }
            ProcessStatus::Exited(code) => {
                return Err(SvctestError::ProcessExited {
                    process: id.to_string(),
                    code,
                });
            }
            ProcessStatus::Pending => {
                trace!(process = %id, polls, "process not running yet");
            }
        }

        let now = Instant::now();
        let nap = match deadline {
            Some(deadline) if now >= deadline => {
                return Err(SvctestError::ReadinessTimeout {
                    process: id.to_string(),
                    waited: now - started,
                });
            }
            Some(deadline) => interval.min(deadline - now),
            None => interval,
        };

        sleep(nap).await;
        interval = interval.saturating_mul(2).min(policy.max_interval);
    }
}
