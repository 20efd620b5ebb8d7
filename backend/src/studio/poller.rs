//! Job poller
//!
//! Drives a long-running provider job to completion by checking its status at
//! a fixed interval. The wait is unbounded unless a timeout is configured;
//! a cancellation token can stop it between checks.

use crate::studio::error::StudioError;
use crate::studio::types::{JobHandle, JobOutcome};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Bounded-interval poller for long-running jobs
#[derive(Debug, Clone)]
pub struct JobPoller {
    interval: Duration,
    timeout: Option<Duration>,
}

impl JobPoller {
    /// Create a poller; `timeout = None` waits forever
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }

    /// Check interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll `handle` with `check` until it reports completion
    ///
    /// Returns the artifact locator of the finished job.
    ///
    /// # Errors
    /// * `StudioError::Provider` if the job finished with a failure or without
    ///   an artifact, or if a check failed
    /// * `StudioError::Timeout` if the configured timeout elapsed
    /// * `StudioError::Cancelled` if `cancel` fired while waiting
    pub async fn wait<F, Fut>(
        &self,
        mut handle: JobHandle,
        mut check: F,
        cancel: &CancellationToken,
    ) -> Result<String, StudioError>
    where
        F: FnMut(JobHandle) -> Fut,
        Fut: Future<Output = Result<JobHandle, StudioError>>,
    {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut attempt: u64 = 0;

        while !handle.done {
            let sleep = tokio::time::sleep(self.interval);
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(job = %handle.name, attempt, "Job polling cancelled");
                    return Err(StudioError::Cancelled);
                }
                _ = sleep => {}
            }

            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    let secs = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
                    warn!(job = %handle.name, attempt, timeout_secs = secs, "Job polling timed out");
                    return Err(StudioError::Timeout(secs));
                }
            }

            attempt += 1;
            debug!(job = %handle.name, attempt, "Checking job status");
            handle = check(handle).await?;
        }

        info!(job = %handle.name, attempts = attempt, "Job completed");

        match handle.outcome {
            Some(JobOutcome::Artifact(locator)) if !locator.is_empty() => Ok(locator),
            Some(JobOutcome::Failed(message)) => Err(StudioError::Provider(message)),
            _ => Err(StudioError::provider("no artifact produced")),
        }
    }
}
