//! Job queue: bounded worker pool, per-asset uniqueness, retry, and timeouts.
//!
//! Shutdown: [`JobQueue::shutdown`] stops admitting jobs still waiting for a
//! worker permit; it does not wait for in-flight jobs. For graceful shutdown,
//! allow time for running jobs to finish before process exit.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use uuid::Uuid;
use vodpipe_core::{Job, JobKind, PipelineConfig};

use crate::handler::JobHandler;

/// Retry policy for one job kind. Backoff between attempts is fixed.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub retry_backoff: Duration,
}

#[derive(Clone)]
pub struct JobQueueConfig {
    pub max_workers: usize,
    pub transcode: RetryPolicy,
    pub acquire: RetryPolicy,
}

impl JobQueueConfig {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_workers: config.max_workers,
            transcode: RetryPolicy {
                max_attempts: config.transcode_max_attempts,
                attempt_timeout: Duration::from_secs(config.transcode_timeout_seconds),
                retry_backoff: Duration::from_secs(config.transcode_retry_backoff_seconds),
            },
            acquire: RetryPolicy {
                max_attempts: config.acquire_max_attempts,
                attempt_timeout: Duration::from_secs(config.acquire_timeout_seconds),
                retry_backoff: Duration::from_secs(config.acquire_retry_backoff_seconds),
            },
        }
    }
}

impl Default for JobQueueConfig {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("asset {0} already has a job in flight")]
    AlreadyRunning(Uuid),
}

/// Terminal result of one job, after all retries.
#[derive(Debug)]
pub enum JobOutcome {
    Completed { attempts: u32 },
    Failed { attempts: u32, error: String },
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }
}

/// Semaphore-bounded job runner. At most `max_workers` jobs execute at once;
/// jobs submitted beyond that wait for a permit. An asset can have only one
/// job in flight at a time, whatever its kind.
pub struct JobQueue {
    transcode_handler: Arc<dyn JobHandler>,
    acquire_handler: Arc<dyn JobHandler>,
    config: JobQueueConfig,
    semaphore: Arc<Semaphore>,
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

impl JobQueue {
    pub fn new(
        config: JobQueueConfig,
        transcode_handler: Arc<dyn JobHandler>,
        acquire_handler: Arc<dyn JobHandler>,
    ) -> Self {
        tracing::info!(max_workers = config.max_workers, "Job queue started");
        Self {
            transcode_handler,
            acquire_handler,
            semaphore: Arc::new(Semaphore::new(config.max_workers)),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            config,
        }
    }

    /// Submit a job. The returned handle resolves to the job's terminal
    /// outcome; dropping the handle does not cancel the job.
    pub async fn submit(&self, job: Job) -> Result<JoinHandle<JobOutcome>, SubmitError> {
        {
            let mut in_flight = self.in_flight.lock().await;
            if !in_flight.insert(job.asset_id) {
                return Err(SubmitError::AlreadyRunning(job.asset_id));
            }
        }
        tracing::info!(
            job_id = %job.id,
            job_kind = %job.kind,
            asset_id = %job.asset_id,
            "Job submitted to queue"
        );

        let handler = match job.kind {
            JobKind::Transcode => self.transcode_handler.clone(),
            JobKind::Acquire => self.acquire_handler.clone(),
        };
        let policy = match job.kind {
            JobKind::Transcode => self.config.transcode.clone(),
            JobKind::Acquire => self.config.acquire.clone(),
        };
        let semaphore = self.semaphore.clone();
        let in_flight = self.in_flight.clone();

        Ok(tokio::spawn(async move {
            let asset_id = job.asset_id;
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    in_flight.lock().await.remove(&asset_id);
                    tracing::warn!(
                        job_id = %job.id,
                        asset_id = %asset_id,
                        "Queue shut down before job could start"
                    );
                    return JobOutcome::Failed {
                        attempts: 0,
                        error: "queue shut down".to_string(),
                    };
                }
            };
            let outcome = Self::run_with_retry(job, handler.as_ref(), &policy).await;
            in_flight.lock().await.remove(&asset_id);
            outcome
        }))
    }

    #[tracing::instrument(
        skip(job, handler, policy),
        fields(job_id = %job.id, job_kind = %job.kind, asset_id = %job.asset_id)
    )]
    async fn run_with_retry(
        mut job: Job,
        handler: &dyn JobHandler,
        policy: &RetryPolicy,
    ) -> JobOutcome {
        loop {
            job.attempt += 1;
            match tokio::time::timeout(policy.attempt_timeout, handler.run(job.asset_id)).await {
                Ok(Ok(())) => {
                    tracing::info!(attempts = job.attempt, "Job completed successfully");
                    return JobOutcome::Completed {
                        attempts: job.attempt,
                    };
                }
                Ok(Err(e)) if !e.is_retryable() => {
                    tracing::error!(
                        error = %e,
                        attempts = job.attempt,
                        "Job failed permanently, will not retry"
                    );
                    return JobOutcome::Failed {
                        attempts: job.attempt,
                        error: e.to_string(),
                    };
                }
                Ok(Err(e)) => {
                    if job.attempt >= policy.max_attempts {
                        tracing::error!(
                            error = %e,
                            attempts = job.attempt,
                            "Job failed after maximum attempts"
                        );
                        return JobOutcome::Failed {
                            attempts: job.attempt,
                            error: e.to_string(),
                        };
                    }
                    tracing::info!(
                        error = %e,
                        attempt = job.attempt,
                        backoff_seconds = policy.retry_backoff.as_secs(),
                        "Job attempt failed, scheduling retry"
                    );
                    sleep(policy.retry_backoff).await;
                }
                Err(_) => {
                    // The attempt future was dropped at the deadline, taking
                    // any child process with it; the handler records the
                    // failure on the asset since the attempt no longer can.
                    tracing::error!(
                        attempt = job.attempt,
                        timeout_seconds = policy.attempt_timeout.as_secs(),
                        "Job attempt timed out"
                    );
                    handler.on_timeout(job.asset_id).await;
                    if job.attempt >= policy.max_attempts {
                        return JobOutcome::Failed {
                            attempts: job.attempt,
                            error: format!(
                                "timed out after {} attempts of {}s",
                                job.attempt,
                                policy.attempt_timeout.as_secs()
                            ),
                        };
                    }
                    sleep(policy.retry_backoff).await;
                }
            }
        }
    }

    /// Stops admitting jobs still waiting for a worker permit; their handles
    /// resolve as failed. Jobs already running are unaffected.
    pub fn shutdown(&self) {
        tracing::info!("Job queue shutting down");
        self.semaphore.close();
    }
}
