//! Vodpipe Worker Library
//!
//! Job queue and dispatch for pipeline runs: a semaphore-bounded worker pool
//! with per-asset uniqueness, per-kind retry policies, and attempt timeouts.

pub mod handler;
pub mod queue;

// Re-export commonly used types
pub use handler::{AcquireJobHandler, JobHandler, TranscodeJobHandler};
pub use queue::{JobOutcome, JobQueue, JobQueueConfig, RetryPolicy, SubmitError};
pub use vodpipe_core::{Job, JobKind};
