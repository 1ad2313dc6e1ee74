//! Job execution error types
//!
//! Lets a pipeline run tell the queue whether another attempt could help
//! (transient storage or subprocess trouble) or whether retrying is pointless
//! (no video stream, source below every ladder rung, bad preconditions).

use std::fmt;

/// Error from one job attempt, carrying the retry decision.
#[derive(Debug)]
pub struct JobError {
    inner: anyhow::Error,
    retryable: bool,
}

impl JobError {
    /// An error no retry will fix. The queue fails the job immediately.
    pub fn permanent(err: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: err.into(),
            retryable: false,
        }
    }

    /// A transient error. The queue retries according to the job's policy.
    pub fn retryable(err: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: err.into(),
            retryable: true,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    pub fn into_inner(self) -> anyhow::Error {
        self.inner
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<anyhow::Error> for JobError {
    /// Plain anyhow errors default to retryable.
    fn from(err: anyhow::Error) -> Self {
        Self::retryable(err)
    }
}

/// Extension trait for Result to mark errors permanent at the call site.
pub trait JobResultExt<T> {
    fn permanent(self) -> Result<T, JobError>;
}

impl<T, E: Into<anyhow::Error>> JobResultExt<T> for Result<T, E> {
    fn permanent(self) -> Result<T, JobError> {
        self.map_err(|e| JobError::permanent(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_error() {
        let err = JobError::permanent(anyhow::anyhow!("no video stream"));
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("no video stream"));
    }

    #[test]
    fn test_retryable_error() {
        let err = JobError::retryable(anyhow::anyhow!("storage unavailable"));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("storage unavailable"));
    }

    #[test]
    fn test_from_anyhow_defaults_to_retryable() {
        let err: JobError = anyhow::anyhow!("something transient").into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_result_ext() {
        let result: Result<(), anyhow::Error> = Err(anyhow::anyhow!("bad precondition"));
        let job_result = result.permanent();
        assert!(!job_result.unwrap_err().is_retryable());
    }
}
