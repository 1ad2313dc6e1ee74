//! Pipeline error taxonomy

use thiserror::Error;
use vodpipe_core::{JobError, StoreError};
use vodpipe_storage::StorageError;

/// Errors raised by pipeline runs.
///
/// Expected conditions (unreadable source, no video stream, nothing to
/// encode) are distinct variants so the retry layer can tell them apart from
/// transient faults.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("probe failed: {0}")]
    ProbeFailed(String),

    #[error("no video stream in source")]
    NoVideoStream,

    #[error("no ladder rung fits a source of height {0}")]
    NoEligibleRenditions(u32),

    #[error("'{0}' is not a known quality label")]
    UnknownQuality(String),

    #[error("encode failed: {0}")]
    EncodeFailed(String),

    #[error("asset has no source file reference")]
    MissingSource,

    #[error("provider request failed: {0}")]
    Provider(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("asset store error: {0}")]
    Store(#[from] StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Whether re-running the pipeline could plausibly change the outcome.
    /// The source bytes do not change between attempts, so anything derived
    /// purely from them is permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::ProbeFailed(_)
            | PipelineError::NoVideoStream
            | PipelineError::NoEligibleRenditions(_)
            | PipelineError::UnknownQuality(_)
            | PipelineError::MissingSource => false,
            PipelineError::Storage(storage) => matches!(
                storage,
                StorageError::Unavailable(_) | StorageError::IoError(_)
            ),
            PipelineError::EncodeFailed(_)
            | PipelineError::Provider(_)
            | PipelineError::Store(_)
            | PipelineError::Io(_) => true,
        }
    }
}

impl From<PipelineError> for JobError {
    fn from(err: PipelineError) -> Self {
        if err.is_retryable() {
            JobError::retryable(err)
        } else {
            JobError::permanent(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_derived_errors_are_permanent() {
        assert!(!PipelineError::NoVideoStream.is_retryable());
        assert!(!PipelineError::NoEligibleRenditions(144).is_retryable());
        assert!(!PipelineError::ProbeFailed("garbage container".to_string()).is_retryable());
        assert!(!PipelineError::MissingSource.is_retryable());
    }

    #[test]
    fn test_transient_faults_are_retryable() {
        assert!(PipelineError::EncodeFailed("killed".to_string()).is_retryable());
        assert!(PipelineError::Provider("timeout".to_string()).is_retryable());
        assert!(
            PipelineError::Storage(StorageError::Unavailable("s3 5xx".to_string())).is_retryable()
        );
    }

    #[test]
    fn test_storage_denied_is_permanent() {
        let err = PipelineError::Storage(StorageError::Denied("no write access".to_string()));
        assert!(!err.is_retryable());

        let job_err: JobError = err.into();
        assert!(!job_err.is_retryable());
    }
}
