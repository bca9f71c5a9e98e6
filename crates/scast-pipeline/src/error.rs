//! Pipeline error taxonomy.

use thiserror::Error;

use scast_models::{JobId, JobStatus};
use scast_store::StoreError;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// The synthesis stage that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Enhancement,
    Synthesis,
    Rendering,
    Storage,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Enhancement => "script enhancement",
            PipelineStage::Synthesis => "speech synthesis",
            PipelineStage::Rendering => "video rendering",
            PipelineStage::Storage => "artifact storage",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors surfaced by the orchestration core.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Rejected before any state mutation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Normal outcome of a reservation against a short balance; no job
    /// is created.
    #[error("insufficient credit: {required} required")]
    InsufficientCredit { required: i64 },

    /// The ledger's backing store failed during a balance operation.
    #[error("ledger unavailable: {0}")]
    Ledger(#[source] StoreError),

    /// A requested job transition would leave the legal state machine.
    #[error("job {job_id}: illegal transition {from} -> {to}")]
    InvalidTransition {
        job_id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("job not found: {0}")]
    JobNotFound(JobId),

    /// A synthesis/storage stage failed after the job existed; captured
    /// into the job's error field by the settlement path.
    #[error("{stage} failed: {message}")]
    Stage {
        stage: PipelineStage,
        message: String,
    },

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl PipelineError {
    pub(crate) fn stage(stage: PipelineStage, err: impl std::fmt::Display) -> Self {
        Self::Stage {
            stage,
            message: err.to_string(),
        }
    }
}
