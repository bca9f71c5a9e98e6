//! Generation job records and their lifecycle state machine.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Narrated audio plus a rendered video
    Video,
    /// Narrated audio only
    Audio,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Video => "video",
            JobKind::Audio => "audio",
        }
    }

    /// Credit cost of one generation of this kind.
    pub fn cost(&self) -> i64 {
        match self {
            JobKind::Video => 2,
            JobKind::Audio => 1,
        }
    }

    /// Container format of the stored artifact.
    pub fn format(&self) -> &'static str {
        match self {
            JobKind::Video => "mp4",
            JobKind::Audio => "mp3",
        }
    }

    /// MIME type for serving the stored artifact.
    pub fn content_type(&self) -> &'static str {
        match self {
            JobKind::Video => "video/mp4",
            JobKind::Audio => "audio/mpeg",
        }
    }
}

impl std::str::FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(JobKind::Video),
            "audio" => Ok(JobKind::Audio),
            other => Err(format!("unknown job kind: {other}")),
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Job lifecycle status.
///
/// The state machine is a single forward path with one escape:
/// `pending -> generating -> completed`, with `failed` reachable from
/// both non-terminal states. `completed` and `failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Admitted, credit reserved, work not yet started
    #[default]
    Pending,
    /// Pipeline is running
    Generating,
    /// Artifact stored, job done
    Completed,
    /// Pipeline failed; error message captured
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Generating => "generating",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Check whether a transition to `next` is legal.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Pending, JobStatus::Generating) => true,
            (JobStatus::Pending, JobStatus::Failed) => true,
            (JobStatus::Generating, JobStatus::Completed) => true,
            (JobStatus::Generating, JobStatus::Failed) => true,
            _ => false,
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "generating" => Ok(JobStatus::Generating),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A generation job's lifecycle record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobRecord {
    /// Unique job ID
    pub id: JobId,

    /// Owning wallet address
    pub wallet_address: String,

    /// What this job produces
    pub kind: JobKind,

    /// Input script text; cleared once the job completes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    /// Optional user-provided title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Current lifecycle status
    #[serde(default)]
    pub status: JobStatus,

    /// Error message, set only when the job failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a new pending job.
    pub fn new(
        wallet_address: impl Into<String>,
        kind: JobKind,
        script: impl Into<String>,
        title: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            wallet_address: wallet_address.into(),
            kind,
            script: Some(script.into()),
            title,
            status: JobStatus::Pending,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}
