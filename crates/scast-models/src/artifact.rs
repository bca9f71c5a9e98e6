//! Stored generation artifacts (audio/video payloads).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::job::{JobId, JobKind};

/// Unique identifier for a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ArtifactId(pub String);

impl ArtifactId {
    /// Generate a new random artifact ID.
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

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An artifact about to be persisted. Write-once: the store exposes no
/// update or delete for artifacts.
#[derive(Debug)]
pub struct NewArtifact<'a> {
    /// Job that produced this artifact
    pub job_id: &'a JobId,
    /// Owning wallet address
    pub wallet_address: &'a str,
    /// Content kind (audio or video)
    pub kind: JobKind,
    /// Binary payload
    pub payload: &'a [u8],
    /// Duration of the media, when known
    pub duration_secs: Option<f64>,
}

/// A persisted artifact, payload included.
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub id: ArtifactId,
    pub job_id: JobId,
    pub wallet_address: String,
    pub kind: JobKind,
    pub payload: Vec<u8>,
    pub duration_secs: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Listing entry for a wallet's stored content (no payload).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ArtifactSummary {
    pub id: ArtifactId,
    pub job_id: JobId,
    pub kind: JobKind,
    /// Container format ("mp4" / "mp3")
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Title of the job that produced the artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}
