//! Shared data models for the Scriptcast backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their lifecycle status
//! - Accounts and credit balances
//! - Stored artifacts (audio/video payloads)
//! - Credit costs and payment tier configuration

pub mod account;
pub mod artifact;
pub mod credits;
pub mod job;

// Re-export common types
pub use account::AccountInfo;
pub use artifact::{ArtifactId, ArtifactSummary, NewArtifact, StoredArtifact};
pub use credits::{CreditTier, CreditTierSchedule, TierScheduleError, TRIAL_CREDITS, TRIAL_PERIOD_DAYS};
pub use job::{JobId, JobKind, JobRecord, JobStatus};
