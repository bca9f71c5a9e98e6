//! Storage traits consumed by the orchestration core.
//!
//! Implementations are injected at construction time; no component holds
//! a process-global handle. Each method is one scoped acquire-use-release
//! against the underlying store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use scast_models::{
    AccountInfo, ArtifactId, ArtifactSummary, JobId, JobRecord, JobStatus, NewArtifact,
    StoredArtifact,
};

use crate::error::StoreResult;

/// Outcome of an atomic conditional deduction.
///
/// `Insufficient` is a normal result, not an error: it is how the guarded
/// update reports that zero rows matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeductOutcome {
    /// Deduction applied; the new balance.
    Balance(i64),
    /// Balance was below the requested amount; nothing changed.
    Insufficient,
}

/// Account rows: balance and trial metadata.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Cheap connectivity probe.
    async fn ping(&self) -> StoreResult<()>;

    /// Fetch an account, if provisioned.
    async fn get_account(&self, wallet: &str) -> StoreResult<Option<AccountInfo>>;

    /// Insert an account if absent. Returns `true` when a row was
    /// created; an existing account is left untouched.
    async fn insert_account(
        &self,
        wallet: &str,
        balance: i64,
        trial_expires_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Atomically check `balance >= amount` and decrement in the same
    /// operation. The check and the write must not be separable: two
    /// concurrent deductions racing on one remaining credit must not
    /// both succeed.
    async fn deduct(&self, wallet: &str, amount: i64) -> StoreResult<DeductOutcome>;

    /// Atomically increment the balance; returns the new balance.
    /// The account must already exist.
    async fn grant(&self, wallet: &str, amount: i64) -> StoreResult<i64>;

    /// Settle trial metadata: clear `trial_expires_at` and, when
    /// `zero_balance` is set, zero the balance in the same statement.
    /// Guarded on the trial marker still being present, so concurrent
    /// settles apply at most once. A missing account or an already
    /// settled trial is a no-op.
    async fn clear_trial(&self, wallet: &str, zero_balance: bool) -> StoreResult<()>;
}

/// Job lifecycle rows.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: &JobRecord) -> StoreResult<()>;

    async fn get_job(&self, id: &JobId) -> StoreResult<Option<JobRecord>>;

    /// Write status and error message, bumping `updated_at`.
    async fn set_status(
        &self,
        id: &JobId,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> StoreResult<()>;

    /// Drop the stored script text (retention minimization on
    /// completion). The job row itself persists.
    async fn clear_script(&self, id: &JobId) -> StoreResult<()>;

    /// Housekeeping primitive: delete failed jobs older than `days`.
    /// Returns the number of rows removed. The retention policy itself
    /// is owned by an external housekeeping task.
    async fn delete_failed_older_than(&self, days: i32) -> StoreResult<u64>;
}

/// Artifact rows. Write-once: no update or delete is exposed.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist an artifact; returns its generated id.
    async fn put_artifact(&self, artifact: NewArtifact<'_>) -> StoreResult<ArtifactId>;

    async fn get_by_job(&self, job_id: &JobId) -> StoreResult<Option<StoredArtifact>>;

    async fn get_by_id(&self, id: &ArtifactId) -> StoreResult<Option<StoredArtifact>>;

    /// Payload-free existence check, used by status queries.
    async fn exists_for_job(&self, job_id: &JobId) -> StoreResult<bool>;

    /// List a wallet's artifacts, newest first, with job titles.
    async fn list_by_wallet(&self, wallet: &str) -> StoreResult<Vec<ArtifactSummary>>;
}
