//! In-memory implementation of the storage traits.
//!
//! Used by tests and for DB-less local development. A single mutex
//! guards all tables, so the check-and-decrement in [`deduct`] is
//! linearizable exactly like the Postgres guarded UPDATE.
//!
//! [`deduct`]: crate::store::AccountStore::deduct

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use scast_models::{
    AccountInfo, ArtifactId, ArtifactSummary, JobId, JobRecord, JobStatus, NewArtifact,
    StoredArtifact,
};

use crate::error::{StoreError, StoreResult};
use crate::store::{AccountStore, ArtifactStore, DeductOutcome, JobStore};

#[derive(Default)]
struct Tables {
    accounts: HashMap<String, AccountInfo>,
    jobs: HashMap<String, JobRecord>,
    artifacts: HashMap<String, StoredArtifact>,
    /// job_id -> artifact_id
    by_job: HashMap<String, String>,
}

/// Volatile store holding everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of job rows. Lets tests assert that a rejected submission
    /// created no job.
    pub fn job_count(&self) -> usize {
        self.tables.lock().unwrap().jobs.len()
    }

    /// Number of artifact rows.
    pub fn artifact_count(&self) -> usize {
        self.tables.lock().unwrap().artifacts.len()
    }

    /// Snapshot of all job rows, for assertions in tests.
    pub fn jobs_snapshot(&self) -> Vec<JobRecord> {
        self.tables.lock().unwrap().jobs.values().cloned().collect()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn get_account(&self, wallet: &str) -> StoreResult<Option<AccountInfo>> {
        Ok(self.tables.lock().unwrap().accounts.get(wallet).cloned())
    }

    async fn insert_account(
        &self,
        wallet: &str,
        balance: i64,
        trial_expires_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        if tables.accounts.contains_key(wallet) {
            return Ok(false);
        }
        tables.accounts.insert(
            wallet.to_string(),
            AccountInfo {
                wallet_address: wallet.to_string(),
                balance,
                trial_expires_at: Some(trial_expires_at),
            },
        );
        Ok(true)
    }

    async fn deduct(&self, wallet: &str, amount: i64) -> StoreResult<DeductOutcome> {
        let mut tables = self.tables.lock().unwrap();
        match tables.accounts.get_mut(wallet) {
            Some(account) if account.balance >= amount => {
                account.balance -= amount;
                Ok(DeductOutcome::Balance(account.balance))
            }
            _ => Ok(DeductOutcome::Insufficient),
        }
    }

    async fn grant(&self, wallet: &str, amount: i64) -> StoreResult<i64> {
        let mut tables = self.tables.lock().unwrap();
        match tables.accounts.get_mut(wallet) {
            Some(account) => {
                account.balance += amount;
                Ok(account.balance)
            }
            None => Err(StoreError::AccountNotFound(wallet.to_string())),
        }
    }

    async fn clear_trial(&self, wallet: &str, zero_balance: bool) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(account) = tables.accounts.get_mut(wallet) {
            if account.trial_expires_at.is_some() {
                if zero_balance {
                    account.balance = 0;
                }
                account.trial_expires_at = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert_job(&self, job: &JobRecord) -> StoreResult<()> {
        self.tables
            .lock()
            .unwrap()
            .jobs
            .insert(job.id.as_str().to_string(), job.clone());
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> StoreResult<Option<JobRecord>> {
        Ok(self.tables.lock().unwrap().jobs.get(id.as_str()).cloned())
    }

    async fn set_status(
        &self,
        id: &JobId,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let job = tables
            .jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::JobNotFound(id.to_string()))?;
        job.status = status;
        job.error_message = error_message.map(str::to_string);
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn clear_script(&self, id: &JobId) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(job) = tables.jobs.get_mut(id.as_str()) {
            job.script = None;
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_failed_older_than(&self, days: i32) -> StoreResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::days(days as i64);
        let mut tables = self.tables.lock().unwrap();
        let before = tables.jobs.len();
        tables
            .jobs
            .retain(|_, job| !(job.status == JobStatus::Failed && job.created_at < cutoff));
        Ok((before - tables.jobs.len()) as u64)
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn put_artifact(&self, artifact: NewArtifact<'_>) -> StoreResult<ArtifactId> {
        let id = ArtifactId::new();
        let mut tables = self.tables.lock().unwrap();
        tables.artifacts.insert(
            id.as_str().to_string(),
            StoredArtifact {
                id: id.clone(),
                job_id: artifact.job_id.clone(),
                wallet_address: artifact.wallet_address.to_string(),
                kind: artifact.kind,
                payload: artifact.payload.to_vec(),
                duration_secs: artifact.duration_secs,
                created_at: Utc::now(),
            },
        );
        tables
            .by_job
            .insert(artifact.job_id.as_str().to_string(), id.as_str().to_string());
        Ok(id)
    }

    async fn get_by_job(&self, job_id: &JobId) -> StoreResult<Option<StoredArtifact>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .by_job
            .get(job_id.as_str())
            .and_then(|aid| tables.artifacts.get(aid))
            .cloned())
    }

    async fn get_by_id(&self, id: &ArtifactId) -> StoreResult<Option<StoredArtifact>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .artifacts
            .get(id.as_str())
            .cloned())
    }

    async fn exists_for_job(&self, job_id: &JobId) -> StoreResult<bool> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .by_job
            .contains_key(job_id.as_str()))
    }

    async fn list_by_wallet(&self, wallet: &str) -> StoreResult<Vec<ArtifactSummary>> {
        let tables = self.tables.lock().unwrap();
        let mut summaries: Vec<ArtifactSummary> = tables
            .artifacts
            .values()
            .filter(|a| a.wallet_address == wallet)
            .map(|a| ArtifactSummary {
                id: a.id.clone(),
                job_id: a.job_id.clone(),
                kind: a.kind,
                format: a.kind.format().to_string(),
                duration_secs: a.duration_secs,
                title: tables
                    .jobs
                    .get(a.job_id.as_str())
                    .and_then(|j| j.title.clone()),
                created_at: a.created_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;
    use scast_models::JobKind;

    #[tokio::test]
    async fn test_insert_account_is_idempotent() {
        let store = MemoryStore::new();
        let expires = Utc::now() + Duration::days(7);

        assert!(store.insert_account("0xabc", 28, expires).await.unwrap());
        // Second call must not re-grant
        assert!(!store.insert_account("0xabc", 28, expires).await.unwrap());

        let account = store.get_account("0xabc").await.unwrap().unwrap();
        assert_eq!(account.balance, 28);
    }

    #[tokio::test]
    async fn test_deduct_insufficient_leaves_balance_unchanged() {
        let store = MemoryStore::new();
        store
            .insert_account("0xabc", 1, Utc::now() + Duration::days(7))
            .await
            .unwrap();

        assert_eq!(
            store.deduct("0xabc", 2).await.unwrap(),
            DeductOutcome::Insufficient
        );
        assert_eq!(
            store.get_account("0xabc").await.unwrap().unwrap().balance,
            1
        );
    }

    #[tokio::test]
    async fn test_deduct_from_unknown_wallet_is_insufficient() {
        let store = MemoryStore::new();
        assert_eq!(
            store.deduct("0xmissing", 1).await.unwrap(),
            DeductOutcome::Insufficient
        );
    }

    #[tokio::test]
    async fn test_concurrent_deducts_never_overdraw() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_account("0xabc", 5, Utc::now() + Duration::days(7))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.deduct("0xabc", 1).await.unwrap()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), DeductOutcome::Balance(_)) {
                successes += 1;
            }
        }

        // Exactly the available balance may be spent, never more.
        assert_eq!(successes, 5);
        assert_eq!(
            store.get_account("0xabc").await.unwrap().unwrap().balance,
            0
        );
    }

    #[tokio::test]
    async fn test_clear_trial_applies_once() {
        let store = MemoryStore::new();
        store
            .insert_account("0xabc", 10, Utc::now() - Duration::hours(1))
            .await
            .unwrap();

        store.clear_trial("0xabc", true).await.unwrap();
        let account = store.get_account("0xabc").await.unwrap().unwrap();
        assert_eq!(account.balance, 0);
        assert!(account.trial_expires_at.is_none());

        // Balance accrued after settlement must survive a repeat settle.
        store.grant("0xabc", 30).await.unwrap();
        store.clear_trial("0xabc", true).await.unwrap();
        assert_eq!(
            store.get_account("0xabc").await.unwrap().unwrap().balance,
            30
        );
    }

    #[tokio::test]
    async fn test_artifact_round_trip_and_listing() {
        let store = MemoryStore::new();
        let job = JobRecord::new("0xabc", JobKind::Audio, "script", Some("Title".into()));
        store.insert_job(&job).await.unwrap();

        let id = store
            .put_artifact(NewArtifact {
                job_id: &job.id,
                wallet_address: "0xabc",
                kind: JobKind::Audio,
                payload: b"mp3-bytes",
                duration_secs: Some(12.5),
            })
            .await
            .unwrap();

        assert!(store.exists_for_job(&job.id).await.unwrap());
        let by_job = store.get_by_job(&job.id).await.unwrap().unwrap();
        assert_eq!(by_job.id, id);
        assert_eq!(by_job.payload, b"mp3-bytes");

        let listing = store.list_by_wallet("0xabc").await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].title.as_deref(), Some("Title"));
        assert_eq!(listing[0].format, "mp3");
    }

    #[tokio::test]
    async fn test_delete_failed_older_than() {
        let store = MemoryStore::new();
        let mut job = JobRecord::new("0xabc", JobKind::Audio, "script", None);
        job.status = JobStatus::Failed;
        job.created_at = Utc::now() - Duration::days(10);
        store.insert_job(&job).await.unwrap();

        let fresh = JobRecord::new("0xabc", JobKind::Audio, "script", None);
        store.insert_job(&fresh).await.unwrap();

        assert_eq!(store.delete_failed_older_than(7).await.unwrap(), 1);
        assert_eq!(store.job_count(), 1);
    }
}
