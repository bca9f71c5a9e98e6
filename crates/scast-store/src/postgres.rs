//! Postgres implementation of the storage traits.
//!
//! All queries are runtime-bound (`sqlx::query` + `bind`), and every
//! mutation that has a correctness condition expresses it as a WHERE
//! guard so the database applies check and write in one statement.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use scast_models::{
    AccountInfo, ArtifactId, ArtifactSummary, JobId, JobKind, JobRecord, JobStatus, NewArtifact,
    StoredArtifact,
};

use crate::error::{StoreError, StoreResult};
use crate::pool::create_pool;
use crate::store::{AccountStore, ArtifactStore, DeductOutcome, JobStore};

/// Postgres-backed store. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database and run pending migrations.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = create_pool(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Connected to Postgres and applied migrations");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests that manage their own).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn job_from_row(row: &PgRow) -> StoreResult<JobRecord> {
    let kind: String = row.try_get("kind")?;
    let status: String = row.try_get("status")?;
    Ok(JobRecord {
        id: JobId::from_string(row.try_get::<String, _>("id")?),
        wallet_address: row.try_get("wallet_address")?,
        kind: JobKind::from_str(&kind).map_err(StoreError::Decode)?,
        script: row.try_get("script")?,
        title: row.try_get("title")?,
        status: JobStatus::from_str(&status).map_err(StoreError::Decode)?,
        error_message: row.try_get("error_message")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn artifact_from_row(row: &PgRow) -> StoreResult<StoredArtifact> {
    let kind: String = row.try_get("kind")?;
    Ok(StoredArtifact {
        id: ArtifactId::from_string(row.try_get::<String, _>("id")?),
        job_id: JobId::from_string(row.try_get::<String, _>("job_id")?),
        wallet_address: row.try_get("wallet_address")?,
        kind: JobKind::from_str(&kind).map_err(StoreError::Decode)?,
        payload: row.try_get("payload")?,
        duration_secs: row.try_get("duration_secs")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl AccountStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_account(&self, wallet: &str) -> StoreResult<Option<AccountInfo>> {
        let row = sqlx::query(
            "SELECT wallet_address, balance, trial_expires_at FROM accounts \
             WHERE wallet_address = $1",
        )
        .bind(wallet)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(AccountInfo {
                wallet_address: r.try_get("wallet_address")?,
                balance: r.try_get("balance")?,
                trial_expires_at: r.try_get("trial_expires_at")?,
            })
        })
        .transpose()
    }

    async fn insert_account(
        &self,
        wallet: &str,
        balance: i64,
        trial_expires_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO accounts (wallet_address, balance, trial_expires_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (wallet_address) DO NOTHING",
        )
        .bind(wallet)
        .bind(balance)
        .bind(trial_expires_at)
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() == 1;
        if created {
            info!(wallet = %wallet, balance = balance, "Provisioned account with trial grant");
        }
        Ok(created)
    }

    async fn deduct(&self, wallet: &str, amount: i64) -> StoreResult<DeductOutcome> {
        // The balance check lives in the WHERE clause: zero affected rows
        // means insufficient credit, never a partial write.
        let row = sqlx::query(
            "UPDATE accounts \
             SET balance = balance - $2, updated_at = now() \
             WHERE wallet_address = $1 AND balance >= $2 \
             RETURNING balance",
        )
        .bind(wallet)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => {
                let balance: i64 = r.try_get("balance")?;
                debug!(wallet = %wallet, amount = amount, balance = balance, "Deducted credits");
                Ok(DeductOutcome::Balance(balance))
            }
            None => Ok(DeductOutcome::Insufficient),
        }
    }

    async fn grant(&self, wallet: &str, amount: i64) -> StoreResult<i64> {
        let row = sqlx::query(
            "UPDATE accounts \
             SET balance = balance + $2, updated_at = now() \
             WHERE wallet_address = $1 \
             RETURNING balance",
        )
        .bind(wallet)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(r.try_get("balance")?),
            None => Err(StoreError::AccountNotFound(wallet.to_string())),
        }
    }

    async fn clear_trial(&self, wallet: &str, zero_balance: bool) -> StoreResult<()> {
        // Guarded on the trial marker so concurrent settles zero at most
        // once; a second settle matches zero rows.
        sqlx::query(
            "UPDATE accounts \
             SET balance = CASE WHEN $2 THEN 0 ELSE balance END, \
                 trial_expires_at = NULL, \
                 updated_at = now() \
             WHERE wallet_address = $1 AND trial_expires_at IS NOT NULL",
        )
        .bind(wallet)
        .bind(zero_balance)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn insert_job(&self, job: &JobRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO jobs \
             (id, wallet_address, kind, script, title, status, error_message, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(job.id.as_str())
        .bind(&job.wallet_address)
        .bind(job.kind.as_str())
        .bind(&job.script)
        .bind(&job.title)
        .bind(job.status.as_str())
        .bind(&job.error_message)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> StoreResult<Option<JobRecord>> {
        let row = sqlx::query(
            "SELECT id, wallet_address, kind, script, title, status, error_message, \
                    created_at, updated_at \
             FROM jobs WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn set_status(
        &self,
        id: &JobId,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE jobs SET status = $2, error_message = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(status.as_str())
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::JobNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn clear_script(&self, id: &JobId) -> StoreResult<()> {
        sqlx::query("UPDATE jobs SET script = NULL, updated_at = now() WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_failed_older_than(&self, days: i32) -> StoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM jobs \
             WHERE status = 'failed' AND created_at < now() - make_interval(days => $1)",
        )
        .bind(days)
        .execute(&self.pool)
        .await?;
        let removed = result.rows_affected();
        if removed > 0 {
            info!(removed = removed, days = days, "Cleaned up aged failed jobs");
        }
        Ok(removed)
    }
}

#[async_trait]
impl ArtifactStore for PgStore {
    async fn put_artifact(&self, artifact: NewArtifact<'_>) -> StoreResult<ArtifactId> {
        let id = ArtifactId::new();
        sqlx::query(
            "INSERT INTO artifacts (id, job_id, wallet_address, kind, payload, duration_secs) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id.as_str())
        .bind(artifact.job_id.as_str())
        .bind(artifact.wallet_address)
        .bind(artifact.kind.as_str())
        .bind(artifact.payload)
        .bind(artifact.duration_secs)
        .execute(&self.pool)
        .await?;

        debug!(
            artifact_id = %id,
            job_id = %artifact.job_id,
            bytes = artifact.payload.len(),
            "Stored artifact"
        );
        Ok(id)
    }

    async fn get_by_job(&self, job_id: &JobId) -> StoreResult<Option<StoredArtifact>> {
        let row = sqlx::query(
            "SELECT id, job_id, wallet_address, kind, payload, duration_secs, created_at \
             FROM artifacts WHERE job_id = $1",
        )
        .bind(job_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(artifact_from_row).transpose()
    }

    async fn get_by_id(&self, id: &ArtifactId) -> StoreResult<Option<StoredArtifact>> {
        let row = sqlx::query(
            "SELECT id, job_id, wallet_address, kind, payload, duration_secs, created_at \
             FROM artifacts WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(artifact_from_row).transpose()
    }

    async fn exists_for_job(&self, job_id: &JobId) -> StoreResult<bool> {
        let row = sqlx::query("SELECT 1 AS one FROM artifacts WHERE job_id = $1")
            .bind(job_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn list_by_wallet(&self, wallet: &str) -> StoreResult<Vec<ArtifactSummary>> {
        let rows = sqlx::query(
            "SELECT a.id, a.job_id, a.kind, a.duration_secs, a.created_at, j.title \
             FROM artifacts a \
             LEFT JOIN jobs j ON j.id = a.job_id \
             WHERE a.wallet_address = $1 \
             ORDER BY a.created_at DESC",
        )
        .bind(wallet)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                let kind_str: String = r.try_get("kind")?;
                let kind = JobKind::from_str(&kind_str).map_err(StoreError::Decode)?;
                Ok(ArtifactSummary {
                    id: ArtifactId::from_string(r.try_get::<String, _>("id")?),
                    job_id: JobId::from_string(r.try_get::<String, _>("job_id")?),
                    kind,
                    format: kind.format().to_string(),
                    duration_secs: r.try_get("duration_secs")?,
                    title: r.try_get("title")?,
                    created_at: r.try_get("created_at")?,
                })
            })
            .collect()
    }
}
