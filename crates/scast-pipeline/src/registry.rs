//! Job lifecycle registry.
//!
//! Enforces the forward-only state machine on top of an injected
//! [`JobStore`]. Status and error message are the only fields callers
//! can mutate after creation; script text is cleared as a side effect of
//! reaching `completed`.

use std::sync::Arc;

use tracing::{debug, info, warn};

use scast_models::{JobId, JobKind, JobRecord, JobStatus};
use scast_store::JobStore;

use crate::error::{PipelineError, PipelineResult};

#[derive(Clone)]
pub struct JobRegistry {
    jobs: Arc<dyn JobStore>,
}

impl JobRegistry {
    pub fn new(jobs: Arc<dyn JobStore>) -> Self {
        Self { jobs }
    }

    /// Create a job in `pending`.
    pub async fn create(
        &self,
        wallet: &str,
        kind: JobKind,
        script: &str,
        title: Option<String>,
    ) -> PipelineResult<JobRecord> {
        let job = JobRecord::new(wallet, kind, script, title);
        self.jobs.insert_job(&job).await?;
        debug!(job_id = %job.id, wallet = %wallet, kind = %kind, "Created job");
        Ok(job)
    }

    pub async fn get(&self, id: &JobId) -> PipelineResult<Option<JobRecord>> {
        Ok(self.jobs.get_job(id).await?)
    }

    pub async fn mark_generating(&self, id: &JobId) -> PipelineResult<()> {
        self.transition(id, JobStatus::Generating, None).await
    }

    /// Terminal success. Also drops the stored script text; the record
    /// itself persists.
    ///
    /// The script clear is best-effort: the job is already terminal with
    /// its artifact stored, and a bookkeeping fault here must not turn a
    /// completed job into a reported failure.
    pub async fn mark_completed(&self, id: &JobId) -> PipelineResult<()> {
        self.transition(id, JobStatus::Completed, None).await?;
        if let Err(e) = self.jobs.clear_script(id).await {
            warn!(job_id = %id, error = %e, "Could not clear script after completion");
        }
        info!(job_id = %id, "Job completed");
        Ok(())
    }

    /// Terminal failure with the captured stage error.
    pub async fn mark_failed(&self, id: &JobId, message: &str) -> PipelineResult<()> {
        self.transition(id, JobStatus::Failed, Some(message)).await?;
        info!(job_id = %id, error = %message, "Job failed");
        Ok(())
    }

    async fn transition(
        &self,
        id: &JobId,
        to: JobStatus,
        error_message: Option<&str>,
    ) -> PipelineResult<()> {
        let job = self
            .jobs
            .get_job(id)
            .await?
            .ok_or_else(|| PipelineError::JobNotFound(id.clone()))?;

        if !job.status.can_transition_to(to) {
            return Err(PipelineError::InvalidTransition {
                job_id: id.clone(),
                from: job.status,
                to,
            });
        }

        self.jobs.set_status(id, to, error_message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use scast_store::MemoryStore;

    fn registry(store: &Arc<MemoryStore>) -> JobRegistry {
        JobRegistry::new(Arc::clone(store) as Arc<dyn JobStore>)
    }

    #[tokio::test]
    async fn test_happy_path_transitions() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry(&store);

        let job = registry
            .create("0xabc", JobKind::Audio, "say hello", None)
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Pending);

        registry.mark_generating(&job.id).await.unwrap();
        registry.mark_completed(&job.id).await.unwrap();

        let done = registry.get(&job.id).await.unwrap().unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        // Script dropped on completion, record kept
        assert!(done.script.is_none());
        assert!(done.error_message.is_none());
    }

    #[tokio::test]
    async fn test_failure_from_pending_and_generating() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry(&store);

        let early = registry
            .create("0xabc", JobKind::Audio, "s", None)
            .await
            .unwrap();
        registry.mark_failed(&early.id, "admission fault").await.unwrap();
        let record = registry.get(&early.id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.error_message.as_deref(), Some("admission fault"));

        let late = registry
            .create("0xabc", JobKind::Video, "s", None)
            .await
            .unwrap();
        registry.mark_generating(&late.id).await.unwrap();
        registry.mark_failed(&late.id, "render exploded").await.unwrap();
        let record = registry.get(&late.id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_terminal_states_reject_transitions() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry(&store);

        let job = registry
            .create("0xabc", JobKind::Audio, "s", None)
            .await
            .unwrap();
        registry.mark_generating(&job.id).await.unwrap();
        registry.mark_completed(&job.id).await.unwrap();

        let err = registry.mark_failed(&job.id, "too late").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTransition { .. }));

        // Completed cannot be re-entered either
        let err = registry.mark_generating(&job.id).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTransition { .. }));
    }

    /// Job store whose script clears always fail; everything else
    /// delegates to the in-memory store.
    struct FlakyScriptClear {
        inner: Arc<MemoryStore>,
    }

    #[async_trait::async_trait]
    impl JobStore for FlakyScriptClear {
        async fn insert_job(&self, job: &JobRecord) -> scast_store::StoreResult<()> {
            self.inner.insert_job(job).await
        }

        async fn get_job(&self, id: &JobId) -> scast_store::StoreResult<Option<JobRecord>> {
            self.inner.get_job(id).await
        }

        async fn set_status(
            &self,
            id: &JobId,
            status: JobStatus,
            error_message: Option<&str>,
        ) -> scast_store::StoreResult<()> {
            self.inner.set_status(id, status, error_message).await
        }

        async fn clear_script(&self, _id: &JobId) -> scast_store::StoreResult<()> {
            Err(scast_store::StoreError::Decode(
                "connection reset".to_string(),
            ))
        }

        async fn delete_failed_older_than(&self, days: i32) -> scast_store::StoreResult<u64> {
            self.inner.delete_failed_older_than(days).await
        }
    }

    #[tokio::test]
    async fn test_completion_survives_script_clear_fault() {
        let inner = Arc::new(MemoryStore::new());
        let registry = JobRegistry::new(Arc::new(FlakyScriptClear {
            inner: Arc::clone(&inner),
        }) as Arc<dyn JobStore>);

        let job = registry
            .create("0xabc", JobKind::Audio, "say hello", None)
            .await
            .unwrap();
        registry.mark_generating(&job.id).await.unwrap();

        // The flip to completed must report success even though the
        // script clear faulted.
        registry.mark_completed(&job.id).await.unwrap();

        let record = registry.get(&job.id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        // Script retained; only the clear failed.
        assert!(record.script.is_some());
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry(&store);

        let err = registry
            .mark_generating(&JobId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::JobNotFound(_)));
    }
}
