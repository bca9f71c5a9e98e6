//! Pipeline orchestrator.
//!
//! The single owner of a submission's control flow: admission, credit
//! reservation, synthesis stages, artifact storage, and failure
//! settlement. Exactly one `submit` invocation owns a job id end to end;
//! once the reservation succeeds the pipeline runs to a terminal state
//! with no mid-flight abort.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use scast_models::{
    ArtifactId, ArtifactSummary, JobId, JobKind, JobRecord, JobStatus, NewArtifact, StoredArtifact,
};
use scast_store::{ArtifactStore, DeductOutcome};

use crate::collaborators::{ScriptEnhancer, SpeechSynthesizer, VideoRenderer};
use crate::error::{PipelineError, PipelineResult, PipelineStage};
use crate::ledger::Ledger;
use crate::registry::JobRegistry;

/// A generation request entering the pipeline.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub wallet_address: String,
    pub script: String,
    pub title: Option<String>,
    pub kind: JobKind,
}

/// Successful submission outcome.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub job_id: JobId,
    pub artifact_id: ArtifactId,
    pub credits_deducted: i64,
    pub remaining_credits: i64,
}

/// Status snapshot for polling callers.
#[derive(Debug, Clone)]
pub struct JobStatusReport {
    pub job_id: JobId,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub artifact_available: bool,
}

pub struct Orchestrator {
    ledger: Ledger,
    registry: JobRegistry,
    artifacts: Arc<dyn ArtifactStore>,
    enhancer: Arc<dyn ScriptEnhancer>,
    speech: Arc<dyn SpeechSynthesizer>,
    renderer: Arc<dyn VideoRenderer>,
}

impl Orchestrator {
    pub fn new(
        ledger: Ledger,
        registry: JobRegistry,
        artifacts: Arc<dyn ArtifactStore>,
        enhancer: Arc<dyn ScriptEnhancer>,
        speech: Arc<dyn SpeechSynthesizer>,
        renderer: Arc<dyn VideoRenderer>,
    ) -> Self {
        Self {
            ledger,
            registry,
            artifacts,
            enhancer,
            speech,
            renderer,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Run one generation request to a terminal state.
    ///
    /// Order of operations: trial settlement and lazy provisioning,
    /// atomic credit reservation, job creation, synthesis stages,
    /// artifact storage, completion flip. Reservation happens before the
    /// job exists, so an insufficient balance leaves no trace. A stage
    /// failure after the job exists settles through [`Self::fail_job`];
    /// the reserved credit stays spent.
    pub async fn submit(&self, request: SubmitRequest) -> PipelineResult<SubmitReceipt> {
        let wallet = request.wallet_address.trim().to_string();
        if wallet.is_empty() {
            return Err(PipelineError::InvalidInput(
                "missing wallet address".to_string(),
            ));
        }
        if request.script.trim().is_empty() {
            return Err(PipelineError::InvalidInput("missing script".to_string()));
        }

        self.ledger.ensure(&wallet).await?;

        let cost = request.kind.cost();
        let remaining = match self.ledger.deduct(&wallet, cost).await? {
            DeductOutcome::Balance(balance) => balance,
            DeductOutcome::Insufficient => {
                return Err(PipelineError::InsufficientCredit { required: cost });
            }
        };

        let job = self
            .registry
            .create(&wallet, request.kind, &request.script, request.title)
            .await?;
        info!(
            job_id = %job.id,
            wallet = %wallet,
            kind = %request.kind,
            cost = cost,
            remaining = remaining,
            "Admitted generation job"
        );

        match self.run_stages(&job).await {
            Ok(artifact_id) => Ok(SubmitReceipt {
                job_id: job.id,
                artifact_id,
                credits_deducted: cost,
                remaining_credits: remaining,
            }),
            Err(err) => {
                self.fail_job(&job.id, &err).await;
                Err(err)
            }
        }
    }

    /// Steps 4-9: generating flip, enhancement, speech, optional render,
    /// artifact store, completed flip. The artifact row exists before
    /// the status flips, so no reader observes `completed` without a
    /// stored artifact.
    async fn run_stages(&self, job: &JobRecord) -> PipelineResult<ArtifactId> {
        self.registry.mark_generating(&job.id).await?;

        let script = job.script.as_deref().unwrap_or_default();

        let narration = self
            .enhancer
            .enhance(script)
            .await
            .map_err(|e| PipelineError::stage(PipelineStage::Enhancement, e))?;

        let audio = self
            .speech
            .synthesize(&narration)
            .await
            .map_err(|e| PipelineError::stage(PipelineStage::Synthesis, e))?;
        info!(job_id = %job.id, bytes = audio.len(), "Synthesized narration audio");

        let payload = match job.kind {
            JobKind::Video => {
                let video = self
                    .renderer
                    .render(script, &audio)
                    .await
                    .map_err(|e| PipelineError::stage(PipelineStage::Rendering, e))?;
                info!(job_id = %job.id, bytes = video.len(), "Rendered video");
                video
            }
            JobKind::Audio => audio,
        };

        let artifact_id = self
            .artifacts
            .put_artifact(NewArtifact {
                job_id: &job.id,
                wallet_address: &job.wallet_address,
                kind: job.kind,
                payload: &payload,
                duration_secs: None,
            })
            .await
            .map_err(|e| PipelineError::stage(PipelineStage::Storage, e))?;

        self.registry.mark_completed(&job.id).await?;
        Ok(artifact_id)
    }

    /// Single failure-settlement path for every stage error after the
    /// job exists. Records the captured message on the job; the credit
    /// reserved at admission is not restored.
    async fn fail_job(&self, job_id: &JobId, err: &PipelineError) {
        warn!(job_id = %job_id, error = %err, "Pipeline stage failed; settling job");
        if let Err(settle_err) = self.registry.mark_failed(job_id, &err.to_string()).await {
            // The job row keeps whatever status it had; the error is at
            // least visible in the logs.
            warn!(
                job_id = %job_id,
                error = %settle_err,
                "Could not record job failure"
            );
        }
    }

    /// Status snapshot for a job, with artifact availability computed
    /// from the store.
    pub async fn job_status(&self, job_id: &JobId) -> PipelineResult<Option<JobStatusReport>> {
        let Some(job) = self.registry.get(job_id).await? else {
            return Ok(None);
        };
        let artifact_available = self.artifacts.exists_for_job(job_id).await?;
        Ok(Some(JobStatusReport {
            job_id: job.id,
            status: job.status,
            error_message: job.error_message,
            created_at: job.created_at,
            updated_at: job.updated_at,
            artifact_available,
        }))
    }

    pub async fn artifact_by_job(&self, job_id: &JobId) -> PipelineResult<Option<StoredArtifact>> {
        Ok(self.artifacts.get_by_job(job_id).await?)
    }

    pub async fn artifact_by_id(&self, id: &ArtifactId) -> PipelineResult<Option<StoredArtifact>> {
        Ok(self.artifacts.get_by_id(id).await?)
    }

    pub async fn wallet_content(&self, wallet: &str) -> PipelineResult<Vec<ArtifactSummary>> {
        Ok(self.artifacts.list_by_wallet(wallet).await?)
    }
}
