//! Generation submission handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use scast_models::{JobKind, JobStatus};
use scast_pipeline::SubmitRequest;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Generation request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub wallet_address: String,
    pub script: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Successful generation response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub job_id: String,
    pub artifact_id: String,
    pub status: JobStatus,
    pub credits_deducted: i64,
    pub remaining_credits: i64,
}

/// Submit a video generation job.
pub async fn generate_video(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    run_generation(state, request, JobKind::Video).await
}

/// Submit an audio generation job.
pub async fn generate_audio(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    run_generation(state, request, JobKind::Audio).await
}

/// Run a submission on a detached task so a client disconnect cannot
/// cancel the pipeline mid-flight. Once the credit is reserved, the job
/// reaches a terminal state whether or not the caller is still there.
async fn run_generation(
    state: AppState,
    request: GenerateRequest,
    kind: JobKind,
) -> ApiResult<Json<GenerateResponse>> {
    let orchestrator = Arc::clone(&state.orchestrator);
    let submit = SubmitRequest {
        wallet_address: request.wallet_address,
        script: request.script,
        title: request.title,
        kind,
    };

    let handle = tokio::spawn(async move { orchestrator.submit(submit).await });

    let receipt = handle
        .await
        .map_err(|e| {
            error!(error = %e, "Generation task panicked");
            ApiError::internal("generation task failed")
        })?
        .map_err(ApiError::from)?;

    Ok(Json(GenerateResponse {
        job_id: receipt.job_id.to_string(),
        artifact_id: receipt.artifact_id.to_string(),
        status: JobStatus::Completed,
        credits_deducted: receipt.credits_deducted,
        remaining_credits: receipt.remaining_credits,
    }))
}
