//! Artifact delivery handlers.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use scast_models::{ArtifactId, ArtifactSummary, JobId, JobKind, StoredArtifact};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn serve_artifact(artifact: StoredArtifact) -> Response {
    (
        [
            (header::CONTENT_TYPE, artifact.kind.content_type()),
            (header::CACHE_CONTROL, "private, max-age=3600"),
        ],
        artifact.payload,
    )
        .into_response()
}

/// Fetch the rendered video for a job.
pub async fn get_video_by_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    artifact_by_job(&state, &job_id, JobKind::Video).await
}

/// Fetch the synthesized audio for a job.
pub async fn get_audio_by_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    artifact_by_job(&state, &job_id, JobKind::Audio).await
}

async fn artifact_by_job(state: &AppState, job_id: &str, kind: JobKind) -> ApiResult<Response> {
    let job_id = JobId::from_string(job_id);
    let artifact = state
        .orchestrator
        .artifact_by_job(&job_id)
        .await?
        .filter(|a| a.kind == kind)
        .ok_or_else(|| ApiError::not_found(format!("no {kind} for job {job_id}")))?;
    Ok(serve_artifact(artifact))
}

/// Fetch an artifact by its own id, whatever its kind.
pub async fn get_artifact(
    State(state): State<AppState>,
    Path(artifact_id): Path<String>,
) -> ApiResult<Response> {
    let artifact_id = ArtifactId::from_string(artifact_id);
    let artifact = state
        .orchestrator
        .artifact_by_id(&artifact_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("artifact {artifact_id} not found")))?;
    Ok(serve_artifact(artifact))
}

/// Wallet content listing response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletContentResponse {
    pub wallet_address: String,
    pub items: Vec<ArtifactSummary>,
}

/// List a wallet's stored artifacts, newest first.
pub async fn get_wallet_content(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> ApiResult<Json<WalletContentResponse>> {
    let wallet = wallet.trim().to_string();
    if wallet.is_empty() {
        return Err(ApiError::bad_request("walletAddress required"));
    }
    let items = state.orchestrator.wallet_content(&wallet).await?;
    Ok(Json(WalletContentResponse {
        wallet_address: wallet,
        items,
    }))
}
