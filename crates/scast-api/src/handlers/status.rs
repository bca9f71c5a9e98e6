//! Job status polling handler.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use scast_models::{JobId, JobStatus};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Status snapshot response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    /// `completed` with the artifact actually present and readable
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub artifact_available: bool,
}

/// Poll the status of a generation job.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job_id = JobId::from_string(job_id);
    let report = state
        .orchestrator
        .job_status(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("job {job_id} not found")))?;

    Ok(Json(JobStatusResponse {
        job_id: report.job_id.to_string(),
        status: report.status,
        ready: report.status == JobStatus::Completed && report.artifact_available,
        error: report.error_message,
        created_at: report.created_at,
        updated_at: report.updated_at,
        artifact_available: report.artifact_available,
    }))
}
