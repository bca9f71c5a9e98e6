//! Wallet balance handlers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsResponse {
    pub wallet_address: String,
    pub points: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_expires_at: Option<DateTime<Utc>>,
    pub trial_active: bool,
}

/// Current credit balance for a wallet.
///
/// A lapsed trial is settled before the read, so the reported balance
/// never includes spendable credit the trial window already revoked.
/// Provisioning is lazy and happens on first submission, so a wallet
/// that never submitted or was granted anything is 404.
pub async fn get_points(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> ApiResult<Json<PointsResponse>> {
    let wallet = wallet.trim().to_string();
    if wallet.is_empty() {
        return Err(ApiError::bad_request("walletAddress required"));
    }

    let account = state
        .orchestrator
        .ledger()
        .query(&wallet)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(PointsResponse {
        wallet_address: wallet,
        points: account.balance,
        trial_active: account.trial_active(Utc::now()),
        trial_expires_at: account.trial_expires_at,
    }))
}
