//! Payment confirmation handler.

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use scast_models::JobKind;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Credit award request. The caller supplies an explicit point amount,
/// or a purchase tier to resolve through the configured schedule
/// (`amount` is an accepted alias for `tier`). `contentType` is echo
/// metadata only; it does not affect the grant.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardRequest {
    pub wallet_address: String,
    #[serde(default)]
    pub tier: Option<u32>,
    #[serde(default)]
    pub amount: Option<u32>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub content_type: Option<JobKind>,
}

/// Award response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardResponse {
    pub wallet_address: String,
    pub awarded_points: i64,
    pub new_total_points: i64,
    pub content_type: Option<JobKind>,
    /// Awarded points expressed as generations of `content_type`
    pub content_credits: Option<f64>,
}

fn check_webhook_token(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = &state.config.payment_webhook_token else {
        return Ok(());
    };
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match provided {
        Some(token) if token == expected => Ok(()),
        _ => Err(ApiError::unauthorized("invalid payment webhook token")),
    }
}

/// Credit a wallet after an externally confirmed payment.
///
/// Trusted endpoint: when `PAYMENT_WEBHOOK_TOKEN` is configured the
/// caller must present it as a bearer token.
pub async fn award_credits(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AwardRequest>,
) -> ApiResult<Json<AwardResponse>> {
    check_webhook_token(&state, &headers)?;

    let wallet = request.wallet_address.trim().to_string();
    if wallet.is_empty() {
        return Err(ApiError::bad_request("walletAddress is required"));
    }

    // Resolution order: explicit points, then tier, then its amount alias.
    let awarded = match (request.points, request.tier.or(request.amount)) {
        (Some(points), _) if points > 0 => points,
        (Some(_), _) => return Err(ApiError::bad_request("points must be positive")),
        (None, Some(tier)) => state
            .config
            .tier_schedule
            .credits_for(tier)
            .ok_or_else(|| ApiError::bad_request(format!("unknown payment tier: {tier}")))?,
        (None, None) => {
            return Err(ApiError::bad_request(
                "provide a valid tier, amount, or points",
            ))
        }
    };

    let balance = state.orchestrator.ledger().grant(&wallet, awarded).await?;
    info!(wallet = %wallet, amount = awarded, balance = balance, "Awarded payment credits");

    let content_credits = request
        .content_type
        .map(|kind| ((awarded as f64 / kind.cost() as f64) * 100.0).round() / 100.0);

    Ok(Json(AwardResponse {
        wallet_address: wallet,
        awarded_points: awarded,
        new_total_points: balance,
        content_type: request.content_type,
        content_credits,
    }))
}
