use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;

use super::{error::ApiError, extractors::AuthenticatedUser, AppState};
use crate::common::types::{
    HealthResponse, VerificationRecord, VerificationRequest, VerificationResult,
};
use crate::common::{validation::validate_request, verify};

/// Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}

/// Verify a signed message and record the attempt in the caller's history.
///
/// A signature that does not recover is still a 200; only malformed bodies
/// are rejected.
pub async fn verify_signature(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: Result<Json<VerificationRequest>, JsonRejection>,
) -> Result<Json<VerificationResult>, ApiError> {
    let Json(request) = payload?;
    let request = validate_request(request).map_err(|e| {
        tracing::debug!(error = %e, "rejected verify request");
        e
    })?;

    let result = verify::verify(&request.message, &request.signature);
    tracing::info!(
        user = %user.user_id,
        is_valid = result.is_valid,
        signer = ?result.signer,
        "verified signature"
    );

    state
        .history
        .append(
            &user.user_id,
            VerificationRecord::from_result(&request.signature, &result),
        )
        .await?;

    Ok(Json(result))
}

/// The caller's past verifications, oldest first
pub async fn history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<VerificationRecord>>, ApiError> {
    let records = state.history.get(&user.user_id).await?;
    Ok(Json(records))
}
