//! Ownership claim endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::ApiResult;
use crate::errors::AppError;
use crate::models::{Claim, PendingClaim, Principal};
use crate::AppState;

/// POST /api/restaurants/:id/claims - Ask to be recognized as the owner.
pub async fn submit_claim(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<(StatusCode, Json<Claim>)> {
    let restaurant = state
        .repo
        .get_restaurant(&restaurant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Restaurant {} not found", restaurant_id)))?;

    if restaurant.is_claimed {
        return Err(AppError::Conflict(
            "Restaurant is already claimed".to_string(),
        ));
    }

    if state
        .repo
        .find_pending_claim(&restaurant_id, &principal.id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "A claim for this restaurant is already pending".to_string(),
        ));
    }

    let claim = state
        .repo
        .create_claim(&restaurant_id, &principal.id)
        .await?;
    tracing::info!(
        "User {} claimed restaurant {}",
        principal.id,
        restaurant_id
    );
    Ok((StatusCode::CREATED, Json(claim)))
}

/// GET /api/admin/claims/pending - Claims awaiting a decision.
pub async fn list_pending_claims(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PendingClaim>>> {
    Ok(Json(state.repo.list_pending_claims().await?))
}

/// PATCH /api/admin/claims/:id/approve - Approve a claim and set the owner.
pub async fn approve_claim(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Claim>> {
    let claim = state.repo.approve_claim(&id).await?;
    tracing::info!(
        "Restaurant {} now owned by {}",
        claim.restaurant_id,
        claim.claimant_id
    );
    Ok(Json(claim))
}
