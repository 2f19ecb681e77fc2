//! Review moderation endpoints (admin only).

use axum::{
    extract::{Path, State},
    Json,
};

use super::ApiResult;
use crate::errors::AppError;
use crate::models::{MessageResponse, PendingReview, Review, ReviewStatus, Transition};
use crate::AppState;

/// GET /api/admin/reviews/pending - Reviews awaiting a decision.
pub async fn list_pending_reviews(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PendingReview>>> {
    Ok(Json(state.repo.list_pending_reviews().await?))
}

/// PATCH /api/admin/reviews/:id/approve - Publish a pending review.
pub async fn approve_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Review>> {
    let review = moderate(&state, &id, ReviewStatus::Approved).await?;
    Ok(Json(review))
}

/// DELETE /api/admin/reviews/:id - Mark a pending review as removed.
///
/// The review is kept with status `removed`; the restaurant's rating is recomputed without it.
pub async fn remove_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let review = moderate(&state, &id, ReviewStatus::Removed).await?;

    if let Err(e) = state
        .repo
        .refresh_restaurant_rating(&review.restaurant_id)
        .await
    {
        tracing::warn!(
            "Failed to refresh rating of restaurant {}: {}",
            review.restaurant_id,
            e
        );
    }

    Ok(Json(MessageResponse::new("Review removed")))
}

async fn moderate(state: &AppState, id: &str, target: ReviewStatus) -> ApiResult<Review> {
    let review = state
        .repo
        .get_review(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review {} not found", id)))?;

    match review.status.transition(target)? {
        Transition::AlreadyDone => Ok(review),
        Transition::Apply => {
            let updated = state
                .repo
                .transition_review(id, review.status, target)
                .await?;
            tracing::info!("Review {} is now {}", id, target.as_str());
            Ok(updated)
        }
    }
}
