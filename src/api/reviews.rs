//! Review API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::{ApiResult, AppJson};
use crate::errors::AppError;
use crate::models::{
    non_blank, validate_rating, CreateReviewRequest, NewReview, Principal, Review, ReviewStatus,
};
use crate::AppState;

/// GET /api/reviews/restaurant/:id - Approved reviews of a restaurant, newest first.
pub async fn list_reviews_for_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> ApiResult<Json<Vec<Review>>> {
    Ok(Json(state.repo.list_approved_reviews(&restaurant_id).await?))
}

/// GET /api/reviews/mine - The caller's own reviews in any status.
pub async fn list_my_reviews(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<Review>>> {
    Ok(Json(state.repo.list_reviews_by_user(&principal.id).await?))
}

/// POST /api/reviews/restaurant/:id - Post a review and refresh the restaurant's rating.
pub async fn create_review(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
    Extension(principal): Extension<Principal>,
    AppJson(request): AppJson<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    let rating = validate_rating(request.rating)?;

    if let Some(user_id) = request.user_id.as_deref() {
        if user_id != principal.id {
            return Err(AppError::Validation {
                message: "userId does not match the authenticated user".to_string(),
                details: Some(serde_json::json!({ "userId": user_id })),
            });
        }
    }

    if state.repo.get_restaurant(&restaurant_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Restaurant {} not found",
            restaurant_id
        )));
    }

    let status = if state.config.review_moderation {
        ReviewStatus::Pending
    } else {
        ReviewStatus::Approved
    };

    let review = state
        .repo
        .create_review(&NewReview {
            restaurant_id,
            user_id: principal.id,
            rating,
            comment: non_blank(request.comment.as_deref()),
            status,
        })
        .await?;

    // Best effort: the review stays saved even if the aggregate goes stale.
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

    Ok((StatusCode::CREATED, Json(review)))
}
