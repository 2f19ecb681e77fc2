//! Review model and moderation status.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Moderation status of a review.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Removed,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Removed => "removed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReviewStatus::Pending),
            "approved" => Some(ReviewStatus::Approved),
            "removed" => Some(ReviewStatus::Removed),
            _ => None,
        }
    }

    /// Decide a moderation move from this status.
    ///
    /// Only pending reviews move. Repeating the move that produced the current
    /// status is a no-op; anything else is a conflict.
    pub fn transition(self, target: ReviewStatus) -> Result<Transition, AppError> {
        match (self, target) {
            (ReviewStatus::Pending, ReviewStatus::Approved | ReviewStatus::Removed) => {
                Ok(Transition::Apply)
            }
            (current, target) if current == target => Ok(Transition::AlreadyDone),
            (current, target) => Err(AppError::Conflict(format!(
                "Review cannot move from {} to {}",
                current.as_str(),
                target.as_str()
            ))),
        }
    }
}

/// Outcome of [`ReviewStatus::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Apply,
    AlreadyDone,
}

/// A star rating left by a user for a restaurant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub restaurant_id: String,
    pub user_id: String,
    pub rating: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub status: ReviewStatus,
    pub created_at: String,
}

/// Pending review joined with the name of its restaurant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReview {
    #[serde(flatten)]
    pub review: Review,
    pub restaurant_name: String,
}

/// Request body for posting a review.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub rating: f64,
    #[serde(default)]
    pub comment: Option<String>,
    /// Accepted for older clients; must match the authenticated user.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Validated review ready to be stored.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub restaurant_id: String,
    pub user_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub status: ReviewStatus,
}

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Accept whole star ratings between [`MIN_RATING`] and [`MAX_RATING`].
pub fn validate_rating(rating: f64) -> Result<i64, AppError> {
    if rating.fract() != 0.0 || rating < MIN_RATING as f64 || rating > MAX_RATING as f64 {
        return Err(AppError::Validation {
            message: format!(
                "Rating must be a whole number between {} and {}",
                MIN_RATING, MAX_RATING
            ),
            details: Some(serde_json::json!({ "rating": rating })),
        });
    }
    Ok(rating as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rating() {
        assert_eq!(validate_rating(1.0).unwrap(), 1);
        assert_eq!(validate_rating(5.0).unwrap(), 5);
        assert!(validate_rating(0.0).is_err());
        assert!(validate_rating(6.0).is_err());
        assert!(validate_rating(4.5).is_err());
        assert!(validate_rating(-3.0).is_err());
        assert!(validate_rating(f64::NAN).is_err());
    }

    #[test]
    fn test_status_round_trip_names() {
        for status in [
            ReviewStatus::Pending,
            ReviewStatus::Approved,
            ReviewStatus::Removed,
        ] {
            assert_eq!(ReviewStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ReviewStatus::parse("deleted"), None);
    }

    #[test]
    fn test_transitions() {
        use ReviewStatus::*;

        assert_eq!(Pending.transition(Approved).unwrap(), Transition::Apply);
        assert_eq!(Pending.transition(Removed).unwrap(), Transition::Apply);
        assert_eq!(Approved.transition(Approved).unwrap(), Transition::AlreadyDone);
        assert_eq!(Removed.transition(Removed).unwrap(), Transition::AlreadyDone);
        assert!(matches!(
            Removed.transition(Approved),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            Approved.transition(Removed),
            Err(AppError::Conflict(_))
        ));
        assert!(Approved.transition(Pending).is_err());
    }

    #[test]
    fn test_pending_review_flattens() {
        let pending = PendingReview {
            review: Review {
                id: "r1".into(),
                restaurant_id: "x".into(),
                user_id: "u".into(),
                rating: 4,
                comment: None,
                status: ReviewStatus::Pending,
                created_at: "2026-01-01T00:00:00.000000Z".into(),
            },
            restaurant_name: "Sushi House".into(),
        };
        let value = serde_json::to_value(&pending).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["restaurantName"], "Sushi House");
        assert_eq!(value["restaurantId"], "x");
    }
}
