//! REST API module.
//!
//! Handlers validate input, call the repository and the geocoder, and return
//! plain JSON bodies. Failures surface as [`AppError`] responses.

mod auth;
mod categories;
mod claims;
mod moderation;
mod restaurants;
mod reviews;

pub use auth::*;
pub use categories::*;
pub use claims::*;
pub use moderation::*;
pub use restaurants::*;
pub use reviews::*;

use axum::extract::FromRequest;

use crate::errors::AppError;
use crate::models::non_blank;

/// Handler result type.
pub type ApiResult<T> = Result<T, AppError>;

/// JSON body extractor whose rejections are validation errors.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Apply a partial text update: absent keeps the old value, blank clears it.
fn merge_text(update: Option<&str>, existing: &Option<String>) -> Option<String> {
    match update {
        Some(value) => non_blank(Some(value)),
        None => existing.clone(),
    }
}

/// Trimmed, non-empty required text field.
fn required_text(value: &str, field: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation {
            message: format!("{} is required", field),
            details: Some(serde_json::json!({ "field": field })),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_text() {
        let existing = Some("old".to_string());
        assert_eq!(merge_text(None, &existing), existing);
        assert_eq!(merge_text(Some(""), &existing), None);
        assert_eq!(merge_text(Some(" new "), &existing), Some("new".to_string()));
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("  Sushi House ", "name").unwrap(), "Sushi House");
        assert!(matches!(
            required_text("   ", "name"),
            Err(AppError::Validation { .. })
        ));
    }
}
