//! Registration, login and current-user endpoints.

use axum::{extract::State, http::StatusCode, Extension, Json};

use super::{ApiResult, AppJson};
use crate::auth::{hash_password_blocking, verify_password_blocking};
use crate::errors::AppError;
use crate::models::{
    normalize_email, CredentialsRequest, LoginResponse, Principal, RegisterResponse, Role,
};
use crate::AppState;

/// POST /api/auth/register - Create a user account.
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let email = normalize_email(&request.email);
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("A valid email is required"));
    }

    if state.repo.get_user_by_email(&email).await?.is_some() {
        return Err(AppError::validation("User already exists"));
    }

    let password_hash = hash_password_blocking(request.password).await?;
    let user = state
        .repo
        .create_user(&email, &password_hash, Role::User)
        .await
        .map_err(duplicate_as_validation)?;

    tracing::info!("Registered user {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered".to_string(),
            id: user.id,
        }),
    ))
}

/// POST /api/auth/login - Exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<CredentialsRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let email = normalize_email(&request.email);
    let user = state
        .repo
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password_blocking(request.password, user.password_hash.clone()).await? {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state.tokens.issue(&user.id, user.role)?;
    Ok(Json(LoginResponse { token }))
}

/// GET /api/auth/me - The authenticated principal.
pub async fn current_user(Extension(principal): Extension<Principal>) -> Json<Principal> {
    Json(principal)
}

/// A concurrent registration with the same email trips the unique index.
fn duplicate_as_validation(err: AppError) -> AppError {
    match err {
        AppError::Conflict(_) => AppError::validation("User already exists"),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_email_is_a_validation_error() {
        let err = duplicate_as_validation(AppError::Conflict("UNIQUE constraint failed".into()));
        assert!(matches!(
            &err,
            AppError::Validation { message, .. } if message == "User already exists"
        ));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        assert!(matches!(
            duplicate_as_validation(AppError::Database("disk I/O error".into())),
            AppError::Database(_)
        ));
    }
}
