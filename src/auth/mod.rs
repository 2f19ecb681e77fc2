//! Bearer-token authentication and role-based authorization.
//!
//! Two layers are composed per route group: [`authenticate`] resolves the
//! principal from the store, [`authorize`] checks its role against a [`RoleSet`].

mod password;
mod token;

pub use password::*;
pub use token::*;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::models::{Principal, Role};
use crate::AppState;

/// Set of roles allowed through an authorization layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(u8);

impl RoleSet {
    /// Any signed-in user.
    pub const MEMBERS: RoleSet = RoleSet::of(&[Role::User, Role::Admin]);
    /// Administrators only.
    pub const ADMINS: RoleSet = RoleSet::of(&[Role::Admin]);

    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < roles.len() {
            bits |= Self::bit(roles[i]);
            i += 1;
        }
        RoleSet(bits)
    }

    pub const fn contains(self, role: Role) -> bool {
        self.0 & Self::bit(role) != 0
    }

    const fn bit(role: Role) -> u8 {
        match role {
            Role::User => 1 << 0,
            Role::Admin => 1 << 1,
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Verify the bearer token and attach the stored [`Principal`] to the request.
///
/// The role is read from the user record, not from the token.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;
    let claims = state.tokens.verify(token)?;

    let user = state
        .repo
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if user.role != claims.role {
        tracing::debug!(
            "Token role {} for user {} is stale, stored role is {}",
            claims.role.as_str(),
            user.id,
            user.role.as_str()
        );
    }

    request.extensions_mut().insert(Principal::from(user));
    Ok(next.run(request).await)
}

/// Reject principals whose role is not in `allowed`.
pub async fn authorize(
    allowed: RoleSet,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

    if !allowed.contains(principal.role) {
        return Err(AppError::Forbidden(
            "Forbidden: insufficient privileges".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_role_sets() {
        assert!(RoleSet::MEMBERS.contains(Role::User));
        assert!(RoleSet::MEMBERS.contains(Role::Admin));
        assert!(RoleSet::ADMINS.contains(Role::Admin));
        assert!(!RoleSet::ADMINS.contains(Role::User));
        assert!(!RoleSet::of(&[]).contains(Role::Admin));
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
