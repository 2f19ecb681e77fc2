//! User accounts and roles.

use serde::{Deserialize, Serialize};

/// Role of a principal. Stored on the user record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Stored user record including the password hash.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: String,
}

/// The authenticated actor of a request, resolved from the store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

/// Request body for registration and login.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Successful registration.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub id: String,
}

/// Canonical form of an email address used for lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
