//! Password hashing.

use crate::errors::AppError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash a password with bcrypt after checking the length policy.
///
/// CPU bound; call from a blocking task.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(pwhash::bcrypt::hash(password)?)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    pwhash::bcrypt::verify(password, hash)
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, AppError> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let input = "p^$$w%&7*{}";
        let hash = hash_password(input).unwrap();
        assert_ne!(hash, input);
        assert!(verify_password(input, &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn test_short_passwords_are_rejected() {
        for short in ["", "a", "abcde"] {
            assert!(matches!(
                hash_password(short),
                Err(AppError::Validation { .. })
            ));
        }
    }
}
