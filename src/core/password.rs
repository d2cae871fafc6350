//! Password hashing with Argon2id.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use library_core::{AppError, ErrorExt};

/// Hash a password with a random salt, returning the PHC string.
///
/// # Errors
///
/// Returns `AppError::Internal` if password hashing fails.
pub fn hash(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .internal("Failed to hash password")
}

/// Verify a password against a stored PHC string.
///
/// A malformed stored hash never verifies.
#[must_use]
pub fn verify(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash("pw").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify("pw", &hash));
        assert!(!verify("wrong", &hash));
    }

    #[test]
    fn salts_differ() {
        let first = hash("same").unwrap();
        let second = hash("same").unwrap();
        assert_ne!(first, second);
        assert!(verify("same", &first));
        assert!(verify("same", &second));
    }

    #[test]
    fn plaintext_stored_value_never_verifies() {
        assert!(!verify("pw", "pw"));
    }
}
