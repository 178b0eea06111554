//! Password hashing and strength policy.
//!
//! Hashes use Argon2id in PHC string format with a per-password random
//! salt. Plaintext passwords are checked against a strength policy
//! before they are ever hashed: minimum length plus at least one
//! uppercase letter, one lowercase letter, and one digit.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use thiserror::Error;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Password rejected by the strength policy.
    #[error("{0}")]
    WeakPassword(&'static str),

    /// Failed to hash password.
    #[error("failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password.
    #[error("failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format.
    #[error("invalid password hash format")]
    InvalidHash,
}

/// Checks a plaintext password against the strength policy.
///
/// The policy requires [`MIN_PASSWORD_LENGTH`] characters, an uppercase
/// letter, a lowercase letter, and a digit. Account creation and
/// password changes both go through this check.
///
/// # Errors
///
/// Returns `PasswordError::WeakPassword` naming the first unmet
/// requirement.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::WeakPassword(
            "password must be at least 8 characters long",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordError::WeakPassword(
            "password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordError::WeakPassword(
            "password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::WeakPassword(
            "password must contain at least one number",
        ));
    }
    Ok(())
}

/// Hashes a password with Argon2id, returning a PHC string.
///
/// Callers are expected to run [`validate_password`] first; hashing
/// itself accepts any input.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a stored PHC hash.
///
/// A wrong password is `Ok(false)`, not an error.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash cannot be
/// parsed, or `PasswordError::VerifyError` on unexpected failures.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_produces_phc_argon2id() {
        let hash = hash_password("Sup3rSecret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, "Sup3rSecret");
    }

    #[test]
    fn test_verify_roundtrip() {
        let hash = hash_password("Sup3rSecret").unwrap();
        assert!(verify_password("Sup3rSecret", &hash).unwrap());
        assert!(!verify_password("sup3rsecret", &hash).unwrap());
    }

    #[test]
    fn test_equal_inputs_hash_differently() {
        // Random salt per hash.
        assert_ne!(
            hash_password("Sup3rSecret").unwrap(),
            hash_password("Sup3rSecret").unwrap()
        );
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("Sup3rSecret", "not-a-phc-string");
        assert!(matches!(result, Err(PasswordError::InvalidHash)));
    }

    #[test]
    fn test_policy_accepts_strong_password() {
        assert!(validate_password("Passw0rd").is_ok());
        assert!(validate_password("Correct-Horse-1").is_ok());
    }

    #[test]
    fn test_policy_rejects_short_password() {
        let err = validate_password("Ab1").unwrap_err();
        assert!(matches!(err, PasswordError::WeakPassword(m) if m.contains("8 characters")));
    }

    #[test]
    fn test_policy_rejects_missing_character_classes() {
        let err = validate_password("passw0rdonly").unwrap_err();
        assert!(matches!(err, PasswordError::WeakPassword(m) if m.contains("uppercase")));

        let err = validate_password("PASSW0RDONLY").unwrap_err();
        assert!(matches!(err, PasswordError::WeakPassword(m) if m.contains("lowercase")));

        let err = validate_password("PasswordOnly").unwrap_err();
        assert!(matches!(err, PasswordError::WeakPassword(m) if m.contains("number")));
    }
}
