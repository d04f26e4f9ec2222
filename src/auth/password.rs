/// Password hashing and verification
///
/// bcrypt with the library default cost, behind a strength policy applied
/// before any hashing work is done.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Hash a password with bcrypt.
///
/// # Errors
/// Returns a validation error when the password fails the strength policy,
/// or an internal error when bcrypt itself fails.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    validate_password_strength(password)?;

    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// Strength policy:
/// - 8 to 128 characters
/// - at least one digit, one lowercase letter, one uppercase letter
fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        )));
    }

    // bcrypt truncates long inputs, so cap the length instead
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        )));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(AppError::Validation(ValidationError::InvalidFormat(
            "password must contain at least one digit, one lowercase letter, and one uppercase letter"
                .to_string(),
        )));
    }

    Ok(())
}
