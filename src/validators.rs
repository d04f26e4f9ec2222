/// Input validators for registration and account recovery payloads.
/// Length limits guard against oversized inputs; format checks catch
/// malformed data before it reaches the database.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_NAME_LENGTH: usize = 256;
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_PHONE_LENGTH: usize = 20;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 \-()]{4,}$").unwrap();
}

/// Validates an email address: format, length, and a single `@`.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    if has_suspicious_email_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a person name field (first or last name).
pub fn is_valid_name(field: &str, name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }

    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(field.to_string(), MAX_NAME_LENGTH));
    }

    if has_suspicious_name_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent(field.to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates an optional phone number; `None` passes through.
pub fn is_valid_phone(phone: Option<&str>) -> Result<Option<String>, ValidationError> {
    let phone = match phone {
        Some(p) => p.trim(),
        None => return Ok(None),
    };

    if phone.is_empty() {
        return Ok(None);
    }

    if phone.len() > MAX_PHONE_LENGTH {
        return Err(ValidationError::TooLong("phone_number".to_string(), MAX_PHONE_LENGTH));
    }

    if !PHONE_REGEX.is_match(phone) {
        return Err(ValidationError::InvalidFormat("phone_number".to_string()));
    }

    Ok(Some(phone.to_string()))
}

fn has_suspicious_email_patterns(email: &str) -> bool {
    // Local part longer than 64 characters is outside RFC limits
    if let Some(at_pos) = email.find('@') {
        let local_part = &email[..at_pos];
        if local_part.len() > 64 {
            return true;
        }
    }

    if email.matches('@').count() != 1 {
        return true;
    }

    if email.contains('\0') {
        return true;
    }

    false
}

fn has_suspicious_name_patterns(name: &str) -> bool {
    if name.contains('\0') {
        return true;
    }

    if name.chars().any(|c| c.is_control()) {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());

        assert!(is_valid_email("a@b").is_err()); // Too short
    }

    #[test]
    fn email_is_trimmed() {
        assert_eq!(
            is_valid_email("  user@example.com  ").unwrap(),
            "user@example.com"
        );
    }

    #[test]
    fn valid_name() {
        assert!(is_valid_name("first_name", "John").is_ok());
        assert!(is_valid_name("last_name", "Jean-Pierre").is_ok());
        assert!(is_valid_name("last_name", "O'Brien").is_ok());
    }

    #[test]
    fn name_length_limits() {
        let too_long = "a".repeat(257);
        assert!(is_valid_name("first_name", &too_long).is_err());

        assert!(is_valid_name("first_name", "").is_err());
    }

    #[test]
    fn control_characters_in_name() {
        assert!(is_valid_name("first_name", "Name\0with\0null").is_err());
        assert!(is_valid_name("first_name", "line\nbreak").is_err());
    }

    #[test]
    fn valid_phone() {
        assert_eq!(
            is_valid_phone(Some("+1 555-0100")).unwrap(),
            Some("+1 555-0100".to_string())
        );
        assert_eq!(is_valid_phone(None).unwrap(), None);
        assert_eq!(is_valid_phone(Some("  ")).unwrap(), None);
    }

    #[test]
    fn invalid_phone() {
        assert!(is_valid_phone(Some("not-a-number")).is_err());
        assert!(is_valid_phone(Some(&"1".repeat(30))).is_err());
    }
}
