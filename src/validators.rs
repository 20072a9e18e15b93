/// Input validators
///
/// Request bodies are checked here before anything reaches the session
/// core or the database:
/// 1. Length limits on every free-text field
/// 2. Email format
/// 3. Control characters and null bytes rejected in names
/// 4. Passwords bounded by what bcrypt can hash

use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::MAX_PASSWORD_BYTES;
use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 256;
const MAX_DESCRIPTION_LENGTH: usize = 1024;
const MAX_SYMBOL_LENGTH: usize = 16;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).expect("email regex is valid");

    static ref SYMBOL_REGEX: Regex = Regex::new(r"^[A-Za-z0-9.\-]+$").expect("symbol regex is valid");
}

/// Validates email address and returns it trimmed
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

/// Validates a display name (user, asset or category) and returns it trimmed
pub fn is_valid_name(field: &str, name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(field.to_string(), MAX_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent(field.to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates free text such as descriptions; may be multi-line
pub fn is_valid_description(field: &str, text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }

    if trimmed.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong(field.to_string(), MAX_DESCRIPTION_LENGTH));
    }

    if trimmed.contains('\0') {
        return Err(ValidationError::SuspiciousContent(field.to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a ticker symbol and returns it upper-cased
pub fn is_valid_symbol(symbol: &str) -> Result<String, ValidationError> {
    let trimmed = symbol.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("symbol".to_string()));
    }

    if trimmed.len() > MAX_SYMBOL_LENGTH {
        return Err(ValidationError::TooLong("symbol".to_string(), MAX_SYMBOL_LENGTH));
    }

    if !SYMBOL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("symbol".to_string()));
    }

    Ok(trimmed.to_uppercase())
}

/// Password must be present and hashable; strength rules are left to clients
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_BYTES));
    }

    Ok(())
}

pub fn is_valid_id(field: &str, id: i64) -> Result<i64, ValidationError> {
    if id <= 0 {
        return Err(ValidationError::InvalidFormat(field.to_string()));
    }
    Ok(id)
}

pub fn is_valid_amount(field: &str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat(field.to_string()));
    }
    Ok(value)
}

/// Detects suspicious patterns in email addresses that might indicate phishing
fn has_suspicious_email_patterns(email: &str) -> bool {
    if let Some(at_pos) = email.find('@') {
        let local_part = &email[..at_pos];
        if local_part.len() > 64 {
            return true;
        }
    }

    if email.matches('@').count() != 1 {
        return true;
    }

    email.contains('\0')
}
