//! Input validation rules from §4.7's closing paragraph.

use crate::error::CamelotError;

pub fn validate_email(email: &str) -> Result<String, CamelotError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || email.len() > 256 {
        return Err(CamelotError::Validation("email must be 1..256 characters".into()));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(CamelotError::Validation("email must contain '@'".into()));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.starts_with('.') {
        return Err(CamelotError::Validation("email is not well-formed".into()));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> Result<(), CamelotError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(CamelotError::Validation("password must be 8..128 characters".into()));
    }
    Ok(())
}

pub fn validate_display_name(name: &str) -> Result<String, CamelotError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 64 {
        return Err(CamelotError::Validation("display name must be 1..64 characters".into()));
    }
    Ok(trimmed.to_string())
}

const CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub fn validate_room_code(code: &str) -> Result<String, CamelotError> {
    let code = code.trim().to_uppercase();
    if code.len() != 6 || !code.chars().all(|c| CODE_ALPHABET.contains(c)) {
        return Err(CamelotError::Validation("room code must be 6 characters from the room-code alphabet".into()));
    }
    Ok(code)
}
