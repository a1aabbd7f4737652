//! Validation rules shared by the booking flow (fast feedback) and the HTTP
//! handlers (authoritative re-check on submission).

use crate::error::ApiError;

/// International phone format: "+" followed by 10 to 15 digits.
pub fn is_international_phone(phone: &str) -> bool {
    let Some(rest) = phone.strip_prefix('+') else {
        return false;
    };
    (10..=15).contains(&rest.len()) && rest.bytes().all(|b| b.is_ascii_digit())
}

/// Combine a raw local number with a country calling code.
///
/// Whitespace is stripped and a single leading "0" is dropped before the
/// calling code is prefixed, so "0176 1234567" with "+49" becomes
/// "+491761234567".
pub fn normalize_phone(raw: &str, calling_code: &str) -> Result<String, ApiError> {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = digits.strip_prefix('0').unwrap_or(&digits);

    let code = calling_code.trim();
    let full = if code.starts_with('+') {
        format!("{code}{digits}")
    } else {
        format!("+{code}{digits}")
    };

    if is_international_phone(&full) {
        Ok(full)
    } else {
        Err(ApiError::validation(
            "Please enter a valid phone number with country code.",
        ))
    }
}

pub fn require(value: &str, message: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(message));
    }
    Ok(())
}

/// Status values are drawn from small fixed sets per entity.
pub fn check_status(status: &str, allowed: &[&str]) -> Result<(), ApiError> {
    if allowed.contains(&status) {
        return Ok(());
    }
    Err(ApiError::validation(format!("Invalid status '{status}'.")))
}
