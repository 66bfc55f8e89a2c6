//! Input validation shared by configuration loading and email dispatch.

use std::fmt;

/// Validation error type.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn invalid(field_name: &str, message: &str) -> ValidationError {
    ValidationError {
        field: field_name.to_string(),
        message: message.to_string(),
    }
}

/// Validate an email address closely enough to reject obvious garbage.
///
/// # Example
/// ```
/// use reminders::validation::validate_email;
///
/// assert!(validate_email("cook@example.com", "to").is_ok());
/// assert!(validate_email("not-an-address", "to").is_err());
/// ```
pub fn validate_email(value: &str, field_name: &str) -> ValidationResult<()> {
    let email_regex = regex::Regex::new(r"^[^\s@<>]+@[^\s@<>]+\.[^\s@<>]+$")
        .map_err(|e| invalid(field_name, &e.to_string()))?;

    if email_regex.is_match(value.trim()) {
        Ok(())
    } else {
        Err(invalid(field_name, "invalid email address"))
    }
}

/// Validate an absolute http(s) URL without a query string.
///
/// # Example
/// ```
/// use reminders::validation::validate_base_url;
///
/// assert!(validate_base_url("https://app.example.com", "base_url").is_ok());
/// assert!(validate_base_url("app.example.com", "base_url").is_err());
/// ```
pub fn validate_base_url(value: &str, field_name: &str) -> ValidationResult<()> {
    let url_regex = regex::Regex::new(r"^https?://[A-Za-z0-9.\-]+(:[0-9]{1,5})?(/[^\s?#]*)?$")
        .map_err(|e| invalid(field_name, &e.to_string()))?;

    if url_regex.is_match(value) {
        Ok(())
    } else {
        Err(invalid(
            field_name,
            "invalid URL (expected http:// or https:// followed by a host)",
        ))
    }
}

/// Validate that a string is not empty or whitespace only.
pub fn validate_not_empty(value: &str, field_name: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        Err(invalid(field_name, "cannot be empty"))
    } else {
        Ok(())
    }
}

/// Validate that a number falls within an inclusive range.
pub fn validate_range(value: u32, min: u32, max: u32, field_name: &str) -> ValidationResult<()> {
    if value < min || value > max {
        Err(invalid(
            field_name,
            &format!("must be between {min} and {max}, got {value}"),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_addresses() {
        assert!(validate_email("a.b+c@mail.example.org", "to").is_ok());
        assert!(validate_email(" padded@example.com ", "to").is_ok());
        assert!(validate_email("two@@example.com", "to").is_err());
        assert!(validate_email("missing-domain@", "to").is_err());
        assert!(validate_email("", "to").is_err());
    }

    #[test]
    fn base_urls() {
        assert!(validate_base_url("http://localhost:5173", "base_url").is_ok());
        assert!(validate_base_url("https://app.example.com/app", "base_url").is_ok());
        assert!(validate_base_url("ftp://example.com", "base_url").is_err());
        assert!(validate_base_url("https://example.com?x=1", "base_url").is_err());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(validate_range(1, 1, 30, "lookahead_days").is_ok());
        assert!(validate_range(30, 1, 30, "lookahead_days").is_ok());
        let err = validate_range(0, 1, 30, "lookahead_days").unwrap_err();
        assert_eq!(err.field, "lookahead_days");
    }

    #[test]
    fn not_empty() {
        assert!(validate_not_empty("x", "name").is_ok());
        assert!(validate_not_empty("   ", "name").is_err());
    }
}
