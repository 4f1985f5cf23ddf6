use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

pub fn validate_email(email: &str) -> AppResult<()> {
    if !EMAIL_REGEX.is_match(email.trim()) {
        return Err(AppError::ValidationError(format!("Invalid email address: {email}")));
    }
    Ok(())
}

/// Emails are compared and stored lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("jo@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.co").is_ok());
        assert!(validate_email("no-at-sign.example.com").is_err());
        assert!(validate_email("jo@localhost").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jo@Example.COM "), "jo@example.com");
    }
}
