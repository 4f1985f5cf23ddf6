use crate::error::{AppError, AppResult};
use bcrypt::{BcryptError, DEFAULT_COST, hash, verify};

const MIN_PASSWORD_CHARS: usize = 8;
/// bcrypt ignores everything past the first 72 bytes.
const MAX_PASSWORD_BYTES: usize = 72;
/// Local parts shorter than this are too common to reject on.
const MIN_EMAIL_HINT_CHARS: usize = 3;

const HASH_COST: u32 = if cfg!(test) { 4 } else { DEFAULT_COST };

/// Checks an account password against the signup policy. `email` is the
/// address the account is registered under; its local part may not appear in
/// the password.
pub fn validate_password(password: &str, email: &str) -> AppResult<()> {
    let invalid = |reason: &str| Err(AppError::ValidationError(format!("password: {reason}")));

    if password.chars().count() < MIN_PASSWORD_CHARS {
        return invalid("must be at least 8 characters");
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return invalid("must be at most 72 bytes");
    }

    let mut has_lower = false;
    let mut has_upper = false;
    let mut has_digit = false;
    for c in password.chars() {
        has_lower |= c.is_lowercase();
        has_upper |= c.is_uppercase();
        has_digit |= c.is_ascii_digit();
    }
    if !(has_lower && has_upper && has_digit) {
        return invalid("needs upper and lower case letters plus a digit");
    }

    let local = email
        .split('@')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    if local.chars().count() >= MIN_EMAIL_HINT_CHARS && password.to_lowercase().contains(&local) {
        return invalid("must not contain the account email");
    }

    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, HASH_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))
}

/// A stored hash bcrypt cannot parse counts as a mismatch, so such an
/// account fails login with the usual 401.
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    match verify(password, password_hash) {
        Ok(matches) => Ok(matches),
        Err(BcryptError::InvalidHash(_) | BcryptError::InvalidPrefix(_)) => {
            log::warn!("Stored password hash is not a bcrypt hash");
            Ok(false)
        }
        Err(e) => Err(AppError::InternalError(format!(
            "Password verification failed: {e}"
        ))),
    }
}
