use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;
use crate::users::dto::RegisterRequest;

pub const USERNAME_MIN_LEN: usize = 3;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;
// Applied to the password in the combined length check, not the username.
pub const COMBINED_CHECK_MAX_LEN: usize = 20;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9.-]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Registration input that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Runs the registration checks in order; the first failure wins.
pub fn validate_registration(req: RegisterRequest) -> Result<Registration, ApiError> {
    let (username, password, email) = match (req.username, req.password, req.email) {
        (Some(u), Some(p), Some(e)) => (u.trim().to_string(), p, e),
        _ => return Err(ApiError::MissingInput),
    };
    if username.is_empty() || password.is_empty() || email.is_empty() {
        return Err(ApiError::MissingInput);
    }

    let username_len = username.chars().count();
    let password_len = password.chars().count();

    if username_len < USERNAME_MIN_LEN || password_len > COMBINED_CHECK_MAX_LEN {
        return Err(ApiError::LengthViolation);
    }

    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&password_len) {
        return Err(ApiError::PasswordLengthViolation);
    }

    if !is_valid_email(&email) {
        return Err(ApiError::InvalidEmail);
    }

    if username.is_empty() || password.is_empty() {
        return Err(ApiError::EmptyCredential);
    }

    Ok(Registration {
        username,
        password,
        email,
    })
}
