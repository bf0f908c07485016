//! Input validation. Every check runs before any storage access.

use homelink_database::{Gender, Provider};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AccountError, AccountResult};

static LOGIN_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{3,19}$").expect("login id pattern"));
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern")
});
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10,11}$").expect("phone pattern"));

const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 20;
const NAME_MIN: usize = 2;
const NAME_MAX: usize = 10;
const EMAIL_MAX: usize = 255;
const DEVICE_ID_MAX: usize = 128;
const DEVICE_TOKEN_MAX: usize = 4096;

pub fn validate_login_id(login_id: &str) -> AccountResult<()> {
    if !LOGIN_ID.is_match(login_id) {
        return Err(AccountError::validation(
            "login id must be 4 to 20 letters, digits or underscores and start with a letter",
        ));
    }
    Ok(())
}

/// 8 to 20 characters with at least one letter, one digit and one special
/// character. Whitespace is never allowed.
pub fn validate_password(password: &str) -> AccountResult<()> {
    let length = password.chars().count();
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password
        .chars()
        .any(|c| c.is_ascii_punctuation());
    let has_whitespace = password.chars().any(char::is_whitespace);

    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&length)
        || !has_letter
        || !has_digit
        || !has_special
        || has_whitespace
    {
        return Err(AccountError::validation(
            "password must be 8 to 20 characters with a letter, a digit and a special character",
        ));
    }
    Ok(())
}

pub fn validate_email(email: Option<&str>) -> AccountResult<()> {
    match email {
        Some(email) if email.len() > EMAIL_MAX || !EMAIL.is_match(email) => {
            Err(AccountError::validation("invalid email format"))
        }
        _ => Ok(()),
    }
}

pub fn validate_phone_number(phone_number: &str) -> AccountResult<()> {
    if !PHONE.is_match(phone_number) {
        return Err(AccountError::validation(
            "phone number must be 10 or 11 digits",
        ));
    }
    Ok(())
}

pub fn validate_display_name(display_name: &str) -> AccountResult<()> {
    if !length_between(display_name, NAME_MIN, NAME_MAX) {
        return Err(AccountError::validation(
            "display name must be 2 to 10 characters",
        ));
    }
    Ok(())
}

/// Absent means unspecified; only the codes 1 and 2 may be sent.
pub fn parse_gender(code: Option<i64>) -> AccountResult<Gender> {
    match code {
        None => Ok(Gender::Unspecified),
        Some(code @ (1 | 2)) => Gender::from_code(code)
            .ok_or_else(|| AccountError::validation("gender must be 1 or 2")),
        Some(_) => Err(AccountError::validation("gender must be 1 or 2")),
    }
}

pub fn parse_social_provider(provider: &str) -> AccountResult<Provider> {
    match Provider::parse(provider) {
        Some(provider) if provider.is_social() => Ok(provider),
        _ => Err(AccountError::validation("provider must be naver or kakao")),
    }
}

pub fn validate_access_token(access_token: &str) -> AccountResult<()> {
    if access_token.trim().is_empty() {
        return Err(AccountError::validation("access token is required"));
    }
    Ok(())
}

pub fn validate_device_id(device_id: &str) -> AccountResult<()> {
    if device_id.trim().is_empty() || device_id.len() > DEVICE_ID_MAX {
        return Err(AccountError::validation("device id is required"));
    }
    Ok(())
}

pub fn validate_device_label(label: Option<&str>) -> AccountResult<()> {
    match label {
        Some(label) if !length_between(label, NAME_MIN, NAME_MAX) => Err(
            AccountError::validation("device label must be 2 to 10 characters"),
        ),
        _ => Ok(()),
    }
}

pub fn validate_device_token(token: Option<&str>) -> AccountResult<()> {
    match token {
        Some(token) if token.trim().is_empty() || token.len() > DEVICE_TOKEN_MAX => {
            Err(AccountError::validation("device token must not be empty"))
        }
        _ => Ok(()),
    }
}

fn length_between(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.chars().count())
}
