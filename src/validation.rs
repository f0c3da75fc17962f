use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, AppResult};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+@[\w.-]+\.\w{2,}$").expect("Invalid regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d{10,15}$").expect("Invalid regex"));
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s'-]{2,40}$").expect("Invalid regex"));
static UNSAFE_KEY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("Invalid regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// Normalized user key: lowercase email with every non-alphanumeric char as `_`.
pub fn user_key(email: &str) -> String {
    email
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Replace characters that are unsafe in object keys with `_`.
pub fn sanitize_object_segment(value: &str) -> String {
    UNSAFE_KEY_CHARS.replace_all(value, "_").into_owned()
}

/// Strip spaces and dashes from a phone number.
pub fn compact_phone(phone: &str) -> String {
    phone.chars().filter(|c| *c != ' ' && *c != '-').collect()
}

/// Login phone check: the input must carry at least ten digits and the stored
/// number must end with its last ten.
pub fn phone_matches(stored: &str, input: &str) -> bool {
    let stored = compact_phone(stored);
    let input: Vec<char> = compact_phone(input).chars().collect();
    if input.len() < 10 {
        return false;
    }
    let tail: String = input[input.len() - 10..].iter().collect();
    stored.ends_with(&tail)
}

/// Trimmed, non-empty value or a field error naming it.
pub fn required<'a>(field: &'static str, value: Option<&'a str>) -> AppResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::field(field, format!("Field \"{field}\" is required"))),
    }
}
