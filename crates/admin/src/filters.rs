//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Groups a 10-digit phone number as `12 34 56 78 90`.
///
/// Anything else is shown as stored.
///
/// Usage in templates: `{{ person.phone|phone }}`
#[askama::filter_fn]
pub fn phone(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(group_phone(&value.to_string()))
}

fn group_phone(raw: &str) -> String {
    let digits = raw.trim();
    if digits.len() != 10 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return raw.to_string();
    }

    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_phone() {
        assert_eq!(group_phone("4712345678"), "47 12 34 56 78");
        assert_eq!(group_phone(" 4712345678 "), "47 12 34 56 78");
    }

    #[test]
    fn test_group_phone_leaves_other_values() {
        assert_eq!(group_phone("+47 123"), "+47 123");
        assert_eq!(group_phone(""), "");
    }
}
