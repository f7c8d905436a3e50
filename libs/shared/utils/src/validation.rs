// libs/shared/utils/src/validation.rs
use std::sync::LazyLock;

use regex::Regex;

/// Optional `+CC` country prefix, then digit groups split by single spaces or
/// hyphens. The subscriber number may not start with 0.
const PHONE_PATTERN: &str = r"^(?:\+[1-9]\d{0,2}[ -]?)?[1-9]\d*(?:[ -]\d+)*$";

const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;

static PHONE_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(PHONE_PATTERN).ok());

/// Contact number check shared by the booking and membership forms.
pub fn validate_phone(phone: &str) -> bool {
    let Some(phone_regex) = PHONE_REGEX.as_ref() else {
        return false;
    };

    let phone = phone.trim();
    if !phone_regex.is_match(phone) {
        return false;
    }

    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_formats() {
        assert!(validate_phone("9876543210"));
        assert!(validate_phone("+91 98765-43210"));
        assert!(validate_phone("+919876543210"));
        assert!(validate_phone("98765 43210"));
        assert!(validate_phone(" 9876543210 "));
    }

    #[test]
    fn test_rejects_malformed_numbers() {
        assert!(!validate_phone(""));
        assert!(!validate_phone("   "));
        assert!(!validate_phone("not a phone"));
        assert!(!validate_phone("+-+- 98765 43210 +"));
        assert!(!validate_phone("98765x43210"));
        assert!(!validate_phone("98765--43210"));
        assert!(!validate_phone("0000000000"));
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(!validate_phone("12345"));
        assert!(!validate_phone("1234567890123456789012"));
    }
}
