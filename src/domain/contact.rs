//! Structural checks for phone numbers and email addresses.

use serde::{Deserialize, Serialize};
use validator::validate_email;

/// Accepts an optional leading `+`, then 7 to 15 digits; spaces, dashes,
/// dots and parentheses are allowed as separators.
pub fn is_valid_phone(phone: &str) -> bool {
    let trimmed = phone.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if body.is_empty() {
        return false;
    }
    let mut digits = 0;
    for ch in body.chars() {
        match ch {
            '0'..='9' => digits += 1,
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return false,
        }
    }
    (7..=15).contains(&digits)
}

/// RFC-style address check, additionally requiring a dot in the domain.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    validate_email(email)
        && email
            .rsplit_once('@')
            .is_some_and(|(_, domain)| domain.contains('.'))
}

fn digits_of(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// The numbering plan SMS is allowed to reach.
///
/// A number is domestic when, after stripping separators, it is either the
/// bare national number or the country code followed by it, and the
/// national number starts with the mobile prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomesticNumbering {
    pub country_code: String,
    pub national_length: usize,
    pub mobile_prefix: String,
}

impl Default for DomesticNumbering {
    fn default() -> Self {
        Self {
            country_code: "995".to_string(),
            national_length: 9,
            mobile_prefix: "5".to_string(),
        }
    }
}

impl DomesticNumbering {
    /// Returns the number in `+<country><national>` form when it is domestic.
    pub fn normalize(&self, phone: &str) -> Option<String> {
        let digits = digits_of(phone);
        let national = if digits.len() == self.national_length {
            digits.as_str()
        } else {
            digits
                .strip_prefix(self.country_code.as_str())
                .filter(|rest| rest.len() == self.national_length)?
        };
        national
            .starts_with(self.mobile_prefix.as_str())
            .then(|| format!("+{}{}", self.country_code, national))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_structure() {
        assert!(is_valid_phone("+995 555 12 34 56"));
        assert!(is_valid_phone("(212) 555-0100"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("+995 555 12 34 56 78 90 12"));
        assert!(!is_valid_phone("call me"));
        assert!(!is_valid_phone("+"));
    }

    #[test]
    fn test_email_structure() {
        assert!(is_valid_email("nino@example.ge"));
        assert!(is_valid_email("a.b+c@mail.example.com"));
        assert!(!is_valid_email("nino@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("nino@@example.com"));
        assert!(!is_valid_email("ni no@example.com"));
        assert!(!is_valid_email("nino@.com"));
        assert!(!is_valid_email("a@-.com"));
        assert!(is_valid_email("  nino@example.ge "));
    }

    #[test]
    fn test_domestic_numbering() {
        let plan = DomesticNumbering::default();
        assert_eq!(
            plan.normalize("+995 555 12-34-56"),
            Some("+995555123456".to_string())
        );
        assert_eq!(plan.normalize("555123456"), Some("+995555123456".to_string()));
        // Landline prefix.
        assert_eq!(plan.normalize("+995 322 123 456"), None);
        // Foreign number.
        assert_eq!(plan.normalize("+1 212 555 0100"), None);
    }
}
