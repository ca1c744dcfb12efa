//! Field checks run before a lead is handed to the driver.
//!
//! Problems found here never fail a lead; they are attached to its outcome.

use std::sync::LazyLock;

use regex::Regex;

use crate::lead::LeadRecord;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email pattern")
});

static AU_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\+?61|0)[2-8]\d{8}$").expect("valid phone pattern"));

static PHONE_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-()]").expect("valid separator pattern"));

pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && EMAIL.is_match(email)
}

/// Australian landline or mobile, ignoring spaces, dashes and parentheses.
pub fn is_valid_au_phone(phone: &str) -> bool {
    let cleaned = PHONE_NOISE.replace_all(phone, "");
    !cleaned.is_empty() && AU_PHONE.is_match(&cleaned)
}

/// Non-fatal problems with the contact fields of `lead`. Blank fields are fine.
pub fn lead_problems(lead: &LeadRecord) -> Vec<String> {
    let mut problems = Vec::new();

    if !lead.email.is_empty() && !is_valid_email(&lead.email) {
        problems.push(format!("Invalid email format: {}", lead.email));
    }
    for (label, value) in [("telephone", &lead.telephone), ("mobile", &lead.mobile)] {
        if !value.is_empty() && !is_valid_au_phone(value) {
            problems.push(format!("Invalid {} number: {}", label, value));
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("jane.citizen@example.com.au"));
        assert!(is_valid_email("a+tag@b.io"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("jane@"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane example@x.com"));
    }

    #[test]
    fn test_au_phone_formats() {
        assert!(is_valid_au_phone("0412 345 678"));
        assert!(is_valid_au_phone("(02) 9876-5432"));
        assert!(is_valid_au_phone("+61412345678"));
        assert!(is_valid_au_phone("61298765432"));
    }

    #[test]
    fn test_invalid_au_phone() {
        assert!(!is_valid_au_phone(""));
        assert!(!is_valid_au_phone("12345"));
        assert!(!is_valid_au_phone("0112345678"));
    }

    #[test]
    fn test_lead_problems() {
        let lead = LeadRecord::new(2, "Jane", "Citizen")
            .with_email("not-an-email")
            .with_mobile("0412 345 678");
        let problems = lead_problems(&lead);
        assert_eq!(problems, vec!["Invalid email format: not-an-email".to_string()]);
    }

    #[test]
    fn test_blank_fields_have_no_problems() {
        assert!(lead_problems(&LeadRecord::new(2, "Jane", "Citizen")).is_empty());
    }
}
