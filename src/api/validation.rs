//! Input validation for API requests.
//!
//! Field-format checks for member input. Uniqueness is not checked here;
//! the store's constraints own that.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating phone numbers (digits with optional dashes,
    /// optional leading +)
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?\d[\d-]{5,19}$").unwrap();

    /// Regex for validating identity codes (alphanumeric, dash, underscore)
    static ref CID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,50}$").unwrap();
}

/// Validate a member display name
pub fn validate_member_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }

    if name.len() > 100 {
        return Err("Name is too long (max 100 characters)".to_string());
    }

    Ok(())
}

/// Validate a phone number
pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.is_empty() {
        return Err("Phone number is required".to_string());
    }

    if !PHONE_REGEX.is_match(phone) {
        return Err("Phone number must be digits and dashes, e.g. 010-1234-5678".to_string());
    }

    Ok(())
}

/// Validate an identity code
pub fn validate_cid(cid: &str) -> Result<(), String> {
    if cid.is_empty() {
        return Err("CID is required".to_string());
    }

    if !CID_REGEX.is_match(cid) {
        return Err("CID must be 1-50 alphanumeric, dash, or underscore characters".to_string());
    }

    Ok(())
}

/// Validate an optional referrer name
pub fn validate_recommender(recommender: Option<&str>) -> Result<(), String> {
    if let Some(r) = recommender {
        if r.len() > 100 {
            return Err("Recommender is too long (max 100 characters)".to_string());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_phones() {
        assert!(validate_phone("010-1111-2222").is_ok());
        assert!(validate_phone("01012345678").is_ok());
        assert!(validate_phone("+82-10-1234-5678").is_ok());
    }

    #[test]
    fn test_invalid_phones() {
        assert!(validate_phone("").is_err());
        assert!(validate_phone("not-a-phone").is_err());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("010 1234 5678").is_err());
    }

    #[test]
    fn test_valid_cids() {
        assert!(validate_cid("abc123").is_ok());
        assert!(validate_cid("testcid").is_ok());
        assert!(validate_cid("A-1_b").is_ok());
    }

    #[test]
    fn test_invalid_cids() {
        assert!(validate_cid("").is_err());
        assert!(validate_cid("has space").is_err());
        assert!(validate_cid(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_member_name() {
        assert!(validate_member_name("Kim").is_ok());
        assert!(validate_member_name("").is_err());
        assert!(validate_member_name("   ").is_err());
        assert!(validate_member_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_recommender() {
        assert!(validate_recommender(None).is_ok());
        assert!(validate_recommender(Some("Choi")).is_ok());
        assert!(validate_recommender(Some(&"x".repeat(101))).is_err());
    }
}
