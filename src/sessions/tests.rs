//! Tests for sessions module
//!
//! These tests verify the provider response handling:
//! - GitHub form-encoded token extraction
//! - Callback parameter structure

#[cfg(test)]
mod tests {
    use crate::services::oauth::extract_access_token;

    #[test]
    fn test_extract_access_token_from_form_body() {
        let body = "access_token=gho_abc123&scope=user&token_type=bearer";
        assert_eq!(extract_access_token(body), Some("gho_abc123".to_string()));
    }

    #[test]
    fn test_extract_access_token_not_first_pair() {
        let body = "scope=user&access_token=gho_xyz&token_type=bearer";
        assert_eq!(extract_access_token(body), Some("gho_xyz".to_string()));
    }

    #[test]
    fn test_extract_access_token_missing() {
        assert_eq!(extract_access_token("error=bad_verification_code"), None);
        assert_eq!(extract_access_token(""), None);
    }

    #[test]
    fn test_extract_access_token_empty_value() {
        assert_eq!(extract_access_token("access_token=&scope=user"), None);
    }
}
