// Helper functions for safe logging

/// Masks email addresses for safe logging
/// Prevents sensitive data exposure while preserving debugging utility
///
/// # Example
/// ```
/// let masked = safe_email_log("user@example.com");
/// // Returns: "u***@example.com"
/// ```
pub fn safe_email_log(email: &str) -> String {
    if email.len() > 3 {
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() == 2 {
            // First char, not first byte: the local part may start with a
            // multi-byte character
            match parts[0].chars().next() {
                Some(first) => format!("{}***@{}", first, parts[1]),
                None => format!("***@{}", parts[1]),
            }
        } else {
            "***@***.***".to_string()
        }
    } else {
        "***@***.***".to_string()
    }
}

/// Masks tokens for safe logging
/// Shows only first and last 4 characters
pub fn safe_token_log(token: &str) -> String {
    if token.len() > 8 {
        format!("{}...{}", &token[..4], &token[token.len() - 4..])
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_email_log_masks_local_part() {
        assert_eq!(safe_email_log("user@example.com"), "u***@example.com");
    }

    #[test]
    fn test_safe_email_log_handles_multibyte_first_char() {
        // The first character of the local part may span multiple bytes
        assert_eq!(safe_email_log("über@example.com"), "ü***@example.com");
        assert_eq!(safe_email_log("日本@example.com"), "日***@example.com");
    }

    #[test]
    fn test_safe_email_log_degrades_on_malformed_input() {
        assert_eq!(safe_email_log("@example.com"), "***@example.com");
        assert_eq!(safe_email_log("not-an-email"), "***@***.***");
        assert_eq!(safe_email_log("a@b"), "***@***.***");
    }

    #[test]
    fn test_safe_token_log_shows_edges_only() {
        assert_eq!(safe_token_log("abcdefghij"), "abcd...ghij");
        assert_eq!(safe_token_log("short"), "***");
    }
}
