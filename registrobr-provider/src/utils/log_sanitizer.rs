//! Log sanitization utilities
//!
//! Login pages and zone pages are full HTML documents and carry anti-forgery
//! tokens. Neither belongs in a debug log verbatim.

/// Maximum number of characters to include in truncated log output.
const TRUNCATE_LIMIT: usize = 256;

/// Number of leading characters [`mask_secret`] leaves visible.
const MASK_VISIBLE: usize = 4;

/// MSRV-compatible replacement for `str::floor_char_boundary` (stable since 1.91.0).
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        let mut i = index;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

/// Truncate a response body for logging, noting the full length.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// Mask a token or password: `abcd****`. Short values are fully masked.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= MASK_VISIBLE * 2 {
        return "*".repeat(count.max(1));
    }
    let visible: String = secret.chars().take(MASK_VISIBLE).collect();
    format!("{visible}{}", "*".repeat(count - MASK_VISIBLE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_string_unchanged() {
        let s = "<html></html>";
        assert_eq!(truncate_for_log(s), s);
    }

    #[test]
    fn over_limit_truncated() {
        let s = "a".repeat(TRUNCATE_LIMIT + 100);
        let result = truncate_for_log(&s);
        assert!(result.contains("... [truncated, total"));
        assert!(result.contains(&format!("{} bytes]", TRUNCATE_LIMIT + 100)));
        assert!(result.len() < s.len());
    }

    #[test]
    fn multibyte_chars_safe() {
        let s = "ção".repeat(200);
        let result = truncate_for_log(&s);
        assert!(result.contains("... [truncated, total"));
    }

    #[test]
    fn mask_keeps_prefix_only() {
        assert_eq!(mask_secret("abcdef0123456789"), "abcd************");
        assert_eq!(mask_secret("hunter2"), "*******");
        assert_eq!(mask_secret(""), "*");
    }
}
