//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let end = floor_char_boundary(s, target);
        format!("{}...", &s[..end])
    }
}

/// Largest char boundary `<= index` (clamped to the string length).
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut end = index.min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Smallest char boundary `>= index` (clamped to the string length).
pub fn ceil_char_boundary(s: &str, index: usize) -> usize {
    let mut end = index.min(s.len());
    while end < s.len() && !s.is_char_boundary(end) {
        end += 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // 'é' is 2 bytes; cutting inside it must back up
        assert_eq!(truncate("ééééé", 8), "éé...");
    }

    #[test]
    fn test_char_boundaries() {
        let s = "aé b"; // 'é' occupies bytes 1..3
        assert_eq!(floor_char_boundary(s, 2), 1);
        assert_eq!(ceil_char_boundary(s, 2), 3);
        assert_eq!(floor_char_boundary(s, 100), s.len());
        assert_eq!(ceil_char_boundary(s, 100), s.len());
    }
}
