

#[inline]
pub fn safe_truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}

/// Key under which a category appears in one-hot training columns.
///
/// Training columns spell categories with underscores for spaces, so both
/// spellings collapse to the same key.
#[inline]
pub fn category_key(category: &str) -> String {
    category.trim().to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_truncate_ellipsis() {
        assert_eq!(safe_truncate_ellipsis("you guys are great", 8), "you guys...");
        assert_eq!(safe_truncate_ellipsis("y'all", 10), "y'all");
    }

    #[test]
    fn test_safe_truncate_multibyte() {
        assert_eq!(safe_truncate_ellipsis("Привет мир", 6), "Привет...");
    }

    #[test]
    fn test_category_key() {
        assert_eq!(category_key("you guys"), "you_guys");
        assert_eq!(category_key("you_guys"), "you_guys");
        assert_eq!(category_key("Italian sandwich"), "italian_sandwich");
        assert_eq!(category_key("y'all"), "y'all");
    }
}
