use chrono::Utc;
use derive_new::new;
use serde::Serialize;

pub type Timestamp = chrono::DateTime<Utc>;

/// A snapshot of one post's public stats, rebuilt from scratch on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, new)]
pub struct Video {
    pub video_id: String,
    pub username: String,
    pub title: String,
    pub views: u64,
    pub url: String,
}

/// Cut `text` down to at most `limit` characters, respecting char boundaries.
pub fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

/// Render a view count with thousands separators, e.g. `1,234,567`.
pub fn group_digits(views: u64) -> String {
    let digits = views.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_text_is_untouched() {
        assert_eq!(truncate("hello", 200), "hello");
    }

    #[test]
    fn truncate_cuts_at_limit() {
        assert_eq!(truncate("hello", 3), "hel");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
    }

    #[test]
    fn group_digits_small() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
    }

    #[test]
    fn group_digits_large() {
        assert_eq!(group_digits(10000), "10,000");
        assert_eq!(group_digits(1234567), "1,234,567");
    }
}
