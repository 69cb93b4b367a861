/// Sentinel glyphs in priority order. When a title carries more than one,
/// the earliest row here decides the rating.
pub const SENTINELS: [(char, u8); 5] = [
    ('🤩', 5),
    ('👍', 4),
    ('🤷', 3),
    ('👎', 2),
    ('🤮', 1),
];

pub const DEFAULT_RATING: u8 = 3;

pub fn extract_rating(raw_title: &str) -> u8 {
    SENTINELS
        .iter()
        .find(|(glyph, _)| raw_title.contains(*glyph))
        .map(|(_, rating)| *rating)
        .unwrap_or(DEFAULT_RATING)
}

/// Drop every sentinel glyph and trim.
pub fn clean_title(raw_title: &str) -> String {
    raw_title
        .chars()
        .filter(|c| !is_sentinel(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Glyph for a rating, used as the select option name in the store.
pub fn glyph_for(rating: u8) -> Option<char> {
    SENTINELS
        .iter()
        .find(|(_, r)| *r == rating)
        .map(|(glyph, _)| *glyph)
}

fn is_sentinel(c: char) -> bool {
    SENTINELS.iter().any(|(glyph, _)| *glyph == c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn each_glyph_maps() {
        assert_eq!(extract_rating("Widget 🤩"), 5);
        assert_eq!(extract_rating("👍 Widget"), 4);
        assert_eq!(extract_rating("Wid🤷get"), 3);
        assert_eq!(extract_rating("Widget 👎"), 2);
        assert_eq!(extract_rating("Widget 🤮"), 1);
    }

    #[test]
    fn no_glyph_defaults_to_middle() {
        assert_eq!(extract_rating("Widget"), DEFAULT_RATING);
        assert_eq!(extract_rating(""), 3);
    }

    #[test]
    fn priority_is_table_order_not_position() {
        // 🤮 comes first in the string, but 👍 ranks higher in the table
        assert_eq!(extract_rating("🤮 then 👍"), 4);
        assert_eq!(extract_rating("👎🤩"), 5);
    }

    #[test]
    fn clean_removes_all_occurrences() {
        assert_eq!(clean_title("  🤩 Widget 🤩 👎 "), "Widget");
        assert_eq!(clean_title("A🤮B"), "AB");
    }

    #[test]
    fn glyph_lookup() {
        assert_eq!(glyph_for(5), Some('🤩'));
        assert_eq!(glyph_for(1), Some('🤮'));
        assert_eq!(glyph_for(0), None);
    }

    proptest! {
        #[test]
        fn clean_is_idempotent(s in "\\PC*") {
            let once = clean_title(&s);
            prop_assert_eq!(clean_title(&once), once);
        }

        #[test]
        fn clean_is_idempotent_with_glyphs(s in "[a-z 🤩👍🤷👎🤮]{0,24}") {
            let once = clean_title(&s);
            prop_assert_eq!(clean_title(&once), once.clone());
            prop_assert!(!once.contains('🤩'));
        }

        #[test]
        fn rating_is_total(s in "\\PC*") {
            let r = extract_rating(&s);
            prop_assert!((1..=5).contains(&r));
        }
    }
}
