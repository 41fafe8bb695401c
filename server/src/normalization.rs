/// Normalizes an imported text field by stripping surrounding whitespace
/// and composing it into Unicode Normalization Form C.
///
/// ```
/// use backend::normalization::normalize_field;
/// assert_eq!(normalize_field(" Ma\u{0064}\u{0307}rid "), "Ma\u{1e0b}rid");
/// ```
pub fn normalize_field(value: impl AsRef<str>) -> String {
    use unicode_normalization::UnicodeNormalization;

    value.as_ref().trim().nfc().collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use unicode_normalization::is_nfc;

    use super::normalize_field;

    fn count_whitespace(s: impl AsRef<str>) -> usize {
        s.as_ref().chars().filter(|c| c.is_whitespace()).count()
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 5000, ..ProptestConfig::default()
        })]

        #[test]
        fn normalization_works(string in "(\\S.*\\S|\\S+)", space_before in "\\s*", space_after in "\\s*") {
            let normalized = normalize_field(format!("{}{}{}", space_before, string, space_after));

            prop_assert!(is_nfc(&normalized), "{:?} (normalized form of {:?}) is in NFC", normalized, string);

            prop_assert!(!normalized.starts_with(char::is_whitespace) && !normalized.ends_with(char::is_whitespace), "{:?} (normalized form of {:?}) has no leading or trailing whitespace", normalized, string);

            let trimmed = normalized.trim();

            prop_assert_eq!(count_whitespace(&normalized), count_whitespace(&trimmed), "{:?} (normalized form of {:?}) preserves inner whitespace", normalized, string);
        }
    }
}
