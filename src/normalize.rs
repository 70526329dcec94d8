//! Contact identifier normalization.
//!
//! Handles and address-book entries spell the same phone number different
//! ways; both sides are funneled through [`normalize_phone_number`] so they
//! compare equal.

/// Canonicalize a phone number for use as a contact key.
///
/// Strips a single leading `+`, removes the usual separator characters
/// (parentheses, dashes, dots, spaces, and the non-breaking space), and
/// prefixes a `1` country code when exactly ten characters remain — a North
/// American number written without its code. Survivors that are not digits
/// pass through untouched; inputs that never were phone numbers come back
/// as they went in.
#[must_use]
pub fn normalize_phone_number(raw: &str) -> String {
    let mut number = raw.strip_prefix('+').unwrap_or(raw).to_string();
    number.retain(|c| !matches!(c, '(' | ')' | '-' | '.' | ' ' | '\u{a0}'));
    if number.chars().count() == 10 {
        number.insert(0, '1');
    }
    number
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formatted_us_number() {
        assert_eq!(normalize_phone_number("+1 (222) 333-4444"), "12223334444");
    }

    #[test]
    fn ten_digits_gets_country_code() {
        assert_eq!(normalize_phone_number("2223334444"), "12223334444");
    }

    #[test]
    fn already_normalized_is_unchanged() {
        assert_eq!(normalize_phone_number("12223334444"), "12223334444");
    }

    #[test]
    fn non_breaking_spaces_are_removed() {
        assert_eq!(normalize_phone_number("+1\u{a0}222\u{a0}333\u{a0}4444"), "12223334444");
    }

    #[test]
    fn non_digit_survivors_pass_through() {
        // No digit validation on purpose; rejecting these would change how
        // handles dedup against the address book.
        assert_eq!(normalize_phone_number("22-ABC-333x"), "22ABC333x");
    }

    #[test]
    fn eleven_digit_number_is_not_prefixed() {
        assert_eq!(normalize_phone_number("44 20 7946 0958"), "442079460958");
    }

    proptest! {
        #[test]
        fn idempotent(raw in r"\+?[0-9() .\-]{0,16}") {
            let once = normalize_phone_number(&raw);
            prop_assert_eq!(normalize_phone_number(&once), once.clone());
        }
    }
}
