use once_cell::sync::Lazy;
use regex::Regex;

const MIN_DIGITS: usize = 10;
const MAX_DIGITS: usize = 12;
const COUNTRY_CODE: &str = "60";
const NATIONAL_DIGITS: std::ops::RangeInclusive<usize> = 8..=10;

// Ordered by specificity: Malaysian mobile, Klang Valley landline, other
// landlines, then bare digit runs and loosely formatted numbers.
static PHONE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:\+?60|\b0)[\s-]?1\d(?:[\s-]?\d){7,8}\b",
        r"(?:\+?60|\b0)[\s-]?3(?:[\s-]?\d){8}\b",
        r"(?:\+?60|\b0)[\s-]?[4-9](?:[\s-]?\d){7,8}\b",
        r"\b\d{10,12}\b",
        r"\b\d{3}[\s-]?\d{3}[\s-]?\d{4}\b",
    ]
    .into_iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Extracts the first plausible phone number and normalizes it to `+60...`.
pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.find_iter(text))
        .find_map(|found| normalize_phone(found.as_str()))
}

/// Strips separators and maps local (`0...`) and country-code (`60...`)
/// forms onto `+60...`. Digit counts outside 10..=12, and national numbers
/// outside 8..=10 digits once the prefix is stripped, are rejected.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) {
        return None;
    }

    let national = if let Some(rest) = digits.strip_prefix(COUNTRY_CODE) {
        rest
    } else if let Some(rest) = digits.strip_prefix('0') {
        rest
    } else {
        digits.as_str()
    };
    if !NATIONAL_DIGITS.contains(&national.len()) {
        return None;
    }
    Some(format!("+{COUNTRY_CODE}{national}"))
}

#[cfg(test)]
mod tests {
    use super::{extract_phone, normalize_phone};

    #[test]
    fn local_mobile_numbers_gain_the_country_prefix() {
        assert_eq!(extract_phone("reach me at 012-3456789").as_deref(), Some("+60123456789"));
        assert_eq!(extract_phone("0173456789 please").as_deref(), Some("+60173456789"));
    }

    #[test]
    fn international_and_spaced_forms_normalize_identically() {
        assert_eq!(extract_phone("+60 12 345 6789").as_deref(), Some("+60123456789"));
        assert_eq!(extract_phone("60123456789").as_deref(), Some("+60123456789"));
    }

    #[test]
    fn kl_landlines_are_recognized() {
        assert_eq!(extract_phone("office line 03-2345 6789").as_deref(), Some("+60323456789"));
    }

    #[test]
    fn short_or_overlong_digit_runs_are_rejected() {
        assert_eq!(extract_phone("budget 50000"), None);
        assert_eq!(extract_phone("ref 1234567890123"), None);
        assert_eq!(normalize_phone("12345"), None);
    }

    #[test]
    fn bare_runs_without_a_local_prefix_must_fit_a_national_number() {
        assert_eq!(extract_phone("call 12345678901"), None);
        assert_eq!(normalize_phone("123456789012"), None);
        assert_eq!(normalize_phone("1123456789").as_deref(), Some("+601123456789"));
    }

    #[test]
    fn text_without_digits_yields_nothing() {
        assert_eq!(extract_phone("my name is John"), None);
    }
}
