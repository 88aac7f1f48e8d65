use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::extract::{location, normalize, style, title_case};

/// Callers only trust candidates at or above this score.
pub const MIN_ACCEPTED_NAME_SCORE: u8 = 2;

const MAX_NAME_TOKENS: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMatch {
    pub value: String,
    pub score: u8,
}

struct IntroPattern {
    regex: Regex,
    strength: u8,
}

fn intro(pattern: &str, strength: u8) -> Option<IntroPattern> {
    Regex::new(pattern).ok().map(|regex| IntroPattern { regex, strength })
}

// Each pattern captures the text that follows the introduction in group 1.
static INTRO_PATTERNS: Lazy<Vec<IntroPattern>> = Lazy::new(|| {
    [
        intro(r"(?i)\b(?:my\s+)?name\s+is\s+(.+)", 2),
        intro(r"(?i)\bcall\s+me\s+(.+)", 2),
        intro(r"(?i)\bi\s+am\s+(.+)", 1),
        intro(r"(?i)\bi['\u{2019}]?m\s+(.+)", 1),
        intro(r"(?i)\bthis\s+is\s+(.+)", 1),
    ]
    .into_iter()
    .flatten()
    .collect()
});

static HERE_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[,.!?;]\s*|\b(?:hi|hello|hey)\s+)([a-z][a-z'\-]*)\s+here\b").ok()
});

const CONNECTORS: &[&str] = &[
    "and", "my", "phone", "is", "number", "please", "call", "contact", "at", "in", "from",
    "located", "near", "with", "the", "a", "but", "or", "so", "here", "to", "for", "of", "on",
];

const BLACKLIST: &[&str] = &[
    "interested", "looking", "here", "ready", "good", "fine", "okay", "ok", "just", "planning",
    "hoping", "wanting", "trying", "not", "so", "very", "also", "new", "hi", "hello", "hey",
    "sure", "thinking", "glad", "happy", "sorry", "currently", "still", "going", "renovating",
    "moving", "living", "staying", "based", "located", "done", "back", "yes", "no", "i", "im",
    "we", "a", "the", "your", "curious", "wondering", "keen", "available", "anyone", "someone",
    "anybody", "somebody", "everyone", "everybody", "nobody", "no-one", "it", "that", "what",
    "great", "excited", "awesome", "amazing", "nice", "cool", "thrilled", "pleased", "grateful",
    "thankful", "busy", "free", "first", "all", "well", "perfect", "wonderful",
];

/// Finds a self-introduced name. Explicit patterns ("my name is", "call me")
/// score 2, weaker ones ("I'm", "this is", "X here") score 1, and a candidate
/// written with a leading capital earns one more point.
pub fn extract_name(text: &str) -> Option<NameMatch> {
    for pattern in INTRO_PATTERNS.iter() {
        for captures in pattern.regex.captures_iter(text) {
            let Some(rest) = captures.get(1) else { continue };
            if let Some(found) = candidate_from(rest.as_str(), pattern.strength, true) {
                return Some(found);
            }
        }
    }

    // A capital on the message's first word is just sentence case.
    let message_start = text.len() - text.trim_start().len();
    let here = HERE_PATTERN.as_ref()?;
    here.captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .find_map(|word| candidate_from(word.as_str(), 1, word.start() != message_start))
}

fn candidate_from(rest: &str, strength: u8, capital_counts: bool) -> Option<NameMatch> {
    let clause = rest.split(|ch: char| matches!(ch, ',' | '.' | '!' | '?' | ';' | ':' | '\n')).next()?;

    let mut tokens: Vec<&str> = Vec::new();
    for raw in clause.split_whitespace() {
        if tokens.len() == MAX_NAME_TOKENS {
            break;
        }
        let lowered = raw.to_lowercase();
        if CONNECTORS.contains(&lowered.as_str()) || !is_name_token(raw) {
            break;
        }
        if BLACKLIST.contains(&lowered.as_str()) {
            if tokens.is_empty() {
                return None;
            }
            break;
        }
        tokens.push(raw);
    }

    let first = tokens.first()?;
    let candidate = normalize(&tokens.join(" "));
    if style::is_style_word(&normalize(first)) || location::is_known_place(&candidate) {
        return None;
    }

    let capitalized = capital_counts && first.chars().next().is_some_and(char::is_uppercase);
    Some(NameMatch { value: title_case(&tokens), score: strength + u8::from(capitalized) })
}

fn is_name_token(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_alphabetic)
        && token.chars().all(|ch| ch.is_alphabetic() || ch == '-' || ch == '\'')
}

#[cfg(test)]
mod tests {
    use super::{extract_name, NameMatch};

    fn name(text: &str) -> Option<NameMatch> {
        extract_name(text)
    }

    #[test]
    fn explicit_introduction_scores_high() {
        assert_eq!(
            name("my name is Aisyah Rahman and my number is 0123456789"),
            Some(NameMatch { value: "Aisyah Rahman".to_string(), score: 3 })
        );
        assert_eq!(name("call me wei").map(|found| found.score), Some(2));
    }

    #[test]
    fn weak_introduction_needs_capitalization_to_pass_the_gate() {
        assert_eq!(name("Hi, I'm John, 012-3456789").map(|found| found.score), Some(2));
        assert_eq!(name("i'm john").map(|found| found.score), Some(1));
    }

    #[test]
    fn capture_stops_at_connectors() {
        assert_eq!(name("I am Daniel from Penang").map(|found| found.value), Some("Daniel".to_string()));
    }

    #[test]
    fn x_here_introductions_are_recognized() {
        assert_eq!(name("Hi, Mei here").map(|found| found.value), Some("Mei".to_string()));
    }

    #[test]
    fn blacklisted_and_descriptive_candidates_are_rejected() {
        assert_eq!(name("I'm interested in a renovation"), None);
        assert_eq!(name("I'm looking for a designer"), None);
        assert_eq!(name("I'm cozy"), None);
    }

    #[test]
    fn pronouns_and_adjectives_are_not_names() {
        assert_eq!(name("Anyone here?"), None);
        assert_eq!(name("This is Great"), None);
        assert_eq!(name("I'm Excited to start"), None);
        assert_eq!(name("Someone here can help?"), None);
    }

    #[test]
    fn sentence_initial_x_here_stays_below_the_gate() {
        assert_eq!(name("Mei here").map(|found| found.score), Some(1));
        assert_eq!(name("Hi, Mei here").map(|found| found.score), Some(2));
    }

    #[test]
    fn location_introductions_are_not_names() {
        assert_eq!(name("I'm in Bangsar"), None);
        assert_eq!(name("I'm at Mont Kiara"), None);
        assert_eq!(name("I'm from Penang"), None);
        assert_eq!(name("I'm located near KL"), None);
        assert_eq!(name("this is Bangsar"), None);
    }
}
