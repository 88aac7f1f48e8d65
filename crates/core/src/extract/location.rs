use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::{contains_phrase, fuzzy, normalize, style, title_case};

const FUZZY_THRESHOLD: f64 = 0.9;
const FUZZY_MIN_CHARS: usize = 4;
const MAX_CANDIDATE_CHARS: usize = 50;
const MAX_BUILDING_WORDS: usize = 3;

/// Malaysian place aliases mapped to their display names.
const PLACE_ALIASES: &[(&str, &str)] = &[
    ("kl", "Kuala Lumpur"),
    ("pj", "Petaling Jaya"),
    ("jb", "Johor Bahru"),
    ("kk", "Kota Kinabalu"),
    ("kuala lumpur", "Kuala Lumpur"),
    ("petaling jaya", "Petaling Jaya"),
    ("subang jaya", "Subang Jaya"),
    ("shah alam", "Shah Alam"),
    ("ampang", "Ampang"),
    ("cheras", "Cheras"),
    ("gombak", "Gombak"),
    ("kepong", "Kepong"),
    ("puchong", "Puchong"),
    ("kajang", "Kajang"),
    ("bangsar", "Bangsar"),
    ("damansara", "Damansara"),
    ("mont kiara", "Mont Kiara"),
    ("desa parkcity", "Desa ParkCity"),
    ("setia alam", "Setia Alam"),
    ("sunway", "Sunway"),
    ("usj", "USJ"),
    ("klang", "Klang"),
    ("penang", "Penang"),
    ("george town", "George Town"),
    ("ipoh", "Ipoh"),
    ("perak", "Perak"),
    ("seremban", "Seremban"),
    ("negeri sembilan", "Negeri Sembilan"),
    ("kuantan", "Kuantan"),
    ("pahang", "Pahang"),
    ("kota bharu", "Kota Bharu"),
    ("kelantan", "Kelantan"),
    ("alor setar", "Alor Setar"),
    ("kedah", "Kedah"),
    ("kangar", "Kangar"),
    ("perlis", "Perlis"),
    ("kuching", "Kuching"),
    ("sarawak", "Sarawak"),
    ("miri", "Miri"),
    ("sibu", "Sibu"),
    ("kota kinabalu", "Kota Kinabalu"),
    ("sabah", "Sabah"),
    ("sandakan", "Sandakan"),
    ("tawau", "Tawau"),
    ("putrajaya", "Putrajaya"),
    ("cyberjaya", "Cyberjaya"),
    ("melaka", "Melaka"),
    ("malacca", "Melaka"),
    ("johor bahru", "Johor Bahru"),
    ("johor", "Johor"),
    ("sepang", "Sepang"),
    ("nilai", "Nilai"),
    ("bangi", "Bangi"),
    ("port dickson", "Port Dickson"),
];

const BUILDING_SUFFIXES: &[&str] = &[
    "serviced residence",
    "residences",
    "residence",
    "residential",
    "condominium",
    "condo",
    "apartments",
    "apartment",
    "suites",
    "suite",
    "soho",
    "sofo",
    "heights",
];

const BUILDING_LEAD_STOPWORDS: &[&str] =
    &["in", "at", "near", "my", "the", "a", "is", "stay", "live", "i", "our", "im", "am", "from"];

const INTRO_PHRASES: &[&str] = &["my name", "name is", "this is", "call me", "im", "i am"];

static ANCHOR: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\b(?:located at|located in|based in|in|at|near|around)\b").ok()
});

static ALIASES_LONGEST_FIRST: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    let mut aliases = PLACE_ALIASES.to_vec();
    aliases.sort_by(|left, right| right.0.len().cmp(&left.0.len()));
    aliases
});

/// True when `normalized` is exactly a known place alias.
pub fn is_known_place(normalized: &str) -> bool {
    PLACE_ALIASES.iter().any(|(alias, _)| *alias == normalized)
}

fn lookup_alias(normalized: &str) -> Option<&'static str> {
    PLACE_ALIASES.iter().find(|(alias, _)| *alias == normalized).map(|(_, place)| *place)
}

/// Two stages: a direct gazetteer and building-name scan over the whole turn,
/// then a preposition-anchored n-gram lookup with a fuzzy fallback.
pub fn extract_location(text: &str) -> Option<String> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }

    direct_alias(&normalized)
        .map(str::to_string)
        .or_else(|| building_name(&normalized))
        .or_else(|| anchored(&normalized).map(str::to_string))
}

fn direct_alias(normalized: &str) -> Option<&'static str> {
    ALIASES_LONGEST_FIRST
        .iter()
        .find(|(alias, _)| contains_phrase(normalized, alias))
        .map(|(_, place)| *place)
}

fn building_name(normalized: &str) -> Option<String> {
    let words: Vec<&str> = normalized.split_whitespace().collect();
    for suffix in BUILDING_SUFFIXES {
        let suffix_words: Vec<&str> = suffix.split_whitespace().collect();
        let Some(position) =
            words.windows(suffix_words.len()).position(|window| window == suffix_words.as_slice())
        else {
            continue;
        };

        let window = &words[position.saturating_sub(MAX_BUILDING_WORDS)..position];
        let lead_start = window
            .iter()
            .rposition(|word| BUILDING_LEAD_STOPWORDS.contains(word))
            .map_or(0, |index| index + 1);
        let lead = &window[lead_start..];
        if lead.is_empty() {
            continue;
        }

        let candidate_words: Vec<&str> = lead.iter().chain(suffix_words.iter()).copied().collect();
        if is_rejected(&candidate_words.join(" ")) {
            continue;
        }
        return Some(title_case(&candidate_words));
    }
    None
}

fn anchored(normalized: &str) -> Option<&'static str> {
    let anchor = ANCHOR.as_ref()?;
    anchor.find_iter(normalized).find_map(|found| {
        let tail: String = normalized[found.end()..].chars().take(MAX_CANDIDATE_CHARS).collect();
        let tokens: Vec<&str> = tail.split_whitespace().collect();

        ngrams(&tokens).iter().find_map(|gram| lookup_alias(gram)).or_else(|| {
            ngrams(&tokens)
                .into_iter()
                .filter(|gram| gram.chars().count() >= FUZZY_MIN_CHARS && !is_rejected(gram))
                .find_map(|gram| {
                    PLACE_ALIASES
                        .iter()
                        .map(|(alias, place)| (fuzzy::ratio(&gram, alias), *place))
                        .filter(|(score, _)| *score >= FUZZY_THRESHOLD)
                        .fold(None::<(f64, &'static str)>, |best, candidate| match best {
                            Some(current) if current.0 >= candidate.0 => Some(current),
                            _ => Some(candidate),
                        })
                        .map(|(_, place)| place)
                })
        })
    })
}

/// Three-, two- then one-token windows, left to right within each width.
fn ngrams(tokens: &[&str]) -> Vec<String> {
    (1..=3)
        .rev()
        .flat_map(|width| tokens.windows(width).map(|window| window.join(" ")))
        .collect()
}

fn is_rejected(candidate: &str) -> bool {
    style::contains_style_word(candidate)
        || INTRO_PHRASES.iter().any(|phrase| contains_phrase(candidate, phrase))
}
