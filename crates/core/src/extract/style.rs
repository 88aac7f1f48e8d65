use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::extract::{contains_phrase, fuzzy, normalize};

pub const DEFAULT_PORTFOLIO_BASE: &str = "https://jablancinteriors.com/portfolio";

const FUZZY_THRESHOLD: f64 = 0.9;
const FUZZY_MIN_TERM_CHARS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleTheme {
    ModernMinimalist,
    NaturalWarmth,
    SereneElegance,
    NaturalHarmony,
    PlayfulVibrantRetail,
    ModernIndustrialAccents,
    Generic,
}

impl StyleTheme {
    pub const SPECIFIC: [StyleTheme; 6] = [
        StyleTheme::ModernMinimalist,
        StyleTheme::NaturalWarmth,
        StyleTheme::SereneElegance,
        StyleTheme::NaturalHarmony,
        StyleTheme::PlayfulVibrantRetail,
        StyleTheme::ModernIndustrialAccents,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModernMinimalist => "modern minimalist",
            Self::NaturalWarmth => "natural warmth",
            Self::SereneElegance => "serene elegance",
            Self::NaturalHarmony => "natural harmony",
            Self::PlayfulVibrantRetail => "playful vibrant retail",
            Self::ModernIndustrialAccents => "modern industrial accents",
            Self::Generic => "generic",
        }
    }

    /// Portfolio project that showcases the theme.
    pub fn portfolio_slug(&self) -> Option<&'static str> {
        match self {
            Self::ModernMinimalist => Some("park-regent-desa-park-city"),
            Self::NaturalWarmth => Some("88-bandar-utama"),
            Self::SereneElegance => Some("3213-the-arcuz"),
            Self::NaturalHarmony => Some("third-avenus-cyberjaya"),
            Self::PlayfulVibrantRetail => Some("eureka-midvalley"),
            Self::ModernIndustrialAccents => Some("eureka-setia-city-mall"),
            Self::Generic => None,
        }
    }

    /// Full portfolio link under `portfolio_base`, e.g. `https://host/portfolio`.
    pub fn portfolio_link(&self, portfolio_base: &str) -> Option<String> {
        self.portfolio_slug()
            .map(|slug| format!("{}/{slug}/", portfolio_base.trim_end_matches('/')))
    }
}

impl fmt::Display for StyleTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const THEME_TRIGGERS: &[(StyleTheme, &[&str])] = &[
    (
        StyleTheme::ModernMinimalist,
        &[
            "modern minimalist",
            "minimalist",
            "minimal",
            "clean modern",
            "sleek",
            "simple clean",
            "streamlined",
            "clutter free",
        ],
    ),
    (
        StyleTheme::NaturalWarmth,
        &[
            "natural warmth",
            "warm neutral",
            "neutral palette",
            "earthy",
            "connection to nature",
            "cozy warm",
            "layered lighting",
            "comfort first",
        ],
    ),
    (
        StyleTheme::SereneElegance,
        &[
            "serene elegance",
            "soothing",
            "calm",
            "gallery like",
            "warm monochrome",
            "rounded millwork",
            "handle less cabinetry",
        ],
    ),
    (
        StyleTheme::NaturalHarmony,
        &["natural harmony", "minimalist functionality", "modern elegance", "curated comfort"],
    ),
    (
        StyleTheme::PlayfulVibrantRetail,
        &["playful", "vibrant", "instagrammable", "retail space", "commercial", "led lighting", "fun vibe"],
    ),
    (
        StyleTheme::ModernIndustrialAccents,
        &[
            "industrial",
            "industrial accents",
            "modern industrial",
            "cement screed",
            "exposed brick",
            "industrial vibe",
        ],
    ),
    (
        StyleTheme::Generic,
        &[
            "modern", "contemporary", "classic", "traditional", "luxury", "elegant", "rustic",
            "scandinavian", "mid century", "boho", "bohemian", "farmhouse", "coastal", "nautical",
            "wabi sabi", "zen", "hygge", "art deco", "retro", "vintage", "glam", "opulent",
            "grand", "bold", "pastel", "monochrome", "cozy", "cosy", "style", "design", "vibe",
            "theme", "look", "feel", "aesthetic", "decor", "interior",
        ],
    ),
];

/// Generic triggers that name the topic rather than a preference.
const META_WORDS: &[&str] =
    &["style", "design", "vibe", "theme", "look", "feel", "aesthetic", "decor", "interior"];

/// Single words that describe a look; used to keep style answers from being
/// read as names, places or price questions.
const STYLE_DESCRIPTORS: &[&str] = &[
    "modern", "minimalist", "minimal", "cozy", "cosy", "warm", "industrial", "classic",
    "contemporary", "traditional", "luxury", "luxurious", "elegant", "rustic", "scandinavian",
    "boho", "bohemian", "farmhouse", "coastal", "zen", "retro", "vintage", "sleek", "earthy",
    "calm", "serene", "playful", "vibrant", "neutral", "monochrome", "pastel", "glam", "bold",
    "simple", "clean", "natural", "japandi",
];

static TRIGGERS: Lazy<Vec<(String, StyleTheme)>> = Lazy::new(|| {
    THEME_TRIGGERS
        .iter()
        .flat_map(|(theme, terms)| terms.iter().map(move |term| (normalize(term), *theme)))
        .collect()
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleMatch {
    pub theme: StyleTheme,
    pub matched: String,
    pub link: Option<String>,
}

impl StyleMatch {
    /// Value stored in the `style` slot. Meta words like "style" or "vibe"
    /// say nothing about a preference and fill nothing.
    pub fn slot_value(&self) -> Option<String> {
        match self.theme {
            StyleTheme::Generic if META_WORDS.contains(&self.matched.as_str()) => None,
            StyleTheme::Generic => Some(self.matched.clone()),
            theme => Some(theme.as_str().to_string()),
        }
    }

    pub fn with_portfolio_base(mut self, portfolio_base: &str) -> Self {
        self.link = self.theme.portfolio_link(portfolio_base);
        self
    }
}

/// Descriptive triggers outrank meta words regardless of length.
fn trigger_rank((term, _): &(String, StyleTheme)) -> (bool, usize) {
    (!META_WORDS.contains(&term.as_str()), term.len())
}

pub fn is_style_word(word: &str) -> bool {
    STYLE_DESCRIPTORS.contains(&word)
}

/// True when any token of already normalized text is a style descriptor.
pub fn contains_style_word(normalized: &str) -> bool {
    normalized.split_whitespace().any(is_style_word)
}

/// Longest word-bounded trigger wins, and the generic theme is used only when
/// no specific theme matched. A fuzzy pass catches typos when nothing matched
/// exactly. Links point at [`DEFAULT_PORTFOLIO_BASE`] until
/// [`StyleMatch::with_portfolio_base`] swaps in the configured one.
pub fn extract_style(text: &str) -> Option<StyleMatch> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }

    let best_exact = |generic: bool| {
        TRIGGERS
            .iter()
            .filter(|(_, theme)| (*theme == StyleTheme::Generic) == generic)
            .filter(|(term, _)| contains_phrase(&normalized, term))
            .fold(None::<&(String, StyleTheme)>, |best, candidate| match best {
                Some(current) if trigger_rank(current) >= trigger_rank(candidate) => Some(current),
                _ => Some(candidate),
            })
    };

    let found = best_exact(false).or_else(|| best_exact(true)).or_else(|| {
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        TRIGGERS
            .iter()
            .filter(|(term, _)| term.chars().count() >= FUZZY_MIN_TERM_CHARS)
            .map(|entry| (entry, fuzzy::window_ratio(&tokens, &entry.0)))
            .filter(|(_, score)| *score >= FUZZY_THRESHOLD)
            .fold(None::<(&(String, StyleTheme), f64)>, |best, candidate| match best {
                Some(current) if current.1 >= candidate.1 => Some(current),
                _ => Some(candidate),
            })
            .map(|(entry, _)| entry)
    })?;

    let (term, theme) = found;
    Some(StyleMatch {
        theme: *theme,
        matched: term.clone(),
        link: theme.portfolio_link(DEFAULT_PORTFOLIO_BASE),
    })
}
