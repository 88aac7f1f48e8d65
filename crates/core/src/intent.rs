//! Priority-ordered intent classification.
//!
//! Classification is a single pass over [`INTENT_RULES`]; the first rule whose
//! predicate matches decides the intent. The rule order is part of the
//! contract and is covered by tests.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::extract::{contains_phrase, normalize, style};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Portfolio,
    Services,
    Pricing,
    OfficeAddress,
    GenericId,
    InfoRequest,
    None,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portfolio => "portfolio",
            Self::Services => "services",
            Self::Pricing => "pricing",
            Self::OfficeAddress => "office_address",
            Self::GenericId => "generic_id",
            Self::InfoRequest => "info_request",
            Self::None => "none",
        }
    }

    /// Intents answered directly before any checklist question.
    pub fn is_short_circuit(&self) -> bool {
        matches!(self, Self::Portfolio | Self::Services | Self::Pricing | Self::OfficeAddress)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct IntentRule {
    pub intent: Intent,
    pub matches: fn(&str) -> bool,
}

/// Evaluated top to bottom against normalized text.
pub static INTENT_RULES: [IntentRule; 6] = [
    IntentRule { intent: Intent::OfficeAddress, matches: is_office_address },
    IntentRule { intent: Intent::Pricing, matches: is_pricing },
    IntentRule { intent: Intent::Services, matches: is_services },
    IntentRule { intent: Intent::Portfolio, matches: is_portfolio },
    IntentRule { intent: Intent::GenericId, matches: is_generic_id },
    IntentRule { intent: Intent::InfoRequest, matches: is_info_request },
];

const STYLE_ANSWER_MAX_TOKENS: usize = 5;

const OFFICE_ADDRESS_TRIGGERS: &[&str] = &[
    "office address",
    "your address",
    "address",
    "where are you located",
    "where is your office",
    "office location",
    "where are you based",
    "where you based",
    "where can i find you",
    "your office",
    "your location",
    "where are you",
];

const SERVICES_TRIGGERS: &[&str] = &[
    "what do you do",
    "your services",
    "what services",
    "do you offer",
    "what can you do",
    "do you provide",
    "do you handle",
];

const PORTFOLIO_TRIGGERS: &[&str] = &[
    "portfolio",
    "past project",
    "past projects",
    "projects",
    "work examples",
    "your work",
    "case study",
    "case studies",
    "references",
    "gallery",
    "showroom",
    "examples",
    "sample",
    "samples",
];

const INFO_TRIGGERS: &[&str] = &[
    "do you",
    "can you",
    "how",
    "what",
    "price",
    "cost",
    "timeline",
    "lead time",
    "revision",
    "process",
    "services",
    "warranty",
    "quotation",
    "quote",
    "consultation",
    "portfolio",
    "examples",
];

static EXPLICIT_PRICE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\b(?:prices?|pricing|costs?|how much|quotations?|quotes?|rates?|fees?|charges?)\b").ok()
});

static SOFT_PRICE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\b(?:affordable|cheap|expensive|budget friendly|premium|value)\b").ok()
});

static GENERIC_ID: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\b(?:id|interior design|interior designer|renovation|renovate|makeover|concept)\b").ok()
});

pub fn detect_intent(text: &str) -> Intent {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return Intent::None;
    }

    INTENT_RULES
        .iter()
        .find(|rule| (rule.matches)(&normalized))
        .map_or(Intent::None, |rule| rule.intent)
}

/// Whether the informational trigger set matches, independent of rule
/// priority. Lets the controller attach a side answer when a different rule
/// decided the intent.
pub fn matches_info_request(text: &str) -> bool {
    is_info_request(&normalize(text))
}

fn regex_matches(regex: &Lazy<Option<Regex>>, normalized: &str) -> bool {
    regex.as_ref().is_some_and(|regex| regex.is_match(normalized))
}

fn any_phrase(normalized: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| contains_phrase(normalized, phrase))
}

/// A short message carrying a style descriptor and no explicit price word is
/// a style answer ("modern and cozy"), not a question.
fn is_style_answer(normalized: &str) -> bool {
    normalized.split_whitespace().count() <= STYLE_ANSWER_MAX_TOKENS
        && style::contains_style_word(normalized)
        && !regex_matches(&EXPLICIT_PRICE, normalized)
}

fn is_office_address(normalized: &str) -> bool {
    any_phrase(normalized, OFFICE_ADDRESS_TRIGGERS)
}

fn is_pricing(normalized: &str) -> bool {
    if is_style_answer(normalized) {
        return false;
    }
    regex_matches(&EXPLICIT_PRICE, normalized) || regex_matches(&SOFT_PRICE, normalized)
}

fn is_services(normalized: &str) -> bool {
    any_phrase(normalized, SERVICES_TRIGGERS)
}

fn is_portfolio(normalized: &str) -> bool {
    any_phrase(normalized, PORTFOLIO_TRIGGERS)
}

fn is_generic_id(normalized: &str) -> bool {
    regex_matches(&GENERIC_ID, normalized)
}

fn is_info_request(normalized: &str) -> bool {
    !is_style_answer(normalized) && any_phrase(normalized, INFO_TRIGGERS)
}
