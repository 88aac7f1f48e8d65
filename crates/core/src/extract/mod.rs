//! Pattern based field extraction over free-text turns.
//!
//! Every extractor is pure and total: malformed or unrelated input yields
//! `None`, never an error.

pub mod budget;
pub mod fuzzy;
pub mod location;
pub mod name;
pub mod phone;
pub mod scope;
pub mod style;

use serde::{Deserialize, Serialize};

use crate::domain::slot::Slot;
use crate::domain::state::ConversationState;

pub use budget::extract_budget;
pub use location::extract_location;
pub use name::{extract_name, NameMatch, MIN_ACCEPTED_NAME_SCORE};
pub use phone::extract_phone;
pub use scope::extract_scope;
pub use style::{extract_style, StyleMatch, StyleTheme};

/// Lower-cases `text`, drops apostrophes and collapses every other
/// non-alphanumeric run into a single space.
pub fn normalize(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        if ch == '\'' || ch == '\u{2019}' {
            continue;
        }
        if ch.is_alphanumeric() {
            if pending_space && !normalized.is_empty() {
                normalized.push(' ');
            }
            pending_space = false;
            normalized.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    normalized
}

/// Word-bounded containment check on already normalized text.
pub(crate) fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    format!(" {normalized} ").contains(&format!(" {phrase} "))
}

pub(crate) fn title_case(words: &[&str]) -> String {
    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Everything a single turn yielded, with the name confidence gate applied.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub style: Option<StyleMatch>,
    pub scope: Option<String>,
    pub budget: Option<String>,
}

impl ExtractedFields {
    pub fn value(&self, slot: Slot) -> Option<String> {
        match slot {
            Slot::Name => self.name.clone(),
            Slot::Phone => self.phone.clone(),
            Slot::Location => self.location.clone(),
            Slot::Style => self.style.as_ref().and_then(StyleMatch::slot_value),
            Slot::Scope => self.scope.clone(),
            Slot::Budget => self.budget.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Slot::ALL.iter().all(|slot| self.value(*slot).is_none())
    }

    /// Writes every extracted value into its slot when that slot is still
    /// empty. Returns the slots that were filled by this call.
    pub fn merge_into(&self, state: &mut ConversationState) -> Vec<Slot> {
        Slot::ALL
            .iter()
            .filter_map(|slot| {
                let value = self.value(*slot)?;
                state.fill_slot(*slot, value).then_some(*slot)
            })
            .collect()
    }
}

pub fn extract_all(text: &str) -> ExtractedFields {
    ExtractedFields {
        name: extract_name(text)
            .filter(|candidate| candidate.score >= MIN_ACCEPTED_NAME_SCORE)
            .map(|candidate| candidate.value),
        phone: extract_phone(text),
        location: extract_location(text),
        style: extract_style(text),
        scope: extract_scope(text),
        budget: extract_budget(text),
    }
}
