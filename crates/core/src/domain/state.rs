use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::slot::Slot;
use crate::errors::DomainError;

const FIELD_ASK_COUNT_PREFIX: &str = "field_ask_count.";
const LAST_FIELD_ASK_TURN_PREFIX: &str = "last_field_ask_turn.";

/// Per-thread record the dialogue writes slot values and policy counters into.
///
/// Every field is always present; absent information is `None` or zero rather
/// than a missing attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub thread_id: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub style: Option<String>,
    pub scope: Option<String>,
    pub budget: Option<String>,
    pub turn_index: u32,
    pub asked_phone_count: u32,
    pub last_phone_prompt_turn: Option<u32>,
    pub last_asked_field: Option<Slot>,
    pub field_ask_counts: BTreeMap<Slot, u32>,
    pub last_field_ask_turn: BTreeMap<Slot, u32>,
    pub conversation_complete: bool,
    pub lead_captured: bool,
}

/// A state decoded from a flat map, with the keys that had to be reset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestoredState {
    pub state: ConversationState,
    pub repaired_keys: Vec<String>,
}

impl ConversationState {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self { thread_id: thread_id.into(), ..Self::default() }
    }

    pub fn slot(&self, slot: Slot) -> Option<&str> {
        let value = match slot {
            Slot::Name => &self.name,
            Slot::Phone => &self.phone,
            Slot::Location => &self.location,
            Slot::Style => &self.style,
            Slot::Scope => &self.scope,
            Slot::Budget => &self.budget,
        };
        value.as_deref().filter(|value| !value.trim().is_empty())
    }

    pub fn is_filled(&self, slot: Slot) -> bool {
        self.slot(slot).is_some()
    }

    /// Writes `value` into an empty slot. Returns `false` and leaves the state
    /// untouched when the slot already holds a value or `value` is blank.
    pub fn fill_slot(&mut self, slot: Slot, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.trim().is_empty() || self.is_filled(slot) {
            return false;
        }

        let target = match slot {
            Slot::Name => &mut self.name,
            Slot::Phone => &mut self.phone,
            Slot::Location => &mut self.location,
            Slot::Style => &mut self.style,
            Slot::Scope => &mut self.scope,
            Slot::Budget => &mut self.budget,
        };
        *target = Some(value.trim().to_string());
        true
    }

    pub fn filled_slots(&self) -> Vec<(Slot, &str)> {
        Slot::ALL.iter().filter_map(|slot| self.slot(*slot).map(|value| (*slot, value))).collect()
    }

    pub fn advance_turn(&mut self) -> Result<u32, DomainError> {
        self.turn_index = self.turn_index.checked_add(1).ok_or_else(|| {
            DomainError::InvariantViolation(format!(
                "turn counter overflow for thread `{}`",
                self.thread_id
            ))
        })?;
        Ok(self.turn_index)
    }

    pub fn ask_count(&self, slot: Slot) -> u32 {
        self.field_ask_counts.get(&slot).copied().unwrap_or(0)
    }

    pub fn last_ask_turn(&self, slot: Slot) -> Option<u32> {
        self.last_field_ask_turn.get(&slot).copied()
    }

    pub fn to_flat_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("thread_id".to_string(), self.thread_id.clone());
        for (slot, value) in self.filled_slots() {
            map.insert(slot.as_str().to_string(), value.to_string());
        }
        map.insert("turn_index".to_string(), self.turn_index.to_string());
        map.insert("asked_phone_count".to_string(), self.asked_phone_count.to_string());
        if let Some(turn) = self.last_phone_prompt_turn {
            map.insert("last_phone_prompt_turn".to_string(), turn.to_string());
        }
        if let Some(slot) = self.last_asked_field {
            map.insert("last_asked_field".to_string(), slot.as_str().to_string());
        }
        for (slot, count) in &self.field_ask_counts {
            map.insert(format!("{FIELD_ASK_COUNT_PREFIX}{slot}"), count.to_string());
        }
        for (slot, turn) in &self.last_field_ask_turn {
            map.insert(format!("{LAST_FIELD_ASK_TURN_PREFIX}{slot}"), turn.to_string());
        }
        map.insert("conversation_complete".to_string(), self.conversation_complete.to_string());
        map.insert("lead_captured".to_string(), self.lead_captured.to_string());
        map
    }

    /// Rebuilds a state from its flat form. Missing or unreadable entries are
    /// reset to their defaults and reported instead of failing.
    pub fn from_flat_map(thread_id: &str, map: &BTreeMap<String, String>) -> RestoredState {
        let mut repaired = Vec::new();
        let mut state = Self::new(thread_id);

        match map.get("thread_id") {
            Some(stored) if stored == thread_id => {}
            _ => repaired.push("thread_id".to_string()),
        }

        for slot in Slot::ALL {
            if let Some(value) = map.get(slot.as_str()) {
                state.fill_slot(slot, value.clone());
            }
        }

        state.turn_index = required_number(map, "turn_index", &mut repaired);
        state.asked_phone_count = required_number(map, "asked_phone_count", &mut repaired);
        state.last_phone_prompt_turn = optional_parse(map, "last_phone_prompt_turn", &mut repaired);
        state.last_asked_field = optional_parse(map, "last_asked_field", &mut repaired);
        state.conversation_complete = required_flag(map, "conversation_complete", &mut repaired);
        state.lead_captured = required_flag(map, "lead_captured", &mut repaired);

        for (key, value) in map {
            if let Some(raw_slot) = key.strip_prefix(FIELD_ASK_COUNT_PREFIX) {
                match (raw_slot.parse::<Slot>(), value.parse::<u32>()) {
                    (Ok(slot), Ok(count)) => {
                        state.field_ask_counts.insert(slot, count);
                    }
                    _ => repaired.push(key.clone()),
                }
            } else if let Some(raw_slot) = key.strip_prefix(LAST_FIELD_ASK_TURN_PREFIX) {
                match (raw_slot.parse::<Slot>(), value.parse::<u32>()) {
                    (Ok(slot), Ok(turn)) => {
                        state.last_field_ask_turn.insert(slot, turn);
                    }
                    _ => repaired.push(key.clone()),
                }
            }
        }

        RestoredState { state, repaired_keys: repaired }
    }
}

fn required_number(map: &BTreeMap<String, String>, key: &str, repaired: &mut Vec<String>) -> u32 {
    match map.get(key).map(|value| value.trim().parse::<u32>()) {
        Some(Ok(value)) => value,
        _ => {
            repaired.push(key.to_string());
            0
        }
    }
}

fn required_flag(map: &BTreeMap<String, String>, key: &str, repaired: &mut Vec<String>) -> bool {
    match map.get(key).map(|value| value.trim().parse::<bool>()) {
        Some(Ok(value)) => value,
        _ => {
            repaired.push(key.to_string());
            false
        }
    }
}

fn optional_parse<T: FromStr>(
    map: &BTreeMap<String, String>,
    key: &str,
    repaired: &mut Vec<String>,
) -> Option<T> {
    let raw = map.get(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            repaired.push(key.to_string());
            None
        }
    }
}
