//! Ordered, configurable checklist of slots that drives what to ask next.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::field::{default_field_configs, FieldConfig};
use crate::domain::slot::Slot;
use crate::domain::state::ConversationState;
use crate::errors::DomainError;

pub const DEFAULT_FIELD_COOLDOWN_TURNS: u32 = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistField {
    pub slot: Slot,
    pub question_text: String,
    pub is_required: bool,
    pub sort_order: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistProgress {
    pub required_filled: usize,
    pub required_total: usize,
    pub optional_filled: usize,
    pub optional_total: usize,
}

/// Active fields sorted by `sort_order`, ties broken by slot order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChecklist {
    fields: Vec<ChecklistField>,
}

impl Default for FieldChecklist {
    fn default() -> Self {
        // Built-in configs always parse.
        Self::from_configs(&default_field_configs()).unwrap_or(Self { fields: Vec::new() })
    }
}

impl FieldChecklist {
    pub fn from_configs(configs: &[FieldConfig]) -> Result<Self, DomainError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::new();
        for config in configs.iter().filter(|config| config.is_active) {
            let slot = config.field_name.trim().parse::<Slot>().map_err(|_| {
                DomainError::InvalidFieldConfig(format!(
                    "unknown field `{}`",
                    config.field_name.trim()
                ))
            })?;
            if !seen.insert(slot) {
                return Err(DomainError::InvalidFieldConfig(format!(
                    "field `{slot}` is configured more than once"
                )));
            }
            if config.question_text.trim().is_empty() {
                return Err(DomainError::InvalidFieldConfig(format!(
                    "field `{slot}` has an empty question"
                )));
            }
            fields.push(ChecklistField {
                slot,
                question_text: config.question_text.trim().to_string(),
                is_required: config.is_required,
                sort_order: config.sort_order,
            });
        }

        fields.sort_by_key(|field| (field.sort_order, field.slot));
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[ChecklistField] {
        &self.fields
    }

    pub fn field(&self, slot: Slot) -> Option<&ChecklistField> {
        self.fields.iter().find(|field| field.slot == slot)
    }

    pub fn is_required(&self, slot: Slot) -> bool {
        self.field(slot).is_some_and(|field| field.is_required)
    }

    /// First required slot, in checklist order, that the state lacks.
    pub fn next_missing(&self, state: &ConversationState) -> Option<Slot> {
        self.missing_required(state).into_iter().next()
    }

    pub fn missing_required(&self, state: &ConversationState) -> Vec<Slot> {
        self.fields
            .iter()
            .filter(|field| field.is_required && !state.is_filled(field.slot))
            .map(|field| field.slot)
            .collect()
    }

    pub fn missing_optional(&self, state: &ConversationState) -> Vec<Slot> {
        self.fields
            .iter()
            .filter(|field| !field.is_required && !state.is_filled(field.slot))
            .map(|field| field.slot)
            .collect()
    }

    pub fn is_complete(&self, state: &ConversationState) -> bool {
        self.next_missing(state).is_none()
    }

    /// Configured question plus a fixed example hint for style, location and
    /// scope. Slots without a configured field fall back to the default text.
    pub fn question_for(&self, slot: Slot) -> String {
        let base = self
            .field(slot)
            .map(|field| field.question_text.clone())
            .unwrap_or_else(|| fallback_question(slot).to_string());
        match example_hint(slot) {
            Some(hint) if !base.to_lowercase().contains("for example") => {
                format!("{base}{hint}")
            }
            _ => base,
        }
    }

    pub fn progress(&self, state: &ConversationState) -> ChecklistProgress {
        let count = |required: bool, filled_only: bool| {
            self.fields
                .iter()
                .filter(|field| field.is_required == required)
                .filter(|field| !filled_only || state.is_filled(field.slot))
                .count()
        };
        ChecklistProgress {
            required_filled: count(true, true),
            required_total: count(true, false),
            optional_filled: count(false, true),
            optional_total: count(false, false),
        }
    }

    /// Picks the next required field to ask, rotating between missing fields:
    /// the field asked last is skipped, fields asked within `cooldown` turns
    /// are skipped, and the least-asked remaining field wins (ties by order).
    /// When every missing field is cooling down, the one asked longest ago is
    /// returned.
    pub fn select_next_field(&self, state: &ConversationState, cooldown: u32) -> Option<Slot> {
        self.select_from(state, self.missing_required(state), cooldown)
    }

    /// Like [`select_next_field`](Self::select_next_field) but never returns
    /// `excluded`, and falls back to missing optional fields.
    pub fn select_next_field_excluding(
        &self,
        state: &ConversationState,
        excluded: Slot,
        cooldown: u32,
    ) -> Option<Slot> {
        let required: Vec<Slot> =
            self.missing_required(state).into_iter().filter(|slot| *slot != excluded).collect();
        if let Some(slot) = self.select_from(state, required, cooldown) {
            return Some(slot);
        }
        let optional: Vec<Slot> =
            self.missing_optional(state).into_iter().filter(|slot| *slot != excluded).collect();
        self.select_from(state, optional, cooldown)
    }

    pub fn record_ask(&self, state: &mut ConversationState, slot: Slot) {
        state.last_asked_field = Some(slot);
        *state.field_ask_counts.entry(slot).or_insert(0) += 1;
        state.last_field_ask_turn.insert(slot, state.turn_index);
    }

    fn select_from(
        &self,
        state: &ConversationState,
        missing: Vec<Slot>,
        cooldown: u32,
    ) -> Option<Slot> {
        if missing.len() <= 1 {
            return missing.first().copied();
        }

        let cooling_down = |slot: Slot| {
            state
                .last_ask_turn(slot)
                .is_some_and(|asked| state.turn_index.saturating_sub(asked) < cooldown)
        };

        // `missing` is already in checklist order, so min_by_key keeps the
        // earliest field among equal ask counts.
        missing
            .iter()
            .copied()
            .filter(|slot| state.last_asked_field != Some(*slot) && !cooling_down(*slot))
            .min_by_key(|slot| state.ask_count(*slot))
            .or_else(|| {
                missing
                    .iter()
                    .copied()
                    .min_by_key(|slot| state.last_ask_turn(*slot).map_or(0, |turn| turn + 1))
            })
    }
}

fn example_hint(slot: Slot) -> Option<&'static str> {
    match slot {
        Slot::Style => Some(" For example, modern minimalist, warm neutral, or industrial."),
        Slot::Location => Some(" For example, Mont Kiara, Bangsar, or Penang."),
        Slot::Scope => Some(" For example, living, kitchen, or master bedroom."),
        Slot::Name | Slot::Phone | Slot::Budget => None,
    }
}

fn fallback_question(slot: Slot) -> &'static str {
    match slot {
        Slot::Name => "May I have your name?",
        Slot::Phone => "What's the best phone number to reach you?",
        Slot::Location => "Which area is the property located?",
        Slot::Style => "What kind of style or vibe you want?",
        Slot::Scope => "Which spaces are in scope?",
        Slot::Budget => "What's your budget range for this project?",
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::field::FieldConfig;
    use crate::domain::slot::Slot;
    use crate::domain::state::ConversationState;
    use crate::errors::DomainError;

    use super::{FieldChecklist, DEFAULT_FIELD_COOLDOWN_TURNS};

    fn state_at(turn: u32) -> ConversationState {
        let mut state = ConversationState::new("t-1");
        state.turn_index = turn;
        state
    }

    #[test]
    fn default_checklist_orders_required_fields() {
        let checklist = FieldChecklist::default();
        let state = ConversationState::new("t-1");

        assert_eq!(
            checklist.missing_required(&state),
            vec![Slot::Name, Slot::Phone, Slot::Style, Slot::Location]
        );
        assert_eq!(checklist.next_missing(&state), Some(Slot::Name));
        assert!(!checklist.is_required(Slot::Scope));
    }

    #[test]
    fn complete_means_no_missing_required_field() {
        let checklist = FieldChecklist::default();
        let mut state = ConversationState::new("t-1");
        for (slot, value) in [
            (Slot::Name, "John"),
            (Slot::Phone, "+60123456789"),
            (Slot::Style, "modern minimalist"),
            (Slot::Location, "Bangsar"),
        ] {
            assert!(!checklist.is_complete(&state));
            state.fill_slot(slot, value);
        }

        assert!(checklist.is_complete(&state));
        state.fill_slot(Slot::Scope, "kitchen");
        assert!(checklist.is_complete(&state), "extra slots never undo completion");
    }

    #[test]
    fn configs_are_sorted_and_inactive_ones_ignored() {
        let mut inactive = FieldConfig::new("name", "Name?", true, 0);
        inactive.is_active = false;
        let checklist = FieldChecklist::from_configs(&[
            FieldConfig::new("location", "Where?", true, 2),
            FieldConfig::new("budget", "Budget?", true, 1),
            inactive,
        ])
        .expect("valid configs");

        let slots: Vec<Slot> = checklist.fields().iter().map(|field| field.slot).collect();
        assert_eq!(slots, vec![Slot::Budget, Slot::Location]);
    }

    #[test]
    fn unknown_and_duplicate_fields_are_rejected() {
        let unknown = FieldChecklist::from_configs(&[FieldConfig::new("email", "Email?", true, 1)]);
        assert!(matches!(unknown, Err(DomainError::InvalidFieldConfig(_))));

        let duplicate = FieldChecklist::from_configs(&[
            FieldConfig::new("name", "Name?", true, 1),
            FieldConfig::new("name", "Your name?", true, 2),
        ]);
        assert!(matches!(duplicate, Err(DomainError::InvalidFieldConfig(_))));
    }

    #[test]
    fn questions_carry_example_hints() {
        let checklist = FieldChecklist::default();

        assert_eq!(checklist.question_for(Slot::Name), "May I have your name?");
        assert_eq!(
            checklist.question_for(Slot::Style),
            "What kind of style or vibe you want? For example, modern minimalist, warm neutral, or industrial."
        );
        assert_eq!(
            checklist.question_for(Slot::Location),
            "Which area is the property located? For example, Mont Kiara, Bangsar, or Penang."
        );
    }

    #[test]
    fn progress_counts_filled_fields() {
        let checklist = FieldChecklist::default();
        let mut state = ConversationState::new("t-1");
        state.fill_slot(Slot::Name, "John");
        state.fill_slot(Slot::Scope, "kitchen");

        let progress = checklist.progress(&state);
        assert_eq!((progress.required_filled, progress.required_total), (1, 4));
        assert_eq!((progress.optional_filled, progress.optional_total), (1, 1));
    }

    #[test]
    fn rotation_skips_the_field_asked_last_turn() {
        let checklist = FieldChecklist::default();
        let mut state = state_at(1);
        checklist.record_ask(&mut state, Slot::Name);
        state.turn_index = 2;

        assert_eq!(
            checklist.select_next_field(&state, DEFAULT_FIELD_COOLDOWN_TURNS),
            Some(Slot::Phone)
        );
    }

    #[test]
    fn rotation_prefers_the_least_asked_field() {
        let checklist = FieldChecklist::default();
        let mut state = state_at(1);
        checklist.record_ask(&mut state, Slot::Name);
        checklist.record_ask(&mut state, Slot::Phone);
        state.last_asked_field = Some(Slot::Location);
        state.turn_index = 10;

        assert_eq!(checklist.select_next_field(&state, 2), Some(Slot::Style));
    }

    #[test]
    fn all_fields_cooling_down_falls_back_to_oldest_asked() {
        let checklist = FieldChecklist::default();
        let mut state = state_at(5);
        state.fill_slot(Slot::Name, "John");
        state.fill_slot(Slot::Phone, "+60123456789");
        checklist.record_ask(&mut state, Slot::Location);
        state.turn_index = 6;
        checklist.record_ask(&mut state, Slot::Style);

        assert_eq!(checklist.select_next_field(&state, 3), Some(Slot::Location));
    }

    #[test]
    fn single_missing_field_is_always_selected() {
        let checklist = FieldChecklist::default();
        let mut state = state_at(3);
        for slot in [Slot::Name, Slot::Phone, Slot::Style] {
            state.fill_slot(slot, "x");
        }
        checklist.record_ask(&mut state, Slot::Location);

        assert_eq!(checklist.select_next_field(&state, 2), Some(Slot::Location));
    }

    #[test]
    fn exclusion_falls_back_to_optional_fields() {
        let checklist = FieldChecklist::default();
        let mut state = state_at(4);
        for slot in [Slot::Name, Slot::Style, Slot::Location] {
            state.fill_slot(slot, "x");
        }

        assert_eq!(checklist.select_next_field_excluding(&state, Slot::Phone, 2), Some(Slot::Scope));
        state.fill_slot(Slot::Scope, "kitchen");
        assert_eq!(checklist.select_next_field_excluding(&state, Slot::Phone, 2), None);
    }

    #[test]
    fn record_ask_updates_every_counter() {
        let checklist = FieldChecklist::default();
        let mut state = state_at(3);
        checklist.record_ask(&mut state, Slot::Style);
        checklist.record_ask(&mut state, Slot::Style);

        assert_eq!(state.last_asked_field, Some(Slot::Style));
        assert_eq!(state.ask_count(Slot::Style), 2);
        assert_eq!(state.last_ask_turn(Slot::Style), Some(3));
    }
}
