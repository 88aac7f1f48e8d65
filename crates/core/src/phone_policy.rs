//! Bounded, cooldown-gated prompting for the phone slot.

use serde::{Deserialize, Serialize};

use crate::domain::state::ConversationState;

const PHONE_PROMPTS: [&str; 3] = [
    "What's the best phone number to reach you?",
    "Could you share a contact number so I can follow up properly?",
    "Mind sharing your phone number? I'll WhatsApp you the next steps.",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneAskPolicy {
    pub cooldown_turns: u32,
    pub max_attempts: u32,
}

impl Default for PhoneAskPolicy {
    fn default() -> Self {
        Self { cooldown_turns: 2, max_attempts: 3 }
    }
}

impl PhoneAskPolicy {
    pub fn new(cooldown_turns: u32, max_attempts: u32) -> Self {
        Self { cooldown_turns, max_attempts }
    }

    pub fn is_cooling_down(&self, state: &ConversationState) -> bool {
        state.asked_phone_count > 0
            && state
                .last_phone_prompt_turn
                .is_some_and(|turn| state.turn_index.saturating_sub(turn) < self.cooldown_turns)
    }

    pub fn is_exhausted(&self, state: &ConversationState) -> bool {
        state.asked_phone_count >= self.max_attempts
    }

    pub fn allows_prompt(&self, state: &ConversationState) -> bool {
        !self.is_cooling_down(state) && !self.is_exhausted(state)
    }

    /// The next phone prompt, or `None` while cooling down or once the attempt
    /// budget is spent. Does not record anything; pair an emitted prompt with
    /// [`mark_phone_prompted`](Self::mark_phone_prompted).
    pub fn next_phone_prompt(&self, state: &ConversationState) -> Option<String> {
        if !self.allows_prompt(state) {
            return None;
        }

        let variant = PHONE_PROMPTS[state.asked_phone_count as usize % PHONE_PROMPTS.len()];
        Some(match state.name.as_deref().filter(|name| !name.trim().is_empty()) {
            Some(name) => format!("Thanks, {name}. {variant}"),
            None => variant.to_string(),
        })
    }

    pub fn mark_phone_prompted(&self, state: &mut ConversationState) {
        state.asked_phone_count = state.asked_phone_count.saturating_add(1);
        state.last_phone_prompt_turn = Some(state.turn_index);
    }
}

/// True when `reply` contains any phone prompt phrasing.
pub fn is_phone_prompt(reply: &str) -> bool {
    PHONE_PROMPTS.iter().any(|prompt| reply.contains(prompt))
}
