use thiserror::Error;

use crate::checklist::FieldChecklist;
use crate::dialogue::phase::{DialoguePhase, PhaseTransition};
use crate::domain::state::ConversationState;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DialogueTransitionError {
    #[error("conversation `{thread_id}` cannot leave the complete phase for {to}")]
    Regression { thread_id: String, to: DialoguePhase },
}

/// Phase model over a checklist: `Collecting(slot)` for the first missing
/// required slot, `Complete` once none is missing. `Complete` is terminal.
#[derive(Clone, Debug, Default)]
pub struct DialogueFlow;

impl DialogueFlow {
    pub fn phase_of(&self, checklist: &FieldChecklist, state: &ConversationState) -> DialoguePhase {
        if state.conversation_complete {
            return DialoguePhase::Complete;
        }
        checklist.next_missing(state).map_or(DialoguePhase::Complete, DialoguePhase::Collecting)
    }

    /// Validates the move from `current` to the phase `state` is now in.
    pub fn transition(
        &self,
        current: DialoguePhase,
        checklist: &FieldChecklist,
        state: &ConversationState,
    ) -> Result<PhaseTransition, DialogueTransitionError> {
        let to = self.phase_of(checklist, state);
        match (current, to) {
            (DialoguePhase::Complete, DialoguePhase::Collecting(_)) => {
                Err(DialogueTransitionError::Regression { thread_id: state.thread_id.clone(), to })
            }
            _ => Ok(PhaseTransition { from: current, to }),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::checklist::FieldChecklist;
    use crate::dialogue::{DialogueFlow, DialoguePhase, DialogueTransitionError};
    use crate::domain::slot::Slot;
    use crate::domain::state::ConversationState;

    fn complete_state() -> ConversationState {
        let mut state = ConversationState::new("t-1");
        for (slot, value) in [
            (Slot::Name, "John"),
            (Slot::Phone, "+60123456789"),
            (Slot::Style, "modern minimalist"),
            (Slot::Location, "Bangsar"),
        ] {
            state.fill_slot(slot, value);
        }
        state
    }

    #[test]
    fn phase_follows_the_first_missing_required_slot() {
        let flow = DialogueFlow;
        let checklist = FieldChecklist::default();
        let mut state = ConversationState::new("t-1");

        assert_eq!(flow.phase_of(&checklist, &state), DialoguePhase::Collecting(Slot::Name));
        state.fill_slot(Slot::Name, "John");
        assert_eq!(flow.phase_of(&checklist, &state), DialoguePhase::Collecting(Slot::Phone));
        assert_eq!(flow.phase_of(&checklist, &complete_state()), DialoguePhase::Complete);
    }

    #[test]
    fn collecting_advances_to_complete() {
        let flow = DialogueFlow;
        let transition = flow
            .transition(
                DialoguePhase::Collecting(Slot::Location),
                &FieldChecklist::default(),
                &complete_state(),
            )
            .expect("valid transition");

        assert_eq!(transition.to, DialoguePhase::Complete);
        assert!(transition.to.is_terminal());
    }

    #[test]
    fn completed_flag_keeps_the_phase_terminal_after_config_changes() {
        let flow = DialogueFlow;
        let mut state = complete_state();
        state.conversation_complete = true;
        let stricter = FieldChecklist::from_configs(&[crate::domain::field::FieldConfig::new(
            "budget", "Budget?", true, 1,
        )])
        .expect("valid configs");

        let transition =
            flow.transition(DialoguePhase::Complete, &stricter, &state).expect("stays complete");
        assert_eq!(transition.to, DialoguePhase::Complete);
    }

    #[test]
    fn leaving_complete_is_rejected() {
        let flow = DialogueFlow;
        let state = ConversationState::new("t-1");

        let error = flow
            .transition(DialoguePhase::Complete, &FieldChecklist::default(), &state)
            .expect_err("regression must fail");
        assert!(matches!(error, DialogueTransitionError::Regression { .. }));
    }
}
