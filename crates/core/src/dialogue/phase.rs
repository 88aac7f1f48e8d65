use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::slot::Slot;
use crate::intent::Intent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "slot", rename_all = "snake_case")]
pub enum DialoguePhase {
    Collecting(Slot),
    Complete,
}

impl DialoguePhase {
    pub fn pending_slot(&self) -> Option<Slot> {
        match self {
            Self::Collecting(slot) => Some(*slot),
            Self::Complete => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for DialoguePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collecting(slot) => write!(f, "collecting:{slot}"),
            Self::Complete => f.write_str("complete"),
        }
    }
}

/// Something a turn did, recorded for audit and tests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TurnAction {
    Greeted,
    MergedSlot { slot: Slot },
    AnsweredIntent { intent: Intent },
    SideAnswer,
    AskedField { slot: Slot },
    PromptedPhone { attempt: u32 },
    PhoneDeferred,
    HeldForPhone,
    Completed,
    Fallback,
}

impl TurnAction {
    pub fn label(&self) -> String {
        match self {
            Self::Greeted => "greeted".to_string(),
            Self::MergedSlot { slot } => format!("merged_slot:{slot}"),
            Self::AnsweredIntent { intent } => format!("answered_intent:{intent}"),
            Self::SideAnswer => "side_answer".to_string(),
            Self::AskedField { slot } => format!("asked_field:{slot}"),
            Self::PromptedPhone { attempt } => format!("prompted_phone:{attempt}"),
            Self::PhoneDeferred => "phone_deferred".to_string(),
            Self::HeldForPhone => "held_for_phone".to_string(),
            Self::Completed => "completed".to_string(),
            Self::Fallback => "fallback".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: DialoguePhase,
    pub to: DialoguePhase,
}
