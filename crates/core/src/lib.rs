pub mod audit;
pub mod checklist;
pub mod config;
pub mod dialogue;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod intent;
pub mod phone_policy;

pub use checklist::{ChecklistField, ChecklistProgress, FieldChecklist};
pub use dialogue::{DialogueFlow, DialoguePhase, PhaseTransition, TurnAction};
pub use domain::field::{default_field_configs, FieldConfig};
pub use domain::lead::Lead;
pub use domain::slot::Slot;
pub use domain::state::{ConversationState, RestoredState};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use extract::{extract_all, ExtractedFields, StyleMatch, StyleTheme};
pub use intent::{detect_intent, Intent};
pub use phone_policy::PhoneAskPolicy;
