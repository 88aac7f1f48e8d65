pub mod flow;
pub mod phase;

pub use flow::{DialogueFlow, DialogueTransitionError};
pub use phase::{DialoguePhase, PhaseTransition, TurnAction};
