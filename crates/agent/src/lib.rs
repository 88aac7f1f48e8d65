//! Dialogue runtime for lead qualification.
//!
//! This crate turns one user message into one reply:
//! - `controller` runs the turn algorithm over the core checklist, extractors
//!   and phone-ask policy
//! - `runtime` serializes turns per thread, loads and persists state, and
//!   captures the lead on completion
//! - `search`, `llm` are the collaborator seams, with HTTP and no-op adapters
//! - `side_answer`, `greeting`, `responses` compose the reply text
//!
//! # Safety Principle
//!
//! The LLM only phrases the opening greeting, and its output passes the tone
//! guardrail first. Every question, answer and completion message comes from
//! deterministic code.

pub mod audit;
pub mod controller;
pub mod greeting;
pub mod guardrails;
pub mod llm;
pub mod responses;
pub mod runtime;
pub mod search;
pub mod session;
pub mod side_answer;

pub use controller::{DialogueController, TurnOutcome};
pub use runtime::{AgentRuntime, TurnReply, TurnRequest, FALLBACK_REPLY};
