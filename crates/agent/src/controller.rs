//! Turn-level dialogue algorithm.
//!
//! A turn works on a copy of the stored state: extraction results are merged
//! into empty slots, a short-circuit intent is answered directly, otherwise
//! the checklist (with the phone-ask policy) decides what to ask. The caller
//! commits the returned state only once it has been persisted.

use std::sync::Arc;

use leadflow_core::checklist::{FieldChecklist, DEFAULT_FIELD_COOLDOWN_TURNS};
use leadflow_core::config::AppConfig;
use leadflow_core::dialogue::{DialogueFlow, PhaseTransition, TurnAction};
use leadflow_core::domain::slot::Slot;
use leadflow_core::domain::state::ConversationState;
use leadflow_core::errors::DomainError;
use leadflow_core::extract::{extract_all, ExtractedFields};
use leadflow_core::intent::{detect_intent, matches_info_request, Intent};
use leadflow_core::phone_policy::PhoneAskPolicy;

use crate::greeting::{is_bare_greeting, Greeter};
use crate::llm::LlmClient;
use crate::responses::{confirm, follow_up_question, ResponseComposer};
use crate::search::ContentSearch;
use crate::side_answer::SideAnswerer;

const PART_SEPARATOR: &str = "\n\n";

#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub reply: String,
    pub state: ConversationState,
    pub actions: Vec<TurnAction>,
    pub intent: Intent,
    pub extracted: ExtractedFields,
    pub transition: PhaseTransition,
}

#[derive(Default)]
struct ReplyBuilder {
    parts: Vec<String>,
    actions: Vec<TurnAction>,
}

impl ReplyBuilder {
    fn say(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.trim().is_empty() {
            self.parts.push(text);
        }
    }

    fn record(&mut self, action: TurnAction) {
        self.actions.push(action);
    }

    fn finish(self) -> (String, Vec<TurnAction>) {
        (self.parts.join(PART_SEPARATOR), self.actions)
    }
}

#[derive(Clone)]
pub struct DialogueController {
    composer: ResponseComposer,
    side: SideAnswerer,
    greeter: Greeter,
    phone_policy: PhoneAskPolicy,
    field_cooldown: u32,
    flow: DialogueFlow,
}

impl DialogueController {
    pub fn new(composer: ResponseComposer, side: SideAnswerer, greeter: Greeter) -> Self {
        Self {
            composer,
            side,
            greeter,
            phone_policy: PhoneAskPolicy::default(),
            field_cooldown: DEFAULT_FIELD_COOLDOWN_TURNS,
            flow: DialogueFlow,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        search: Arc<dyn ContentSearch>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self::new(
            ResponseComposer::from_config(&config.dialogue),
            SideAnswerer::from_config(search, &config.search, &config.dialogue),
            Greeter::from_config(llm, &config.llm, &config.dialogue),
        )
        .with_phone_policy(PhoneAskPolicy::new(
            config.dialogue.phone_cooldown_turns,
            config.dialogue.phone_max_attempts,
        ))
        .with_field_cooldown(config.dialogue.field_cooldown_turns)
    }

    pub fn with_phone_policy(mut self, policy: PhoneAskPolicy) -> Self {
        self.phone_policy = policy;
        self
    }

    pub fn with_field_cooldown(mut self, turns: u32) -> Self {
        self.field_cooldown = turns;
        self
    }

    pub async fn run_turn(
        &self,
        state: &ConversationState,
        checklist: &FieldChecklist,
        text: &str,
    ) -> Result<TurnOutcome, DomainError> {
        let mut working = state.clone();
        let from = self.flow.phase_of(checklist, &working);
        working.advance_turn()?;

        let extracted = extract_all(text);
        let merged = extracted.merge_into(&mut working);
        let intent = detect_intent(text);

        let mut reply = ReplyBuilder::default();
        for slot in &merged {
            reply.record(TurnAction::MergedSlot { slot: *slot });
        }

        if working.turn_index == 1 && is_bare_greeting(text) {
            reply.say(self.greeter.greet(text).await);
            reply.record(TurnAction::Greeted);
        }

        if working.conversation_complete || checklist.is_complete(&working) {
            working.conversation_complete = true;
            reply.say(self.composer.completion_message(&working, checklist));
            reply.record(TurnAction::Completed);
        } else {
            if merged.contains(&Slot::Style) {
                if let Some(link) = extracted.style.as_ref().and_then(|found| found.link.as_deref())
                {
                    reply.say(ResponseComposer::style_link_line(link));
                }
            }

            if let Some(answer) = self.intent_answer(intent).await {
                reply.say(answer);
                reply.record(TurnAction::AnsweredIntent { intent });
                self.follow_up(&mut working, checklist, text, &mut reply);
            } else {
                self.progress_checklist(&mut working, checklist, text, intent, &mut reply).await?;
            }
        }

        let transition = self.flow.transition(from, checklist, &working)?;
        let (reply, actions) = reply.finish();
        Ok(TurnOutcome { reply, state: working, actions, intent, extracted, transition })
    }

    /// The pending field's question, or the completion message. Used when a
    /// turn could not be processed.
    pub fn reask_reply(&self, state: &ConversationState, checklist: &FieldChecklist) -> String {
        match self.flow.phase_of(checklist, state).pending_slot() {
            Some(slot) => checklist.question_for(slot),
            None => self.composer.completion_message(state, checklist),
        }
    }

    async fn intent_answer(&self, intent: Intent) -> Option<String> {
        match intent {
            Intent::Portfolio => {
                Some(self.composer.portfolio_reply(self.side.portfolio_preview().await))
            }
            Intent::Pricing => Some(self.composer.pricing_reply()),
            Intent::Services => Some(self.composer.services_reply()),
            Intent::OfficeAddress => {
                let searched = if self.composer.has_office_address() {
                    None
                } else {
                    self.side.office_address().await
                };
                Some(self.composer.office_address_reply(searched))
            }
            Intent::GenericId | Intent::InfoRequest | Intent::None => None,
        }
    }

    fn follow_up(
        &self,
        working: &mut ConversationState,
        checklist: &FieldChecklist,
        text: &str,
        reply: &mut ReplyBuilder,
    ) {
        let phone_allowed = self.phone_policy.allows_prompt(working);
        let Some((slot, question)) = follow_up_question(text, working, checklist, phone_allowed)
        else {
            return;
        };

        if slot == Slot::Phone {
            let prompt = self.phone_policy.next_phone_prompt(working).unwrap_or(question);
            self.phone_policy.mark_phone_prompted(working);
            reply.say(prompt);
            reply.record(TurnAction::PromptedPhone { attempt: working.asked_phone_count });
        } else {
            reply.say(question);
        }
        checklist.record_ask(working, slot);
        reply.record(TurnAction::AskedField { slot });
    }

    async fn progress_checklist(
        &self,
        working: &mut ConversationState,
        checklist: &FieldChecklist,
        text: &str,
        intent: Intent,
        reply: &mut ReplyBuilder,
    ) -> Result<(), DomainError> {
        let Some(mut slot) = checklist.select_next_field(working, self.field_cooldown) else {
            return Err(DomainError::InvariantViolation(format!(
                "thread `{}` has missing fields but none could be selected",
                working.thread_id
            )));
        };

        if intent == Intent::GenericId
            && matches!(slot, Slot::Name | Slot::Phone)
            && !working.is_filled(Slot::Style)
            && checklist.field(Slot::Style).is_some()
        {
            slot = Slot::Style;
        }

        let informational = intent == Intent::InfoRequest || matches_info_request(text);
        let side_answer =
            if informational { self.side.one_liner(text).await } else { None };
        let answered = side_answer.is_some();
        if let Some(line) = side_answer {
            reply.say(line);
            reply.record(TurnAction::SideAnswer);
        }

        if slot != Slot::Phone {
            self.ask(working, checklist, slot, answered, reply);
            return Ok(());
        }

        if let Some(prompt) = self.phone_policy.next_phone_prompt(working) {
            self.phone_policy.mark_phone_prompted(working);
            checklist.record_ask(working, Slot::Phone);
            reply.say(prompt);
            reply.record(TurnAction::PromptedPhone { attempt: working.asked_phone_count });
            return Ok(());
        }

        reply.record(TurnAction::PhoneDeferred);
        match checklist.select_next_field_excluding(working, Slot::Phone, self.field_cooldown) {
            Some(other) => self.ask(working, checklist, other, answered, reply),
            None => {
                reply.say(self.composer.phone_hold_message());
                reply.record(TurnAction::HeldForPhone);
            }
        }
        Ok(())
    }

    fn ask(
        &self,
        working: &mut ConversationState,
        checklist: &FieldChecklist,
        slot: Slot,
        after_side_answer: bool,
        reply: &mut ReplyBuilder,
    ) {
        let question = checklist.question_for(slot);
        if after_side_answer {
            reply.say(confirm(&question));
        } else {
            reply.say(question);
        }
        checklist.record_ask(working, slot);
        reply.record(TurnAction::AskedField { slot });
    }
}
