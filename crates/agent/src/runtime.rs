//! Session runtime: one serialized, persisted dialogue turn per request.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use leadflow_core::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use leadflow_core::checklist::FieldChecklist;
use leadflow_core::config::{AppConfig, LlmConfig, SearchConfig};
use leadflow_core::dialogue::DialogueFlow;
use leadflow_core::domain::field::FieldConfig;
use leadflow_core::domain::lead::Lead;
use leadflow_core::domain::slot::Slot;
use leadflow_core::domain::state::ConversationState;
use leadflow_db::repositories::{
    ConversationRepository, FieldConfigRepository, LeadRepository, RepositoryError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::TracingAuditSink;
use crate::controller::DialogueController;
use crate::llm::{HttpLlmClient, LlmClient, NoopLlmClient};
use crate::search::{ContentSearch, HttpContentSearch, NoopContentSearch};
use crate::session::ThreadLocks;

pub const FALLBACK_REPLY: &str =
    "I'm having trouble responding right now. Please try again in a moment.";

const ACTOR: &str = "dialogue-runtime";
const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRequest {
    pub thread_id: String,
    pub user_message: String,
    #[serde(default)]
    pub field_configs: Option<Vec<FieldConfig>>,
    #[serde(default)]
    pub correlation_id: Option<String>,
}

impl TurnRequest {
    pub fn new(thread_id: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            user_message: user_message.into(),
            field_configs: None,
            correlation_id: None,
        }
    }

    pub fn with_field_configs(mut self, configs: Vec<FieldConfig>) -> Self {
        self.field_configs = Some(configs);
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReply {
    pub reply: String,
    pub state_snapshot: BTreeMap<String, String>,
    pub is_complete: bool,
    pub next_field: Option<Slot>,
}

impl TurnReply {
    fn from_state(reply: String, state: &ConversationState, checklist: &FieldChecklist) -> Self {
        Self {
            reply,
            state_snapshot: state.to_flat_map(),
            is_complete: state.conversation_complete,
            next_field: DialogueFlow.phase_of(checklist, state).pending_slot(),
        }
    }
}

pub fn build_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    if !config.enabled {
        return Ok(Arc::new(NoopLlmClient));
    }
    Ok(Arc::new(HttpLlmClient::from_config(config)?))
}

pub fn build_content_search(config: &SearchConfig) -> Result<Arc<dyn ContentSearch>> {
    match config.base_url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
        Some(base_url) => Ok(Arc::new(HttpContentSearch::new(
            base_url,
            Duration::from_millis(config.timeout_ms),
        )?)),
        None => Ok(Arc::new(NoopContentSearch)),
    }
}

pub struct AgentRuntime {
    controller: DialogueController,
    conversations: Arc<dyn ConversationRepository>,
    leads: Arc<dyn LeadRepository>,
    field_configs: Option<Arc<dyn FieldConfigRepository>>,
    audit: Arc<dyn AuditSink>,
    locks: ThreadLocks,
    provider_timeout: Duration,
}

impl AgentRuntime {
    pub fn new(
        controller: DialogueController,
        conversations: Arc<dyn ConversationRepository>,
        leads: Arc<dyn LeadRepository>,
    ) -> Self {
        Self {
            controller,
            conversations,
            leads,
            field_configs: None,
            audit: Arc::new(TracingAuditSink),
            locks: ThreadLocks::default(),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Runtime with collaborators built from `config`.
    pub fn from_config(
        config: &AppConfig,
        conversations: Arc<dyn ConversationRepository>,
        leads: Arc<dyn LeadRepository>,
    ) -> Result<Self> {
        let controller = DialogueController::from_config(
            config,
            build_content_search(&config.search)?,
            build_llm_client(&config.llm)?,
        );
        Ok(Self::new(controller, conversations, leads))
    }

    pub fn with_field_config_provider(mut self, provider: Arc<dyn FieldConfigRepository>) -> Self {
        self.field_configs = Some(provider);
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Current state of a thread, if it has one.
    pub async fn session(
        &self,
        thread_id: &str,
    ) -> Result<Option<ConversationState>, RepositoryError> {
        Ok(self.conversations.find_by_thread(thread_id).await?.map(|restored| restored.state))
    }

    pub async fn lead(&self, thread_id: &str) -> Result<Option<Lead>, RepositoryError> {
        self.leads.find_by_thread(thread_id).await
    }

    /// Runs one turn. Never fails: persistence problems produce the fallback
    /// reply and leave the stored state untouched.
    pub async fn handle_turn(&self, request: TurnRequest) -> TurnReply {
        let correlation_id =
            request.correlation_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        let thread_id = request.thread_id.as_str();
        let audit = AuditContext::new(thread_id, correlation_id.as_str(), ACTOR);

        let _turn_guard = self.locks.acquire(thread_id).await;

        let checklist =
            self.resolve_checklist(request.field_configs.as_deref(), &correlation_id, thread_id).await;

        let stored = match self.load_state(thread_id, &correlation_id, &audit).await {
            Ok(state) => state,
            Err(error) => {
                return self.persistence_fallback(
                    &audit,
                    "load",
                    &error,
                    &ConversationState::new(thread_id),
                    &checklist,
                );
            }
        };

        let outcome =
            match self.controller.run_turn(&stored, &checklist, &request.user_message).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!(
                        event_name = "dialogue.turn_failed",
                        correlation_id = %correlation_id,
                        thread_id,
                        error = %error,
                        "turn could not be processed; re-asking the pending field"
                    );
                    self.audit.emit(
                        audit
                            .event("dialogue.turn_failed", AuditCategory::Dialogue, AuditOutcome::Failed)
                            .with_metadata("error", error.to_string()),
                    );
                    let reply = self.controller.reask_reply(&stored, &checklist);
                    return TurnReply::from_state(reply, &stored, &checklist);
                }
            };

        let mut committed = outcome.state;
        let capture_lead = committed.conversation_complete && !committed.lead_captured;
        if capture_lead {
            if let Err(error) = self.leads.save(Lead::from_state(&committed, Utc::now())).await {
                return self.persistence_fallback(&audit, "lead", &error, &stored, &checklist);
            }
            committed.lead_captured = true;
        }
        if let Err(error) = self.conversations.save(committed.clone()).await {
            return self.persistence_fallback(&audit, "state", &error, &stored, &checklist);
        }

        let action_labels =
            outcome.actions.iter().map(|action| action.label()).collect::<Vec<String>>().join(",");
        info!(
            event_name = "dialogue.turn_processed",
            correlation_id = %correlation_id,
            thread_id,
            turn_index = committed.turn_index,
            intent = %outcome.intent,
            phase = %outcome.transition.to,
            actions = %action_labels,
            "turn processed"
        );
        self.audit.emit(
            audit
                .event("dialogue.turn_processed", AuditCategory::Dialogue, AuditOutcome::Success)
                .with_metadata("turn_index", committed.turn_index.to_string())
                .with_metadata("intent", outcome.intent.as_str())
                .with_metadata("phase_from", outcome.transition.from.to_string())
                .with_metadata("phase_to", outcome.transition.to.to_string())
                .with_metadata("actions", action_labels),
        );
        if capture_lead {
            self.audit.emit(audit.event(
                "persistence.lead_captured",
                AuditCategory::Persistence,
                AuditOutcome::Success,
            ));
        }

        TurnReply::from_state(outcome.reply, &committed, &checklist)
    }

    async fn load_state(
        &self,
        thread_id: &str,
        correlation_id: &str,
        audit: &AuditContext,
    ) -> Result<ConversationState, RepositoryError> {
        let Some(restored) = self.conversations.find_by_thread(thread_id).await? else {
            debug!(
                event_name = "dialogue.session_started",
                correlation_id,
                thread_id,
                "no stored state; starting a new conversation"
            );
            return Ok(ConversationState::new(thread_id));
        };

        if !restored.repaired_keys.is_empty() {
            let repaired = restored.repaired_keys.join(",");
            warn!(
                event_name = "dialogue.state_repaired",
                correlation_id,
                thread_id,
                repaired_keys = %repaired,
                "stored state had malformed entries; they were reset"
            );
            self.audit.emit(
                audit
                    .event("persistence.state_repaired", AuditCategory::Persistence, AuditOutcome::Rejected)
                    .with_metadata("repaired_keys", repaired),
            );
        }
        Ok(restored.state)
    }

    /// Request configs first, then the provider under a timeout, then the
    /// built-in checklist.
    async fn resolve_checklist(
        &self,
        request_configs: Option<&[FieldConfig]>,
        correlation_id: &str,
        thread_id: &str,
    ) -> FieldChecklist {
        if let Some(configs) = request_configs.filter(|configs| !configs.is_empty()) {
            match FieldChecklist::from_configs(configs) {
                Ok(checklist) => return checklist,
                Err(error) => warn!(
                    event_name = "dialogue.field_config_rejected",
                    correlation_id,
                    thread_id,
                    error = %error,
                    "request field configs are invalid; trying the provider"
                ),
            }
        }

        let Some(provider) = &self.field_configs else {
            return FieldChecklist::default();
        };

        match tokio::time::timeout(self.provider_timeout, provider.list_active()).await {
            Ok(Ok(configs)) if !configs.is_empty() => match FieldChecklist::from_configs(&configs) {
                Ok(checklist) => return checklist,
                Err(error) => warn!(
                    event_name = "dialogue.field_config_rejected",
                    correlation_id,
                    thread_id,
                    error = %error,
                    "stored field configs are invalid; using defaults"
                ),
            },
            Ok(Ok(_)) => debug!(
                event_name = "dialogue.field_config_empty",
                correlation_id,
                thread_id,
                "no active field configs; using defaults"
            ),
            Ok(Err(error)) => warn!(
                event_name = "collaborator.field_config.failed",
                correlation_id,
                thread_id,
                error = %error,
                "field config provider failed; using defaults"
            ),
            Err(_) => warn!(
                event_name = "collaborator.field_config.timeout",
                correlation_id,
                thread_id,
                timeout_ms = self.provider_timeout.as_millis() as u64,
                "field config provider timed out; using defaults"
            ),
        }
        FieldChecklist::default()
    }

    fn persistence_fallback(
        &self,
        audit: &AuditContext,
        stage: &'static str,
        error: &RepositoryError,
        unchanged: &ConversationState,
        checklist: &FieldChecklist,
    ) -> TurnReply {
        warn!(
            event_name = "persistence.turn_failed",
            correlation_id = %audit.correlation_id,
            thread_id = %audit.thread_id,
            stage,
            error = %error,
            "session store failed; replying with fallback"
        );
        self.audit.emit(
            audit
                .event("persistence.turn_failed", AuditCategory::Persistence, AuditOutcome::Failed)
                .with_metadata("stage", stage)
                .with_metadata("error", error.to_string()),
        );
        TurnReply::from_state(FALLBACK_REPLY.to_string(), unchanged, checklist)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use leadflow_core::audit::InMemoryAuditSink;
    use leadflow_core::config::AppConfig;
    use leadflow_core::domain::field::FieldConfig;
    use leadflow_core::domain::lead::Lead;
    use leadflow_core::domain::slot::Slot;
    use leadflow_core::domain::state::{ConversationState, RestoredState};
    use leadflow_db::repositories::{
        ConversationRepository, FieldConfigRepository, InMemoryConversationRepository,
        InMemoryFieldConfigRepository, InMemoryLeadRepository, LeadRepository, RepositoryError,
    };

    use super::{AgentRuntime, TurnRequest, FALLBACK_REPLY};

    struct BrokenStore;

    #[async_trait]
    impl ConversationRepository for BrokenStore {
        async fn find_by_thread(
            &self,
            _thread_id: &str,
        ) -> Result<Option<RestoredState>, RepositoryError> {
            Ok(None)
        }

        async fn save(&self, _state: ConversationState) -> Result<(), RepositoryError> {
            Err(RepositoryError::Decode("disk full".to_string()))
        }
    }

    struct SlowFieldConfigs;

    #[async_trait]
    impl FieldConfigRepository for SlowFieldConfigs {
        async fn list_active(&self) -> Result<Vec<FieldConfig>, RepositoryError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![FieldConfig::new("budget", "Budget?", true, 1)])
        }

        async fn save(&self, _config: FieldConfig) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    struct Fixture {
        runtime: AgentRuntime,
        conversations: Arc<InMemoryConversationRepository>,
        leads: Arc<InMemoryLeadRepository>,
        audit: InMemoryAuditSink,
    }

    fn fixture() -> Fixture {
        let conversations = Arc::new(InMemoryConversationRepository::default());
        let leads = Arc::new(InMemoryLeadRepository::default());
        let audit = InMemoryAuditSink::default();
        let runtime =
            AgentRuntime::from_config(&AppConfig::default(), conversations.clone(), leads.clone())
                .expect("runtime")
                .with_audit_sink(Arc::new(audit.clone()));
        Fixture { runtime, conversations, leads, audit }
    }

    #[tokio::test]
    async fn turns_are_persisted_and_reported() {
        let fx = fixture();

        let reply = fx
            .runtime
            .handle_turn(
                TurnRequest::new("t-1", "Hi, I'm John, 012-3456789, looking at Bangsar")
                    .with_correlation_id("req-1"),
            )
            .await;

        assert_eq!(reply.next_field, Some(Slot::Style));
        assert!(!reply.is_complete);
        assert_eq!(reply.state_snapshot.get("name").map(String::as_str), Some("John"));

        let stored = fx.conversations.find_by_thread("t-1").await.expect("load").expect("state");
        assert_eq!(stored.state.turn_index, 1);
        assert_eq!(stored.state.location.as_deref(), Some("Bangsar"));

        let events = fx.audit.events_of_type("dialogue.turn_processed");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].correlation_id, "req-1");
        assert!(events[0].metadata.get("actions").is_some_and(|a| a.contains("merged_slot:name")));
    }

    #[tokio::test]
    async fn completion_captures_the_lead_once() {
        let fx = fixture();
        fx.runtime.handle_turn(TurnRequest::new("t-2", "Hi, I'm John, 012-3456789, looking at Bangsar")).await;

        let done = fx.runtime.handle_turn(TurnRequest::new("t-2", "modern minimalist please")).await;
        let again = fx.runtime.handle_turn(TurnRequest::new("t-2", "modern minimalist please")).await;

        assert!(done.is_complete);
        assert_eq!(done.next_field, None);
        assert!(done.reply.starts_with("Perfect! Thank you."));
        assert_eq!(again.reply, done.reply);
        assert_eq!(fx.leads.len().await, 1);

        let lead: Lead = fx.leads.find_by_thread("t-2").await.expect("load").expect("lead");
        assert_eq!(lead.style.as_deref(), Some("modern minimalist"));
        assert_eq!(fx.audit.events_of_type("persistence.lead_captured").len(), 1);
        assert_eq!(done.state_snapshot.get("lead_captured").map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn store_failure_returns_the_fallback_and_keeps_state() {
        let audit = InMemoryAuditSink::default();
        let runtime = AgentRuntime::from_config(
            &AppConfig::default(),
            Arc::new(BrokenStore),
            Arc::new(InMemoryLeadRepository::default()),
        )
        .expect("runtime")
        .with_audit_sink(Arc::new(audit.clone()));

        let reply = runtime.handle_turn(TurnRequest::new("t-3", "my name is Aisyah")).await;

        assert_eq!(reply.reply, FALLBACK_REPLY);
        assert!(reply.state_snapshot.get("name").is_none());
        assert_eq!(reply.state_snapshot.get("turn_index").map(String::as_str), Some("0"));
        assert_eq!(audit.events_of_type("persistence.turn_failed").len(), 1);
    }

    #[tokio::test]
    async fn corrupt_state_is_repaired_on_load() {
        let fx = fixture();
        let mut raw = BTreeMap::new();
        raw.insert("name".to_string(), "Aisyah".to_string());
        raw.insert("turn_index".to_string(), "not-a-number".to_string());
        fx.conversations.insert_raw("t-4", raw).await;

        let reply = fx.runtime.handle_turn(TurnRequest::new("t-4", "hello")).await;

        assert_eq!(reply.state_snapshot.get("name").map(String::as_str), Some("Aisyah"));
        assert_eq!(reply.state_snapshot.get("turn_index").map(String::as_str), Some("1"));
        assert_eq!(fx.audit.events_of_type("persistence.state_repaired").len(), 1);
    }

    #[tokio::test]
    async fn request_field_configs_override_the_provider() {
        let fx = fixture();
        let runtime = fx.runtime.with_field_config_provider(Arc::new(
            InMemoryFieldConfigRepository::new(vec![FieldConfig::new("name", "Your name?", true, 1)]),
        ));

        let from_provider = runtime.handle_turn(TurnRequest::new("t-5", "ok")).await;
        assert_eq!(from_provider.reply, "Your name?");

        let from_request = runtime
            .handle_turn(
                TurnRequest::new("t-6", "ok")
                    .with_field_configs(vec![FieldConfig::new("location", "Where is it?", true, 1)]),
            )
            .await;
        assert_eq!(from_request.next_field, Some(Slot::Location));
        assert!(from_request.reply.starts_with("Where is it?"));
    }

    #[tokio::test]
    async fn slow_field_config_provider_falls_back_to_defaults() {
        let fx = fixture();
        let runtime = fx
            .runtime
            .with_field_config_provider(Arc::new(SlowFieldConfigs))
            .with_provider_timeout(Duration::from_millis(20));

        let reply = runtime.handle_turn(TurnRequest::new("t-7", "ok")).await;

        assert_eq!(reply.next_field, Some(Slot::Name));
        assert_eq!(reply.reply, "May I have your name?");
    }

    #[tokio::test]
    async fn concurrent_turns_on_one_thread_do_not_lose_writes() {
        let fx = fixture();
        let runtime = Arc::new(fx.runtime);

        let first = {
            let runtime = runtime.clone();
            tokio::spawn(async move {
                runtime.handle_turn(TurnRequest::new("t-8", "my name is Aisyah")).await
            })
        };
        let second = {
            let runtime = runtime.clone();
            tokio::spawn(async move {
                runtime.handle_turn(TurnRequest::new("t-8", "my number is 0198765432")).await
            })
        };
        first.await.expect("first turn");
        second.await.expect("second turn");

        let state = runtime.session("t-8").await.expect("load").expect("state");
        assert_eq!(state.turn_index, 2);
        assert_eq!(state.name.as_deref(), Some("Aisyah"));
        assert_eq!(state.phone.as_deref(), Some("+60198765432"));
    }

    #[tokio::test]
    async fn thread_locks_are_released_after_each_turn() {
        let fx = fixture();

        for index in 0..50 {
            fx.runtime.handle_turn(TurnRequest::new(format!("burst-{index}"), "hello")).await;
        }

        assert_eq!(fx.runtime.locks.tracked_threads(), 0);
        let last = fx.runtime.session("burst-49").await.expect("load").expect("state");
        assert_eq!(last.turn_index, 1);
    }
}
