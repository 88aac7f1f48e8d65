use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use leadflow_core::domain::field::FieldConfig;
use leadflow_core::domain::lead::Lead;
use leadflow_core::domain::state::{ConversationState, RestoredState};

use super::{ConversationRepository, FieldConfigRepository, LeadRepository, RepositoryError};

/// Keeps states in their flat form so loads go through the same repair path
/// as the SQL store.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    states: RwLock<HashMap<String, BTreeMap<String, String>>>,
}

impl InMemoryConversationRepository {
    pub async fn insert_raw(&self, thread_id: impl Into<String>, map: BTreeMap<String, String>) {
        self.states.write().await.insert(thread_id.into(), map);
    }
}

#[async_trait::async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn find_by_thread(
        &self,
        thread_id: &str,
    ) -> Result<Option<RestoredState>, RepositoryError> {
        let states = self.states.read().await;
        Ok(states.get(thread_id).map(|map| ConversationState::from_flat_map(thread_id, map)))
    }

    async fn save(&self, state: ConversationState) -> Result<(), RepositoryError> {
        let mut states = self.states.write().await;
        states.insert(state.thread_id.clone(), state.to_flat_map());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryFieldConfigRepository {
    configs: RwLock<Vec<FieldConfig>>,
}

impl InMemoryFieldConfigRepository {
    pub fn new(configs: Vec<FieldConfig>) -> Self {
        Self { configs: RwLock::new(configs) }
    }
}

#[async_trait::async_trait]
impl FieldConfigRepository for InMemoryFieldConfigRepository {
    async fn list_active(&self) -> Result<Vec<FieldConfig>, RepositoryError> {
        let configs = self.configs.read().await;
        let mut active: Vec<FieldConfig> =
            configs.iter().filter(|config| config.is_active).cloned().collect();
        active.sort_by(|a, b| {
            a.sort_order.cmp(&b.sort_order).then_with(|| a.field_name.cmp(&b.field_name))
        });
        Ok(active)
    }

    async fn save(&self, config: FieldConfig) -> Result<(), RepositoryError> {
        let mut configs = self.configs.write().await;
        match configs.iter_mut().find(|existing| existing.field_name == config.field_name) {
            Some(existing) => *existing = config,
            None => configs.push(config),
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryLeadRepository {
    leads: RwLock<HashMap<String, Lead>>,
}

impl InMemoryLeadRepository {
    pub async fn len(&self) -> usize {
        self.leads.read().await.len()
    }
}

#[async_trait::async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn find_by_thread(&self, thread_id: &str) -> Result<Option<Lead>, RepositoryError> {
        let leads = self.leads.read().await;
        Ok(leads.get(thread_id).cloned())
    }

    async fn save(&self, lead: Lead) -> Result<(), RepositoryError> {
        let mut leads = self.leads.write().await;
        leads.entry(lead.thread_id.clone()).or_insert(lead);
        Ok(())
    }
}
