use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::Row;

use leadflow_core::domain::state::{ConversationState, RestoredState};

use super::{ConversationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlConversationRepository {
    pool: DbPool,
}

impl SqlConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn encode_state(state: &ConversationState) -> Result<String, RepositoryError> {
    serde_json::to_string(&state.to_flat_map()).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn decode_state(thread_id: &str, state_json: &str) -> RestoredState {
    match serde_json::from_str::<BTreeMap<String, String>>(state_json) {
        Ok(map) => ConversationState::from_flat_map(thread_id, &map),
        Err(_) => {
            let mut restored = ConversationState::from_flat_map(thread_id, &BTreeMap::new());
            restored.repaired_keys.insert(0, "state_json".to_string());
            restored
        }
    }
}

#[async_trait::async_trait]
impl ConversationRepository for SqlConversationRepository {
    async fn find_by_thread(
        &self,
        thread_id: &str,
    ) -> Result<Option<RestoredState>, RepositoryError> {
        let row = sqlx::query("SELECT state_json FROM conversation_state WHERE thread_id = ?")
            .bind(thread_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => {
                let state_json: String =
                    r.try_get("state_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(Some(decode_state(thread_id, &state_json)))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, state: ConversationState) -> Result<(), RepositoryError> {
        let state_json = encode_state(&state)?;

        sqlx::query(
            "INSERT INTO conversation_state (thread_id, state_json, turn_index,
                                             conversation_complete, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(thread_id) DO UPDATE SET
                 state_json = excluded.state_json,
                 turn_index = excluded.turn_index,
                 conversation_complete = excluded.conversation_complete,
                 updated_at = excluded.updated_at",
        )
        .bind(&state.thread_id)
        .bind(&state_json)
        .bind(i64::from(state.turn_index))
        .bind(state.conversation_complete)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use leadflow_core::domain::slot::Slot;
    use leadflow_core::domain::state::ConversationState;

    use super::SqlConversationRepository;
    use crate::repositories::ConversationRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn sample_state(thread_id: &str) -> ConversationState {
        let mut state = ConversationState::new(thread_id);
        state.fill_slot(Slot::Name, "John");
        state.fill_slot(Slot::Phone, "+60123456789");
        state.turn_index = 3;
        state.asked_phone_count = 1;
        state.last_phone_prompt_turn = Some(2);
        state.last_asked_field = Some(Slot::Style);
        state.field_ask_counts.insert(Slot::Style, 1);
        state.last_field_ask_turn.insert(Slot::Style, 3);
        state
    }

    #[tokio::test]
    async fn save_and_find_by_thread() {
        let repo = SqlConversationRepository::new(setup().await);
        let state = sample_state("thread-1");

        repo.save(state.clone()).await.expect("save");
        let restored = repo.find_by_thread("thread-1").await.expect("find").expect("should exist");

        assert_eq!(restored.state, state);
        assert!(restored.repaired_keys.is_empty());
    }

    #[tokio::test]
    async fn unknown_thread_is_none() {
        let repo = SqlConversationRepository::new(setup().await);

        assert!(repo.find_by_thread("missing").await.expect("find").is_none());
    }

    #[tokio::test]
    async fn save_upserts_on_conflict() {
        let repo = SqlConversationRepository::new(setup().await);
        let mut state = sample_state("thread-1");
        repo.save(state.clone()).await.expect("save");

        state.turn_index = 4;
        state.fill_slot(Slot::Style, "Modern");
        repo.save(state.clone()).await.expect("upsert");

        let restored = repo.find_by_thread("thread-1").await.expect("find").expect("should exist");
        assert_eq!(restored.state.turn_index, 4);
        assert_eq!(restored.state.style.as_deref(), Some("Modern"));
    }

    #[tokio::test]
    async fn corrupt_payload_is_repaired_not_rejected() {
        let pool = setup().await;
        sqlx::query(
            "INSERT INTO conversation_state (thread_id, state_json, turn_index,
                                             conversation_complete, updated_at)
             VALUES ('thread-bad', '{not json', 0, 0, '2024-01-01T00:00:00+00:00')",
        )
        .execute(&pool)
        .await
        .expect("insert corrupt row");

        let repo = SqlConversationRepository::new(pool);
        let restored =
            repo.find_by_thread("thread-bad").await.expect("find").expect("should exist");

        assert_eq!(restored.state, ConversationState::new("thread-bad"));
        assert_eq!(restored.repaired_keys.first().map(String::as_str), Some("state_json"));
    }
}
