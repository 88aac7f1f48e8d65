use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::state::ConversationState;

/// Contact and project details handed off for follow-up once a conversation completes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub thread_id: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub style: Option<String>,
    pub scope: Option<String>,
    pub budget: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl Lead {
    pub fn from_state(state: &ConversationState, captured_at: DateTime<Utc>) -> Self {
        Self {
            thread_id: state.thread_id.clone(),
            name: state.name.clone(),
            phone: state.phone.clone(),
            location: state.location.clone(),
            style: state.style.clone(),
            scope: state.scope.clone(),
            budget: state.budget.clone(),
            captured_at,
        }
    }
}
