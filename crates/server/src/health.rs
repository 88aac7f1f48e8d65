use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use leadflow_core::config::AppConfig;
use leadflow_db::DbPool;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    collaborators: CollaboratorModes,
}

impl HealthState {
    pub fn new(db_pool: DbPool, config: &AppConfig) -> Self {
        Self { db_pool, collaborators: CollaboratorModes::from_config(config) }
    }
}

/// Which collaborator adapters the runtime was built with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CollaboratorModes {
    pub llm: String,
    pub search: &'static str,
}

impl CollaboratorModes {
    fn from_config(config: &AppConfig) -> Self {
        let llm = if config.llm.enabled {
            format!("{}:{}", config.llm.provider, config.llm.model)
        } else {
            "disabled".to_string()
        };
        let search = match config.search.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => "http",
            _ => "disabled",
        };
        Self { llm, search }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: HealthCheck,
    pub collaborators: CollaboratorModes,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Ready only when the session store answers; collaborators are optional and
/// never degrade readiness.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        database,
        collaborators: state.collaborators.clone(),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM conversation_state").fetch_one(pool).await
    {
        Ok(sessions) => {
            HealthCheck { status: "ready", detail: format!("session store reachable ({sessions} threads)") }
        }
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("session store query failed: {error}") }
        }
    }
}
