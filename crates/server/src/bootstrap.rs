use std::sync::Arc;

use leadflow_agent::runtime::AgentRuntime;
use leadflow_core::config::{AppConfig, ConfigError};
use leadflow_db::{
    connect_from_config, migrations, DbPool, SqlConversationRepository, SqlFieldConfigRepository,
    SqlLeadRepository,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("collaborator setup failed: {0}")]
    Collaborators(String),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        llm_enabled = config.llm.enabled,
        "starting application bootstrap"
    );

    let db_pool =
        connect_from_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let runtime = AgentRuntime::from_config(
        &config,
        Arc::new(SqlConversationRepository::new(db_pool.clone())),
        Arc::new(SqlLeadRepository::new(db_pool.clone())),
    )
    .map_err(|error| BootstrapError::Collaborators(error.to_string()))?
    .with_field_config_provider(Arc::new(SqlFieldConfigRepository::new(db_pool.clone())));

    Ok(Application { config, db_pool, runtime: Arc::new(runtime) })
}
