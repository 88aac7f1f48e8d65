use chrono::Utc;
use sqlx::Row;

use leadflow_core::domain::field::FieldConfig;

use super::{FieldConfigRepository, RepositoryError};
use crate::DbPool;

pub struct SqlFieldConfigRepository {
    pool: DbPool,
}

impl SqlFieldConfigRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_config(row: &sqlx::sqlite::SqliteRow) -> Result<FieldConfig, RepositoryError> {
    let field_name: String =
        row.try_get("field_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let question_text: String =
        row.try_get("question_text").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let is_required: bool =
        row.try_get("is_required").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let sort_order: i32 =
        row.try_get("sort_order").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let is_active: bool =
        row.try_get("is_active").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(FieldConfig { field_name, question_text, is_required, sort_order, is_active })
}

#[async_trait::async_trait]
impl FieldConfigRepository for SqlFieldConfigRepository {
    async fn list_active(&self) -> Result<Vec<FieldConfig>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT field_name, question_text, is_required, sort_order, is_active
             FROM field_config
             WHERE is_active = 1
             ORDER BY sort_order ASC, field_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_config).collect()
    }

    async fn save(&self, config: FieldConfig) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO field_config (field_name, question_text, is_required, sort_order,
                                       is_active, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(field_name) DO UPDATE SET
                 question_text = excluded.question_text,
                 is_required = excluded.is_required,
                 sort_order = excluded.sort_order,
                 is_active = excluded.is_active,
                 updated_at = excluded.updated_at",
        )
        .bind(&config.field_name)
        .bind(&config.question_text)
        .bind(config.is_required)
        .bind(config.sort_order)
        .bind(config.is_active)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use leadflow_core::domain::field::{default_field_configs, FieldConfig};

    use super::SqlFieldConfigRepository;
    use crate::repositories::FieldConfigRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlFieldConfigRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlFieldConfigRepository::new(pool)
    }

    #[tokio::test]
    async fn seeded_configs_match_builtin_defaults() {
        let repo = setup().await;

        let configs = repo.list_active().await.expect("list");

        assert_eq!(configs, default_field_configs());
    }

    #[tokio::test]
    async fn inactive_configs_are_filtered_out() {
        let repo = setup().await;
        let mut scope = FieldConfig::new("scope", "Which spaces are in scope?", false, 5);
        scope.is_active = false;
        repo.save(scope).await.expect("deactivate scope");

        let names: Vec<String> = repo
            .list_active()
            .await
            .expect("list")
            .into_iter()
            .map(|config| config.field_name)
            .collect();

        assert_eq!(names, vec!["name", "phone", "style", "location"]);
    }

    #[tokio::test]
    async fn save_reorders_and_adds_fields() {
        let repo = setup().await;
        repo.save(FieldConfig::new("budget", "What's your budget range?", true, 0))
            .await
            .expect("add budget");
        repo.save(FieldConfig::new("style", "Which look do you like?", true, 10))
            .await
            .expect("move style");

        let configs = repo.list_active().await.expect("list");
        let names: Vec<&str> = configs.iter().map(|config| config.field_name.as_str()).collect();

        assert_eq!(names, vec!["budget", "name", "phone", "location", "scope", "style"]);
        assert_eq!(
            configs.last().map(|config| config.question_text.as_str()),
            Some("Which look do you like?")
        );
    }
}
