use chrono::{DateTime, Utc};
use sqlx::Row;

use leadflow_core::domain::lead::Lead;

use super::{LeadRepository, RepositoryError};
use crate::DbPool;

pub struct SqlLeadRepository {
    pool: DbPool,
}

impl SqlLeadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_lead(row: &sqlx::sqlite::SqliteRow) -> Result<Lead, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());
    let captured_at_str: String = row.try_get("captured_at").map_err(decode)?;
    let captured_at = DateTime::parse_from_rfc3339(&captured_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("captured_at: {e}")))?;

    Ok(Lead {
        thread_id: row.try_get("thread_id").map_err(decode)?,
        name: row.try_get("name").map_err(decode)?,
        phone: row.try_get("phone").map_err(decode)?,
        location: row.try_get("location").map_err(decode)?,
        style: row.try_get("style").map_err(decode)?,
        scope: row.try_get("scope").map_err(decode)?,
        budget: row.try_get("budget").map_err(decode)?,
        captured_at,
    })
}

#[async_trait::async_trait]
impl LeadRepository for SqlLeadRepository {
    async fn find_by_thread(&self, thread_id: &str) -> Result<Option<Lead>, RepositoryError> {
        let row = sqlx::query(
            "SELECT thread_id, name, phone, location, style, scope, budget, captured_at
             FROM lead WHERE thread_id = ?",
        )
        .bind(thread_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_lead(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, lead: Lead) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO lead (thread_id, name, phone, location, style, scope, budget, captured_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(thread_id) DO NOTHING",
        )
        .bind(&lead.thread_id)
        .bind(&lead.name)
        .bind(&lead.phone)
        .bind(&lead.location)
        .bind(&lead.style)
        .bind(&lead.scope)
        .bind(&lead.budget)
        .bind(lead.captured_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use leadflow_core::domain::lead::Lead;

    use super::SqlLeadRepository;
    use crate::repositories::LeadRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlLeadRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlLeadRepository::new(pool)
    }

    fn sample_lead(thread_id: &str, name: &str) -> Lead {
        Lead {
            thread_id: thread_id.to_string(),
            name: Some(name.to_string()),
            phone: Some("+60123456789".to_string()),
            location: Some("Bangsar".to_string()),
            style: Some("Modern".to_string()),
            scope: None,
            budget: Some("80k".to_string()),
            captured_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).single().expect("timestamp"),
        }
    }

    #[tokio::test]
    async fn save_and_find_by_thread() {
        let repo = setup().await;
        let lead = sample_lead("thread-1", "John");

        repo.save(lead.clone()).await.expect("save");
        let found = repo.find_by_thread("thread-1").await.expect("find");

        assert_eq!(found, Some(lead));
    }

    #[tokio::test]
    async fn first_capture_wins() {
        let repo = setup().await;
        repo.save(sample_lead("thread-1", "John")).await.expect("save first");
        repo.save(sample_lead("thread-1", "Someone Else")).await.expect("save second");

        let found = repo.find_by_thread("thread-1").await.expect("find").expect("should exist");

        assert_eq!(found.name.as_deref(), Some("John"));
    }
}
