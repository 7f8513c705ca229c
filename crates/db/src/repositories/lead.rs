use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use encore_core::domain::lead::{LeadId, LeadRecord};

use super::{decode_timestamp, LeadStore, RepositoryError};
use crate::DbPool;

pub struct SqlLeadStore {
    pool: DbPool,
}

impl SqlLeadStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LeadStore for SqlLeadStore {
    async fn find_by_id(&self, id: &LeadId) -> Result<Option<LeadRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, email, phone, event_type, event_date, location, created_at
             FROM lead WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| decode_lead(&row)).transpose()
    }
}

fn decode_lead(row: &SqliteRow) -> Result<LeadRecord, RepositoryError> {
    let event_date = row
        .try_get::<Option<String>, _>("event_date")?
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                RepositoryError::Decode(format!("invalid date in `event_date`: `{raw}`"))
            })
        })
        .transpose()?;

    let created_at_raw: String = row.try_get("created_at")?;

    Ok(LeadRecord {
        id: LeadId(row.try_get("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        event_type: row.try_get("event_type")?,
        event_date,
        location: row.try_get("location")?,
        created_at: decode_timestamp("created_at", &created_at_raw)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use encore_core::domain::lead::LeadId;

    use crate::repositories::{LeadStore, SqlLeadStore};
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn finds_lead_by_id_with_event_date() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        sqlx::query(
            "INSERT INTO lead (id, name, email, phone, event_type, event_date, location, created_at)
             VALUES ('lead-1', 'Jordan Avery', 'jordan@example.com', NULL, 'wedding',
                     '2026-10-17', 'The Atrium', ?)",
        )
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .expect("seed lead");

        let store = SqlLeadStore::new(pool.clone());
        let lead = store
            .find_by_id(&LeadId("lead-1".to_string()))
            .await
            .expect("query")
            .expect("lead present");

        assert_eq!(lead.name, "Jordan Avery");
        assert_eq!(lead.event_date, NaiveDate::from_ymd_opt(2026, 10, 17));
        assert_eq!(lead.location.as_deref(), Some("The Atrium"));

        pool.close().await;
    }

    #[tokio::test]
    async fn missing_lead_is_a_clean_none() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let store = SqlLeadStore::new(pool.clone());
        let lead = store.find_by_id(&LeadId("nope".to_string())).await.expect("query");

        assert!(lead.is_none());
        pool.close().await;
    }
}
