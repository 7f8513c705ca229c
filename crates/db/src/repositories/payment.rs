use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use encore_core::domain::lead::LeadId;
use encore_core::domain::payment::{PaymentRecord, PaymentStatus};

use super::{decode_decimal, decode_timestamp, PaymentStore, RepositoryError};
use crate::DbPool;

pub struct SqlPaymentStore {
    pool: DbPool,
}

impl SqlPaymentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PaymentStore for SqlPaymentStore {
    async fn list_by_lead(
        &self,
        lead_id: &LeadId,
    ) -> Result<Vec<PaymentRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, lead_id, payment_status, total_amount, payment_name,
                    payment_method, transaction_id, transaction_date, created_at
             FROM payment
             WHERE lead_id = ?
             ORDER BY COALESCE(transaction_date, created_at) DESC",
        )
        .bind(&lead_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_payment).collect()
    }
}

fn decode_payment(row: &SqliteRow) -> Result<PaymentRecord, RepositoryError> {
    let status_raw: String = row.try_get("payment_status")?;
    let amount_raw: String = row.try_get("total_amount")?;
    let created_at_raw: String = row.try_get("created_at")?;
    let transaction_date = row
        .try_get::<Option<String>, _>("transaction_date")?
        .map(|raw| decode_timestamp("transaction_date", &raw))
        .transpose()?;

    Ok(PaymentRecord {
        id: row.try_get("id")?,
        lead_id: LeadId(row.try_get("lead_id")?),
        payment_status: PaymentStatus::parse(&status_raw),
        total_amount: decode_decimal("total_amount", &amount_raw)?,
        payment_name: row.try_get("payment_name")?,
        payment_method: row.try_get("payment_method")?,
        transaction_id: row.try_get("transaction_id")?,
        transaction_date,
        created_at: decode_timestamp("created_at", &created_at_raw)?,
    })
}
