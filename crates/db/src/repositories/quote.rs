use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use encore_core::domain::lead::LeadId;
use encore_core::domain::quote::{Addon, BookingQuote, DiscountType, QuoteId, SpeakerRental};

use super::{decode_decimal, decode_timestamp, QuoteStore, RepositoryError};
use crate::DbPool;

pub struct SqlQuoteStore {
    pool: DbPool,
}

impl SqlQuoteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl QuoteStore for SqlQuoteStore {
    async fn find_by_lead(
        &self,
        lead_id: &LeadId,
    ) -> Result<Option<BookingQuote>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, lead_id, package_name, package_price, speaker_rental, addons,
                    total_price, is_custom_price, discount_type, discount_value,
                    created_at, updated_at
             FROM booking_quote WHERE lead_id = ?",
        )
        .bind(&lead_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| decode_quote(&row)).transpose()
    }

    async fn save(&self, quote: BookingQuote) -> Result<(), RepositoryError> {
        let addons = serde_json::to_string(&quote.addons)
            .map_err(|error| RepositoryError::Decode(format!("encode addons: {error}")))?;
        let speaker_rental = quote
            .speaker_rental
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|error| RepositoryError::Decode(format!("encode speaker_rental: {error}")))?;

        sqlx::query(
            "INSERT INTO booking_quote
                (id, lead_id, package_name, package_price, speaker_rental, addons,
                 total_price, is_custom_price, discount_type, discount_value,
                 created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                package_name = excluded.package_name,
                package_price = excluded.package_price,
                speaker_rental = excluded.speaker_rental,
                addons = excluded.addons,
                total_price = excluded.total_price,
                is_custom_price = excluded.is_custom_price,
                discount_type = excluded.discount_type,
                discount_value = excluded.discount_value,
                updated_at = excluded.updated_at",
        )
        .bind(&quote.id.0)
        .bind(&quote.lead_id.0)
        .bind(&quote.package_name)
        .bind(quote.package_price.to_string())
        .bind(speaker_rental)
        .bind(addons)
        .bind(quote.total_price.map(|value| value.to_string()))
        .bind(quote.is_custom_price)
        .bind(quote.discount_type.map(|kind| kind.as_str()))
        .bind(quote.discount_value.to_string())
        .bind(quote.created_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn decode_quote(row: &SqliteRow) -> Result<BookingQuote, RepositoryError> {
    let addons_raw: String = row.try_get("addons")?;
    let addons: Vec<Addon> = serde_json::from_str(&addons_raw)
        .map_err(|error| RepositoryError::Decode(format!("decode addons: {error}")))?;

    let speaker_rental: Option<SpeakerRental> = row
        .try_get::<Option<String>, _>("speaker_rental")?
        .map(|raw| {
            serde_json::from_str(&raw)
                .map_err(|error| RepositoryError::Decode(format!("decode speaker_rental: {error}")))
        })
        .transpose()?;

    let package_price_raw: String = row.try_get("package_price")?;
    let discount_value_raw: String = row.try_get("discount_value")?;
    let total_price = row
        .try_get::<Option<String>, _>("total_price")?
        .map(|raw| decode_decimal("total_price", &raw))
        .transpose()?;

    let discount_type = row
        .try_get::<Option<String>, _>("discount_type")?
        .as_deref()
        .and_then(DiscountType::parse);

    let created_at_raw: String = row.try_get("created_at")?;
    let updated_at_raw: String = row.try_get("updated_at")?;

    Ok(BookingQuote {
        id: QuoteId(row.try_get("id")?),
        lead_id: LeadId(row.try_get("lead_id")?),
        package_name: row.try_get("package_name")?,
        package_price: decode_decimal("package_price", &package_price_raw)?,
        speaker_rental,
        addons,
        total_price,
        is_custom_price: row.try_get("is_custom_price")?,
        discount_type,
        discount_value: decode_decimal("discount_value", &discount_value_raw)?,
        created_at: decode_timestamp("created_at", &created_at_raw)?,
        updated_at: decode_timestamp("updated_at", &updated_at_raw)?,
    })
}
