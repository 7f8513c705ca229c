use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use encore_core::domain::lead::{LeadId, LeadRecord};
use encore_core::domain::payment::PaymentRecord;
use encore_core::domain::quote::BookingQuote;

pub mod lead;
pub mod memory;
pub mod payment;
pub mod quote;

pub use lead::SqlLeadStore;
pub use memory::{InMemoryLeadStore, InMemoryPaymentStore, InMemoryQuoteStore};
pub use payment::SqlPaymentStore;
pub use quote::SqlQuoteStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn find_by_id(&self, id: &LeadId) -> Result<Option<LeadRecord>, RepositoryError>;
}

#[async_trait]
pub trait QuoteStore: Send + Sync {
    async fn find_by_lead(
        &self,
        lead_id: &LeadId,
    ) -> Result<Option<BookingQuote>, RepositoryError>;

    /// Persist an updated quote. The stored row only changes when this call
    /// succeeds; callers treat their prior in-memory record as authoritative
    /// until then.
    async fn save(&self, quote: BookingQuote) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Payments for a lead, newest first.
    async fn list_by_lead(
        &self,
        lead_id: &LeadId,
    ) -> Result<Vec<PaymentRecord>, RepositoryError>;
}

pub(crate) fn decode_decimal(column: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    raw.trim().parse().map_err(|_| {
        RepositoryError::Decode(format!("invalid decimal in `{column}`: `{raw}`"))
    })
}

pub(crate) fn decode_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|_| RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{raw}`")))
}
