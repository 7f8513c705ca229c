use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::lead::LeadId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Failed,
    Refunded,
    Unknown,
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Pending => "Pending",
            Self::Failed => "Failed",
            Self::Refunded => "Refunded",
            Self::Unknown => "Unknown",
        }
    }

    /// Gateway webhooks have produced several spellings over time; anything
    /// unrecognized is kept but never counted as paid.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "paid" | "succeeded" => Self::Paid,
            "pending" => Self::Pending,
            "failed" => Self::Failed,
            "refunded" => Self::Refunded,
            _ => Self::Unknown,
        }
    }
}

/// Payment captured by the gateway webhook flow. This system only reads and
/// aggregates these records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub lead_id: LeadId,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Sum of amounts across `Paid` records only.
pub fn paid_total(records: &[PaymentRecord]) -> Decimal {
    records
        .iter()
        .filter(|record| record.payment_status == PaymentStatus::Paid)
        .map(|record| record.total_amount)
        .sum()
}

/// Most recent `Paid` record, preferring the transaction date and falling
/// back to the row creation time when the gateway omitted one.
pub fn latest_paid(records: &[PaymentRecord]) -> Option<&PaymentRecord> {
    records
        .iter()
        .filter(|record| record.payment_status == PaymentStatus::Paid)
        .max_by_key(|record| record.transaction_date.unwrap_or(record.created_at))
}
