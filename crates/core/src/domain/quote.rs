use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::lead::LeadId;
use crate::errors::DomainError;
use crate::pricing;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

/// Optional line item sold on top of the base offering. Insertion order is
/// preserved for display; prices sum independently of order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addon {
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Alternative base offering. When present its price replaces the package
/// price as the effective base.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerRental {
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_hours: Option<Decimal>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    // Older records use "flat" for the same thing.
    #[serde(alias = "flat")]
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "percentage" => Some(Self::Percentage),
            "fixed" | "flat" => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// Quote as persisted by the quoting workflow. Immutable from the booking
/// flow's perspective except for addon removal, which produces a new record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingQuote {
    pub id: QuoteId,
    pub lead_id: LeadId,
    pub package_name: Option<String>,
    pub package_price: Decimal,
    pub speaker_rental: Option<SpeakerRental>,
    pub addons: Vec<Addon>,
    pub total_price: Option<Decimal>,
    pub is_custom_price: bool,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingQuote {
    /// Human label for checkout descriptions and summaries.
    pub fn display_name(&self) -> &str {
        if let Some(name) = self.package_name.as_deref() {
            return name;
        }
        if let Some(rental) = &self.speaker_rental {
            return &rental.name;
        }
        "your booking"
    }

    /// Produce a new quote with the addon at `index` removed and the stored
    /// total recomputed from components. Discount fields are intentionally
    /// not applied on this path (standard recomputation).
    ///
    /// An out-of-range index fails validation and nothing is produced, so
    /// callers cannot accidentally persist a partial edit.
    pub fn remove_addon(&self, index: usize) -> Result<BookingQuote, DomainError> {
        if index >= self.addons.len() {
            return Err(DomainError::AddonIndexOutOfRange { index, len: self.addons.len() });
        }

        let mut updated = self.clone();
        updated.addons.remove(index);
        updated.total_price =
            Some(pricing::effective_base(&updated) + pricing::addons_total(&updated.addons));
        Ok(updated)
    }
}
