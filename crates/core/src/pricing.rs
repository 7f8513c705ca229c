//! Pricing derivation for booking quotes.
//!
//! Single owner of the subtotal/discount/total/deposit/balance rules; the
//! HTTP surfaces and CLI are callers, never owners, of these rules. All
//! functions are pure over an immutable [`BookingQuote`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::{Addon, BookingQuote, DiscountType};

/// Totals below this floor are charged in full rather than split; card
/// processors reject sub-minimum charges.
pub const MINIMUM_SPLIT_TOTAL: Decimal = Decimal::TEN;

/// Effective base offering: the speaker rental price when a rental is
/// present, the package price otherwise.
pub fn effective_base(quote: &BookingQuote) -> Decimal {
    match &quote.speaker_rental {
        Some(rental) => rental.price,
        None => quote.package_price,
    }
}

/// Order-independent sum of addon prices.
pub fn addons_total(addons: &[Addon]) -> Decimal {
    addons.iter().map(|addon| addon.price).sum()
}

pub fn subtotal(quote: &BookingQuote) -> Decimal {
    effective_base(quote) + addons_total(&quote.addons)
}

/// Discount amount for the given subtotal. Zero unless a discount type is
/// set and the discount value is positive.
pub fn discount(quote: &BookingQuote, subtotal: Decimal) -> Decimal {
    if quote.discount_value <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    match quote.discount_type {
        Some(DiscountType::Percentage) => subtotal * quote.discount_value / Decimal::ONE_HUNDRED,
        Some(DiscountType::Fixed) => quote.discount_value,
        None => Decimal::ZERO,
    }
}

/// Grand total for the quote.
///
/// Custom-priced quotes always re-derive the discount: a stored total can go
/// stale relative to an edited discount. Standard quotes trust a stored
/// positive total verbatim (locked in at quote time, immune to later catalog
/// price changes) and fall back to the component subtotal otherwise.
pub fn total(quote: &BookingQuote) -> Decimal {
    let subtotal = subtotal(quote);

    if quote.is_custom_price {
        return (subtotal - discount(quote, subtotal)).max(Decimal::ZERO);
    }

    match quote.total_price {
        Some(stored) if stored > Decimal::ZERO => stored,
        _ => subtotal,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositSplit {
    pub deposit: Decimal,
    pub remaining: Decimal,
}

/// Split a total into the deposit due on signing and the remaining balance.
/// Small totals are never split.
pub fn deposit_split(total: Decimal) -> DepositSplit {
    if total < MINIMUM_SPLIT_TOTAL {
        return DepositSplit { deposit: total, remaining: Decimal::ZERO };
    }

    let deposit = total / Decimal::TWO;
    DepositSplit { deposit, remaining: total - deposit }
}

/// Balance still owed. With payments on file that is total minus amount
/// paid; with none, an unsigned quote still owes the deposit-equivalent
/// remainder for display purposes. Never negative.
pub fn remaining_after_payment(total: Decimal, amount_paid: Decimal) -> Decimal {
    if amount_paid > Decimal::ZERO {
        (total - amount_paid).max(Decimal::ZERO)
    } else {
        (total - deposit_split(total).deposit).max(Decimal::ZERO)
    }
}

/// Fully-derived pricing for a quote, as rendered in API responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base: Decimal,
    pub addons_total: Decimal,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub deposit: Decimal,
    pub remaining: Decimal,
}

pub fn breakdown(quote: &BookingQuote) -> PriceBreakdown {
    let base = effective_base(quote);
    let addons_total = addons_total(&quote.addons);
    let subtotal = base + addons_total;
    let discount = discount(quote, subtotal);
    let total = total(quote);
    let split = deposit_split(total);

    PriceBreakdown {
        base,
        addons_total,
        subtotal,
        discount,
        total,
        deposit: split.deposit,
        remaining: split.remaining,
    }
}
