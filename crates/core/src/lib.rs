pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;

pub use domain::lead::{LeadId, LeadRecord};
pub use domain::payment::{latest_paid, paid_total, PaymentRecord, PaymentStatus};
pub use domain::quote::{Addon, BookingQuote, DiscountType, QuoteId, SpeakerRental};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pricing::{
    addons_total, breakdown, deposit_split, discount, effective_base, remaining_after_payment,
    subtotal, total, DepositSplit, PriceBreakdown, MINIMUM_SPLIT_TOTAL,
};
