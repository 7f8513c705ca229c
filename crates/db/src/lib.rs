pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;
pub mod retry;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{BookingSeedDataset, LeadSeedInfo, SeedResult, VerificationResult};
pub use retry::{find_quote_with_retry, RetryPolicy};
