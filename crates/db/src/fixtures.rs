use serde_json::Value;
use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Canonical demo seeds and verification contract for the booking flow.
const SEED_LEADS: &[SeedLeadContract] = &[
    SeedLeadContract {
        lead_id: "lead-demo-001",
        quote_id: "BQ-demo-001",
        expected_addon_count: 1,
        is_custom_price: false,
        paid_payment_count: 1,
        description: "Standard wedding quote with a paid deposit",
    },
    SeedLeadContract {
        lead_id: "lead-demo-002",
        quote_id: "BQ-demo-002",
        expected_addon_count: 1,
        is_custom_price: true,
        paid_payment_count: 0,
        description: "Custom-priced corporate quote with a stale stored total",
    },
];

/// Deterministic demo dataset for the booking flow.
///
/// Provides fixtures for:
/// 1. The standard quote path (stored total absent, deposit paid)
/// 2. The custom-priced path (live discount, stale stored total)
pub struct BookingSeedDataset;

#[derive(Clone, Copy, Debug)]
struct SeedLeadContract {
    lead_id: &'static str,
    quote_id: &'static str,
    expected_addon_count: usize,
    is_custom_price: bool,
    paid_payment_count: i64,
    description: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct LeadSeedInfo {
    pub lead_id: &'static str,
    pub quote_id: &'static str,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct SeedResult {
    pub leads_seeded: Vec<LeadSeedInfo>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}

impl BookingSeedDataset {
    /// SQL fixture content for the booking demo data.
    pub const SQL: &str = include_str!("../../../config/fixtures/booking_seed_data.sql");

    /// Load the demo dataset into the database.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let leads_seeded = SEED_LEADS
            .iter()
            .map(|contract| LeadSeedInfo {
                lead_id: contract.lead_id,
                quote_id: contract.quote_id,
                description: contract.description,
            })
            .collect::<Vec<_>>();

        Ok(SeedResult { leads_seeded })
    }

    /// Verify that seed data exists and matches the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for contract in SEED_LEADS {
            let lead_exists: i64 =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM lead WHERE id = ?1)")
                    .bind(contract.lead_id)
                    .fetch_one(pool)
                    .await?;
            checks.push((format!("{}-lead", contract.lead_id), lead_exists == 1));

            let quote_row: Option<(bool, String)> = sqlx::query_as(
                "SELECT is_custom_price, addons FROM booking_quote WHERE id = ?1 AND lead_id = ?2",
            )
            .bind(contract.quote_id)
            .bind(contract.lead_id)
            .fetch_optional(pool)
            .await?;

            match quote_row {
                Some((is_custom_price, addons_raw)) => {
                    checks.push((
                        format!("{}-pricing-mode", contract.quote_id),
                        is_custom_price == contract.is_custom_price,
                    ));

                    let addon_count = serde_json::from_str::<Value>(&addons_raw)
                        .ok()
                        .and_then(|value| value.as_array().map(Vec::len));
                    checks.push((
                        format!("{}-addons", contract.quote_id),
                        addon_count == Some(contract.expected_addon_count),
                    ));
                }
                None => {
                    checks.push((format!("{}-pricing-mode", contract.quote_id), false));
                    checks.push((format!("{}-addons", contract.quote_id), false));
                }
            }

            let paid_count: i64 = sqlx::query_scalar(
                "SELECT COUNT(1) FROM payment WHERE lead_id = ?1 AND payment_status = 'Paid'",
            )
            .bind(contract.lead_id)
            .fetch_one(pool)
            .await?;
            checks.push((
                format!("{}-paid-payments", contract.lead_id),
                paid_count == contract.paid_payment_count,
            ));

            let quote_created: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM booking_event WHERE lead_id = ?1 AND event_type = 'quote.created')",
            )
            .bind(contract.lead_id)
            .fetch_one(pool)
            .await?;
            checks.push((format!("{}-quote-created-event", contract.lead_id), quote_created == 1));
        }

        let all_present = checks.iter().all(|(_, exists)| *exists);
        Ok(VerificationResult { all_present, checks })
    }
}
