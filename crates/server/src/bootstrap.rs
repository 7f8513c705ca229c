use encore_core::config::{AppConfig, ConfigError, LoadOptions};
use encore_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    Ok(Application { config, db_pool })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use encore_core::config::{ConfigOverrides, LoadOptions};
    use encore_core::domain::lead::LeadId;
    use encore_core::domain::quote::{Addon, BookingQuote, QuoteId};
    use encore_core::pricing;
    use rust_decimal::Decimal;

    use crate::bootstrap::bootstrap;

    #[tokio::test]
    async fn bootstrap_fails_fast_without_a_payments_key() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                payments_secret_key: Some("not-a-secret-key".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("payments.secret_key"));
    }

    #[tokio::test]
    async fn integration_smoke_covers_startup_schema_and_pricing_checkpoints() {
        let app = bootstrap(valid_overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('lead', 'booking_quote', 'payment', 'contract', 'booking_event')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected foundation tables to be available after bootstrap");
        assert_eq!(table_count, 5, "bootstrap should expose baseline booking-path tables");

        let quote = quote_fixture();
        let breakdown = pricing::breakdown(&quote);
        assert_eq!(breakdown.subtotal, Decimal::from(1200));
        assert_eq!(breakdown.total, Decimal::from(1200));
        assert_eq!(breakdown.deposit, Decimal::from(600));
        assert_eq!(breakdown.remaining, Decimal::from(600));

        app.db_pool.close().await;
    }

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                payments_secret_key: Some("sk_test_123".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    fn quote_fixture() -> BookingQuote {
        let now = Utc::now();
        BookingQuote {
            id: QuoteId("BQ-INT-0001".to_string()),
            lead_id: LeadId("lead-int-0001".to_string()),
            package_name: Some("Reception Package".to_string()),
            package_price: Decimal::from(1000),
            speaker_rental: None,
            addons: vec![Addon {
                name: "Uplighting".to_string(),
                price: Decimal::from(200),
                description: None,
            }],
            total_price: None,
            is_custom_price: false,
            discount_type: None,
            discount_value: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }
}
