//! Customer-facing booking flow routes.
//!
//! JSON API Endpoints:
//! - `GET    /api/booking/{lead_id}`                 — booking view (lead, quote, payments, pricing)
//! - `DELETE /api/booking/{lead_id}/addons/{index}`  — remove one addon and persist the new total
//! - `GET    /api/booking/{lead_id}/contract`        — contract terms and signature status
//! - `POST   /api/booking/{lead_id}/contract/sign`   — capture the client signature
//! - `POST   /api/booking/{lead_id}/checkout`        — create a hosted checkout session
//! - `GET    /api/booking/{lead_id}/confirmation`    — post-payment summary
//! - `GET    /api/booking/{lead_id}/receipt`         — most recent paid payment
//!
//! Every handler is a caller, never an owner, of the pricing rules in
//! `encore_core::pricing`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use encore_core::config::{AppConfig, SupportConfig};
use encore_core::domain::lead::{LeadId, LeadRecord};
use encore_core::domain::payment::{latest_paid, paid_total, PaymentRecord};
use encore_core::domain::quote::BookingQuote;
use encore_core::pricing::{self, PriceBreakdown, MINIMUM_SPLIT_TOTAL};
use encore_db::repositories::{
    LeadStore, PaymentStore, QuoteStore, RepositoryError, SqlLeadStore, SqlPaymentStore,
    SqlQuoteStore,
};
use encore_db::{find_quote_with_retry, DbPool, RetryPolicy};

use crate::signing::{ContractRecord, ContractSigning, SignatureRequest, SqlContractSigner};
use crate::stripe::{CheckoutSessionRequest, PaymentGateway};

#[derive(Clone)]
pub struct BookingState {
    db_pool: DbPool,
    leads: Arc<dyn LeadStore>,
    quotes: Arc<dyn QuoteStore>,
    payments: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
    signer: Arc<dyn ContractSigning>,
    retry: RetryPolicy,
    support: SupportConfig,
    checkout_success_url: String,
    checkout_cancel_url: String,
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct BookingError {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BookingView {
    pub lead: Option<LeadRecord>,
    pub quote: Option<BookingQuote>,
    pub payments: Vec<PaymentRecord>,
    pub pricing: Option<PriceBreakdown>,
    pub amount_paid: Decimal,
    pub balance_due: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct AddonRemovalResponse {
    pub quote: BookingQuote,
    pub pricing: PriceBreakdown,
}

#[derive(Debug, Serialize)]
pub struct ContractView {
    pub contract_number: String,
    pub client_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub total: Decimal,
    pub deposit_due_on_signing: Decimal,
    pub remaining_due_before_event: Decimal,
    pub signed: bool,
    pub signed_at: Option<DateTime<Utc>>,
    pub signed_by_client: Option<String>,
    pub vendor_countersigned: bool,
}

#[derive(Debug, Deserialize)]
pub struct SignContractRequest {
    pub client_name: String,
    #[serde(default)]
    pub client_email: Option<String>,
    pub signature_image: String,
    #[serde(default)]
    pub agreed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    #[default]
    Deposit,
    Full,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub payment_type: PaymentType,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: Option<String>,
    pub is_free_order: bool,
    pub amount: Decimal,
    pub charged_in_full: bool,
}

#[derive(Debug, Serialize)]
pub struct ConfirmationView {
    pub lead: Option<LeadRecord>,
    pub quote: Option<BookingQuote>,
    pub total: Decimal,
    pub deposit: Decimal,
    pub remaining_balance: Decimal,
    pub amount_paid: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ReceiptView {
    pub payment: PaymentRecord,
    pub lead: Option<LeadRecord>,
    pub quote: Option<BookingQuote>,
    pub quote_total: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(db_pool: DbPool, config: &AppConfig, gateway: Arc<dyn PaymentGateway>) -> Router {
    let state = BookingState {
        leads: Arc::new(SqlLeadStore::new(db_pool.clone())),
        quotes: Arc::new(SqlQuoteStore::new(db_pool.clone())),
        payments: Arc::new(SqlPaymentStore::new(db_pool.clone())),
        signer: Arc::new(SqlContractSigner::new(db_pool.clone())),
        db_pool,
        gateway,
        retry: RetryPolicy::default(),
        support: config.support.clone(),
        checkout_success_url: config.payments.checkout_success_url.clone(),
        checkout_cancel_url: config.payments.checkout_cancel_url.clone(),
    };

    Router::new()
        .route("/api/booking/{lead_id}", get(view_booking))
        .route("/api/booking/{lead_id}/addons/{index}", delete(remove_addon))
        .route("/api/booking/{lead_id}/contract", get(view_contract))
        .route("/api/booking/{lead_id}/contract/sign", post(sign_contract))
        .route("/api/booking/{lead_id}/checkout", post(create_checkout))
        .route("/api/booking/{lead_id}/confirmation", get(view_confirmation))
        .route("/api/booking/{lead_id}/receipt", get(view_receipt))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Full booking view. Lead, quote, and payments are fetched concurrently and
/// each is independently optional; a record that is missing renders as a
/// null section rather than failing the page.
async fn view_booking(
    Path(lead_id): Path<String>,
    State(state): State<BookingState>,
) -> Result<Json<BookingView>, (StatusCode, Json<BookingError>)> {
    let lead_id = LeadId(lead_id);

    let (lead, quote, payments) = tokio::join!(
        state.leads.find_by_id(&lead_id),
        find_quote_with_retry(state.quotes.as_ref(), &lead_id, &state.retry),
        state.payments.list_by_lead(&lead_id),
    );
    let lead = lead.map_err(store_error)?;
    let quote = quote.map_err(store_error)?;
    let payments = payments.map_err(store_error)?;

    if lead.is_none() && quote.is_none() {
        return Err(not_found(&lead_id));
    }

    let pricing = quote.as_ref().map(pricing::breakdown);
    let amount_paid = paid_total(&payments);
    let balance_due = pricing
        .as_ref()
        .map(|breakdown| pricing::remaining_after_payment(breakdown.total, amount_paid));

    Ok(Json(BookingView { lead, quote, payments, pricing, amount_paid, balance_due }))
}

/// Remove one addon from the quote and persist the recomputed total.
///
/// The stored row only changes when the save succeeds; on failure the prior
/// record remains authoritative and the error is surfaced. An out-of-range
/// index is rejected before anything is touched.
async fn remove_addon(
    Path((lead_id, index)): Path<(String, usize)>,
    State(state): State<BookingState>,
) -> Result<Json<AddonRemovalResponse>, (StatusCode, Json<BookingError>)> {
    let lead_id = LeadId(lead_id);

    let Some(quote) = state.quotes.find_by_lead(&lead_id).await.map_err(store_error)? else {
        return Err(not_found(&lead_id));
    };

    let removed_name =
        quote.addons.get(index).map(|addon| addon.name.clone()).unwrap_or_default();

    let updated = quote.remove_addon(index).map_err(|error| {
        (StatusCode::BAD_REQUEST, Json(BookingError { error: error.to_string() }))
    })?;

    if let Err(save_error) = state.quotes.save(updated.clone()).await {
        error!(
            event_name = "booking.addon_removal.save_failed",
            lead_id = %lead_id,
            index,
            error = %save_error,
            "addon removal could not be persisted, stored quote unchanged"
        );
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(BookingError {
                error: "The change could not be saved; your booking is unchanged. Please try again."
                    .to_string(),
            }),
        ));
    }

    record_booking_event(
        &state.db_pool,
        &lead_id,
        "booking.addon_removed",
        &format!(
            "Removed addon `{removed_name}` at index {index}; new total {}",
            updated.total_price.unwrap_or_default()
        ),
    )
    .await;

    info!(
        event_name = "booking.addon_removed",
        lead_id = %lead_id,
        index,
        addon = %removed_name,
        "addon removed from quote"
    );

    let pricing = pricing::breakdown(&updated);
    Ok(Json(AddonRemovalResponse { quote: updated, pricing }))
}

/// Contract terms derived from the live quote, plus signature status.
async fn view_contract(
    Path(lead_id): Path<String>,
    State(state): State<BookingState>,
) -> Result<Json<ContractView>, (StatusCode, Json<BookingError>)> {
    let lead_id = LeadId(lead_id);

    let (lead, quote, contract) = tokio::join!(
        state.leads.find_by_id(&lead_id),
        find_quote_with_retry(state.quotes.as_ref(), &lead_id, &state.retry),
        state.signer.find_by_lead(&lead_id),
    );
    let lead = lead.map_err(store_error)?;
    let quote = quote.map_err(store_error)?;
    let contract = contract.map_err(signing_error)?;

    let Some(lead) = lead else {
        return Err(not_found(&lead_id));
    };

    // The contract can render from lead data alone; a missing quote just
    // leaves the amounts at zero.
    let total = quote.as_ref().map(pricing::total).unwrap_or(Decimal::ZERO);
    let split = pricing::deposit_split(total);

    let contract_number = contract
        .as_ref()
        .map(|record| record.contract_number.clone())
        .unwrap_or_else(|| crate::signing::contract_number_for(&lead_id));

    Ok(Json(ContractView {
        contract_number,
        client_name: Some(lead.name.clone()),
        event_date: lead.event_date,
        location: lead.location.clone(),
        total,
        deposit_due_on_signing: split.deposit,
        remaining_due_before_event: split.remaining,
        signed: contract.as_ref().is_some_and(ContractRecord::is_signed),
        signed_at: contract.as_ref().and_then(|record| record.signed_at),
        signed_by_client: contract.as_ref().and_then(|record| record.signed_by_client.clone()),
        vendor_countersigned: contract
            .as_ref()
            .is_some_and(|record| record.signed_by_vendor_at.is_some()),
    }))
}

/// Capture the client's signature and mark the contract signed.
async fn sign_contract(
    Path(lead_id): Path<String>,
    State(state): State<BookingState>,
    Json(body): Json<SignContractRequest>,
) -> Result<Json<ContractRecord>, (StatusCode, Json<BookingError>)> {
    let lead_id = LeadId(lead_id);

    let client_name = body.client_name.trim();
    if client_name.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(BookingError { error: "client name is required".to_string() }),
        ));
    }
    if body.signature_image.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(BookingError {
                error: "please provide your signature before signing the contract".to_string(),
            }),
        ));
    }

    let Some(_lead) = state.leads.find_by_id(&lead_id).await.map_err(store_error)? else {
        return Err(not_found(&lead_id));
    };

    let contract = state
        .signer
        .sign(SignatureRequest {
            lead_id: lead_id.clone(),
            signer_name: client_name.to_string(),
            signer_email: body.client_email.clone(),
            signature_image: body.signature_image.clone(),
            agreed_at: body.agreed_at.unwrap_or_else(Utc::now),
        })
        .await
        .map_err(signing_error)?;

    record_booking_event(
        &state.db_pool,
        &lead_id,
        "booking.contract_signed",
        &format!("Contract {} signed by {client_name}", contract.contract_number),
    )
    .await;

    info!(
        event_name = "booking.contract_signed",
        lead_id = %lead_id,
        contract_number = %contract.contract_number,
        "contract signed via booking flow"
    );

    Ok(Json(contract))
}

/// Create a hosted checkout session for the deposit or the full balance.
/// Small totals are always charged in full; a zero total is a free order and
/// never reaches the gateway.
async fn create_checkout(
    Path(lead_id): Path<String>,
    State(state): State<BookingState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, (StatusCode, Json<BookingError>)> {
    let lead_id = LeadId(lead_id);

    let Some(quote) = state.quotes.find_by_lead(&lead_id).await.map_err(store_error)? else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(BookingError {
                error: "please select your services before making a payment".to_string(),
            }),
        ));
    };

    let total = pricing::total(&quote);
    let charged_in_full = total < MINIMUM_SPLIT_TOTAL || body.payment_type == PaymentType::Full;
    let amount =
        if charged_in_full { total } else { pricing::deposit_split(total).deposit };
    let description = if charged_in_full {
        format!("Full payment for {}", quote.display_name())
    } else {
        format!("Deposit for {}", quote.display_name())
    };

    let request = CheckoutSessionRequest {
        lead_id: lead_id.clone(),
        amount_cents: to_cents(amount)?,
        description,
        success_url: expand_url(&state.checkout_success_url, &lead_id),
        cancel_url: expand_url(&state.checkout_cancel_url, &lead_id),
    };

    match state.gateway.create_checkout_session(request).await {
        Ok(session) => {
            record_booking_event(
                &state.db_pool,
                &lead_id,
                "booking.checkout_created",
                &format!(
                    "Checkout session {} created for {amount} ({})",
                    session.session_id,
                    if charged_in_full { "full" } else { "deposit" }
                ),
            )
            .await;

            info!(
                event_name = "booking.checkout_created",
                lead_id = %lead_id,
                session_id = %session.session_id,
                %amount,
                charged_in_full,
                "checkout session created"
            );

            Ok(Json(CheckoutResponse {
                session_id: session.session_id,
                url: session.url,
                is_free_order: session.is_free_order,
                amount,
                charged_in_full,
            }))
        }
        Err(gateway_error) => {
            error!(
                event_name = "booking.checkout_failed",
                lead_id = %lead_id,
                error = %gateway_error,
                "checkout session creation failed"
            );
            Err((
                StatusCode::BAD_GATEWAY,
                Json(BookingError {
                    error: format!(
                        "{gateway_error} Need help? Call {} or email {} to pay another way.",
                        state.support.phone, state.support.email
                    ),
                }),
            ))
        }
    }
}

/// Post-payment summary: what was paid, what remains, and when it is due.
async fn view_confirmation(
    Path(lead_id): Path<String>,
    State(state): State<BookingState>,
) -> Result<Json<ConfirmationView>, (StatusCode, Json<BookingError>)> {
    let lead_id = LeadId(lead_id);

    let (lead, quote, payments) = tokio::join!(
        state.leads.find_by_id(&lead_id),
        find_quote_with_retry(state.quotes.as_ref(), &lead_id, &state.retry),
        state.payments.list_by_lead(&lead_id),
    );
    let lead = lead.map_err(store_error)?;
    let quote = quote.map_err(store_error)?;
    let payments = payments.map_err(store_error)?;

    if lead.is_none() && quote.is_none() {
        return Err(not_found(&lead_id));
    }

    let total = quote.as_ref().map(pricing::total).unwrap_or(Decimal::ZERO);
    let split = pricing::deposit_split(total);
    let amount_paid = paid_total(&payments);

    Ok(Json(ConfirmationView {
        lead,
        quote,
        total,
        deposit: split.deposit,
        remaining_balance: pricing::remaining_after_payment(total, amount_paid),
        amount_paid,
    }))
}

/// Most recent paid payment, with quote context for the line items.
async fn view_receipt(
    Path(lead_id): Path<String>,
    State(state): State<BookingState>,
) -> Result<Json<ReceiptView>, (StatusCode, Json<BookingError>)> {
    let lead_id = LeadId(lead_id);

    let (lead, quote, payments) = tokio::join!(
        state.leads.find_by_id(&lead_id),
        state.quotes.find_by_lead(&lead_id),
        state.payments.list_by_lead(&lead_id),
    );
    let lead = lead.map_err(store_error)?;
    let quote = quote.map_err(store_error)?;
    let payments = payments.map_err(store_error)?;

    let Some(payment) = latest_paid(&payments).cloned() else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(BookingError {
                error: "no payment receipt found for this booking: no payment has been \
                        recorded yet, payment is still pending, or payment was recorded \
                        with a different status"
                    .to_string(),
            }),
        ));
    };

    let quote_total = quote.as_ref().map(pricing::total);

    Ok(Json(ReceiptView { payment, lead, quote, quote_total }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(lead_id: &LeadId) -> (StatusCode, Json<BookingError>) {
    (
        StatusCode::NOT_FOUND,
        Json(BookingError { error: format!("booking `{lead_id}` not found") }),
    )
}

fn store_error(error: RepositoryError) -> (StatusCode, Json<BookingError>) {
    error!(error = %error, "booking store error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(BookingError { error: "an internal error occurred".to_string() }),
    )
}

fn signing_error(error: crate::signing::SigningError) -> (StatusCode, Json<BookingError>) {
    error!(error = %error, "contract signing error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(BookingError { error: "an internal error occurred".to_string() }),
    )
}

fn to_cents(amount: Decimal) -> Result<i64, (StatusCode, Json<BookingError>)> {
    (amount * Decimal::ONE_HUNDRED).round().to_i64().ok_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(BookingError { error: "payment amount is out of range".to_string() }),
        )
    })
}

fn expand_url(template: &str, lead_id: &LeadId) -> String {
    template.replace("{lead_id}", &lead_id.0)
}

/// Record an audit event for traceability. Failures are logged, never fatal.
async fn record_booking_event(pool: &DbPool, lead_id: &LeadId, event_type: &str, detail: &str) {
    let event_id = format!("BE-{}", &Uuid::new_v4().simple().to_string()[..12]);
    let payload = serde_json::json!({ "detail": detail }).to_string();

    let result = sqlx::query(
        "INSERT INTO booking_event (id, timestamp, lead_id, event_type, payload_json)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&event_id)
    .bind(Utc::now().to_rfc3339())
    .bind(&lead_id.0)
    .bind(event_type)
    .bind(&payload)
    .execute(pool)
    .await;

    if let Err(e) = result {
        error!(
            event_name = "booking.audit.write_failed",
            lead_id = %lead_id,
            error = %e,
            "failed to write booking audit event"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{extract::Path, extract::State, http::StatusCode, Json};
    use chrono::Utc;
    use rust_decimal::Decimal;

    use encore_core::config::AppConfig;
    use encore_core::domain::lead::LeadId;
    use encore_core::domain::quote::{Addon, BookingQuote, DiscountType, QuoteId};
    use encore_db::repositories::{
        QuoteStore, RepositoryError, SqlLeadStore, SqlPaymentStore, SqlQuoteStore,
    };
    use encore_db::{connect_with_settings, migrations, DbPool, RetryPolicy};

    use crate::signing::SqlContractSigner;
    use crate::stripe::{CheckoutSession, CheckoutSessionRequest, GatewayError, PaymentGateway};

    use super::*;

    #[derive(Default)]
    struct StubGateway {
        requests: Mutex<Vec<CheckoutSessionRequest>>,
        fail_with: Mutex<Option<String>>,
    }

    impl StubGateway {
        fn captured(&self) -> Vec<CheckoutSessionRequest> {
            self.requests.lock().expect("requests lock").clone()
        }

        fn fail_with(&self, message: &str) {
            *self.fail_with.lock().expect("fail lock") = Some(message.to_string());
        }
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn create_checkout_session(
            &self,
            request: CheckoutSessionRequest,
        ) -> Result<CheckoutSession, GatewayError> {
            if let Some(message) = self.fail_with.lock().expect("fail lock").clone() {
                return Err(GatewayError::Api(message));
            }

            self.requests.lock().expect("requests lock").push(request);
            Ok(CheckoutSession {
                session_id: "cs_test_123".to_string(),
                url: Some("https://checkout.example/cs_test_123".to_string()),
                is_free_order: false,
            })
        }
    }

    /// Quote store whose writes always fail, for rollback-contract tests.
    struct FailingSaveQuoteStore {
        inner: SqlQuoteStore,
    }

    #[async_trait]
    impl QuoteStore for FailingSaveQuoteStore {
        async fn find_by_lead(
            &self,
            lead_id: &LeadId,
        ) -> Result<Option<BookingQuote>, RepositoryError> {
            self.inner.find_by_lead(lead_id).await
        }

        async fn save(&self, _quote: BookingQuote) -> Result<(), RepositoryError> {
            Err(RepositoryError::Decode("injected save failure".to_string()))
        }
    }

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        sqlx::query(
            "INSERT INTO lead (id, name, email, event_type, event_date, location, created_at)
             VALUES ('lead-1', 'Jordan Avery', 'jordan@example.com', 'wedding',
                     '2026-10-17', 'The Atrium', ?)",
        )
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .expect("seed lead");

        pool
    }

    fn quote(base: i64, addon_prices: &[i64]) -> BookingQuote {
        let now = Utc::now();
        BookingQuote {
            id: QuoteId("BQ-1".to_string()),
            lead_id: LeadId("lead-1".to_string()),
            package_name: Some("Reception Package".to_string()),
            package_price: Decimal::from(base),
            speaker_rental: None,
            addons: addon_prices
                .iter()
                .enumerate()
                .map(|(position, price)| Addon {
                    name: format!("addon-{position}"),
                    price: Decimal::from(*price),
                    description: None,
                })
                .collect(),
            total_price: None,
            is_custom_price: false,
            discount_type: None,
            discount_value: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    async fn seed_quote(pool: &DbPool, quote: BookingQuote) {
        SqlQuoteStore::new(pool.clone()).save(quote).await.expect("seed quote");
    }

    async fn seed_payment(pool: &DbPool, id: &str, status: &str, amount: &str) {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO payment
                (id, lead_id, payment_status, total_amount, payment_method,
                 transaction_date, created_at)
             VALUES (?, 'lead-1', ?, ?, 'card', ?, ?)",
        )
        .bind(id)
        .bind(status)
        .bind(amount)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await
        .expect("seed payment");
    }

    fn state_with(pool: DbPool, gateway: Arc<StubGateway>) -> State<BookingState> {
        let config = AppConfig::default();
        State(BookingState {
            leads: Arc::new(SqlLeadStore::new(pool.clone())),
            quotes: Arc::new(SqlQuoteStore::new(pool.clone())),
            payments: Arc::new(SqlPaymentStore::new(pool.clone())),
            signer: Arc::new(SqlContractSigner::new(pool.clone())),
            db_pool: pool,
            gateway,
            retry: RetryPolicy { max_retries: 1, base_delay: std::time::Duration::from_millis(2) },
            support: config.support.clone(),
            checkout_success_url: config.payments.checkout_success_url.clone(),
            checkout_cancel_url: config.payments.checkout_cancel_url.clone(),
        })
    }

    fn state(pool: DbPool) -> (State<BookingState>, Arc<StubGateway>) {
        let gateway = Arc::new(StubGateway::default());
        (state_with(pool, gateway.clone()), gateway)
    }

    #[tokio::test]
    async fn booking_view_composes_pricing_with_fallback_total() {
        let pool = setup().await;
        seed_quote(&pool, quote(1000, &[200])).await;
        let (state, _) = state(pool.clone());

        let view = view_booking(Path("lead-1".to_string()), state)
            .await
            .expect("view should succeed")
            .0;

        let pricing = view.pricing.expect("pricing present");
        assert_eq!(pricing.subtotal, Decimal::from(1200));
        assert_eq!(pricing.total, Decimal::from(1200));
        assert_eq!(pricing.deposit, Decimal::from(600));
        assert_eq!(pricing.remaining, Decimal::from(600));
        assert_eq!(view.balance_due, Some(Decimal::from(600)));
        assert!(view.lead.is_some());

        pool.close().await;
    }

    #[tokio::test]
    async fn booking_view_reports_amount_paid_and_balance() {
        let pool = setup().await;
        seed_quote(&pool, quote(1000, &[200])).await;
        seed_payment(&pool, "p-1", "Paid", "600").await;
        seed_payment(&pool, "p-2", "Pending", "600").await;
        let (state, _) = state(pool.clone());

        let view = view_booking(Path("lead-1".to_string()), state)
            .await
            .expect("view should succeed")
            .0;

        assert_eq!(view.amount_paid, Decimal::from(600));
        assert_eq!(view.balance_due, Some(Decimal::from(600)));
        assert_eq!(view.payments.len(), 2);

        pool.close().await;
    }

    #[tokio::test]
    async fn booking_view_without_lead_or_quote_is_not_found() {
        let pool = setup().await;
        let (state, _) = state(pool.clone());

        let result = view_booking(Path("lead-unknown".to_string()), state).await;

        let (status, body) = result.expect_err("missing booking should 404");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.0.error.contains("not found"));

        pool.close().await;
    }

    #[tokio::test]
    async fn remove_addon_recomputes_and_persists() {
        let pool = setup().await;
        seed_quote(&pool, quote(200, &[100, 50])).await;
        let (state, _) = state(pool.clone());

        let response = remove_addon(Path(("lead-1".to_string(), 0)), state)
            .await
            .expect("removal should succeed")
            .0;

        assert_eq!(response.quote.addons.len(), 1);
        assert_eq!(response.quote.total_price, Some(Decimal::from(250)));
        assert_eq!(response.pricing.total, Decimal::from(250));

        let stored = SqlQuoteStore::new(pool.clone())
            .find_by_lead(&LeadId("lead-1".to_string()))
            .await
            .expect("query")
            .expect("quote present");
        assert_eq!(stored.addons.len(), 1);
        assert_eq!(stored.total_price, Some(Decimal::from(250)));

        pool.close().await;
    }

    #[tokio::test]
    async fn remove_addon_out_of_range_is_rejected_without_mutation() {
        let pool = setup().await;
        seed_quote(&pool, quote(200, &[100])).await;
        let (state, _) = state(pool.clone());

        let (status, _) = remove_addon(Path(("lead-1".to_string(), 5)), state)
            .await
            .expect_err("out-of-range index should fail");
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let stored = SqlQuoteStore::new(pool.clone())
            .find_by_lead(&LeadId("lead-1".to_string()))
            .await
            .expect("query")
            .expect("quote present");
        assert_eq!(stored.addons.len(), 1);
        assert_eq!(stored.total_price, None);

        pool.close().await;
    }

    #[tokio::test]
    async fn remove_addon_save_failure_leaves_stored_quote_unchanged() {
        let pool = setup().await;
        seed_quote(&pool, quote(200, &[100, 50])).await;

        let (State(mut booking_state), _) = state(pool.clone());
        booking_state.quotes =
            Arc::new(FailingSaveQuoteStore { inner: SqlQuoteStore::new(pool.clone()) });

        let (status, body) = remove_addon(Path(("lead-1".to_string(), 0)), State(booking_state))
            .await
            .expect_err("failed save should surface");
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.0.error.contains("unchanged"));

        let stored = SqlQuoteStore::new(pool.clone())
            .find_by_lead(&LeadId("lead-1".to_string()))
            .await
            .expect("query")
            .expect("quote present");
        assert_eq!(stored.addons.len(), 2);

        pool.close().await;
    }

    #[tokio::test]
    async fn checkout_deposit_sends_half_total_in_cents() {
        let pool = setup().await;
        seed_quote(&pool, quote(1000, &[200])).await;
        let (state, gateway) = state(pool.clone());

        let response = create_checkout(
            Path("lead-1".to_string()),
            state,
            Json(CheckoutRequest { payment_type: PaymentType::Deposit }),
        )
        .await
        .expect("checkout should succeed")
        .0;

        assert_eq!(response.amount, Decimal::from(600));
        assert!(!response.charged_in_full);

        let captured = gateway.captured();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].amount_cents, 60_000);
        assert_eq!(captured[0].description, "Deposit for Reception Package");
        assert_eq!(
            captured[0].success_url,
            "http://localhost:8080/booking/lead-1/confirmation?session_id={CHECKOUT_SESSION_ID}"
        );

        pool.close().await;
    }

    #[tokio::test]
    async fn checkout_full_sends_total() {
        let pool = setup().await;
        seed_quote(&pool, quote(1000, &[200])).await;
        let (state, gateway) = state(pool.clone());

        let response = create_checkout(
            Path("lead-1".to_string()),
            state,
            Json(CheckoutRequest { payment_type: PaymentType::Full }),
        )
        .await
        .expect("checkout should succeed")
        .0;

        assert_eq!(response.amount, Decimal::from(1200));
        assert!(response.charged_in_full);
        assert_eq!(gateway.captured()[0].amount_cents, 120_000);
        assert_eq!(gateway.captured()[0].description, "Full payment for Reception Package");

        pool.close().await;
    }

    #[tokio::test]
    async fn checkout_small_total_is_always_charged_in_full() {
        let pool = setup().await;
        let mut small = quote(5, &[]);
        small.total_price = Some(Decimal::from(5));
        seed_quote(&pool, small).await;
        let (state, gateway) = state(pool.clone());

        let response = create_checkout(
            Path("lead-1".to_string()),
            state,
            Json(CheckoutRequest { payment_type: PaymentType::Deposit }),
        )
        .await
        .expect("checkout should succeed")
        .0;

        assert_eq!(response.amount, Decimal::from(5));
        assert!(response.charged_in_full);
        assert_eq!(gateway.captured()[0].amount_cents, 500);

        pool.close().await;
    }

    #[tokio::test]
    async fn checkout_without_quote_is_rejected() {
        let pool = setup().await;
        let (state, _) = state(pool.clone());

        let (status, body) =
            create_checkout(Path("lead-1".to_string()), state, Json(CheckoutRequest::default()))
                .await
                .expect_err("missing quote should fail");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.0.error.contains("select your services"));

        pool.close().await;
    }

    #[tokio::test]
    async fn checkout_gateway_failure_surfaces_message_with_support_contact() {
        let pool = setup().await;
        seed_quote(&pool, quote(1000, &[200])).await;
        let (state, gateway) = state(pool.clone());
        gateway.fail_with("Your card was declined.");

        let (status, body) =
            create_checkout(Path("lead-1".to_string()), state, Json(CheckoutRequest::default()))
                .await
                .expect_err("gateway failure should surface");

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.0.error.contains("Your card was declined."));
        assert!(body.0.error.contains("(555) 201-0100"));
        assert!(body.0.error.contains("bookings@encore.example"));

        pool.close().await;
    }

    #[tokio::test]
    async fn sign_contract_records_signature_and_audit_event() {
        let pool = setup().await;
        seed_quote(&pool, quote(1000, &[200])).await;
        let (state, _) = state(pool.clone());

        let contract = sign_contract(
            Path("lead-1".to_string()),
            state,
            Json(SignContractRequest {
                client_name: "Jordan Avery".to_string(),
                client_email: Some("jordan@example.com".to_string()),
                signature_image: "data:image/png;base64,iVBORw0KGgo=".to_string(),
                agreed_at: None,
            }),
        )
        .await
        .expect("signing should succeed")
        .0;

        assert!(contract.is_signed());
        assert_eq!(contract.signed_by_client.as_deref(), Some("Jordan Avery"));

        let audit_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM booking_event
             WHERE lead_id = 'lead-1' AND event_type = 'booking.contract_signed'",
        )
        .fetch_one(&pool)
        .await
        .expect("count audit events");
        assert_eq!(audit_count, 1);

        pool.close().await;
    }

    #[tokio::test]
    async fn sign_contract_requires_signature_image() {
        let pool = setup().await;
        let (state, _) = state(pool.clone());

        let (status, body) = sign_contract(
            Path("lead-1".to_string()),
            state,
            Json(SignContractRequest {
                client_name: "Jordan Avery".to_string(),
                client_email: None,
                signature_image: "  ".to_string(),
                agreed_at: None,
            }),
        )
        .await
        .expect_err("blank signature should fail");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.0.error.contains("signature"));

        pool.close().await;
    }

    #[tokio::test]
    async fn contract_view_derives_terms_from_live_quote() {
        let pool = setup().await;
        seed_quote(&pool, quote(1000, &[200])).await;
        let (state, _) = state(pool.clone());

        let view = view_contract(Path("lead-1".to_string()), state)
            .await
            .expect("contract view should succeed")
            .0;

        assert_eq!(view.contract_number, "CONT-LEAD-1");
        assert_eq!(view.total, Decimal::from(1200));
        assert_eq!(view.deposit_due_on_signing, Decimal::from(600));
        assert_eq!(view.remaining_due_before_event, Decimal::from(600));
        assert!(!view.signed);
        assert!(!view.vendor_countersigned);

        pool.close().await;
    }

    #[tokio::test]
    async fn confirmation_reports_deposit_and_remaining_balance() {
        let pool = setup().await;
        seed_quote(&pool, quote(1000, &[200])).await;
        seed_payment(&pool, "p-1", "Paid", "600").await;
        let (state, _) = state(pool.clone());

        let view = view_confirmation(Path("lead-1".to_string()), state)
            .await
            .expect("confirmation should succeed")
            .0;

        assert_eq!(view.total, Decimal::from(1200));
        assert_eq!(view.deposit, Decimal::from(600));
        assert_eq!(view.amount_paid, Decimal::from(600));
        assert_eq!(view.remaining_balance, Decimal::from(600));

        pool.close().await;
    }

    #[tokio::test]
    async fn receipt_returns_latest_paid_payment() {
        let pool = setup().await;
        seed_quote(&pool, quote(1000, &[200])).await;
        seed_payment(&pool, "p-1", "Paid", "600").await;
        let (state, _) = state(pool.clone());

        let view = view_receipt(Path("lead-1".to_string()), state)
            .await
            .expect("receipt should succeed")
            .0;

        assert_eq!(view.payment.id, "p-1");
        assert_eq!(view.payment.total_amount, Decimal::from(600));
        assert_eq!(view.quote_total, Some(Decimal::from(1200)));

        pool.close().await;
    }

    #[tokio::test]
    async fn receipt_without_paid_payments_is_not_found() {
        let pool = setup().await;
        seed_quote(&pool, quote(1000, &[200])).await;
        seed_payment(&pool, "p-1", "Pending", "600").await;
        let (state, _) = state(pool.clone());

        let (status, body) = view_receipt(Path("lead-1".to_string()), state)
            .await
            .expect_err("no paid payments should 404");

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.0.error.contains("no payment receipt"));

        pool.close().await;
    }

    #[tokio::test]
    async fn custom_priced_quote_view_rederives_discount_over_stale_total() {
        let pool = setup().await;
        let mut custom = quote(2400, &[500]);
        custom.is_custom_price = true;
        custom.discount_type = Some(DiscountType::Percentage);
        custom.discount_value = Decimal::from(10);
        // Stale stored total that must be ignored on the custom path.
        custom.total_price = Some(Decimal::from(2900));
        seed_quote(&pool, custom).await;
        let (state, _) = state(pool.clone());

        let view = view_booking(Path("lead-1".to_string()), state)
            .await
            .expect("view should succeed")
            .0;

        let pricing = view.pricing.expect("pricing present");
        assert_eq!(pricing.subtotal, Decimal::from(2900));
        assert_eq!(pricing.discount, Decimal::from(290));
        assert_eq!(pricing.total, Decimal::from(2610));

        pool.close().await;
    }
}
