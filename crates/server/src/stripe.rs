//! Hosted-checkout client for the payment gateway.
//!
//! Only checkout-session creation is owned here; payment capture and webhook
//! ingestion live with the gateway and its webhook consumer. Amounts cross
//! this boundary in cents.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use encore_core::config::PaymentsConfig;
use encore_core::domain::lead::LeadId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub lead_id: LeadId,
    pub amount_cents: i64,
    pub description: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: Option<String>,
    pub is_free_order: bool,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),
    // The gateway's own message, surfaced to the customer verbatim.
    #[error("{0}")]
    Api(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("gateway client configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError>;
}

pub struct StripeGateway {
    client: Client,
    secret_key: SecretString,
    base_url: String,
    currency: String,
}

impl StripeGateway {
    pub fn from_config(config: &PaymentsConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| GatewayError::Configuration(error.to_string()))?;

        Ok(Self {
            client,
            secret_key: config.secret_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            currency: config.currency.clone(),
        })
    }

    fn checkout_form(&self, request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            ("line_items[0][price_data][currency]".to_string(), self.currency.clone()),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.description.clone(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("metadata[lead_id]".to_string(), request.lead_id.0.clone()),
        ]
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        // Zero-amount orders never reach the processor; there is nothing to
        // charge and sub-minimum requests would be rejected anyway.
        if request.amount_cents == 0 {
            info!(
                event_name = "gateway.checkout.free_order",
                lead_id = %request.lead_id,
                "free order, skipping hosted checkout"
            );
            return Ok(CheckoutSession {
                session_id: format!("free_{}", Uuid::new_v4().simple()),
                url: Some(request.success_url.clone()),
                is_free_order: true,
            });
        }

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .basic_auth(self.secret_key.expose_secret(), Option::<&str>::None)
            .form(&self.checkout_form(&request))
            .send()
            .await
            .map_err(|error| GatewayError::Network(error.to_string()))?;

        let session: StripeSessionBody = handle_response(response).await?;

        info!(
            event_name = "gateway.checkout.session_created",
            lead_id = %request.lead_id,
            session_id = %session.id,
            amount_cents = request.amount_cents,
            "hosted checkout session created"
        );

        Ok(CheckoutSession { session_id: session.id, url: session.url, is_free_order: false })
    }
}

#[derive(Debug, Deserialize)]
struct StripeSessionBody {
    id: String,
    url: Option<String>,
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response.text().await.map_err(|error| GatewayError::Network(error.to_string()))?;

    if !status.is_success() {
        #[derive(Deserialize)]
        struct StripeApiError {
            error: StripeApiErrorDetail,
        }

        #[derive(Deserialize)]
        struct StripeApiErrorDetail {
            message: String,
        }

        if let Ok(error) = serde_json::from_str::<StripeApiError>(&body) {
            return Err(GatewayError::Api(error.error.message));
        }

        return Err(GatewayError::Api(format!("HTTP {status}: {body}")));
    }

    serde_json::from_str(&body).map_err(|error| GatewayError::Parse(error.to_string()))
}
