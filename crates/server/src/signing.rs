//! Contract signing service.
//!
//! Captures the customer's drawn or typed signature against their booking
//! contract. Signing is idempotent per lead: a second submission returns the
//! contract that already exists instead of creating a duplicate. The vendor
//! countersignature happens out of band and stays pending here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use encore_core::domain::lead::LeadId;
use encore_db::DbPool;

#[derive(Clone, Debug)]
pub struct SignatureRequest {
    pub lead_id: LeadId,
    pub signer_name: String,
    pub signer_email: Option<String>,
    /// Data-URL image produced by the signature capture widget.
    pub signature_image: String,
    pub agreed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContractRecord {
    pub id: String,
    pub lead_id: LeadId,
    pub contract_number: String,
    pub status: String,
    pub signed_by_client: Option<String>,
    pub client_signature_data: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
    pub signed_by_vendor_at: Option<DateTime<Utc>>,
}

impl ContractRecord {
    pub fn is_signed(&self) -> bool {
        self.status == "signed" || self.signed_at.is_some()
    }
}

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ContractSigning: Send + Sync {
    async fn sign(&self, request: SignatureRequest) -> Result<ContractRecord, SigningError>;

    async fn find_by_lead(
        &self,
        lead_id: &LeadId,
    ) -> Result<Option<ContractRecord>, SigningError>;
}

/// Contract number derived from the lead when none was assigned upstream.
pub fn contract_number_for(lead_id: &LeadId) -> String {
    let prefix: String = lead_id.0.chars().take(8).collect::<String>().to_uppercase();
    format!("CONT-{prefix}")
}

pub struct SqlContractSigner {
    pool: DbPool,
}

impl SqlContractSigner {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContractSigning for SqlContractSigner {
    async fn sign(&self, request: SignatureRequest) -> Result<ContractRecord, SigningError> {
        if let Some(existing) = self.find_by_lead(&request.lead_id).await? {
            if existing.is_signed() {
                info!(
                    event_name = "signing.contract.already_signed",
                    lead_id = %request.lead_id,
                    contract_number = %existing.contract_number,
                    "contract already signed, returning existing record"
                );
                return Ok(existing);
            }
        }

        let id = format!("CTR-{}", &Uuid::new_v4().simple().to_string()[..12]);
        let contract_number = contract_number_for(&request.lead_id);
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO contract
                (id, lead_id, contract_number, status, signed_by_client,
                 client_signature_data, signed_at, signed_by_vendor_at, created_at)
             VALUES (?, ?, ?, 'signed', ?, ?, ?, NULL, ?)
             ON CONFLICT(lead_id) DO UPDATE SET
                status = 'signed',
                signed_by_client = excluded.signed_by_client,
                client_signature_data = excluded.client_signature_data,
                signed_at = excluded.signed_at",
        )
        .bind(&id)
        .bind(&request.lead_id.0)
        .bind(&contract_number)
        .bind(&request.signer_name)
        .bind(&request.signature_image)
        .bind(request.agreed_at.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!(
            event_name = "signing.contract.signed",
            lead_id = %request.lead_id,
            contract_number = %contract_number,
            signer_name = %request.signer_name,
            signer_email = %request.signer_email.as_deref().unwrap_or(""),
            "contract signed by client"
        );

        self.find_by_lead(&request.lead_id).await?.ok_or_else(|| {
            SigningError::Decode("contract row missing immediately after signing".to_string())
        })
    }

    async fn find_by_lead(
        &self,
        lead_id: &LeadId,
    ) -> Result<Option<ContractRecord>, SigningError> {
        let row = sqlx::query(
            "SELECT id, lead_id, contract_number, status, signed_by_client,
                    client_signature_data, signed_at, signed_by_vendor_at
             FROM contract WHERE lead_id = ?",
        )
        .bind(&lead_id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let signed_at = decode_optional_timestamp(row.try_get("signed_at")?)?;
        let signed_by_vendor_at = decode_optional_timestamp(row.try_get("signed_by_vendor_at")?)?;

        Ok(Some(ContractRecord {
            id: row.try_get("id")?,
            lead_id: LeadId(row.try_get("lead_id")?),
            contract_number: row.try_get("contract_number")?,
            status: row.try_get("status")?,
            signed_by_client: row.try_get("signed_by_client")?,
            client_signature_data: row.try_get("client_signature_data")?,
            signed_at,
            signed_by_vendor_at,
        }))
    }
}

fn decode_optional_timestamp(
    raw: Option<String>,
) -> Result<Option<DateTime<Utc>>, SigningError> {
    raw.map(|value| {
        DateTime::parse_from_rfc3339(value.trim())
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|_| SigningError::Decode(format!("invalid timestamp: `{value}`")))
    })
    .transpose()
}
