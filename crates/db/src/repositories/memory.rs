use std::collections::HashMap;

use tokio::sync::RwLock;

use encore_core::domain::lead::{LeadId, LeadRecord};
use encore_core::domain::payment::PaymentRecord;
use encore_core::domain::quote::BookingQuote;

use super::{LeadStore, PaymentStore, QuoteStore, RepositoryError};

#[derive(Default)]
pub struct InMemoryLeadStore {
    leads: RwLock<HashMap<String, LeadRecord>>,
}

impl InMemoryLeadStore {
    pub async fn insert(&self, lead: LeadRecord) {
        let mut leads = self.leads.write().await;
        leads.insert(lead.id.0.clone(), lead);
    }
}

#[async_trait::async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn find_by_id(&self, id: &LeadId) -> Result<Option<LeadRecord>, RepositoryError> {
        let leads = self.leads.read().await;
        Ok(leads.get(&id.0).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryQuoteStore {
    quotes: RwLock<HashMap<String, BookingQuote>>,
}

#[async_trait::async_trait]
impl QuoteStore for InMemoryQuoteStore {
    async fn find_by_lead(
        &self,
        lead_id: &LeadId,
    ) -> Result<Option<BookingQuote>, RepositoryError> {
        let quotes = self.quotes.read().await;
        Ok(quotes.get(&lead_id.0).cloned())
    }

    async fn save(&self, quote: BookingQuote) -> Result<(), RepositoryError> {
        let mut quotes = self.quotes.write().await;
        quotes.insert(quote.lead_id.0.clone(), quote);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPaymentStore {
    payments: RwLock<Vec<PaymentRecord>>,
}

impl InMemoryPaymentStore {
    pub async fn insert(&self, payment: PaymentRecord) {
        let mut payments = self.payments.write().await;
        payments.push(payment);
    }
}

#[async_trait::async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn list_by_lead(
        &self,
        lead_id: &LeadId,
    ) -> Result<Vec<PaymentRecord>, RepositoryError> {
        let payments = self.payments.read().await;
        let mut matching: Vec<PaymentRecord> =
            payments.iter().filter(|payment| payment.lead_id == *lead_id).cloned().collect();
        matching.sort_by_key(|payment| {
            std::cmp::Reverse(payment.transaction_date.unwrap_or(payment.created_at))
        });
        Ok(matching)
    }
}
