//! Bounded retry for quote reads.
//!
//! Quote records are created by the quoting workflow and can lag behind the
//! link a customer follows to the booking pages. A clean miss is re-polled a
//! few times with linear backoff before being reported as absent. Errors are
//! never retried here.

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use encore_core::domain::lead::LeadId;
use encore_core::domain::quote::BookingQuote;

use crate::repositories::{QuoteStore, RepositoryError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    /// Linear backoff: the n-th retry waits n times the base delay
    /// (1s, 2s, 3s with defaults).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }
}

pub async fn find_quote_with_retry(
    store: &dyn QuoteStore,
    lead_id: &LeadId,
    policy: &RetryPolicy,
) -> Result<Option<BookingQuote>, RepositoryError> {
    let mut retry = 0;

    loop {
        match store.find_by_lead(lead_id).await? {
            Some(quote) => return Ok(Some(quote)),
            None if retry < policy.max_retries => {
                retry += 1;
                debug!(
                    event_name = "db.quote.retry",
                    lead_id = %lead_id,
                    retry,
                    max_retries = policy.max_retries,
                    "quote not visible yet, retrying"
                );
                sleep(policy.delay_for(retry)).await;
            }
            None => return Ok(None),
        }
    }
}
