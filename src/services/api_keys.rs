//! Payment-gated API key issuance.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::clients::paystack::PaymentVerifier;
use crate::db::{KeyIssue, Store};

#[derive(Debug, Error)]
pub enum ApiKeyError {
    #[error("Payment verification failed")]
    PaymentNotVerified,

    #[error("This payment reference has already been used")]
    ReferenceUsed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for ApiKeyError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

pub struct ApiKeyService {
    store: Store,
    payments: Arc<dyn PaymentVerifier>,
}

impl ApiKeyService {
    #[must_use]
    pub fn new(store: Store, payments: Arc<dyn PaymentVerifier>) -> Self {
        Self { store, payments }
    }

    /// Verifies the payment and stores a new key for the user. Re-submitting
    /// a reference the same user already redeemed returns their current key.
    pub async fn issue(&self, user_id: i32, reference: &str) -> Result<String, ApiKeyError> {
        if let Some(owner_id) = self.store.payment_reference_owner(reference).await? {
            if owner_id != user_id {
                return Err(ApiKeyError::ReferenceUsed);
            }
            if let Some(key) = self.current(user_id).await? {
                return Ok(key);
            }
        }

        // Payment API failures count as "not verified"
        let verified = match self.payments.verify(reference).await {
            Ok(verified) => verified,
            Err(e) => {
                warn!("Payment verification error for {reference}: {e:#}");
                false
            }
        };

        if !verified {
            return Err(ApiKeyError::PaymentNotVerified);
        }

        match self.store.issue_api_key(user_id, reference).await? {
            KeyIssue::Issued(key) => {
                info!(user_id, "Issued API key");
                Ok(key)
            }
            KeyIssue::ReferenceUsed => Err(ApiKeyError::ReferenceUsed),
        }
    }

    pub async fn current(&self, user_id: i32) -> Result<Option<String>, ApiKeyError> {
        let user = self.store.get_user_by_id(user_id).await?;
        Ok(user.and_then(|u| u.api_key))
    }
}
