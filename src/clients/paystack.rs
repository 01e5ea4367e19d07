use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::PaymentConfig;

/// Confirms that a payment reference was settled.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn verify(&self, reference: &str) -> Result<bool>;
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
}

impl VerifyResponse {
    fn is_successful(&self) -> bool {
        self.status && self.data.as_ref().is_some_and(|d| d.status == "success")
    }
}

#[derive(Clone)]
pub struct PaystackClient {
    client: Client,
    base_url: String,
    secret_key: String,
    timeout: Duration,
}

impl PaystackClient {
    #[must_use]
    pub fn with_shared_client(client: Client, config: &PaymentConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            secret_key: config.secret_key.clone(),
            timeout: Duration::from_secs(config.request_timeout_seconds),
        }
    }

    fn verify_url(&self, reference: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).context("Invalid payment API base URL")?;
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("Payment API base URL cannot be a base"))?
            .pop_if_empty()
            .extend(["transaction", "verify", reference]);
        Ok(url)
    }
}

#[async_trait]
impl PaymentVerifier for PaystackClient {
    async fn verify(&self, reference: &str) -> Result<bool> {
        if self.secret_key.is_empty() {
            anyhow::bail!("Payment secret key is not configured");
        }

        let url = self.verify_url(reference)?;
        debug!("Verifying payment reference {reference}");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .context("Payment verification request failed")?;

        let status = response.status();
        if status.is_server_error() {
            anyhow::bail!("Payment API returned {status}");
        }
        if !status.is_success() {
            debug!("Payment API rejected reference {reference}: {status}");
            return Ok(false);
        }

        let body: VerifyResponse = response
            .json()
            .await
            .context("Failed to decode payment verification response")?;

        debug!("Payment API says: {}", body.message);
        Ok(body.is_successful())
    }
}
