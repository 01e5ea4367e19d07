use std::sync::Arc;
use std::time::Duration;

use crate::clients::llm::{CompletionProvider, LlmClient};
use crate::clients::paystack::{PaymentVerifier, PaystackClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::{ApiKeyService, AuthService, ScoringService, SeaOrmAuthService};

/// Build the HTTP client shared by every outbound API client.
/// Timeouts are applied per request by each client.
fn build_shared_http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("Essai/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub llm: Arc<dyn CompletionProvider>,

    pub auth_service: Arc<dyn AuthService>,

    pub scoring: Arc<ScoringService>,

    pub api_keys: Arc<ApiKeyService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let http = build_shared_http_client()?;

        let llm = Arc::new(LlmClient::with_shared_client(http.clone(), &config.llm))
            as Arc<dyn CompletionProvider>;
        let payments = Arc::new(PaystackClient::with_shared_client(
            http,
            &config.payments,
        )) as Arc<dyn PaymentVerifier>;

        Self::with_providers(config, llm, payments).await
    }

    /// Builds the state around caller-supplied external API clients.
    pub async fn with_providers(
        config: Config,
        llm: Arc<dyn CompletionProvider>,
        payments: Arc<dyn PaymentVerifier>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_url,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let scoring = Arc::new(ScoringService::new(
            llm.clone(),
            Duration::from_millis(config.scoring.artificial_delay_ms),
        ));

        let api_keys = Arc::new(ApiKeyService::new(store.clone(), payments));

        Ok(Self {
            config: Arc::new(config),
            store,
            llm,
            auth_service,
            scoring,
            api_keys,
        })
    }
}
