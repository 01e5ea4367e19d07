use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::clients::llm::CompletionProvider;
use crate::clients::paystack::PaymentVerifier;
use crate::config::Config;
use crate::state::SharedState;

mod api_keys;
pub mod auth;
mod autosave;
mod diagnostics;
mod error;
pub mod essays;
mod observability;
mod score;
pub mod stats;
mod system;
mod types;
mod validation;

pub use error::{ApiError, set_expose_internal_errors};
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn scoring(&self) -> &Arc<crate::services::ScoringService> {
        &self.shared.scoring
    }

    #[must_use]
    pub fn api_keys(&self) -> &Arc<crate::services::ApiKeyService> {
        &self.shared.api_keys
    }

    #[must_use]
    pub fn llm(&self) -> &Arc<dyn CompletionProvider> {
        &self.shared.llm
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

/// Same as [`create_app_state_from_config`] with caller-supplied
/// completion and payment clients.
pub async fn create_app_state_with_providers(
    config: Config,
    llm: Arc<dyn CompletionProvider>,
    payments: Arc<dyn PaymentVerifier>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_providers(config, llm, payments).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config();
    let cors_origins = config.server.cors_allowed_origins.clone();

    set_expose_internal_errors(!config.general.environment.is_production());

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/health", get(system::health));

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.server.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.server.session_inactivity_minutes,
        )));

    // Signing needs at least 64 bytes of secret
    let api_router = match Key::try_from(config.server.session_secret.as_bytes()) {
        Ok(key) => api_router.layer(session_layer.with_signed(key)),
        Err(_) => {
            if !config.server.session_secret.is_empty() {
                tracing::warn!("Session secret is shorter than 64 bytes, cookies are unsigned");
            }
            api_router.layer(session_layer)
        }
    };

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .route("/metrics", get(observability::get_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(observability::track_metrics))
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(observability::security_headers))
                .layer(cors_layer.allow_methods(Any).allow_headers(Any)),
        )
        .with_state(state)
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route(
            "/essays",
            get(essays::list_essays)
                .post(essays::create_essay)
                .delete(essays::clear_essays),
        )
        .route(
            "/autosave",
            get(autosave::list_drafts).post(autosave::save_draft),
        )
        .route("/score", post(score::score_essay))
        .route("/metrics", get(stats::get_stats))
        .route("/api-key", get(api_keys::get_api_key).post(api_keys::issue_api_key))
        .route(
            "/diagnostics/llm",
            get(diagnostics::llm_status).post(diagnostics::probe_llm),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
