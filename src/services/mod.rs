pub mod api_keys;
pub use api_keys::{ApiKeyError, ApiKeyService};

pub mod auth_service;
pub use auth_service::{AuthError, AuthService, UserInfo};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod autosave;
pub use autosave::{AutoSaver, DraftSink, SaveStatus, StoreDraftSink};

pub mod scoring;
pub use scoring::{ScoringOutcome, ScoringService};
