use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::services::autosave::parse_frequency;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub llm: LlmConfig,

    pub payments: PaymentConfig,

    pub scoring: ScoringConfig,

    pub autosave: AutosaveConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" | "test" => Some(Self::Development),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub environment: Environment,

    pub database_url: String,

    pub log_level: String,

    #[serde(default)]
    pub suppress_connection_errors: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            database_url: "sqlite:data/essai.db".to_string(),
            log_level: "info".to_string(),
            suppress_connection_errors: false,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    /// Public base URL of the deployment (`AUTH_URL`).
    pub public_url: String,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    pub secure_cookies: bool,

    /// Signing secret for session cookies (`AUTH_SECRET`), at least 64 bytes.
    /// Cookies are unsigned when this is empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub session_secret: String,

    pub session_inactivity_minutes: i64,

    /// Whether to allow API key authentication via query parameter (?`api_key`=).
    /// API keys in URLs can leak via browser history, logs, and referrers.
    pub allow_api_key_in_query: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            public_url: "http://localhost:3000".to_string(),
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            secure_cookies: true,
            session_secret: String::new(),
            session_inactivity_minutes: 60 * 24,
            allow_api_key_in_query: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            min_password_length: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended.
    pub base_url: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    pub model: String,

    pub temperature: f32,

    /// Request timeout in seconds (default: 60)
    pub request_timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            request_timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    pub base_url: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub secret_key: String,

    pub request_timeout_seconds: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.paystack.co".to_string(),
            secret_key: String::new(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScoringConfig {
    /// Pause before calling the completion API. The hosted product waited
    /// 2000 ms here; 0 disables it.
    pub artificial_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Debounce window for `essai draft`, e.g. "30s" or "2 minutes".
    pub frequency: String,

    pub min_content_length: usize,

    pub default_draft_limit: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            frequency: "30s".to_string(),
            min_content_length: 10,
            default_draft_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "essai".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            llm: LlmConfig::default(),
            payments: PaymentConfig::default(),
            scoring: ScoringConfig::default(),
            autosave: AutosaveConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Loads the first config file found, then applies `.env` and process
    /// environment overrides.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Overlays environment variables onto the loaded config. `lookup` is
    /// `std::env::var` in production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(env) = get("ESSAI_ENV") {
            match Environment::parse(&env) {
                Some(parsed) => self.general.environment = parsed,
                None => warn!("Ignoring unknown ESSAI_ENV value: {env}"),
            }
        }
        if let Some(url) = get("DATABASE_URL") {
            self.general.database_url = url;
        }
        if let Some(secret) = get("AUTH_SECRET") {
            self.server.session_secret = secret;
        }
        if let Some(url) = get("AUTH_URL") {
            self.server.public_url = url;
        }
        if let Some(port) = get("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid PORT value: {port}"),
            }
        }
        if let Some(key) = get("PAYSTACK_SECRET_KEY") {
            self.payments.secret_key = key;
        }
        if let Some(key) = get("LLM_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            self.llm.api_key = key;
        }
        if let Some(url) = get("LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = get("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = get("LOKI_URL") {
            self.observability.loki_url = url;
            self.observability.loki_enabled = true;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("essai").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".essai").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    /// Collects problems with values the service needs at runtime.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.general.database_url.trim().is_empty() {
            problems.push("DATABASE_URL is not set".to_string());
        }

        if self.server.session_secret.is_empty() {
            problems.push("AUTH_SECRET is not set".to_string());
        } else if self.server.session_secret.len() < 64 {
            problems.push("AUTH_SECRET must be at least 64 bytes".to_string());
        }

        if let Err(e) = url::Url::parse(&self.server.public_url) {
            problems.push(format!("AUTH_URL is not a valid URL: {e}"));
        }

        if self.llm.api_key.is_empty() {
            problems.push("LLM_API_KEY is not set".to_string());
        }

        if let Err(e) = url::Url::parse(&self.llm.base_url) {
            problems.push(format!("LLM_BASE_URL is not a valid URL: {e}"));
        }

        if self.payments.secret_key.is_empty() {
            problems.push("PAYSTACK_SECRET_KEY is not set".to_string());
        }

        if self.observability.loki_enabled
            && let Err(e) = url::Url::parse(&self.observability.loki_url)
        {
            problems.push(format!("LOKI_URL is not a valid URL: {e}"));
        }

        problems
    }

    /// Fails on malformed settings. Missing secrets abort startup in
    /// production and are only warned about in development.
    pub fn validate(&self) -> Result<()> {
        parse_frequency(&self.autosave.frequency)
            .with_context(|| format!("Invalid autosave frequency: {}", self.autosave.frequency))?;

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("min_db_connections cannot exceed max_db_connections");
        }

        let problems = self.problems();
        if problems.is_empty() {
            return Ok(());
        }

        if self.general.environment.is_production() {
            anyhow::bail!("Invalid environment configuration:\n  {}", problems.join("\n  "));
        }

        for problem in &problems {
            warn!("{problem}");
        }
        Ok(())
    }
}
