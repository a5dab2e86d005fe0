//! Service configuration.
//!
//! Loaded once at startup, either from the environment or built directly,
//! and never mutated afterwards.

use std::path::PathBuf;
use std::time::Duration;

use gumstamp_core::{SecretKey, DEFAULT_MAX_AGE};
use gumstamp_store::StorageLayout;
use thiserror::Error;

pub const ENV_SECRET_KEY: &str = "SECRET_KEY";
pub const ENV_STORAGE_DIR: &str = "STORAGE_DIR";
pub const ENV_BASE_URL: &str = "BASE_URL";
pub const ENV_PRODUCT_ID: &str = "GUMROAD_PRODUCT_ID";
pub const ENV_TOKEN_MAX_AGE: &str = "TOKEN_MAX_AGE_SECS";

pub const DEFAULT_STORAGE_DIR: &str = "./storage";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A variable is set but unusable.
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Configuration for a Gumstamp service.
#[derive(Debug, Clone)]
pub struct GumstampConfig {
    /// Secret every capability token is signed with.
    pub secret_key: SecretKey,
    /// Root of the source registry and artifact cache.
    pub storage_dir: PathBuf,
    /// Public base URL, used to build download links. No trailing slash.
    pub base_url: String,
    /// When set, uploads and token issuance require an entitled license key.
    pub product_id: Option<String>,
    /// How long a token stays valid after issuance.
    pub token_max_age: Duration,
}

impl GumstampConfig {
    /// Configuration with defaults for everything but the secret and root.
    pub fn new(secret_key: SecretKey, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            secret_key,
            storage_dir: storage_dir.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            product_id: None,
            token_max_age: DEFAULT_MAX_AGE,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(base_url.into());
        self
    }

    pub fn with_product_id(mut self, product_id: impl Into<String>) -> Self {
        let product_id = product_id.into();
        self.product_id = (!product_id.is_empty()).then_some(product_id);
        self
    }

    pub fn with_token_max_age(mut self, max_age: Duration) -> Self {
        self.token_max_age = max_age;
        self
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    ///
    /// `SECRET_KEY` is required. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let secret = get(ENV_SECRET_KEY).ok_or(ConfigError::Missing(ENV_SECRET_KEY))?;
        let secret_key = SecretKey::new(secret.into_bytes()).map_err(|e| ConfigError::Invalid {
            key: ENV_SECRET_KEY,
            reason: e.to_string(),
        })?;

        let storage_dir = get(ENV_STORAGE_DIR).unwrap_or_else(|| DEFAULT_STORAGE_DIR.to_string());
        let mut config = Self::new(secret_key, storage_dir);

        if let Some(base_url) = get(ENV_BASE_URL) {
            config = config.with_base_url(base_url);
        }
        if let Some(product_id) = get(ENV_PRODUCT_ID) {
            config = config.with_product_id(product_id.trim());
        }
        if let Some(raw) = get(ENV_TOKEN_MAX_AGE) {
            let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    key: ENV_TOKEN_MAX_AGE,
                    reason: e.to_string(),
                }
            })?;
            config = config.with_token_max_age(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// The storage layout rooted at `storage_dir`.
    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.storage_dir)
    }

    /// Download URL template handed to creators after upload.
    pub fn download_template(&self) -> String {
        format!("{}/download/{{token}}", self.base_url)
    }

    /// Download URL for a specific token.
    pub fn download_url(&self, token: &str) -> String {
        format!("{}/download/{}", self.base_url, token)
    }
}

fn normalize_base_url(base_url: String) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}
