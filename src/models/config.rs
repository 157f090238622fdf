//! Runtime settings loaded from `config/default.yaml` and the environment.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Prefix for environment overrides, e.g. `OFERTAS__INGESTION__DELAY_MS`.
pub const ENV_PREFIX: &str = "OFERTAS";

/// Configuration file stem read by [`Settings::load`].
pub const DEFAULT_CONFIG: &str = "config/default";

/// Top-level application settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    pub ingestion: IngestionSettings,
    pub amazon: AmazonSettings,
    pub dispatch: DispatchSettings,
    pub whatsapp: WhatsAppSettings,
}

/// Scraping and ingestion options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestionSettings {
    /// Pause after every fetched item and every configured URL.
    pub delay_ms: u64,
    pub max_per_listing: usize,
    pub request_timeout_ms: u64,
    pub exclude_per_unit_prices: bool,
    pub urls: Vec<String>,
    pub urls_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AmazonSettings {
    /// Associates tag appended as `tag=` to Amazon affiliate links.
    pub partner_tag: Option<String>,
}

/// Outbound dispatch options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Spacing between consecutive send jobs.
    pub anti_ban_interval_ms: u64,
    pub max_attempts: i32,
    pub backoff_base_ms: u64,
    pub poll_interval_ms: u64,
}

/// Credentials of the Twilio-compatible WhatsApp API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WhatsAppSettings {
    pub api_base: String,
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "ofertas.db".to_string(),
            ingestion: IngestionSettings::default(),
            amazon: AmazonSettings::default(),
            dispatch: DispatchSettings::default(),
            whatsapp: WhatsAppSettings::default(),
        }
    }
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            delay_ms: 2500,
            max_per_listing: 15,
            request_timeout_ms: 20_000,
            exclude_per_unit_prices: true,
            urls: Vec::new(),
            urls_file: None,
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            anti_ban_interval_ms: 6000,
            max_attempts: 3,
            backoff_base_ms: 5000,
            poll_interval_ms: 1000,
        }
    }
}

impl Default for WhatsAppSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.twilio.com/2010-04-01".to_string(),
            account_sid: None,
            auth_token: None,
            from_number: None,
        }
    }
}

impl Settings {
    /// Load settings from `config/default.yaml` (optional), then environment
    /// variables prefixed with `OFERTAS__`. A `.env` file is read first if present.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG)
    }

    /// Load settings from a specific configuration file stem.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        _ = dotenvy::dotenv();
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl IngestionSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl DispatchSettings {
    pub fn anti_ban_interval(&self) -> Duration {
        Duration::from_millis(self.anti_ban_interval_ms)
    }

    /// Retry delay after the `attempts`-th failed delivery (1-based).
    pub fn backoff(&self, attempts: i32) -> Duration {
        let exponent = attempts.saturating_sub(1).clamp(0, 16) as u32;
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << exponent))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl WhatsAppSettings {
    /// Whether every credential needed by the live provider is configured.
    pub fn has_credentials(&self) -> bool {
        [&self.account_sid, &self.auth_token, &self.from_number]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}
