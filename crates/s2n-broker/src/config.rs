//! Broker configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::envelope::ProviderMeta;
use crate::provider::ProviderCode;

// ============================================================================
// Broker Configuration Constants
// ============================================================================

/// Default provider code of the aggregate envelope.
pub const DEFAULT_BROKER_CODE: &str = "specifynetwork";

/// Default display label of the aggregate envelope.
pub const DEFAULT_BROKER_LABEL: &str = "Specify Network";

/// Default badge endpoint used to build provider icon URLs.
pub const DEFAULT_ICON_API_URL: &str = "https://broker.spcoco.org/api/v1/badge";

/// Default per-provider fetch timeout in seconds.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Provider paths run concurrently by default.
pub const DEFAULT_PARALLEL: bool = true;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub code: String,
    pub label: String,
    pub icon_api_url: String,
    pub provider_timeout_secs: u64,
    pub parallel: bool,
}

impl BrokerConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = BrokerConfig {
            code: std::env::var("S2N_BROKER_CODE").unwrap_or_else(|_| DEFAULT_BROKER_CODE.to_string()),
            label: std::env::var("S2N_BROKER_LABEL")
                .unwrap_or_else(|_| DEFAULT_BROKER_LABEL.to_string()),
            icon_api_url: std::env::var("S2N_ICON_API_URL")
                .unwrap_or_else(|_| DEFAULT_ICON_API_URL.to_string()),
            provider_timeout_secs: env_parse("S2N_PROVIDER_TIMEOUT_SECS", DEFAULT_PROVIDER_TIMEOUT_SECS)?,
            parallel: env_parse("S2N_PARALLEL", DEFAULT_PARALLEL)?,
        };

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.code.trim().is_empty() {
            anyhow::bail!("Broker code cannot be empty");
        }

        if self.provider_timeout_secs == 0 {
            anyhow::bail!("Provider timeout must be greater than 0 seconds");
        }

        if self.icon_api_url.is_empty() {
            tracing::warn!("No icon API configured - envelopes will carry no icon URLs");
        }

        Ok(())
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Identity of the broker itself, used on aggregate envelopes
    pub fn broker_meta(&self) -> ProviderMeta {
        ProviderMeta::new(self.code.clone(), self.label.clone())
    }

    pub fn icon_url(&self, provider: ProviderCode) -> Option<String> {
        if self.icon_api_url.is_empty() {
            return None;
        }
        Some(provider.descriptor().icon_url(&self.icon_api_url))
    }

    /// Metadata block for one provider's envelope
    pub fn provider_meta(&self, provider: ProviderCode) -> ProviderMeta {
        let mut meta = ProviderMeta::new(provider.as_str(), provider.descriptor().label);
        meta.icon_url = self.icon_url(provider);
        meta
    }
}

/// Parsed value of `var`, `default` when unset
fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(var) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => Ok(value),
            Err(_) => anyhow::bail!("Invalid value '{}' for {}", raw, var),
        },
        Err(_) => Ok(default),
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            code: DEFAULT_BROKER_CODE.to_string(),
            label: DEFAULT_BROKER_LABEL.to_string(),
            icon_api_url: DEFAULT_ICON_API_URL.to_string(),
            provider_timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
            parallel: DEFAULT_PARALLEL,
        }
    }
}
