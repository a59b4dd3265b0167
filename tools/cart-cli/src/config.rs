//! CLI configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use turbo_cart_http::HttpTransportConfig;
use turbo_cart_sync::SyncConfig;

/// CLI configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Identifier used in logs for the cart this CLI mirrors.
    #[serde(default = "default_cart_id")]
    pub cart_id: String,

    /// Engine configuration.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Storefront connection.
    #[serde(default)]
    pub http: HttpTransportConfig,
}

fn default_cart_id() -> String {
    "cli".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            cart_id: default_cart_id(),
            sync: SyncConfig::default(),
            http: HttpTransportConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::parse(path, &content)
    }

    fn parse(path: &str, content: &str) -> Result<Self> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }
}
