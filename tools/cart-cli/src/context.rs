//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::debug;
use turbo_cart_http::HttpCartTransport;
use turbo_cart_sync::SyncEngine;

use crate::config::CliConfig;
use crate::output::Output;

const CONFIG_NAMES: [&str; 3] = ["cart.toml", ".cart.toml", "cart.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Output handler.
    pub output: Output,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config = match config_path {
            Some(path) => CliConfig::load(path)?,
            None => match find_config(&cwd) {
                Some(path) => {
                    output.debug(&format!("Using config {}", path.display()));
                    CliConfig::load(&path.to_string_lossy())?
                }
                None => CliConfig::default(),
            },
        };

        debug!(
            cart_id = %config.cart_id,
            base_url = %config.http.base_url,
            "configuration loaded"
        );
        Ok(Self { config, output })
    }

    /// Engine talking to the configured storefront, hydrated with one fetch.
    pub async fn connect(&self) -> Result<SyncEngine<HttpCartTransport>> {
        let transport = HttpCartTransport::new(self.config.http.clone())
            .context("Failed to build HTTP client")?;
        self.output
            .debug(&format!("Connecting to {}", self.config.http.base_url));

        SyncEngine::connect(
            self.config.cart_id.clone(),
            transport,
            self.config.sync.clone(),
        )
        .await
        .with_context(|| format!("Failed to fetch cart from {}", self.config.http.base_url))
    }
}

/// First config file found in `start` or any parent directory.
fn find_config(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    })
}
