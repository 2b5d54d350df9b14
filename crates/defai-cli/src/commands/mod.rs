//! Command implementations

pub mod agent;
pub mod dashboard;
pub mod wallet;

use anyhow::Context;
use defai_sdk::ApiClient;
use defai_session::SessionContext;
use defai_wallet::Keystore;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CliConfig;

/// Everything a command needs: config, API client and keystore
pub struct Console {
    pub config: CliConfig,
    pub api: ApiClient,
}

impl Console {
    pub fn new(config: CliConfig) -> anyhow::Result<Self> {
        let api = ApiClient::new(config.sdk_config())
            .with_context(|| format!("invalid API URL {:?}", config.api.base_url))?;
        Ok(Self { config, api })
    }

    pub fn keystore(&self) -> Keystore {
        Keystore::new(self.config.keystore_dir())
    }

    /// Session over the keystore wallets, not yet restored. Commands exit
    /// right away, so the balance is only fetched when one asks for it.
    pub fn session(&self) -> anyhow::Result<SessionContext> {
        let registry = self
            .keystore()
            .registry()
            .context("failed to load wallet keystore")?;
        Ok(SessionContext::builder(self.api.clone(), Arc::new(registry))
            .config(self.config.session.clone())
            .background_refresh(false)
            .build())
    }

    /// Session with any persisted login restored, so API calls carry the token
    pub async fn restored_session(&self) -> anyhow::Result<SessionContext> {
        let session = self.session()?;
        match session.restore().await {
            Ok(true) => tracing::debug!("Using restored wallet session"),
            Ok(false) => tracing::debug!("Continuing without a wallet session"),
            Err(e) => tracing::warn!(error = %e, "Could not restore wallet session"),
        }
        Ok(session)
    }
}

/// Spinner shown while a request is in flight
pub fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
