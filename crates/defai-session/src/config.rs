//! Session configuration

use defai_types::Chain;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::{SessionError, SessionResult};

/// Directory holding the session file and wallet keystore
pub fn default_data_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".defai")
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lifetime of every persisted entry
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// Balance refresh period
    #[serde(with = "humantime_serde")]
    pub balance_interval: Duration,
    /// Session file; `<data dir>/session.json` when unset
    pub storage_path: Option<PathBuf>,
    /// Chain the connect flow starts on
    pub default_chain: Chain,
    pub solana_rpc_url: String,
    pub ethereum_rpc_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
            balance_interval: Duration::from_secs(30),
            storage_path: None,
            default_chain: Chain::Solana,
            solana_rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            ethereum_rpc_url: "https://cloudflare-eth.com".to_string(),
        }
    }
}

impl SessionConfig {
    /// Reject durations the session cannot run with
    pub fn validate(&self) -> SessionResult<()> {
        if self.balance_interval.is_zero() {
            return Err(SessionError::Config("session.balance_interval must be non-zero".into()));
        }
        if self.ttl.is_zero() {
            return Err(SessionError::Config("session.ttl must be non-zero".into()));
        }
        crate::storage::expiry(self.ttl)?;
        Ok(())
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage_path
            .clone()
            .unwrap_or_else(|| default_data_dir().join("session.json"))
    }
}
