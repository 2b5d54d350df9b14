//! The wallet connect flow
//!
//! ```text
//! Select ──select()──▶ Connecting ──address──▶ Signing ──signature──▶ Success
//!   ▲                      │                      │
//!   └──────── any failure (error string kept) ────┘
//! ```
//!
//! Nothing survives a `reset()`: reopening the flow always starts at
//! `Select` with no error and nothing in flight.

use defai_types::{Chain, WalletCredentials, WalletId};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

use crate::{
    fresh_auth_message, options_for_chain, wallet_option, ProviderRegistry, WalletError,
    WalletOption, WalletResult,
};

/// Position of the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStep {
    Select,
    Connecting,
    Signing,
    Success,
}

/// Observable state of the flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSnapshot {
    pub step: FlowStep,
    pub chain: Chain,
    pub connecting: Option<WalletId>,
    pub error: Option<String>,
    pub connected_address: Option<String>,
}

impl FlowSnapshot {
    fn initial(chain: Chain) -> Self {
        Self {
            step: FlowStep::Select,
            chain,
            connecting: None,
            error: None,
            connected_address: None,
        }
    }
}

/// A wallet that completed the flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedWallet {
    pub option: WalletOption,
    pub credentials: WalletCredentials,
}

/// Result of a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Address obtained and message signed
    Connected(ConnectedWallet),
    /// The wallet is not installed; its install page was opened instead
    InstallRequired { wallet: WalletId, url: String },
    /// Another wallet was already connecting
    Ignored,
}

/// Opens a wallet's install page
pub trait InstallLauncher: Send + Sync {
    fn open(&self, url: &str) -> WalletResult<()>;
}

/// Launcher that only records the URL in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLauncher;

impl InstallLauncher for LogLauncher {
    fn open(&self, url: &str) -> WalletResult<()> {
        tracing::info!(%url, "Wallet not installed, open the install page to continue");
        Ok(())
    }
}

/// Connect flow over a provider registry
pub struct ConnectFlow {
    registry: Arc<ProviderRegistry>,
    launcher: Arc<dyn InstallLauncher>,
    state: Mutex<FlowSnapshot>,
}

impl ConnectFlow {
    pub fn new(registry: Arc<ProviderRegistry>, chain: Chain) -> Self {
        Self::with_launcher(registry, chain, Arc::new(LogLauncher))
    }

    pub fn with_launcher(
        registry: Arc<ProviderRegistry>,
        chain: Chain,
        launcher: Arc<dyn InstallLauncher>,
    ) -> Self {
        Self {
            registry,
            launcher,
            state: Mutex::new(FlowSnapshot::initial(chain)),
        }
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        self.state.lock().clone()
    }

    pub fn step(&self) -> FlowStep {
        self.state.lock().step
    }

    pub fn chain(&self) -> Chain {
        self.state.lock().chain
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn connecting(&self) -> Option<WalletId> {
        self.state.lock().connecting
    }

    pub fn connected_address(&self) -> Option<String> {
        self.state.lock().connected_address.clone()
    }

    /// Switch the selected chain. Ignored while a wallet is connecting.
    pub fn set_chain(&self, chain: Chain) {
        let mut state = self.state.lock();
        if state.connecting.is_none() {
            state.chain = chain;
        }
    }

    /// Back to `Select`, forgetting error, address and in-flight wallet
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let chain = state.chain;
        *state = FlowSnapshot::initial(chain);
    }

    /// `reset` unless a wallet is connecting; returns whether it reset
    pub fn reset_if_idle(&self) -> bool {
        let mut state = self.state.lock();
        if state.connecting.is_some() {
            return false;
        }
        let chain = state.chain;
        *state = FlowSnapshot::initial(chain);
        true
    }

    /// Wallets offered for the selected chain, with their probed install state
    pub fn wallets(&self) -> Vec<WalletOption> {
        let chain = self.chain();
        options_for_chain(chain)
            .map(|w| w.clone().with_installed(self.registry.probe(w.id)))
            .collect()
    }

    /// Wallets that would connect rather than prompt for installation
    pub fn connectable(&self) -> Vec<WalletOption> {
        self.wallets().into_iter().filter(|w| w.installed).collect()
    }

    /// Select a wallet and run it through connect and sign
    pub async fn select(&self, wallet: WalletId) -> WalletResult<FlowOutcome> {
        let option = wallet_option(wallet);
        let chain = {
            let mut state = self.state.lock();
            if let Some(busy) = state.connecting {
                tracing::debug!(%wallet, %busy, "Ignoring selection while another wallet connects");
                return Ok(FlowOutcome::Ignored);
            }
            if !option.supports(state.chain) {
                let msg = format!("{} does not support {}", option.name, state.chain);
                state.error = Some(msg.clone());
                return Err(WalletError::Unsupported(msg));
            }
            if !self.registry.probe(wallet) {
                drop(state);
                self.launcher.open(option.download_url)?;
                return Ok(FlowOutcome::InstallRequired {
                    wallet,
                    url: option.download_url.to_string(),
                });
            }
            state.connecting = Some(wallet);
            state.error = None;
            state.step = FlowStep::Connecting;
            state.chain
        };

        let result = self.run(wallet, chain).await;

        let mut state = self.state.lock();
        state.connecting = None;
        match result {
            Ok(credentials) => {
                tracing::info!(%wallet, %chain, address = %credentials.address, "Wallet connected");
                state.step = FlowStep::Success;
                state.connected_address = Some(credentials.address.clone());
                Ok(FlowOutcome::Connected(ConnectedWallet {
                    option: option.clone().with_installed(true),
                    credentials,
                }))
            }
            Err(e) => {
                tracing::warn!(%wallet, %chain, error = %e, "Wallet connection failed");
                state.step = FlowStep::Select;
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn run(&self, wallet: WalletId, chain: Chain) -> WalletResult<WalletCredentials> {
        if wallet == WalletId::WalletConnect {
            return Err(WalletError::Unsupported(
                "WalletConnect integration coming soon".to_string(),
            ));
        }

        let provider = self
            .registry
            .get(wallet)
            .filter(|p| p.supports(chain))
            .ok_or_else(|| {
                WalletError::Unsupported("This wallet integration is coming soon".to_string())
            })?;

        let address = provider.connect(chain).await?;

        self.state.lock().step = FlowStep::Signing;
        let message = fresh_auth_message(&address);
        let signature = provider.sign_message(chain, &message).await?;

        Ok(WalletCredentials {
            wallet,
            chain,
            address,
            signature,
            message,
        })
    }
}
