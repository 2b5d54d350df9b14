//! Session / authentication context
//!
//! One `SessionContext` per client. Clones share the same session. It owns:
//! - the wallet connect flow for the preferred chain
//! - the bearer token installed on the API client
//! - the persisted session entries
//! - the balance refresher, alive only while a wallet is connected
//!
//! Every change of session identity bumps a generation counter. Balance
//! results are applied only when the generation they started under is still
//! current, so a slow lookup never writes into a newer session.

use chrono::{DateTime, Utc};
use defai_sdk::ApiClient;
use defai_types::{AuthUser, Chain, WalletCredentials, WalletId};
use defai_wallet::{ConnectFlow, FlowOutcome, InstallLauncher, LogLauncher, ProviderRegistry};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::storage::expiry;
use crate::{
    BalanceRefresher, ChainBalances, FileStorage, PersistedSession, SessionConfig, SessionResult,
    SessionStorage,
};

/// Observable session state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub address: Option<String>,
    pub chain: Option<Chain>,
    pub wallet_type: Option<WalletId>,
    pub balance: f64,
    pub token: Option<String>,
    pub user: Option<AuthUser>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A token is held and has not expired
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.expires_at.map_or(false, |exp| Utc::now() < exp)
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }
}

/// Result of `SessionContext::connect`
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
    /// Wallet signed and the backend issued a token
    Authenticated(Session),
    /// Wallet signed but the backend refused the credentials
    Rejected,
    /// The wallet is not installed
    InstallRequired { wallet: WalletId, url: String },
    /// Another wallet was already connecting
    Ignored,
}

struct Inner {
    api: ApiClient,
    storage: Arc<dyn SessionStorage>,
    registry: Arc<ProviderRegistry>,
    balances: ChainBalances,
    config: SessionConfig,
    flow: ConnectFlow,
    state: RwLock<Session>,
    generation: AtomicU64,
    refresher: Mutex<Option<BalanceRefresher>>,
    background_refresh: bool,
    // serializes authenticate / disconnect / restore
    transition: tokio::sync::Mutex<()>,
}

/// Shared session handle
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("session", &*self.inner.state.read())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

/// Builder for `SessionContext`
pub struct SessionBuilder {
    api: ApiClient,
    registry: Arc<ProviderRegistry>,
    config: SessionConfig,
    storage: Option<Arc<dyn SessionStorage>>,
    balances: Option<ChainBalances>,
    launcher: Arc<dyn InstallLauncher>,
    background_refresh: bool,
}

impl SessionBuilder {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn storage(mut self, storage: Arc<dyn SessionStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn balances(mut self, balances: ChainBalances) -> Self {
        self.balances = Some(balances);
        self
    }

    pub fn launcher(mut self, launcher: Arc<dyn InstallLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Whether a connected session refreshes its balance on an interval.
    /// Off for short-lived callers, which call `refresh_balance` themselves.
    pub fn background_refresh(mut self, enabled: bool) -> Self {
        self.background_refresh = enabled;
        self
    }

    /// Defaults: file storage at the configured path, public chain RPC
    pub fn build(self) -> SessionContext {
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(FileStorage::new(self.config.storage_path())));
        let balances = self
            .balances
            .unwrap_or_else(|| ChainBalances::from_config(&self.config));
        let flow = ConnectFlow::with_launcher(
            self.registry.clone(),
            self.config.default_chain,
            self.launcher,
        );

        SessionContext {
            inner: Arc::new(Inner {
                api: self.api,
                storage,
                registry: self.registry,
                balances,
                config: self.config,
                flow,
                state: RwLock::new(Session::default()),
                generation: AtomicU64::new(0),
                refresher: Mutex::new(None),
                background_refresh: self.background_refresh,
                transition: tokio::sync::Mutex::new(()),
            }),
        }
    }
}

impl SessionContext {
    pub fn builder(api: ApiClient, registry: Arc<ProviderRegistry>) -> SessionBuilder {
        SessionBuilder {
            api,
            registry,
            config: SessionConfig::default(),
            storage: None,
            balances: None,
            launcher: Arc::new(LogLauncher),
            background_refresh: true,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Copy of the current session
    pub fn snapshot(&self) -> Session {
        self.inner.state.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.read().is_authenticated()
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// The wallet connect flow, for rendering wallet choices and progress
    pub fn flow(&self) -> &ConnectFlow {
        &self.inner.flow
    }

    /// Chain the next `connect` will use
    pub fn preferred_chain(&self) -> Chain {
        self.inner.flow.chain()
    }

    pub fn set_preferred_chain(&self, chain: Chain) {
        self.inner.flow.set_chain(chain);
    }

    /// Session generation; changes whenever the session is replaced or cleared
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Whether the balance refresher is running
    pub fn is_refreshing(&self) -> bool {
        self.inner
            .refresher
            .lock()
            .as_ref()
            .map_or(false, |r| !r.is_finished())
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Run the wallet flow for `wallet` on the preferred chain, then authenticate
    pub async fn connect(&self, wallet: WalletId) -> SessionResult<ConnectOutcome> {
        self.inner.flow.reset_if_idle();
        match self.inner.flow.select(wallet).await? {
            FlowOutcome::Connected(connected) => {
                if self.authenticate(connected.credentials).await? {
                    Ok(ConnectOutcome::Authenticated(self.snapshot()))
                } else {
                    Ok(ConnectOutcome::Rejected)
                }
            }
            FlowOutcome::InstallRequired { wallet, url } => {
                Ok(ConnectOutcome::InstallRequired { wallet, url })
            }
            FlowOutcome::Ignored => Ok(ConnectOutcome::Ignored),
        }
    }

    /// Exchange signed credentials for a session.
    ///
    /// `Ok(true)`: all four entries persisted, token installed, refresher
    /// running. `Ok(false)`: the backend refused. Either `Ok(false)` or an
    /// error leaves nothing persisted and the session cleared.
    pub async fn authenticate(&self, credentials: WalletCredentials) -> SessionResult<bool> {
        let _transition = self.inner.transition.lock().await;
        let inner = &self.inner;

        let response = match inner.api.authenticate_wallet(&credentials.to_auth_request()).await {
            Ok(response) => response,
            Err(e) if e.status().is_some() => {
                tracing::warn!(wallet = %credentials.wallet, error = %e, "Backend rejected wallet credentials");
                self.discard_locked().await;
                return Ok(false);
            }
            Err(e) => {
                self.discard_locked().await;
                return Err(e.into());
            }
        };

        let expires_at = match expiry(inner.config.ttl) {
            Ok(expires_at) => expires_at,
            Err(e) => {
                self.discard_locked().await;
                return Err(e);
            }
        };

        if let Err(e) = PersistedSession::save(
            inner.storage.as_ref(),
            &response.token,
            &credentials.address,
            credentials.chain,
            credentials.wallet,
            inner.config.ttl,
        ) {
            tracing::error!(error = %e, "Failed to persist session");
            self.discard_locked().await;
            return Err(e);
        }

        inner.api.set_token(response.token.clone());
        {
            let mut state = inner.state.write();
            inner.generation.fetch_add(1, Ordering::SeqCst);
            *state = Session {
                address: Some(credentials.address.clone()),
                chain: Some(credentials.chain),
                wallet_type: Some(credentials.wallet),
                balance: 0.0,
                token: Some(response.token),
                user: response.user,
                expires_at: Some(expires_at),
            };
        }
        self.start_refresher();

        tracing::info!(
            wallet = %credentials.wallet,
            chain = %credentials.chain,
            address = %credentials.address,
            "Wallet authenticated"
        );
        Ok(true)
    }

    /// Clear everything. Safe to call repeatedly.
    ///
    /// In-memory state is always cleared; an error means the persisted
    /// entries could not be removed.
    pub async fn disconnect(&self) -> SessionResult<()> {
        let _transition = self.inner.transition.lock().await;
        self.reset_locked().await
    }

    /// Reload a persisted session and check it with the backend.
    ///
    /// Returns `Ok(true)` when a verified session is now active. Any
    /// verification failure clears the session before returning.
    pub async fn restore(&self) -> SessionResult<bool> {
        let _transition = self.inner.transition.lock().await;
        let inner = &self.inner;

        let Some(persisted) = PersistedSession::load(inner.storage.as_ref())? else {
            tracing::debug!("No persisted session to restore");
            return Ok(false);
        };

        inner.api.set_token(persisted.token.clone());
        {
            let mut state = inner.state.write();
            inner.generation.fetch_add(1, Ordering::SeqCst);
            *state = Session {
                address: Some(persisted.address.clone()),
                chain: Some(persisted.chain),
                wallet_type: persisted.wallet_type,
                balance: 0.0,
                token: Some(persisted.token.clone()),
                user: None,
                expires_at: Some(persisted.expires_at),
            };
        }

        match inner.api.verify_token(&persisted.token).await {
            Ok(verified) => {
                inner.state.write().user = verified.user;
                self.start_refresher();
                tracing::info!(address = %persisted.address, chain = %persisted.chain, "Session restored");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Persisted session failed verification, disconnecting");
                self.discard_locked().await;
                Ok(false)
            }
        }
    }

    /// Query the connected address's native balance.
    ///
    /// `Ok(None)` when not connected, or when the session changed while the
    /// query was in flight and the result was discarded.
    pub async fn refresh_balance(&self) -> SessionResult<Option<f64>> {
        let (address, chain, generation) = {
            let state = self.inner.state.read();
            match (&state.address, state.chain) {
                (Some(address), Some(chain)) => (address.clone(), chain, self.generation()),
                _ => return Ok(None),
            }
        };

        let balance = self.inner.balances.for_chain(chain).balance(&address).await?;

        let mut state = self.inner.state.write();
        if self.generation() != generation {
            tracing::debug!(%address, "Discarding balance from a previous session");
            return Ok(None);
        }
        state.balance = balance;
        tracing::debug!(%address, %chain, balance, "Balance updated");
        Ok(Some(balance))
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn start_refresher(&self) {
        if !self.inner.background_refresh {
            return;
        }
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let refresher = BalanceRefresher::spawn(self.inner.config.balance_interval, move || {
            let weak = weak.clone();
            async move {
                let Some(inner) = weak.upgrade() else {
                    return false;
                };
                let ctx = SessionContext { inner };
                if let Err(e) = ctx.refresh_balance().await {
                    tracing::warn!(error = %e, "Balance refresh failed");
                }
                true
            }
        });
        if let Some(previous) = self.inner.refresher.lock().replace(refresher) {
            previous.stop();
        }
    }

    /// `reset_locked` on a failure path, where the clear error is only logged
    async fn discard_locked(&self) {
        if let Err(e) = self.reset_locked().await {
            tracing::error!(error = %e, "Failed to clear persisted session");
        }
    }

    /// Caller holds the transition lock. Everything is reset even when the
    /// persisted entries cannot be removed; that error is returned last.
    async fn reset_locked(&self) -> SessionResult<()> {
        let inner = &self.inner;

        if let Some(refresher) = inner.refresher.lock().take() {
            refresher.stop();
        }
        inner.api.clear_token();
        let cleared = PersistedSession::clear(inner.storage.as_ref());

        let previous = {
            let mut state = inner.state.write();
            inner.generation.fetch_add(1, Ordering::SeqCst);
            std::mem::take(&mut *state)
        };

        inner.flow.reset_if_idle();

        if let Some(wallet) = previous.wallet_type {
            if let Some(provider) = inner.registry.get(wallet) {
                if let Err(e) = provider.disconnect().await {
                    tracing::warn!(%wallet, error = %e, "Wallet provider disconnect failed");
                }
            }
            tracing::info!(%wallet, "Wallet disconnected");
        }
        cleared
    }
}
