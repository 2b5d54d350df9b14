//! Wallet provider capability and registry
//!
//! A provider is whatever can hand out an address and sign a message for a
//! wallet id. The registry is the only place provider identity is resolved;
//! callers never branch on concrete wallet types.

use async_trait::async_trait;
use defai_types::{Chain, WalletId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::WalletResult;

/// Capability interface over a concrete wallet
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Wallet this provider implements
    fn id(&self) -> WalletId;

    /// Runtime feature probe: is the wallet usable right now?
    fn is_installed(&self) -> bool {
        true
    }

    /// Whether this provider can operate on `chain`
    fn supports(&self, chain: Chain) -> bool;

    /// Request the account address on `chain`
    async fn connect(&self, chain: Chain) -> WalletResult<String>;

    /// Sign a UTF-8 message on `chain`, returning the chain's signature encoding
    async fn sign_message(&self, chain: Chain, message: &str) -> WalletResult<String>;

    /// Drop any provider-side connection
    async fn disconnect(&self) -> WalletResult<()> {
        Ok(())
    }
}

/// Lookup table of providers keyed by wallet id
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<WalletId, Arc<dyn WalletProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any previous one for the same id
    pub fn register(&mut self, provider: Arc<dyn WalletProvider>) {
        tracing::debug!(wallet = %provider.id(), "Registering wallet provider");
        self.providers.insert(provider.id(), provider);
    }

    /// Builder-style `register`
    pub fn with(mut self, provider: Arc<dyn WalletProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn get(&self, id: WalletId) -> Option<Arc<dyn WalletProvider>> {
        self.providers.get(&id).cloned()
    }

    /// Installed-flag probe. WalletConnect is always available.
    pub fn probe(&self, id: WalletId) -> bool {
        if id == WalletId::WalletConnect {
            return true;
        }
        self.providers.get(&id).map(|p| p.is_installed()).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Registered wallet ids, sorted
    pub fn ids(&self) -> Vec<WalletId> {
        let mut ids: Vec<WalletId> = self.providers.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.ids())
            .finish()
    }
}
