//! Static catalog of supported wallets

use defai_types::{Chain, WalletId};
use serde::Serialize;

/// A wallet the console knows how to present
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletOption {
    pub id: WalletId,
    pub name: &'static str,
    pub icon: &'static str,
    pub chains: &'static [Chain],
    pub download_url: &'static str,
    /// Probed at runtime; always `false` in the static table
    pub installed: bool,
}

impl WalletOption {
    pub fn supports(&self, chain: Chain) -> bool {
        self.chains.contains(&chain)
    }

    pub fn with_installed(mut self, installed: bool) -> Self {
        self.installed = installed;
        self
    }
}

const fn entry(
    id: WalletId,
    name: &'static str,
    icon: &'static str,
    chains: &'static [Chain],
    download_url: &'static str,
) -> WalletOption {
    WalletOption { id, name, icon, chains, download_url, installed: false }
}

/// Every supported wallet, in display order
pub static WALLET_CATALOG: [WalletOption; 6] = [
    entry(
        WalletId::Phantom,
        "Phantom",
        "/wallets/phantom.svg",
        &[Chain::Solana],
        "https://phantom.app/download",
    ),
    entry(
        WalletId::MetaMask,
        "MetaMask",
        "/wallets/metamask.svg",
        &[Chain::Ethereum],
        "https://metamask.io/download/",
    ),
    entry(
        WalletId::Coinbase,
        "Coinbase Wallet",
        "/wallets/coinbase.svg",
        &[Chain::Ethereum, Chain::Solana],
        "https://www.coinbase.com/wallet",
    ),
    entry(
        WalletId::WalletConnect,
        "WalletConnect",
        "/wallets/walletconnect.svg",
        &[Chain::Ethereum],
        "https://walletconnect.com/",
    ),
    entry(
        WalletId::Solflare,
        "Solflare",
        "/wallets/solflare.svg",
        &[Chain::Solana],
        "https://solflare.com/",
    ),
    entry(
        WalletId::Trust,
        "Trust Wallet",
        "/wallets/trust.svg",
        &[Chain::Ethereum, Chain::Solana],
        "https://trustwallet.com/",
    ),
];

/// Catalog entry for `id`
pub fn wallet_option(id: WalletId) -> &'static WalletOption {
    WALLET_CATALOG
        .iter()
        .find(|w| w.id == id)
        .unwrap_or_else(|| unreachable!("every WalletId has a catalog entry"))
}

/// Catalog entries whose chain set contains `chain`
pub fn options_for_chain(chain: Chain) -> impl Iterator<Item = &'static WalletOption> {
    WALLET_CATALOG.iter().filter(move |w| w.supports(chain))
}
