//! Chain and wallet identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DefaiError;

/// Chains a wallet can authenticate on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Solana,
    Ethereum,
}

impl Chain {
    /// All supported chains, in display order
    pub const ALL: [Chain; 2] = [Chain::Solana, Chain::Ethereum];

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solana => "solana",
            Self::Ethereum => "ethereum",
        }
    }

    /// Native token symbol used when displaying balances
    pub fn native_symbol(&self) -> &'static str {
        match self {
            Self::Solana => "SOL",
            Self::Ethereum => "ETH",
        }
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::Solana
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = DefaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solana" | "sol" => Ok(Self::Solana),
            "ethereum" | "eth" => Ok(Self::Ethereum),
            other => Err(DefaiError::InvalidInput(format!("unknown chain: {other}"))),
        }
    }
}

/// Identifier of a supported wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletId {
    Phantom,
    MetaMask,
    Coinbase,
    WalletConnect,
    Solflare,
    Trust,
}

impl WalletId {
    /// Lowercase identifier, as persisted in `wallet_type`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phantom => "phantom",
            Self::MetaMask => "metamask",
            Self::Coinbase => "coinbase",
            Self::WalletConnect => "walletconnect",
            Self::Solflare => "solflare",
            Self::Trust => "trust",
        }
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WalletId {
    type Err = DefaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phantom" => Ok(Self::Phantom),
            "metamask" => Ok(Self::MetaMask),
            "coinbase" => Ok(Self::Coinbase),
            "walletconnect" => Ok(Self::WalletConnect),
            "solflare" => Ok(Self::Solflare),
            "trust" => Ok(Self::Trust),
            other => Err(DefaiError::InvalidInput(format!("unknown wallet: {other}"))),
        }
    }
}
