//! DeFAI Wallet - Wallet connection for the agent console
//!
//! This crate provides:
//! - The static catalog of supported wallets, per chain
//! - The `WalletProvider` capability trait and a registry keyed by wallet id
//! - Construction of the timestamped authentication message
//! - The connect flow: `Select → Connecting → Signing → Success`
//! - Local keystore signers (ed25519 for Solana, secp256k1 for Ethereum)
//!
//! # Invariant
//!
//! **Only one wallet connects at a time.** A selection made while another
//! wallet is in flight is ignored, not queued.

pub mod catalog;
pub mod provider;
pub mod message;
pub mod flow;
pub mod keystore;

pub use catalog::*;
pub use provider::*;
pub use message::*;
pub use flow::*;
pub use keystore::*;

use defai_types::DefaiError;
use thiserror::Error;

/// Wallet errors
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("{wallet} wallet not found. Please install it.")]
    ProviderAbsent { wallet: String },

    #[error("User rejected the request")]
    UserRejected,

    #[error("{0}")]
    Provider(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("keystore I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type WalletResult<T> = Result<T, WalletError>;

impl From<WalletError> for DefaiError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::ProviderAbsent { wallet } => DefaiError::ProviderAbsent { wallet },
            WalletError::UserRejected => DefaiError::UserRejected,
            WalletError::Unsupported(msg) => DefaiError::Unsupported(msg),
            WalletError::Io(io) => DefaiError::Storage(io.to_string()),
            other => DefaiError::Provider(other.to_string()),
        }
    }
}
