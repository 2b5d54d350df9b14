//! Session error types

use defai_sdk::SdkError;
use defai_types::DefaiError;
use defai_wallet::WalletError;
use thiserror::Error;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Session error types
#[derive(Debug, Error)]
pub enum SessionError {
    // =========================================================================
    // Upstream Errors
    // =========================================================================
    /// Wallet flow or provider failure
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// Backend call failed
    #[error(transparent)]
    Api(#[from] SdkError),

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Persisted session could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Chain RPC balance query failed
    #[error("Balance query failed: {0}")]
    Balance(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<SessionError> for DefaiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Wallet(err) => err.into(),
            SessionError::Api(err) => err.into(),
            SessionError::Storage(msg) => DefaiError::Storage(msg),
            SessionError::Io(err) => DefaiError::Storage(err.to_string()),
            SessionError::Serialization(err) => DefaiError::Serialization(err.to_string()),
            SessionError::Balance(msg) => DefaiError::Network(msg),
            SessionError::Config(msg) => DefaiError::InvalidInput(msg),
        }
    }
}
