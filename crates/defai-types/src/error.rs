//! Error types shared across the console
//!
//! Every failure is recovered at the UI boundary and shown inline; none is
//! fatal to the process. Token-verification failure is the one case that
//! cascades into a full local disconnect.

use thiserror::Error;

/// Result type for DeFAI operations
pub type Result<T> = std::result::Result<T, DefaiError>;

/// DeFAI error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefaiError {
    // ========================================================================
    // Wallet Errors
    // ========================================================================

    /// The wallet provider is not installed / not reachable
    #[error("{wallet} wallet not found. Please install it.")]
    ProviderAbsent { wallet: String },

    /// The user declined the connection or signature request
    #[error("User rejected the request")]
    UserRejected,

    /// The provider failed while connecting or signing
    #[error("{0}")]
    Provider(String),

    /// Wallet / chain combination without an implementation
    #[error("{0}")]
    Unsupported(String),

    // ========================================================================
    // Backend Errors
    // ========================================================================

    /// The backend rejected the wallet credentials or the token
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Transport-level failure talking to a remote service
    #[error("Network error: {0}")]
    Network(String),

    // ========================================================================
    // Local Errors
    // ========================================================================

    /// Persisted session storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Malformed JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DefaiError {
    /// Whether this failure must tear down the local session
    pub fn forces_disconnect(&self) -> bool {
        matches!(self, Self::AuthFailed(_))
    }
}

impl From<serde_json::Error> for DefaiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
