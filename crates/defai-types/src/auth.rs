//! Wallet authentication bodies

use serde::{Deserialize, Serialize};

use crate::{Chain, WalletId};

/// Body of `POST /auth/wallet`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAuthRequest {
    pub address: String,
    pub signature: String,
    pub chain: Chain,
    pub message: String,
}

/// Authenticated user as reported by the backend.
///
/// Only the identifying fields are typed; everything else the backend sends
/// is kept in `extra` so it survives a round trip untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Response of `POST /auth/wallet`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletAuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

/// Response of `GET /auth/verify`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub user: Option<AuthUser>,
}

/// Everything a completed wallet flow hands to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletCredentials {
    pub wallet: WalletId,
    pub chain: Chain,
    pub address: String,
    pub signature: String,
    /// The exact message that was signed
    pub message: String,
}

impl WalletCredentials {
    pub fn to_auth_request(&self) -> WalletAuthRequest {
        WalletAuthRequest {
            address: self.address.clone(),
            signature: self.signature.clone(),
            chain: self.chain,
            message: self.message.clone(),
        }
    }
}
