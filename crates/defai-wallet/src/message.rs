//! Authentication message construction

/// First line of every authentication message
pub const AUTH_MESSAGE_HEADER: &str = "Sign this message to authenticate with DeFAI";

/// Build the message a wallet signs to prove address ownership.
///
/// The timestamp is unix milliseconds and makes every message unique.
pub fn auth_message(address: &str, timestamp_ms: i64) -> String {
    format!("{AUTH_MESSAGE_HEADER}\nTimestamp: {timestamp_ms}\nAddress: {address}")
}

/// `auth_message` stamped with the current time
pub fn fresh_auth_message(address: &str) -> String {
    auth_message(address, chrono::Utc::now().timestamp_millis())
}
