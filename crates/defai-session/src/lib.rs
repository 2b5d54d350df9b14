//! DeFAI Session Layer
//!
//! Turns a connected wallet into an authenticated backend session and keeps
//! it alive across restarts:
//!
//! - **Authentication**: signed wallet credentials are exchanged for a bearer
//!   token which is installed on the shared [`defai_sdk::ApiClient`]
//! - **Persistence**: token, address, chain and wallet type are stored
//!   together with a fixed TTL, and cleared together
//! - **Restore**: a persisted session is reloaded and verified with the
//!   backend before it is trusted
//! - **Balance**: the connected address's native balance is refreshed on a
//!   fixed interval while the session lasts

pub mod balance;
pub mod config;
pub mod context;
pub mod error;
pub mod refresher;
pub mod storage;

pub use balance::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use refresher::*;
pub use storage::*;
