//! Persisted session entries
//!
//! A session is four string entries, each with an absolute expiry. They are
//! always written together and removed together; a reader that finds any of
//! the required ones missing or expired treats the session as absent.

use chrono::{DateTime, Utc};
use defai_types::{Chain, WalletId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{SessionError, SessionResult};

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const WALLET_ADDRESS_KEY: &str = "wallet_address";
pub const WALLET_CHAIN_KEY: &str = "wallet_chain";
pub const WALLET_TYPE_KEY: &str = "wallet_type";

/// Every key a session owns
pub const SESSION_KEYS: [&str; 4] = [
    AUTH_TOKEN_KEY,
    WALLET_ADDRESS_KEY,
    WALLET_CHAIN_KEY,
    WALLET_TYPE_KEY,
];

/// A stored value and the moment it stops being valid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Key/value store with per-entry expiry
pub trait SessionStorage: Send + Sync {
    /// Unexpired entry for `key`
    fn get(&self, key: &str) -> SessionResult<Option<StoredEntry>>;

    /// Write all `entries` in one step, each expiring after `ttl`
    fn set_many(&self, entries: &[(&str, String)], ttl: Duration) -> SessionResult<()>;

    /// Remove all `keys` in one step
    fn remove_many(&self, keys: &[&str]) -> SessionResult<()>;
}

/// `now + ttl`, or a config error when the sum is not representable
pub(crate) fn expiry(ttl: Duration) -> SessionResult<DateTime<Utc>> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| SessionError::Config(format!("session ttl {ttl:?} is out of range")))
}

// ============================================================================
// In-memory storage
// ============================================================================

/// Storage that lives as long as the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, expired ones included
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> SessionResult<Option<StoredEntry>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(Utc::now()) => {
                entries.remove(key);
                Ok(None)
            }
            other => Ok(other.cloned()),
        }
    }

    fn set_many(&self, new: &[(&str, String)], ttl: Duration) -> SessionResult<()> {
        let expires_at = expiry(ttl)?;
        let mut entries = self.entries.lock();
        for (key, value) in new {
            entries.insert(
                key.to_string(),
                StoredEntry { value: value.clone(), expires_at },
            );
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> SessionResult<()> {
        let mut entries = self.entries.lock();
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

// ============================================================================
// File storage
// ============================================================================

/// JSON file storage, replaced atomically on every write
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// An unparsable file reads as empty, so the next write replaces it
    fn read_all(&self) -> SessionResult<HashMap<String, StoredEntry>> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => Ok(entries),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                    Ok(HashMap::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &HashMap<String, StoredEntry>) -> SessionResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> SessionResult<Option<StoredEntry>> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        match entries.get(key) {
            Some(entry) if entry.is_expired(Utc::now()) => {
                entries.remove(key);
                self.write_all(&entries)?;
                Ok(None)
            }
            other => Ok(other.cloned()),
        }
    }

    fn set_many(&self, new: &[(&str, String)], ttl: Duration) -> SessionResult<()> {
        let expires_at = expiry(ttl)?;
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        for (key, value) in new {
            entries.insert(
                key.to_string(),
                StoredEntry { value: value.clone(), expires_at },
            );
        }
        self.write_all(&entries)
    }

    fn remove_many(&self, keys: &[&str]) -> SessionResult<()> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        for key in keys {
            entries.remove(*key);
        }
        if !entries.is_empty() {
            return self.write_all(&entries);
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Session record
// ============================================================================

/// The four persisted session fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSession {
    pub token: String,
    pub address: String,
    pub chain: Chain,
    /// Older session files may lack this entry
    pub wallet_type: Option<WalletId>,
    pub expires_at: DateTime<Utc>,
}

impl PersistedSession {
    /// Read the session, `None` unless token, address and chain are all live
    pub fn load(storage: &dyn SessionStorage) -> SessionResult<Option<Self>> {
        let Some(token) = storage.get(AUTH_TOKEN_KEY)? else {
            return Ok(None);
        };
        let Some(address) = storage.get(WALLET_ADDRESS_KEY)? else {
            return Ok(None);
        };
        let Some(chain) = storage.get(WALLET_CHAIN_KEY)? else {
            return Ok(None);
        };
        let chain: Chain = match chain.value.parse() {
            Ok(chain) => chain,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring persisted session with unknown chain");
                return Ok(None);
            }
        };
        let wallet_type = storage
            .get(WALLET_TYPE_KEY)?
            .and_then(|entry| entry.value.parse().ok());

        Ok(Some(Self {
            token: token.value,
            address: address.value,
            chain,
            wallet_type,
            expires_at: token.expires_at,
        }))
    }

    /// Write all four entries together
    pub fn save(
        storage: &dyn SessionStorage,
        token: &str,
        address: &str,
        chain: Chain,
        wallet_type: WalletId,
        ttl: Duration,
    ) -> SessionResult<()> {
        storage.set_many(
            &[
                (AUTH_TOKEN_KEY, token.to_string()),
                (WALLET_ADDRESS_KEY, address.to_string()),
                (WALLET_CHAIN_KEY, chain.as_str().to_string()),
                (WALLET_TYPE_KEY, wallet_type.as_str().to_string()),
            ],
            ttl,
        )
    }

    /// Remove all four entries together
    pub fn clear(storage: &dyn SessionStorage) -> SessionResult<()> {
        storage.remove_many(&SESSION_KEYS)
    }
}
