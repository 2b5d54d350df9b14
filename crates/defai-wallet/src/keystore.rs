//! Keystore wallets: local signers standing in for browser extensions.
//!
//! Each keystore wallet holds a **dual key** derived from one 32-byte seed:
//! - `ed25519` keypair: Solana address (base58 public key), base58 signatures
//! - `secp256k1` keypair: Ethereum address (keccak256 of uncompressed pubkey
//!   tail), EIP-191 `personal_sign` signatures as `0x` + hex(r || s || v)
//!
//! Seeds live in `<dir>/<wallet id>.key` as hex. A wallet counts as installed
//! exactly when its key file exists.

use async_trait::async_trait;
use defai_types::{Chain, WalletId};
use ed25519_dalek::{Signer, SigningKey};
use k256::ecdsa::SigningKey as EcdsaSigningKey;
use rand::RngCore;
use sha3::{Digest, Keccak256};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{wallet_option, ProviderRegistry, WalletError, WalletProvider, WalletResult};

/// EIP-191 digest of a `personal_sign` message
pub fn personal_sign_digest(message: &[u8]) -> Keccak256 {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    Keccak256::new_with_prefix(prefix.as_bytes()).chain_update(message)
}

/// Ethereum address of a secp256k1 key, `0x`-prefixed lowercase hex
pub fn evm_address(key: &k256::ecdsa::VerifyingKey) -> String {
    let encoded = key.to_encoded_point(false);
    // bytes[0] == 0x04 (uncompressed prefix)
    let hash = Keccak256::digest(&encoded.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// A wallet backed by local key material
pub struct KeystoreWallet {
    id: WalletId,
    ed25519_sk: SigningKey,
    ecdsa_sk: EcdsaSigningKey,
}

impl KeystoreWallet {
    /// Derive both keys from a 32-byte seed
    pub fn from_seed(id: WalletId, seed: &[u8; 32]) -> WalletResult<Self> {
        let ed_seed = blake3::derive_key("defai keystore ed25519 key", seed);
        let ecdsa_seed = blake3::derive_key("defai keystore secp256k1 key", seed);

        let ed25519_sk = SigningKey::from_bytes(&ed_seed);
        let ecdsa_sk = EcdsaSigningKey::from_bytes((&ecdsa_seed).into())
            .map_err(|e| WalletError::InvalidKey(e.to_string()))?;

        Ok(Self { id, ed25519_sk, ecdsa_sk })
    }

    /// Solana address (base58 ed25519 public key)
    pub fn solana_address(&self) -> String {
        bs58::encode(self.ed25519_sk.verifying_key().as_bytes()).into_string()
    }

    /// Ethereum address
    pub fn evm_address(&self) -> String {
        evm_address(self.ecdsa_sk.verifying_key())
    }

    pub fn address(&self, chain: Chain) -> String {
        match chain {
            Chain::Solana => self.solana_address(),
            Chain::Ethereum => self.evm_address(),
        }
    }

    fn sign_solana(&self, message: &[u8]) -> String {
        let sig = self.ed25519_sk.sign(message);
        bs58::encode(sig.to_bytes()).into_string()
    }

    fn sign_ethereum(&self, message: &[u8]) -> WalletResult<String> {
        let (sig, recovery) = self
            .ecdsa_sk
            .sign_digest_recoverable(personal_sign_digest(message))
            .map_err(|e| WalletError::SigningFailed(e.to_string()))?;
        let mut bytes = sig.to_bytes().to_vec();
        bytes.push(recovery.to_byte() + 27);
        Ok(format!("0x{}", hex::encode(bytes)))
    }
}

impl std::fmt::Debug for KeystoreWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystoreWallet")
            .field("id", &self.id)
            .field("solana_address", &self.solana_address())
            .field("evm_address", &self.evm_address())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WalletProvider for KeystoreWallet {
    fn id(&self) -> WalletId {
        self.id
    }

    fn supports(&self, chain: Chain) -> bool {
        wallet_option(self.id).supports(chain)
    }

    async fn connect(&self, chain: Chain) -> WalletResult<String> {
        if !self.supports(chain) {
            return Err(WalletError::Unsupported(format!(
                "{} does not support {chain}",
                wallet_option(self.id).name
            )));
        }
        Ok(self.address(chain))
    }

    async fn sign_message(&self, chain: Chain, message: &str) -> WalletResult<String> {
        match chain {
            Chain::Solana => Ok(self.sign_solana(message.as_bytes())),
            Chain::Ethereum => self.sign_ethereum(message.as_bytes()),
        }
    }

    async fn disconnect(&self) -> WalletResult<()> {
        tracing::debug!(wallet = %self.id, "Keystore wallet disconnected");
        Ok(())
    }
}

/// Directory of wallet seeds
#[derive(Debug, Clone)]
pub struct Keystore {
    dir: PathBuf,
}

impl Keystore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, id: WalletId) -> PathBuf {
        self.dir.join(format!("{}.key", id.as_str()))
    }

    pub fn contains(&self, id: WalletId) -> bool {
        self.key_path(id).is_file()
    }

    /// Load the wallet for `id`, or `None` when no key file exists
    pub fn load(&self, id: WalletId) -> WalletResult<Option<KeystoreWallet>> {
        let path = self.key_path(id);
        if !path.is_file() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        let bytes = hex::decode(raw.trim())
            .map_err(|e| WalletError::InvalidKey(format!("{}: {e}", path.display())))?;
        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            WalletError::InvalidKey(format!("{}: seed must be 32 bytes", path.display()))
        })?;
        KeystoreWallet::from_seed(id, &seed).map(Some)
    }

    /// Create a fresh seed for `id`. Refuses to overwrite an existing key.
    pub fn generate(&self, id: WalletId) -> WalletResult<KeystoreWallet> {
        let path = self.key_path(id);
        if path.exists() {
            return Err(WalletError::InvalidKey(format!(
                "{} already exists",
                path.display()
            )));
        }
        std::fs::create_dir_all(&self.dir)?;

        let mut seed = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        std::fs::write(&path, hex::encode(seed))?;
        tracing::info!(wallet = %id, path = %path.display(), "Generated keystore wallet");

        KeystoreWallet::from_seed(id, &seed)
    }

    /// Registry holding every wallet that has a key file
    pub fn registry(&self) -> WalletResult<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();
        for option in crate::WALLET_CATALOG.iter() {
            if let Some(wallet) = self.load(option.id)? {
                registry.register(Arc::new(wallet));
            }
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier;
    use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

    fn wallet(id: WalletId) -> KeystoreWallet {
        KeystoreWallet::from_seed(id, &[7u8; 32]).unwrap()
    }

    #[test]
    fn evm_address_is_0x_prefixed() {
        let addr = wallet(WalletId::MetaMask).evm_address();
        assert!(addr.starts_with("0x"));
        assert_eq!(addr.len(), 42);
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = wallet(WalletId::Phantom);
        let b = wallet(WalletId::Phantom);
        assert_eq!(a.solana_address(), b.solana_address());
        assert_eq!(a.evm_address(), b.evm_address());
    }

    #[tokio::test]
    async fn solana_signature_verifies() {
        let w = wallet(WalletId::Phantom);
        let sig_b58 = w.sign_message(Chain::Solana, "hello").await.unwrap();
        let sig_bytes = bs58::decode(&sig_b58).into_vec().unwrap();
        let sig = ed25519_dalek::Signature::from_slice(&sig_bytes).unwrap();
        w.ed25519_sk.verifying_key().verify(b"hello", &sig).unwrap();
    }

    #[tokio::test]
    async fn ethereum_signature_recovers_address() {
        let w = wallet(WalletId::MetaMask);
        let sig_hex = w.sign_message(Chain::Ethereum, "hello").await.unwrap();
        let bytes = hex::decode(sig_hex.trim_start_matches("0x")).unwrap();
        assert_eq!(bytes.len(), 65);

        let sig = Signature::from_slice(&bytes[..64]).unwrap();
        let recid = RecoveryId::from_byte(bytes[64] - 27).unwrap();
        let recovered =
            VerifyingKey::recover_from_digest(personal_sign_digest(b"hello"), &sig, recid).unwrap();
        assert_eq!(evm_address(&recovered), w.evm_address());
    }

    #[tokio::test]
    async fn connect_rejects_unsupported_chain() {
        let w = wallet(WalletId::Phantom);
        assert!(w.connect(Chain::Ethereum).await.is_err());
        assert_eq!(w.connect(Chain::Solana).await.unwrap(), w.solana_address());
    }

    #[test]
    fn keystore_generate_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let keystore = Keystore::new(dir.path());
        assert!(!keystore.contains(WalletId::Phantom));
        assert!(keystore.load(WalletId::Phantom).unwrap().is_none());

        let created = keystore.generate(WalletId::Phantom).unwrap();
        let loaded = keystore.load(WalletId::Phantom).unwrap().unwrap();
        assert_eq!(created.solana_address(), loaded.solana_address());
        assert!(keystore.generate(WalletId::Phantom).is_err());

        let registry = keystore.registry().unwrap();
        assert_eq!(registry.ids(), vec![WalletId::Phantom]);
        assert!(registry.probe(WalletId::Phantom));
    }

    #[test]
    fn malformed_seed_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("metamask.key"), "abcd").unwrap();
        let keystore = Keystore::new(dir.path());
        assert!(matches!(
            keystore.load(WalletId::MetaMask),
            Err(WalletError::InvalidKey(_))
        ));
    }
}
