//! Versioned symmetric engine bound to (key, version, context label).
//!
//! A `CryptoManager` is constructed once per (key, version, label) triple
//! and is immutable for its lifetime; a new instance is created whenever
//! the key or the version changes. The context label scopes a manager to
//! one semantic use (e.g., "journal" vs "userInfo") so ciphertext from one
//! context cannot be replayed as valid in another.
//!
//! Version negotiation: the caller constructs the manager with the version
//! field carried on the data. Data newer than `CURRENT_VERSION` is refused
//! with `VersionTooNew` — an older client must never silently mis-decrypt
//! data produced by a newer scheme.

use zeroize::ZeroizeOnDrop;

use crate::aead;
use crate::error::CryptoError;
use crate::hash;
use crate::kdf::{hkdf_expand, DerivedKey};
use crate::keypair::CollectionKey;

/// Highest data version this build understands.
pub const CURRENT_VERSION: u8 = 2;

/// Symmetric encrypt/authenticate engine. `Send + Sync`; stateless per
/// call beyond the bound triple, so independent call sites may each hold
/// their own instance without coordination.
#[derive(ZeroizeOnDrop)]
pub struct CryptoManager {
    cipher_key: [u8; 32],
    mac_key: [u8; 32],
    #[zeroize(skip)]
    version: u8,
    #[zeroize(skip)]
    context: String,
}

impl std::fmt::Debug for CryptoManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoManager")
            .field("version", &self.version)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl CryptoManager {
    /// Bind a manager to the account key derived from the user's password.
    pub fn new(version: u8, key: &DerivedKey, context: &str) -> Result<Self, CryptoError> {
        Self::from_key_bytes(version, key.as_bytes(), context)
    }

    /// Bind a manager to a per-journal collection key.
    pub fn from_collection_key(
        version: u8,
        key: &CollectionKey,
        context: &str,
    ) -> Result<Self, CryptoError> {
        Self::from_key_bytes(version, key.as_bytes(), context)
    }

    fn from_key_bytes(version: u8, ikm: &[u8; 32], context: &str) -> Result<Self, CryptoError> {
        if version == 0 {
            return Err(CryptoError::InvalidInput("version 0 does not exist".into()));
        }
        if version > CURRENT_VERSION {
            return Err(CryptoError::VersionTooNew {
                found: version,
                supported: CURRENT_VERSION,
            });
        }
        if context.is_empty() {
            return Err(CryptoError::InvalidInput("context label must not be empty".into()));
        }

        let mut cipher_key = [0u8; 32];
        let mut mac_key = [0u8; 32];
        match version {
            1 => {
                // Legacy scheme: the input key is the cipher key directly.
                // Kept only so old journals remain readable.
                cipher_key.copy_from_slice(ikm);
            }
            _ => {
                let info = subkey_info(b"sj-cipher", version, context);
                hkdf_expand(ikm, None, &info, &mut cipher_key)?;
            }
        }
        let info = subkey_info(b"sj-mac", version, context);
        hkdf_expand(ikm, None, &info, &mut mac_key)?;

        Ok(Self {
            cipher_key,
            mac_key,
            version,
            context: context.to_string(),
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Authenticated encryption; output is `nonce || ct+tag`, with the
    /// (version, context) binding authenticated as associated data.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        aead::encrypt(&self.cipher_key, plaintext, &self.aad())
    }

    /// Decrypt and authenticate. `Integrity` on any tag failure — tampered
    /// ciphertext, wrong key, wrong version, or wrong context label.
    pub fn decrypt(&self, data: &[u8]) -> Result<zeroize::Zeroizing<Vec<u8>>, CryptoError> {
        aead::decrypt(&self.cipher_key, data, &self.aad())
    }

    /// Authentication tag for a journal entry: keyed BLAKE3 over the
    /// predecessor's tag and the ciphertext (see `hash::entry_tag`).
    pub fn entry_tag(&self, prev: &[u8; 32], ciphertext: &[u8]) -> [u8; 32] {
        hash::entry_tag(&self.mac_key, prev, ciphertext)
    }

    /// Wrap a collection key for local-only storage under this manager.
    pub fn wrap_collection_key(&self, key: &CollectionKey) -> Result<Vec<u8>, CryptoError> {
        aead::wrap_key(&self.cipher_key, key.as_bytes())
    }

    /// Recover a locally wrapped collection key.
    pub fn unwrap_collection_key(&self, wrapped: &[u8]) -> Result<CollectionKey, CryptoError> {
        Ok(CollectionKey::from_bytes(aead::unwrap_key(&self.cipher_key, wrapped)?))
    }

    fn aad(&self) -> Vec<u8> {
        let mut aad = Vec::with_capacity(12 + self.context.len());
        aad.extend_from_slice(b"sj-aead-v");
        aad.push(self.version);
        aad.push(0);
        aad.extend_from_slice(self.context.as_bytes());
        aad
    }
}

fn subkey_info(domain: &[u8], version: u8, context: &str) -> Vec<u8> {
    let mut info = Vec::with_capacity(domain.len() + 2 + context.len());
    info.extend_from_slice(domain);
    info.push(version);
    info.push(0);
    info.extend_from_slice(context.as_bytes());
    info
}
