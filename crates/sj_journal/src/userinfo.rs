//! Published identity records.
//!
//! A `UserInfo` carries an account's public key plus its private half
//! encrypted under the owner's password-derived key. Fetched records are
//! UNTRUSTED input: `verify` must succeed before the contained key pair
//! is used for sharing or recovery. A record that decrypts but whose
//! rebuilt public key differs from the published one signals server-side
//! key substitution and is rejected outright.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use tracing::warn;

use sj_crypto::{CryptoError, CryptoManager, KeyPair, PublicKeyBytes};

use crate::error::JournalError;

/// Context label for the manager protecting `UserInfo` content.
pub const USERINFO_CONTEXT: &str = "userInfo";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    /// Account identity (username or address) this record belongs to.
    pub owner: String,
    /// Crypto version the content was produced with; the caller constructs
    /// its `CryptoManager` from this field.
    pub version: u8,
    /// Base64url X25519 public key, stored in the clear.
    pub pubkey: String,
    /// Base64url encrypted secret half (`CryptoManager::encrypt` output).
    pub content: String,
}

impl UserInfo {
    /// Build the record to publish for `owner`. `manager` must be bound to
    /// the owner's derived key with [`USERINFO_CONTEXT`].
    pub fn publish(
        owner: &str,
        keypair: &KeyPair,
        manager: &CryptoManager,
    ) -> Result<Self, JournalError> {
        let content = manager.encrypt(keypair.secret_bytes())?;
        Ok(Self {
            owner: owner.to_string(),
            version: manager.version(),
            pubkey: keypair.public.to_b64(),
            content: URL_SAFE_NO_PAD.encode(content),
        })
    }

    /// Validate a fetched record and recover the key pair.
    ///
    /// Steps: decrypt the content under the owner's manager (tag failure →
    /// the record was tampered with or belongs to a different secret);
    /// rebuild the pair from the decrypted secret; compare the rebuilt
    /// public key byte-for-byte against the published one. On any failure
    /// the identity must remain untrusted.
    pub fn verify(&self, manager: &CryptoManager) -> Result<KeyPair, JournalError> {
        if manager.version() != self.version {
            return Err(CryptoError::InvalidInput(format!(
                "manager version {} does not match record version {}",
                manager.version(),
                self.version
            ))
            .into());
        }

        let content = URL_SAFE_NO_PAD
            .decode(&self.content)
            .map_err(CryptoError::from)?;
        let secret = manager.decrypt(&content)?;
        let keypair = KeyPair::from_secret_bytes(&secret)?;

        let published = PublicKeyBytes::from_b64(&self.pubkey)?;
        if !keypair.public.matches(&published) {
            warn!(owner = %self.owner, "published public key does not match record content");
            return Err(CryptoError::Integrity(
                "public key mismatch in identity record (possible substitution)".into(),
            )
            .into());
        }

        Ok(keypair)
    }
}
