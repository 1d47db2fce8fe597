//! Asymmetric key pairs and collection keys
//!
//! Each account owns one long-term X25519 `KeyPair`. Its only job is key
//! transport: a journal's symmetric `CollectionKey` is wrapped under the
//! recipient's public key (sealed-box style — the sender needs no secret
//! of its own, the wrapped value is self-contained and tamper-evident).
//!
//! The private half never touches storage in plaintext: `to_stored` runs
//! it through `CryptoManager::encrypt` and `from_stored` back through
//! `decrypt`, so a stored record is only usable with the account key.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519Public, StaticSecret};
use zeroize::ZeroizeOnDrop;

use crate::error::CryptoError;
use crate::kdf::hkdf_expand;
use crate::manager::CryptoManager;
use crate::{aead, hash};

// ── Newtype wrappers ──────────────────────────────────────────────────────────

/// 32-byte X25519 public key, base64url-encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKeyBytes(pub Vec<u8>);

impl PublicKeyBytes {
    pub fn to_b64(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }

    pub fn from_b64(s: &str) -> Result<Self, CryptoError> {
        let bytes = URL_SAFE_NO_PAD.decode(s)?;
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKey(format!(
                "public key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Human-readable fingerprint: BLAKE3 of the public key, truncated to
    /// 20 bytes, hex-encoded in groups of 4 for display during setup.
    ///
    /// Example: "a1b2 c3d4 e5f6 7890 abcd ef01 2345 6789 0abc def0"
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(&self.0);
        let hex = hex::encode(&hash.as_bytes()[..20]);
        hex.chars()
            .collect::<Vec<_>>()
            .chunks(4)
            .map(|c| c.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Byte-for-byte comparison in constant time.
    pub fn matches(&self, other: &PublicKeyBytes) -> bool {
        let h1: [u8; 32] = blake3::hash(&self.0).into();
        let h2: [u8; 32] = blake3::hash(&other.0).into();
        hash::constant_time_eq(&h1, &h2)
    }

    fn to_x25519(&self) -> Result<X25519Public, CryptoError> {
        let raw: [u8; 32] = self
            .0
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidKey("public key must be 32 bytes".into()))?;
        Ok(X25519Public::from(raw))
    }
}

/// Symmetric key securing one journal. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct CollectionKey([u8; 32]);

impl std::fmt::Debug for CollectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CollectionKey").field(&"<redacted>").finish()
    }
}

impl CollectionKey {
    /// Fresh random key from the OS RNG — one per collection.
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Constant-time equality (test helper and recovery check).
    pub fn matches(&self, other: &CollectionKey) -> bool {
        hash::constant_time_eq(&self.0, &other.0)
    }
}

// ── Account keypair ───────────────────────────────────────────────────────────

/// Long-term account key pair. Drop clears the secret half.
#[derive(ZeroizeOnDrop)]
pub struct KeyPair {
    #[zeroize(skip)]
    pub public: PublicKeyBytes,
    secret_bytes: [u8; 32],
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate a fresh pair; called once at account setup, again only on
    /// explicit key reset.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKeyBytes(X25519Public::from(&secret).as_bytes().to_vec());
        Self {
            public,
            secret_bytes: secret.to_bytes(),
        }
    }

    /// Rebuild a pair from its 32 secret bytes (already decrypted).
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKey(format!(
                "secret key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        let secret = StaticSecret::from(arr);
        let public = PublicKeyBytes(X25519Public::from(&secret).as_bytes().to_vec());
        Ok(Self {
            public,
            secret_bytes: secret.to_bytes(),
        })
    }

    pub fn secret_bytes(&self) -> &[u8; 32] {
        &self.secret_bytes
    }

    /// Recover a collection key wrapped for this pair's public half.
    /// `Integrity` if the payload is malformed, tampered with, or was
    /// wrapped for a different recipient.
    pub fn unwrap_collection_key(&self, wrapped: &[u8]) -> Result<CollectionKey, CryptoError> {
        if wrapped.len() < 32 {
            return Err(CryptoError::Integrity("wrapped key too short".into()));
        }
        let (eph_bytes, ct) = wrapped.split_at(32);
        let mut eph_raw = [0u8; 32];
        eph_raw.copy_from_slice(eph_bytes);
        let eph_pub = X25519Public::from(eph_raw);

        let secret = StaticSecret::from(self.secret_bytes);
        let shared = secret.diffie_hellman(&eph_pub);
        let kek = sealed_box_key(shared.as_bytes(), &eph_raw, &self.public)?;

        let key = aead::unwrap_key(&kek, ct)
            .map_err(|_| CryptoError::Integrity("sealed key rejected (wrong recipient or tampered)".into()))?;
        Ok(CollectionKey::from_bytes(key))
    }

    /// Encrypt the secret half under the account manager for persistence.
    pub fn to_stored(&self, manager: &CryptoManager) -> Result<StoredKeyPair, CryptoError> {
        let content = manager.encrypt(&self.secret_bytes)?;
        Ok(StoredKeyPair {
            pubkey: self.public.to_b64(),
            content: URL_SAFE_NO_PAD.encode(content),
        })
    }

    /// Decrypt a stored record back into a usable pair.
    pub fn from_stored(stored: &StoredKeyPair, manager: &CryptoManager) -> Result<Self, CryptoError> {
        let content = URL_SAFE_NO_PAD.decode(&stored.content)?;
        let secret = manager.decrypt(&content)?;
        let pair = Self::from_secret_bytes(&secret)?;
        let published = PublicKeyBytes::from_b64(&stored.pubkey)?;
        if !pair.public.matches(&published) {
            return Err(CryptoError::Integrity(
                "stored public key does not match the secret half".into(),
            ));
        }
        Ok(pair)
    }
}

/// Wrap a collection key so only the holder of `recipient`'s secret can
/// recover it. Sealed box: fresh ephemeral X25519 pair, DH with the
/// recipient, HKDF over (shared, ephemeral pub, recipient pub).
///
/// Wire format: [ ephemeral pub (32) | nonce | ct+tag ]
pub fn wrap_collection_key(
    key: &CollectionKey,
    recipient: &PublicKeyBytes,
) -> Result<Vec<u8>, CryptoError> {
    let recipient_pub = recipient.to_x25519()?;

    let eph_secret = StaticSecret::random_from_rng(OsRng);
    let eph_pub = X25519Public::from(&eph_secret);
    let shared = eph_secret.diffie_hellman(&recipient_pub);

    let kek = sealed_box_key(shared.as_bytes(), eph_pub.as_bytes(), recipient)?;
    let ct = aead::wrap_key(&kek, key.as_bytes())?;

    let mut out = Vec::with_capacity(32 + ct.len());
    out.extend_from_slice(eph_pub.as_bytes());
    out.extend_from_slice(&ct);
    Ok(out)
}

/// One-shot wrapping key: HKDF(shared || eph_pub || recipient_pub).
/// Binding both public keys into the info string ties the wrapped value
/// to this exact sender/recipient geometry.
fn sealed_box_key(
    shared: &[u8; 32],
    eph_pub: &[u8; 32],
    recipient: &PublicKeyBytes,
) -> Result<[u8; 32], CryptoError> {
    let mut info = Vec::with_capacity(14 + 64);
    info.extend_from_slice(b"sj-sealed-v1\x00");
    info.extend_from_slice(eph_pub);
    info.extend_from_slice(&recipient.0);
    let mut kek = [0u8; 32];
    hkdf_expand(shared, None, &info, &mut kek)?;
    Ok(kek)
}

// ── At-rest record ────────────────────────────────────────────────────────────

/// Persistence form of a key pair: public half in the clear, secret half
/// encrypted under the account's `CryptoManager`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredKeyPair {
    /// Base64url X25519 public key.
    pub pubkey: String,
    /// Base64url `CryptoManager::encrypt` output over the 32 secret bytes.
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::DerivedKey;
    use crate::manager::CURRENT_VERSION;

    #[test]
    fn wrap_unwrap_round_trip() {
        let pair = KeyPair::generate();
        let key = CollectionKey::generate();
        let wrapped = wrap_collection_key(&key, &pair.public).unwrap();
        let recovered = pair.unwrap_collection_key(&wrapped).unwrap();
        assert!(key.matches(&recovered));
    }

    #[test]
    fn wrong_recipient_fails() {
        let alice = KeyPair::generate();
        let eve = KeyPair::generate();
        let key = CollectionKey::generate();
        let wrapped = wrap_collection_key(&key, &alice.public).unwrap();
        assert!(eve.unwrap_collection_key(&wrapped).unwrap_err().is_integrity());
    }

    #[test]
    fn truncated_wrap_fails() {
        let pair = KeyPair::generate();
        assert!(pair.unwrap_collection_key(&[0u8; 16]).unwrap_err().is_integrity());
    }

    #[test]
    fn stored_round_trip() {
        let manager = CryptoManager::new(
            CURRENT_VERSION,
            &DerivedKey::from_bytes([5u8; 32]),
            "keypair",
        )
        .unwrap();
        let pair = KeyPair::generate();
        let stored = pair.to_stored(&manager).unwrap();
        let restored = KeyPair::from_stored(&stored, &manager).unwrap();
        assert_eq!(pair.public, restored.public);
        assert_eq!(pair.secret_bytes(), restored.secret_bytes());
    }

    #[test]
    fn stored_with_wrong_key_fails() {
        let manager = CryptoManager::new(
            CURRENT_VERSION,
            &DerivedKey::from_bytes([5u8; 32]),
            "keypair",
        )
        .unwrap();
        let other = CryptoManager::new(
            CURRENT_VERSION,
            &DerivedKey::from_bytes([6u8; 32]),
            "keypair",
        )
        .unwrap();
        let stored = KeyPair::generate().to_stored(&manager).unwrap();
        assert!(KeyPair::from_stored(&stored, &other).unwrap_err().is_integrity());
    }

    #[test]
    fn fingerprint_is_stable_and_grouped() {
        let pair = KeyPair::generate();
        let fp = pair.public.fingerprint();
        assert_eq!(fp, pair.public.fingerprint());
        assert_eq!(fp.split(' ').count(), 10);
    }
}
