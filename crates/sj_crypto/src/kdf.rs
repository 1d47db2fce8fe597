//! Key derivation functions
//!
//! `derive_key` — Argon2id, turns (identity, password) into the 32-byte
//!   account key. Deterministic: the salt is derived from the identity, so
//!   the same login always reconstructs the same key without persisting it.
//!
//! `hkdf_expand` — HKDF-SHA256, used by `CryptoManager` to split the
//!   account key into context-bound subkeys.

use argon2::{Argon2, Params, Version};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

use crate::error::CryptoError;

// ── Account key (Argon2id) ────────────────────────────────────────────────────

/// 32-byte key derived from the user's password. Zeroized on drop.
/// Never persisted; held in memory for the session only.
#[derive(ZeroizeOnDrop)]
pub struct DerivedKey(pub(crate) [u8; 32]);

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DerivedKey").field(&"<redacted>").finish()
    }
}

impl DerivedKey {
    /// Wrap existing 32 bytes of key material (e.g., for tests or a
    /// hardware-sourced key). Prefer `derive_key` for passwords.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Argon2id parameters — tuned for interactive login on desktop/mobile.
fn argon2_params() -> Params {
    Params::new(
        64 * 1024, // m_cost: 64 MiB
        3,         // t_cost: 3 iterations
        1,         // p_cost: 1 thread
        Some(32),  // output len
    )
    .expect("Static Argon2 params are always valid")
}

/// Derive the account key from a user identity and a low-entropy secret.
///
/// The identity (username or account address) is hashed into a 16-byte
/// salt, so distinct accounts with the same password derive distinct keys.
/// This call is deliberately slow and memory-hard; run it off any
/// interactive thread.
pub fn derive_key(identity: &str, secret: &[u8]) -> Result<DerivedKey, CryptoError> {
    if identity.is_empty() {
        return Err(CryptoError::InvalidInput("identity must not be empty".into()));
    }
    if secret.is_empty() {
        return Err(CryptoError::InvalidInput("secret must not be empty".into()));
    }

    let salt = identity_salt(identity);
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, argon2_params());
    let mut output = [0u8; 32];
    argon2
        .hash_password_into(secret, &salt, &mut output)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(DerivedKey(output))
}

/// 16-byte salt derived from the identity string.
fn identity_salt(identity: &str) -> [u8; 16] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"sj-identity-salt-v1\x00");
    hasher.update(identity.as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    let mut salt = [0u8; 16];
    salt.copy_from_slice(&digest[..16]);
    salt
}

// ── HKDF-SHA256 ───────────────────────────────────────────────────────────────

/// Expand `ikm` + `info` into `output.len()` bytes of key material.
///
/// `salt` may be `None` (HKDF will use a zeroed salt).
pub fn hkdf_expand(
    ikm: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
    output: &mut [u8],
) -> Result<(), CryptoError> {
    let hk = Hkdf::<Sha256>::new(salt, ikm);
    hk.expand(info, output)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_key("alice", b"correct-horse").unwrap();
        let b = derive_key("alice", b"correct-horse").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn identity_separates_keys() {
        let a = derive_key("alice", b"correct-horse").unwrap();
        let b = derive_key("bob", b"correct-horse").unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let err = derive_key("alice", b"").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidInput(_)));
    }

    #[test]
    fn empty_identity_is_rejected() {
        let err = derive_key("", b"pw").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidInput(_)));
    }
}
