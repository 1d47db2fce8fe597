//! sj_crypto — Sealed Journal cryptographic core
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize all secret material on drop.
//! - Secret keys are opaque newtypes; raw byte access is deliberately narrow.
//! - No ambient state: every operation is bound to an explicit
//!   `CryptoManager` (key + version + context label) passed by the caller.
//!
//! # Module layout
//! - `kdf`     — Argon2id password derivation + HKDF subkey expansion
//! - `aead`    — XChaCha20-Poly1305 encrypt/decrypt helpers, key wrapping
//! - `manager` — versioned `CryptoManager` bound to (key, version, context)
//! - `keypair` — X25519 key pairs, sealed-box collection-key wrapping
//! - `hash`    — BLAKE3 utilities (entry tags, constant-time compare)
//! - `error`   — unified error type

pub mod aead;
pub mod error;
pub mod hash;
pub mod kdf;
pub mod keypair;
pub mod manager;

pub use error::CryptoError;
pub use kdf::{derive_key, DerivedKey};
pub use keypair::{CollectionKey, KeyPair, PublicKeyBytes, StoredKeyPair};
pub use manager::{CryptoManager, CURRENT_VERSION};
