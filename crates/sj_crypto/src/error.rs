use thiserror::Error;

/// Unified error type for the crypto core.
///
/// Callers branch on the variant, not on strings:
/// - `InvalidInput` is always a caller bug, never retried.
/// - `Integrity` is a trust failure (tampering, wrong key, wrong context,
///   server substitution). It must propagate to something user-visible.
/// - `VersionTooNew` means this build is outdated and must refuse the data.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("integrity check failed: {0}")]
    Integrity(String),

    #[error("data version {found} is newer than this build supports (max {supported}); upgrade required")]
    VersionTooNew { found: u8, supported: u8 },

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

impl CryptoError {
    /// True for any failure that means the data must not be trusted.
    pub fn is_integrity(&self) -> bool {
        matches!(self, CryptoError::Integrity(_))
    }
}
