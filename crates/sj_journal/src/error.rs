use sj_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The chain itself is inconsistent: stale or forked predecessor,
    /// entry tag mismatch. The whole journal must be treated as suspect.
    #[error("chain integrity violation: {0}")]
    ChainIntegrity(String),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

impl JournalError {
    /// True for any failure that means the data must not be trusted.
    pub fn is_integrity(&self) -> bool {
        match self {
            JournalError::ChainIntegrity(_) => true,
            JournalError::Crypto(e) => e.is_integrity(),
            _ => false,
        }
    }
}
