//! Journal entries and their wire form.
//!
//! An entry is immutable once created; the journal only grows by
//! appending. The authentication tag covers both the ciphertext and the
//! predecessor's tag, so an entry cannot be re-chained under a different
//! predecessor without detection. The tag doubles as the entry's UID on
//! the server (hex-encoded).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use sj_crypto::hash::SENTINEL;

use crate::error::JournalError;

/// One encrypted, chained entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// `CryptoManager::encrypt` output (nonce || ct+tag).
    pub ciphertext: Vec<u8>,
    /// Tag of the predecessor; all-zeros sentinel for the first entry.
    pub prev_tag: [u8; 32],
    /// Keyed BLAKE3 over (prev_tag, ciphertext).
    pub tag: [u8; 32],
}

impl JournalEntry {
    /// Server-side identifier: the tag, hex-encoded.
    pub fn uid(&self) -> String {
        hex::encode(self.tag)
    }

    /// Whether this entry claims to start a journal.
    pub fn is_first(&self) -> bool {
        self.prev_tag == SENTINEL
    }

    pub fn to_record(&self) -> EntryRecord {
        EntryRecord {
            uid: self.uid(),
            prev: hex::encode(self.prev_tag),
            content: URL_SAFE_NO_PAD.encode(&self.ciphertext),
        }
    }

    /// Parse a fetched record. This only checks shape; chain position and
    /// tag validity are established by `JournalChain::verify_and_append_remote`.
    pub fn from_record(record: &EntryRecord) -> Result<Self, JournalError> {
        Ok(Self {
            ciphertext: URL_SAFE_NO_PAD
                .decode(&record.content)
                .map_err(|e| JournalError::MalformedRecord(format!("content: {e}")))?,
            prev_tag: decode_hash(&record.prev, "prev")?,
            tag: decode_hash(&record.uid, "uid")?,
        })
    }
}

fn decode_hash(s: &str, field: &str) -> Result<[u8; 32], JournalError> {
    let bytes = hex::decode(s).map_err(|e| JournalError::MalformedRecord(format!("{field}: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| JournalError::MalformedRecord(format!("{field}: expected 32 bytes")))
}

/// What goes over the wire and into persistence: text fields only, so the
/// transport can treat records as plain JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRecord {
    /// Hex entry tag.
    pub uid: String,
    /// Hex predecessor tag (all-zeros for the first entry).
    pub prev: String,
    /// Base64url ciphertext.
    pub content: String,
}
