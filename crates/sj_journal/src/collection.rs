//! Encrypted per-journal metadata.
//!
//! The server never sees what a journal is for. Its human-facing metadata
//! (type, display name, description) travels as JSON sealed under the
//! journal's manager, typically as the journal's first entry.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use sj_crypto::CryptoManager;

use crate::error::JournalError;

/// Kind of synchronized collection a journal replicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    AddressBook,
    Calendar,
    TaskList,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Random v4 UUID; doubles as the journal's server-side name.
    pub uid: String,
    #[serde(rename = "type")]
    pub collection_type: CollectionType,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CollectionInfo {
    pub fn new(
        collection_type: CollectionType,
        display_name: &str,
        description: Option<&str>,
    ) -> Self {
        Self {
            uid: uuid::Uuid::new_v4().to_string(),
            collection_type,
            display_name: display_name.to_string(),
            description: description.map(str::to_string),
        }
    }

    /// Serialize and encrypt under the journal's manager.
    pub fn seal(&self, manager: &CryptoManager) -> Result<Vec<u8>, JournalError> {
        let json = serde_json::to_vec(self)?;
        Ok(manager.encrypt(&json)?)
    }

    /// Decrypt and parse sealed metadata.
    pub fn open(manager: &CryptoManager, sealed: &[u8]) -> Result<Self, JournalError> {
        let json: Zeroizing<Vec<u8>> = manager.decrypt(sealed)?;
        Ok(serde_json::from_slice(&json)?)
    }
}
