//! The ordered, hash-linked sequence of encrypted entries for one journal.
//!
//! Locally produced entries extend the chain via `append`; entries fetched
//! from the server go through `verify_and_append_remote`, which accepts
//! only a strictly linear extension of the current tail. A stale or forked
//! predecessor, or a tag that does not verify, is rejected WITHOUT
//! mutating the chain — resolving racing writers is the server's job, not
//! this component's.
//!
//! `replay` walks the chain from the sentinel, re-verifying every link and
//! decrypting on demand. The first failure halts the sequence: a journal
//! with one bad entry is suspect as a whole, never partially trusted.

use tracing::{debug, warn};
use zeroize::Zeroizing;

use sj_crypto::hash::{constant_time_eq, SENTINEL};
use sj_crypto::CryptoManager;

use crate::entry::JournalEntry;
use crate::error::JournalError;

/// In-memory chain state plus the manager bound to this journal's
/// collection key. Single-writer: concurrent appends to one instance must
/// be serialized by the caller.
pub struct JournalChain {
    manager: CryptoManager,
    entries: Vec<JournalEntry>,
    tail: [u8; 32],
}

impl std::fmt::Debug for JournalChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalChain")
            .field("manager", &self.manager)
            .field("len", &self.entries.len())
            .field("tail", &hex::encode(self.tail))
            .finish_non_exhaustive()
    }
}

impl JournalChain {
    /// Start an empty chain. `manager` must be bound to the journal's
    /// collection key with the journal context label.
    pub fn new(manager: CryptoManager) -> Self {
        Self {
            manager,
            entries: Vec::new(),
            tail: SENTINEL,
        }
    }

    /// Rebuild a chain from persisted entries, verifying every link.
    /// Fails on the first broken link; the caller must then treat the
    /// whole stored journal as suspect.
    pub fn from_entries(
        manager: CryptoManager,
        entries: Vec<JournalEntry>,
    ) -> Result<Self, JournalError> {
        let mut chain = Self::new(manager);
        for entry in entries {
            chain.check_extends_tail(&entry)?;
            chain.push(entry);
        }
        Ok(chain)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tag of the last entry (sentinel for an empty journal).
    pub fn tail(&self) -> &[u8; 32] {
        &self.tail
    }

    /// Verified entries in chain order, e.g. for upload.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Encrypt `plaintext` and append it as the new chain tail.
    pub fn append(&mut self, plaintext: &[u8]) -> Result<&JournalEntry, JournalError> {
        let ciphertext = self.manager.encrypt(plaintext)?;
        let tag = self.manager.entry_tag(&self.tail, &ciphertext);
        let entry = JournalEntry {
            ciphertext,
            prev_tag: self.tail,
            tag,
        };
        debug!(uid = %entry.uid(), position = self.entries.len(), "journal append");
        self.push(entry);
        Ok(self.entries.last().expect("just pushed"))
    }

    /// Verify an entry fetched from the server and, only if it checks out,
    /// append it and return its plaintext.
    ///
    /// Rejection leaves the chain untouched:
    /// - predecessor does not match the current tail (reordering, insertion,
    ///   forked or rolled-back history) — `ChainIntegrity`;
    /// - authentication tag mismatch (tampering) — `ChainIntegrity`;
    /// - ciphertext fails AEAD verification — `Integrity`.
    pub fn verify_and_append_remote(
        &mut self,
        entry: JournalEntry,
    ) -> Result<Zeroizing<Vec<u8>>, JournalError> {
        self.check_extends_tail(&entry)?;
        let plaintext = self.manager.decrypt(&entry.ciphertext)?;
        debug!(uid = %entry.uid(), position = self.entries.len(), "remote entry accepted");
        self.push(entry);
        Ok(plaintext)
    }

    /// Lazy decrypting walk over the whole journal in chain order.
    /// Restartable from the beginning; fuses on the first bad entry.
    pub fn replay(&self) -> Replay<'_> {
        Replay {
            chain: self,
            index: 0,
            prev: SENTINEL,
            halted: false,
        }
    }

    fn check_extends_tail(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        if !constant_time_eq(&entry.prev_tag, &self.tail) {
            warn!(
                uid = %entry.uid(),
                tail = %hex::encode(self.tail),
                "entry does not extend the current tail"
            );
            return Err(JournalError::ChainIntegrity(
                "entry predecessor does not match the journal tail".into(),
            ));
        }
        let expected = self.manager.entry_tag(&entry.prev_tag, &entry.ciphertext);
        if !constant_time_eq(&expected, &entry.tag) {
            warn!(uid = %entry.uid(), "entry tag mismatch");
            return Err(JournalError::ChainIntegrity(
                "entry authentication tag does not verify".into(),
            ));
        }
        Ok(())
    }

    fn push(&mut self, entry: JournalEntry) {
        self.tail = entry.tag;
        self.entries.push(entry);
    }
}

/// Iterator returned by [`JournalChain::replay`]. Yields plaintexts in
/// chain order; after yielding an `Err` it yields nothing further.
pub struct Replay<'a> {
    chain: &'a JournalChain,
    index: usize,
    prev: [u8; 32],
    halted: bool,
}

impl Iterator for Replay<'_> {
    type Item = Result<Zeroizing<Vec<u8>>, JournalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let entry = self.chain.entries.get(self.index)?;

        let result = self.verify_and_decrypt(entry);
        match result {
            Ok(plaintext) => {
                self.prev = entry.tag;
                self.index += 1;
                Some(Ok(plaintext))
            }
            Err(e) => {
                self.halted = true;
                warn!(position = self.index, error = %e, "replay halted");
                Some(Err(e))
            }
        }
    }
}

impl Replay<'_> {
    fn verify_and_decrypt(
        &self,
        entry: &JournalEntry,
    ) -> Result<Zeroizing<Vec<u8>>, JournalError> {
        if !constant_time_eq(&entry.prev_tag, &self.prev) {
            return Err(JournalError::ChainIntegrity(format!(
                "broken link at position {}",
                self.index
            )));
        }
        let expected = self
            .chain
            .manager
            .entry_tag(&entry.prev_tag, &entry.ciphertext);
        if !constant_time_eq(&expected, &entry.tag) {
            return Err(JournalError::ChainIntegrity(format!(
                "tag mismatch at position {}",
                self.index
            )));
        }
        Ok(self.chain.manager.decrypt(&entry.ciphertext)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sj_crypto::{CollectionKey, CryptoManager, CURRENT_VERSION};

    fn chain() -> JournalChain {
        let key = CollectionKey::from_bytes([11u8; 32]);
        let manager =
            CryptoManager::from_collection_key(CURRENT_VERSION, &key, "journal").unwrap();
        JournalChain::new(manager)
    }

    fn collect_plaintexts(chain: &JournalChain) -> Vec<Vec<u8>> {
        chain
            .replay()
            .map(|r| r.map(|p| p.to_vec()))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn replay_preserves_order() {
        let mut chain = chain();
        chain.append(b"one").unwrap();
        chain.append(b"two").unwrap();
        chain.append(b"three").unwrap();
        assert_eq!(
            collect_plaintexts(&chain),
            vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]
        );
    }

    #[test]
    fn replay_is_restartable() {
        let mut chain = chain();
        chain.append(b"one").unwrap();
        assert_eq!(collect_plaintexts(&chain), collect_plaintexts(&chain));
    }

    #[test]
    fn empty_journal_accepts_only_sentinel_predecessor() {
        let mut producer = chain();
        let first = producer.append(b"one").unwrap().clone();
        let second = producer.append(b"two").unwrap().clone();
        assert!(first.is_first());
        assert!(!second.is_first());

        let mut empty = chain();
        let err = empty.verify_and_append_remote(second).unwrap_err();
        assert!(err.is_integrity());
        assert!(empty.is_empty());

        empty.verify_and_append_remote(first).unwrap();
        assert_eq!(empty.len(), 1);
    }

    #[test]
    fn stale_predecessor_is_rejected_without_mutation() {
        let mut producer = chain();
        let e1 = producer.append(b"one").unwrap().clone();
        let e2 = producer.append(b"two").unwrap().clone();
        producer.append(b"three").unwrap();

        let mut consumer = chain();
        consumer.verify_and_append_remote(e1.clone()).unwrap();
        consumer.verify_and_append_remote(e2).unwrap();
        consumer
            .verify_and_append_remote(producer.entries()[2].clone())
            .unwrap();

        // A fork pointing back at e1 while the tail is e3.
        let forked = JournalEntry {
            prev_tag: e1.tag,
            ..producer.entries()[2].clone()
        };
        let len_before = consumer.len();
        let tail_before = *consumer.tail();
        let err = consumer.verify_and_append_remote(forked).unwrap_err();
        assert!(err.is_integrity());
        assert_eq!(consumer.len(), len_before);
        assert_eq!(*consumer.tail(), tail_before);
    }

    #[test]
    fn tampered_entry_is_rejected() {
        let mut producer = chain();
        let mut entry = producer.append(b"one").unwrap().clone();
        entry.ciphertext[5] ^= 0x01;

        let mut consumer = chain();
        let err = consumer.verify_and_append_remote(entry).unwrap_err();
        assert!(err.is_integrity());
        assert!(consumer.is_empty());
    }

    #[test]
    fn replay_halts_at_first_bad_entry() {
        let mut chain = chain();
        chain.append(b"one").unwrap();
        chain.append(b"two").unwrap();
        chain.append(b"three").unwrap();
        // Corrupt the middle entry in place.
        chain.entries[1].ciphertext[0] ^= 0x01;

        let mut replay = chain.replay();
        assert!(replay.next().unwrap().is_ok());
        assert!(replay.next().unwrap().is_err());
        assert!(replay.next().is_none(), "replay must fuse after a failure");
    }

    #[test]
    fn from_entries_verifies_the_stored_chain() {
        let mut producer = chain();
        producer.append(b"one").unwrap();
        producer.append(b"two").unwrap();
        let mut entries = producer.entries().to_vec();

        let key = CollectionKey::from_bytes([11u8; 32]);
        let manager =
            CryptoManager::from_collection_key(CURRENT_VERSION, &key, "journal").unwrap();
        let restored = JournalChain::from_entries(manager, entries.clone()).unwrap();
        assert_eq!(restored.len(), 2);

        entries.swap(0, 1);
        let key = CollectionKey::from_bytes([11u8; 32]);
        let manager =
            CryptoManager::from_collection_key(CURRENT_VERSION, &key, "journal").unwrap();
        assert!(JournalChain::from_entries(manager, entries).unwrap_err().is_integrity());
    }
}
