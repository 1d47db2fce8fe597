//! End-to-end flow: login key derivation, identity verification, collection
//! key sharing, and journal sync against an untrusted server simulated as a
//! plain record store.

use anyhow::Result;

use sj_crypto::{
    derive_key, keypair::wrap_collection_key, CollectionKey, CryptoManager, KeyPair,
    CURRENT_VERSION,
};
use sj_journal::userinfo::USERINFO_CONTEXT;
use sj_journal::{CollectionInfo, CollectionType, EntryRecord, JournalChain, JournalEntry, UserInfo};

const JOURNAL_CONTEXT: &str = "journal";

fn account_manager(identity: &str, secret: &[u8]) -> Result<CryptoManager> {
    let key = derive_key(identity, secret)?;
    Ok(CryptoManager::new(CURRENT_VERSION, &key, USERINFO_CONTEXT)?)
}

fn journal_manager(key: &CollectionKey) -> Result<CryptoManager> {
    Ok(CryptoManager::from_collection_key(CURRENT_VERSION, key, JOURNAL_CONTEXT)?)
}

#[test]
fn full_setup_share_and_sync_flow() -> Result<()> {
    // Account setup: derive the account key, publish the identity record.
    let manager = account_manager("alice", b"correct-horse")?;
    let keypair = KeyPair::generate();
    let published = UserInfo::publish("alice", &keypair, &manager)?;

    // Next login: the fetched record is untrusted until verified.
    let fetched: UserInfo = serde_json::from_str(&serde_json::to_string(&published)?)?;
    let verified = fetched.verify(&manager)?;
    assert_eq!(verified.public, keypair.public);

    // A new collection: fresh symmetric key, shared with our own pubkey so
    // another device can recover it.
    let collection_key = CollectionKey::generate();
    let wrapped = wrap_collection_key(&collection_key, &verified.public)?;
    let recovered = verified.unwrap_collection_key(&wrapped)?;
    assert!(collection_key.matches(&recovered));

    // Device A writes the journal: metadata first, then events.
    let info = CollectionInfo::new(CollectionType::Calendar, "Home", None);
    let mut writer = JournalChain::new(journal_manager(&collection_key)?);
    writer.append(&serde_json::to_vec(&info)?)?;
    writer.append(b"event: dentist")?;
    writer.append(b"event: groceries")?;

    // The server stores opaque records only.
    let server: Vec<EntryRecord> = writer.entries().iter().map(|e| e.to_record()).collect();

    // Device B syncs from scratch using the recovered key.
    let mut reader = JournalChain::new(journal_manager(&recovered)?);
    let mut plaintexts = Vec::new();
    for record in &server {
        let entry = JournalEntry::from_record(record)?;
        plaintexts.push(reader.verify_and_append_remote(entry)?.to_vec());
    }

    let synced_info: CollectionInfo = serde_json::from_slice(&plaintexts[0])?;
    assert_eq!(synced_info, info);
    assert_eq!(plaintexts[1], b"event: dentist");
    assert_eq!(plaintexts[2], b"event: groceries");

    // Replay on the reader matches what the writer produced.
    let replayed: Vec<Vec<u8>> = reader
        .replay()
        .map(|r| r.map(|p| p.to_vec()))
        .collect::<std::result::Result<_, _>>()?;
    assert_eq!(replayed, plaintexts);
    Ok(())
}

#[test]
fn server_reordering_is_detected() -> Result<()> {
    let collection_key = CollectionKey::generate();
    let mut writer = JournalChain::new(journal_manager(&collection_key)?);
    writer.append(b"one")?;
    writer.append(b"two")?;

    // A malicious server swaps the two records.
    let mut server: Vec<EntryRecord> = writer.entries().iter().map(|e| e.to_record()).collect();
    server.swap(0, 1);

    let mut reader = JournalChain::new(journal_manager(&collection_key)?);
    let err = reader
        .verify_and_append_remote(JournalEntry::from_record(&server[0])?)
        .unwrap_err();
    assert!(err.is_integrity());
    assert!(reader.is_empty());
    Ok(())
}

#[test]
fn wrong_collection_key_cannot_read_the_journal() -> Result<()> {
    let mut writer = JournalChain::new(journal_manager(&CollectionKey::generate())?);
    let entry = writer.append(b"secret plans")?.clone();

    let mut reader = JournalChain::new(journal_manager(&CollectionKey::generate())?);
    assert!(reader.verify_and_append_remote(entry).unwrap_err().is_integrity());
    Ok(())
}

#[test]
fn data_from_a_newer_client_is_refused() -> Result<()> {
    let key = derive_key("alice", b"correct-horse")?;
    let err = CryptoManager::new(CURRENT_VERSION + 1, &key, USERINFO_CONTEXT).unwrap_err();
    assert!(matches!(err, sj_crypto::CryptoError::VersionTooNew { .. }));
    Ok(())
}
