//! sj_journal — tamper-evident encrypted journal chain
//!
//! The server stores only opaque records produced here: hash-chained,
//! authenticated ciphertext entries plus published identity records. It
//! can neither read content nor silently reorder, drop, or forge history
//! without a verification failure on the client.
//!
//! # Module layout
//! - `entry`      — `JournalEntry` + its wire record
//! - `chain`      — `JournalChain`: append / verify-and-append / replay
//! - `userinfo`   — published identity records and their verification
//! - `collection` — encrypted per-journal metadata (`CollectionInfo`)
//! - `error`      — unified error type
//!
//! All operations are synchronous and CPU-bound; I/O belongs to the
//! transport and persistence layers feeding bytes in and out. A chain
//! instance is single-writer: callers serialize appends themselves.

pub mod chain;
pub mod collection;
pub mod entry;
pub mod error;
pub mod userinfo;

pub use chain::JournalChain;
pub use collection::{CollectionInfo, CollectionType};
pub use entry::{EntryRecord, JournalEntry};
pub use error::JournalError;
pub use userinfo::UserInfo;
