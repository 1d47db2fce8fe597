//! BLAKE3 hash utilities
//!
//! - Plain digests (entry content addressing)
//! - Keyed entry tags: each journal entry commits to its predecessor's
//!   tag, so reordering or re-chaining is detectable.
//! - Constant-time comparison for anything an attacker may vary.

/// Sentinel predecessor hash for the first entry of a journal.
pub const SENTINEL: [u8; 32] = [0u8; 32];

pub fn digest(data: &[u8]) -> [u8; 32] {
    blake3::hash(data).into()
}

/// Authentication tag for a journal entry.
///
/// Keyed BLAKE3 over a domain string, the predecessor's tag, and the
/// ciphertext digest. Covering `prev` means an entry cannot be moved
/// under a different predecessor without the tag failing.
pub fn entry_tag(mac_key: &[u8; 32], prev: &[u8; 32], ciphertext: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_keyed(mac_key);
    hasher.update(b"sj-entry-v1\x00");
    hasher.update(prev);
    hasher.update(b"\x00");
    // Digest the ciphertext rather than feeding all bytes twice into the
    // keyed hasher; large entries stay cheap to re-verify.
    hasher.update(digest(ciphertext).as_slice());
    hasher.finalize().into()
}

/// Constant-time comparison to prevent timing side channels.
pub fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
