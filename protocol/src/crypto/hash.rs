//! # Hashing Utilities
//!
//! Two hash functions, each with a job:
//!
//! - **SHA-256** — code hashes. The host chain pins wallet code by its
//!   SHA-256 representation hash, so template verification has to speak the
//!   same language.
//!
//! - **BLAKE3** — everything native to the ledger, most importantly account
//!   address derivation. Addresses are derived with BLAKE3's `derive_key`
//!   mode so a wallet address can never collide with a root address or any
//!   other hash computed over the same bytes.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash and return a fixed-size array.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute a domain-separated hash of several parts using BLAKE3's
/// `derive_key` mode.
///
/// The parts are fed to the hasher in order without an intermediate buffer.
/// Callers that hash variable-length parts must make the encoding
/// unambiguous themselves (fixed-width fields, or a self-delimiting encoding
/// such as bincode).
pub fn domain_separated_hash(context: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        let hash = sha256_array(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn domain_separated_is_deterministic() {
        let a = domain_separated_hash("ctx", &[b"tip3".as_slice()]);
        let b = domain_separated_hash("ctx", &[b"tip3".as_slice()]);
        assert_eq!(a, b);
        assert_ne!(a, domain_separated_hash("ctx", &[b"TIP3".as_slice()]));
    }

    #[test]
    fn test_domain_separation() {
        let data: &[u8] = b"same data";
        let hash_a = domain_separated_hash("context-a", &[data]);
        let hash_b = domain_separated_hash("context-b", &[data]);
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn test_domain_separated_is_not_plain_blake3() {
        let data: &[u8] = b"test data";
        assert_ne!(*blake3::hash(data).as_bytes(), domain_separated_hash("tip3-test", &[data]));
    }

    #[test]
    fn multipart_equals_concatenation() {
        let split = domain_separated_hash("ctx", &[b"hello".as_slice(), b" world".as_slice()]);
        let whole = domain_separated_hash("ctx", &[b"hello world".as_slice()]);
        assert_eq!(split, whole);
    }
}
