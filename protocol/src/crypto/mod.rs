//! # Cryptographic Primitives
//!
//! Hashing only. Signature verification of external callers is the host
//! chain's job; by the time a call reaches the ledger its sender has already
//! been authenticated.

pub mod hash;

pub use hash::{domain_separated_hash, sha256_array};
