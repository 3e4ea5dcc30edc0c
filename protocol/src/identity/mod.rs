//! # Identity Module
//!
//! Addresses and credentials. Everything the ledger needs to answer two
//! questions: "which account is this?" and "is this caller allowed?".
//!
//! - **address** — `workchain:account_id` addresses.
//! - **credential** — holder identities and the root owner credential.

pub mod address;
pub mod credential;

pub use address::Address;
pub use credential::{HolderIdentity, OwnerCredential, PublicKey};

use thiserror::Error;

/// Errors produced while parsing or validating identities.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The string is not a `workchain:hex` address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The key is not 32 bytes of hex.
    #[error("invalid public key: expected 32 hex-encoded bytes")]
    InvalidPublicKey,

    /// Neither a public key nor an owning account was given.
    #[error("define a public key or an internal owner")]
    MissingCredential,

    /// Both a public key and an owning account were given where exactly one
    /// is allowed.
    #[error("a root owner is either a public key or an internal account, not both")]
    ConflictingCredentials,
}
