// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # TIP-3 Root Ledger — Protocol Primitives
//!
//! The building blocks a token root is made of, with none of the root's
//! policy:
//!
//! - **config** — protocol constants: operational amounts, cooldowns,
//!   derivation contexts.
//! - **crypto** — SHA-256 for code hashes, BLAKE3 for everything native.
//! - **identity** — addresses, holder identities, the root owner credential.
//! - **token** — token metadata and the root payload sent to collaborators.
//! - **template** — content-addressed code blobs and pinned verification.
//! - **derivation** — deterministic wallet (and root) address derivation.
//! - **batch** — grant batches and the linear fee transform.
//! - **message** — what the root sends, what bounces back.
//! - **storage** — sled persistence for state records, templates, queues.
//!
//! ## Design Philosophy
//!
//! 1. Pure functions where possible. Derivation never touches state.
//! 2. Verification happens once, at construction. A `VerifiedTemplate` is
//!    proof its hash was checked.
//! 3. Every public type is serializable (serde) for wire transport and
//!    persistent storage.

pub mod batch;
pub mod config;
pub mod crypto;
pub mod derivation;
pub mod identity;
pub mod message;
pub mod storage;
pub mod template;
pub mod token;

pub use batch::{FeeTransform, GrantBatch, GrantEntry};
pub use derivation::{derive_root_address, derive_wallet_address, DerivationContext, WalletData, WalletInit};
pub use identity::{Address, HolderIdentity, IdentityError, OwnerCredential, PublicKey};
pub use message::{DeliveryFailure, Instruction, MessageValue, OutboundMessage, Sender};
pub use template::{CodeBlob, CodeHash, TemplateError, TemplatePin, TemplateStore, VerifiedTemplate};
pub use token::{RootData, TokenMetadata};
