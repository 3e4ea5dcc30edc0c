//! # Storage Module
//!
//! Persistent storage for a root ledger node:
//!
//! ```text
//! db.rs — sled-backed LedgerDb: state record, template blobs,
//!         pending message queue, wallet accounts
//! ```
//!
//! Bincode for on-disk serialization. JSON is for APIs and config files;
//! bincode is for storage.

pub mod db;

pub use db::{Checkpoint, DbError, DbResult, LedgerDb};
