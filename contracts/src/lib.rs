//! # TIP-3 Root Ledger Contracts
//!
//! The token root: the single authority over a token's supply and the only
//! party able to credit holder wallets.
//!
//! - **Supply Ledger** — `total_supply`, `total_granted`, `burn_count`, and
//!   the invariant `total_granted <= total_supply`.
//! - **Wallet Lifecycle** — idempotent wallet provisioning and credits.
//! - **Batch Granter** — self-resubmitting batch grants with a fee split.
//! - **Migration** — replaying grants burned on a predecessor root.
//! - **Reconciliation** — taking back grants whose credit bounced.
//!
//! ## Design Principles
//!
//! 1. All counters use checked arithmetic. Overflow is an error, never a
//!    wrap.
//! 2. Validate, then mutate. A rejected call leaves no trace.
//! 3. Operations return the messages they want sent instead of sending
//!    them; the host owns delivery.
//! 4. Every persisted type is serializable (serde) and the state record is
//!    versioned.

pub mod root;

pub use root::{
    BatchStep, CallContext, FundingState, InitParams, Receipt, RootContract, RootError, RootState,
    SupplyLedger, Topology,
};
