//! # Protocol Configuration & Constants
//!
//! Every magic number of the root ledger lives here. The operational amounts
//! are expressed in the host chain's smallest unit (nanoevers); the ledger
//! never meters them, it only attaches them to outbound messages so the
//! funding protocol keeps its shape.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full version string of the root ledger protocol.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Version tag written in front of every persisted root state record.
/// Bump it whenever the `RootState` layout changes.
pub const STATE_RECORD_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// Address Derivation
// ---------------------------------------------------------------------------

/// Workchain used when none is configured. Everscale's basechain.
pub const DEFAULT_WORKCHAIN: i8 = 0;

/// BLAKE3 `derive_key` context for wallet account addresses. Changing this
/// string moves every wallet in existence, so don't.
pub const WALLET_ADDRESS_CONTEXT: &str = "tip3-root 2024 wallet state init v1";

/// BLAKE3 `derive_key` context for the root's own address.
pub const ROOT_ADDRESS_CONTEXT: &str = "tip3-root 2024 root state init v1";

// ---------------------------------------------------------------------------
// Fee Transform
// ---------------------------------------------------------------------------

/// Denominator of the batch fee multiplier. A multiplier of 10 000 keeps the
/// amount unchanged, 9 000 keeps 90%.
pub const FEE_DENOMINATOR: u128 = 10_000;

// ---------------------------------------------------------------------------
// Operational Funds
// ---------------------------------------------------------------------------

/// Value attached to every wallet deployment the root pays for.
pub const WALLET_DEPLOY_VALUE: u128 = 10_000_000_000;

/// Top-up a holder wallet receives when it asks the root for funds.
pub const WALLET_TOPUP_VALUE: u128 = 50_000_000_000;

/// Root balance above which no funding request is sent to the checker.
pub const FUNDING_BALANCE_THRESHOLD: u128 = 500_000_000_000;

/// Value attached to a funding request and to redemption notices.
pub const FUNDING_REQUEST_VALUE: u128 = 500_000_000;

/// Value attached to calls into collaborator contracts (new root, DAO,
/// index deployment) and to self-addressed batch steps.
pub const COLLABORATOR_CALL_VALUE: u128 = 1_000_000_000;

// ---------------------------------------------------------------------------
// Timing Constants
// ---------------------------------------------------------------------------

/// Minimum spacing between two funding requests while one is in flight.
pub const FUNDING_COOLDOWN: Duration = Duration::from_secs(300);

/// [`FUNDING_COOLDOWN`] in whole seconds, for comparisons against unix time.
pub const FUNDING_COOLDOWN_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default port for the node's JSON-RPC / REST API.
pub const DEFAULT_RPC_PORT: u16 = 9741;

/// Default port for the Prometheus metrics endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 9742;

/// Capacity of the runtime's inbound command channel.
pub const RUNTIME_CHANNEL_CAPACITY: usize = 1024;
