//! # CLI Interface
//!
//! Command-line structure of `tip3-node`, built with `clap` derive.
//! Four subcommands: `init`, `run`, `status`, `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use tip3_protocol::config::{DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT, DEFAULT_WORKCHAIN};
use tip3_protocol::Address;

use crate::config::AccountKey;
use crate::logging::LogFormat;

/// TIP-3 token root node.
///
/// Hosts one token root: accepts signed operations over JSON-RPC, delivers
/// the messages the root emits to simulated wallet accounts, and persists
/// everything to a local sled database.
#[derive(Parser, Debug)]
#[command(
    name = "tip3-node",
    about = "TIP-3 token root node",
    version,
    propagate_version = true
)]
pub struct Tip3NodeCli {
    /// Log output format.
    #[arg(long, global = true, env = "TIP3_LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Debug-level logging for the node and contract crates.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a data directory: owner key, wallet template, `root.json`.
    Init(InitArgs),
    /// Start the node from an initialized data directory.
    Run(RunArgs),
    /// Query the status of a running node via its REST endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `init` subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Data directory to initialize. Must not already hold a `root.json`.
    #[arg(long, short = 'd', env = "TIP3_DATA_DIR", default_value = "./tip3-data")]
    pub data_dir: PathBuf,

    /// Token name.
    #[arg(long)]
    pub name: String,

    /// Token symbol.
    #[arg(long)]
    pub symbol: String,

    /// Decimal places.
    #[arg(long, default_value_t = 9)]
    pub decimals: u8,

    /// Initial total supply, in the token's smallest unit.
    #[arg(long, default_value_t = 0)]
    pub total_supply: u128,

    /// File holding the wallet code. Its hash becomes the template pin.
    #[arg(long)]
    pub wallet_code: PathBuf,

    /// Install the wallet template later with `root_setWalletTemplate`
    /// instead of at initialization.
    #[arg(long)]
    pub defer_template: bool,

    /// Checker account: funds the root, starts batches.
    #[arg(long)]
    pub checker: Address,

    /// Receiver account: notified of redemption burns.
    #[arg(long)]
    pub receiver: Address,

    /// Make the root owned by this internal account instead of the
    /// generated key.
    #[arg(long)]
    pub owner: Option<Address>,

    /// Trusted DAO account allowed to mint and receive burns.
    #[arg(long)]
    pub trusted: Option<Address>,

    /// Root this one migrates from.
    #[arg(long)]
    pub old_root: Option<Address>,

    /// Hex-encoded 32-byte identifier of the token on the bridged chain.
    #[arg(long)]
    pub eth_root: Option<String>,

    /// Workchain the root and its wallets live in.
    #[arg(long, default_value_t = DEFAULT_WORKCHAIN, allow_hyphen_values = true)]
    pub workchain: i8,

    /// Operational balance the simulated root starts with.
    #[arg(long, default_value_t = 1_000_000_000_000)]
    pub initial_balance: u128,

    /// Signing key of an account the node relays calls for, such as the
    /// checker. Repeatable.
    #[arg(long = "account-key", value_name = "ADDRESS=PUBKEY")]
    pub account_keys: Vec<AccountKey>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Initialized data directory.
    #[arg(long, short = 'd', env = "TIP3_DATA_DIR", default_value = "./tip3-data")]
    pub data_dir: PathBuf,

    /// Port for the JSON-RPC and REST API. Overrides `root.json`.
    #[arg(long, env = "TIP3_RPC_PORT")]
    pub rpc_port: Option<u16>,

    /// Port for the Prometheus metrics endpoint. Overrides `root.json`.
    #[arg(long, env = "TIP3_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for the `status` subcommand.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// REST endpoint of the running node.
    #[arg(long, env = "TIP3_RPC_URL", default_value_t = format!("http://127.0.0.1:{DEFAULT_RPC_PORT}"))]
    pub rpc_url: String,
}

/// Ports written into a fresh `root.json`.
pub fn default_ports() -> (u16, u16) {
    (DEFAULT_RPC_PORT, DEFAULT_METRICS_PORT)
}
