//! # Node Configuration
//!
//! `root.json` in the data directory: everything `tip3-node run` needs to
//! bring a root up, written once by `tip3-node init`.
//!
//! ```text
//! <data-dir>/
//!   root.json      — this file
//!   owner.key      — hex Ed25519 secret key of the root owner (0600)
//!   db/            — sled: state record, templates, queue, wallets
//! ```
//!
//! The wallet code itself never goes in here; only its pinned hash does.
//! The blob lives in the database's template tree.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tip3_contracts::InitParams;
use tip3_protocol::{Address, CodeHash, PublicKey, TemplatePin};

/// File name of the config inside the data directory.
pub const CONFIG_FILE: &str = "root.json";

/// File name of the owner key inside the data directory.
pub const OWNER_KEY_FILE: &str = "owner.key";

/// Directory name of the sled database inside the data directory.
pub const DB_DIR: &str = "db";

/// Persistent node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// The root's own address, derived at init.
    pub address: Address,
    /// Hash of the logic the root starts with.
    pub logic_hash: CodeHash,
    /// Pinned wallet code hash.
    pub wallet_pin: TemplatePin,
    /// Install the pinned template at initialization. When false the
    /// operator calls `root_setWalletTemplate` later.
    pub install_template: bool,
    /// Constructor arguments. `wallet_code` is always `None` on disk.
    pub params: InitParams,
    /// Operational balance of the simulated root account at first start.
    pub initial_balance: u128,
    /// Accounts outside the wallet book the node relays calls for: the
    /// checker, the trusted and old roots, an owning account. A call from
    /// one of them must be signed by its key.
    #[serde(default)]
    pub accounts: Vec<AccountKey>,
    pub rpc_port: u16,
    pub metrics_port: u16,
}

/// An account address and the key that signs its calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKey {
    pub address: Address,
    pub pubkey: PublicKey,
}

/// Parses `<wc>:<hex>=<pubkey hex>`.
impl std::str::FromStr for AccountKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, pubkey) = s
            .split_once('=')
            .ok_or_else(|| format!("expected ADDRESS=PUBKEY, got {s:?}"))?;
        let address = address.parse::<Address>().map_err(|e| e.to_string())?;
        let pubkey = PublicKey::from_hex(pubkey).map_err(|e| e.to_string())?;
        if pubkey.is_zero() {
            return Err("account key must not be zero".into());
        }
        Ok(Self { address, pubkey })
    }
}

impl NodeConfig {
    /// Reads `root.json` from `data_dir`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Writes `root.json` into `data_dir`.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self).context("serializing config")?;
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))
    }

    /// Path of the sled database.
    pub fn db_path(data_dir: &Path) -> PathBuf {
        data_dir.join(DB_DIR)
    }

    /// The configured signing key of `address`, if any.
    pub fn account_key(&self, address: &Address) -> Option<PublicKey> {
        self.accounts
            .iter()
            .find(|account| account.address == *address)
            .map(|account| account.pubkey)
    }
}
