//! # Token Metadata
//!
//! The immutable description of a token: name, symbol, decimals. It is part
//! of every wallet's init data (so two tokens with the same template never
//! share wallet addresses) and of every payload the root sends to its
//! collaborators.

use serde::{Deserialize, Serialize};

/// Immutable token metadata, fixed when the root is created.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Human-readable name, e.g. "Wrapped Ether".
    pub name: String,
    /// Ticker, e.g. "WETH".
    pub symbol: String,
    /// Number of decimal places of the smallest unit.
    pub decimals: u8,
}

impl TokenMetadata {
    /// Builds metadata from its parts.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// Root description attached to messages for the checker, the receiver and
/// trusted DAO contracts. `eth_root` identifies the token on the external
/// chain it is bridged from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootData {
    /// Token name.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Token decimals.
    pub decimals: u8,
    /// External-chain token identifier.
    pub eth_root: [u8; 32],
}

impl RootData {
    /// Builds the payload from metadata and the external identifier.
    pub fn new(metadata: &TokenMetadata, eth_root: [u8; 32]) -> Self {
        Self {
            name: metadata.name.clone(),
            symbol: metadata.symbol.clone(),
            decimals: metadata.decimals,
            eth_root,
        }
    }
}
