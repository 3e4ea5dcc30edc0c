//! # Account Addresses
//!
//! A root ledger address is the host chain's standard address: a signed
//! workchain byte plus a 32-byte account id. The textual form is the usual
//! `workchain:hex` (`0:3f2a...`), which is what operators paste into config
//! files and what the node prints in logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::IdentityError;

/// A standard account address: `workchain:account_id`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address {
    workchain: i8,
    id: [u8; 32],
}

impl Address {
    /// Creates an address from its parts.
    pub const fn new(workchain: i8, id: [u8; 32]) -> Self {
        Self { workchain, id }
    }

    /// Workchain this account lives in.
    pub fn workchain(&self) -> i8 {
        self.workchain
    }

    /// Raw 32-byte account id.
    pub fn id(&self) -> &[u8; 32] {
        &self.id
    }

    /// Serializes to 33 bytes: the workchain followed by the account id.
    /// Used wherever an address is fed into a hash.
    pub fn to_bytes(&self) -> [u8; 33] {
        let mut out = [0u8; 33];
        out[0] = self.workchain as u8;
        out[1..].copy_from_slice(&self.id);
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, hex::encode(self.id))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (wc, hex_id) = s
            .split_once(':')
            .ok_or_else(|| IdentityError::InvalidAddress(s.to_string()))?;

        let workchain: i8 = wc
            .parse()
            .map_err(|_| IdentityError::InvalidAddress(s.to_string()))?;

        let bytes = hex::decode(hex_id).map_err(|_| IdentityError::InvalidAddress(s.to_string()))?;
        let id: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| IdentityError::InvalidAddress(s.to_string()))?;

        Ok(Self { workchain, id })
    }
}
