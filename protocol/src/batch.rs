//! # Grant Batches
//!
//! A grant batch is a list of `(pubkey, tokens)` entries the checker wants
//! minted, plus a linear fee transform. It never lives in the root's state:
//! it travels inside self-addressed messages, one entry per message, with a
//! cursor that says which entry the next step handles.
//!
//! The fee transform maps an amount to the share the root owner keeps:
//!
//! ```text
//! adjusted = amount * multiplier / 10_000 + offset
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::FEE_DENOMINATOR;
use crate::identity::PublicKey;

/// One pending grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantEntry {
    /// Holder key; batch wallets are always key-only.
    pub pubkey: PublicKey,
    /// Amount to mint for this entry.
    pub tokens: u128,
}

/// `adjusted = amount * multiplier / 10_000 + offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTransform {
    pub multiplier: u128,
    pub offset: u128,
}

impl FeeTransform {
    /// Builds a transform.
    pub fn new(multiplier: u128, offset: u128) -> Self {
        Self { multiplier, offset }
    }

    /// Applies the transform. `None` on u128 overflow.
    pub fn apply(&self, amount: u128) -> Option<u128> {
        amount
            .checked_mul(self.multiplier)?
            .checked_div(FEE_DENOMINATOR)?
            .checked_add(self.offset)
    }
}

/// A batch in flight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantBatch {
    /// Correlates checkpoints and log lines of one batch.
    pub batch_id: Uuid,
    pub entries: Vec<GrantEntry>,
    /// Index of the entry the next step processes.
    pub cursor: u128,
    pub fee: FeeTransform,
}

impl GrantBatch {
    /// A fresh batch positioned at its first entry.
    pub fn new(entries: Vec<GrantEntry>, fee: FeeTransform) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            entries,
            cursor: 0,
            fee,
        }
    }

    /// Entry under the cursor, `None` once the cursor has run off the end.
    pub fn current(&self) -> Option<&GrantEntry> {
        usize::try_from(self.cursor)
            .ok()
            .and_then(|i| self.entries.get(i))
    }

    /// The same batch, one entry further.
    pub fn advanced(&self) -> Self {
        Self {
            cursor: self.cursor.saturating_add(1),
            ..self.clone()
        }
    }
}
