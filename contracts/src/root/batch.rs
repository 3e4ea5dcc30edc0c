//! # Batch Grants
//!
//! The checker submits a list of `(pubkey, tokens)` entries and a fee
//! transform. The root mints and grants them one entry per step, each step
//! sending the next one to itself:
//!
//! ```text
//! start_batch ──▶ ProcessBatchStep{cursor 0} ──▶ … ──▶ ProcessBatchStep{cursor n}
//!                        │                                      │
//!               mint, credit holder + owner            Completed, nothing sent
//! ```
//!
//! For an entry of `amount` with `adjusted = fee(amount)`:
//!
//! - `adjusted < amount`: the holder gets `amount - adjusted`, the owner's
//!   wallet gets `adjusted`.
//! - otherwise the owner's wallet gets the whole `amount` and the holder
//!   nothing.
//!
//! Either way supply and granted both grow by `amount`.

use tip3_protocol::config::{COLLABORATOR_CALL_VALUE, WALLET_DEPLOY_VALUE};
use tip3_protocol::{
    FeeTransform, GrantBatch, GrantEntry, HolderIdentity, Instruction, MessageValue,
    OutboundMessage,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{CallContext, Receipt, RootContract, RootError};

/// Outcome of one batch step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchStep {
    /// An entry was granted and the next step was sent.
    Continued {
        /// Cursor of the entry just processed.
        cursor: u128,
        holder_share: u128,
        owner_share: u128,
    },
    /// The cursor ran past the last entry. Nothing was sent.
    Completed { batch_id: Uuid },
}

impl RootContract {
    /// Starts a batch. Only the checker may.
    pub fn start_batch(
        &mut self,
        ctx: &CallContext,
        entries: Vec<GrantEntry>,
        multiplier: u128,
        offset: u128,
    ) -> Result<Receipt<Uuid>, RootError> {
        Self::ensure_sender(ctx, Some(self.state.topology.checker))?;
        self.template()?;
        if let Some(bad) = entries.iter().position(|e| e.pubkey.is_zero()) {
            return Err(RootError::InvalidConfiguration(format!(
                "batch entry {bad} has no public key"
            )));
        }

        let batch = GrantBatch::new(entries, FeeTransform::new(multiplier, offset));
        let batch_id = batch.batch_id;
        let count = batch.entries.len();

        let mut messages = Vec::new();
        self.request_funds_if_low(ctx, &mut messages);
        messages.push(self.next_step(batch));

        info!(%batch_id, entries = count, multiplier = %multiplier, offset = %offset, "batch started");
        Ok(Receipt::new(batch_id, messages))
    }

    /// Processes the entry under the batch cursor. Only the root itself may
    /// call this.
    ///
    /// # Errors
    ///
    /// - [`RootError::Unauthorized`] from anyone but the root.
    /// - [`RootError::ArithmeticOverflow`] if the fee transform or the
    ///   counters overflow. The step is dropped and the batch stops there.
    pub fn process_batch_step(
        &mut self,
        ctx: &CallContext,
        batch: GrantBatch,
    ) -> Result<Receipt<BatchStep>, RootError> {
        Self::ensure_sender(ctx, Some(self.address))?;

        let Some(entry) = batch.current().copied() else {
            info!(batch_id = %batch.batch_id, entries = batch.entries.len(), "batch completed");
            return Ok(Receipt::new(
                BatchStep::Completed {
                    batch_id: batch.batch_id,
                },
                Vec::new(),
            ));
        };

        let amount = entry.tokens;
        let adjusted = batch.fee.apply(amount).ok_or(RootError::ArithmeticOverflow)?;
        let (holder_share, owner_share) = if adjusted < amount {
            (amount - adjusted, adjusted)
        } else {
            (0, amount)
        };

        let mut ledger = self.state.ledger.clone();
        ledger.mint_and_grant(amount)?;

        let answer_to = self.address;
        let credit = |tokens| Instruction::AcceptMint {
            tokens,
            answer_to,
            funds: 0,
            notify: None,
        };
        let value = MessageValue::Fixed(WALLET_DEPLOY_VALUE);

        let mut messages = Vec::new();
        self.request_funds_if_low(ctx, &mut messages);
        if adjusted < amount {
            let (init, wallet) = self.derive_wallet(&HolderIdentity::from_pubkey(entry.pubkey))?;
            messages.push(OutboundMessage::deploy(init, value));
            messages.push(OutboundMessage::call(wallet, value, credit(holder_share)));
        } else {
            warn!(
                batch_id = %batch.batch_id,
                cursor = %batch.cursor,
                amount = %amount,
                adjusted = %adjusted,
                "fee consumes the whole entry, crediting owner only"
            );
        }
        let (_, owner_wallet) = self.owner_wallet()?;
        messages.push(OutboundMessage::call(owner_wallet, value, credit(owner_share)));

        let cursor = batch.cursor;
        messages.push(self.next_step(batch.advanced()));
        self.state.ledger = ledger;

        debug!(cursor = %cursor, holder = %entry.pubkey, holder_share = %holder_share, owner_share = %owner_share, "batch entry granted");
        Ok(Receipt::new(
            BatchStep::Continued {
                cursor,
                holder_share,
                owner_share,
            },
            messages,
        ))
    }

    fn next_step(&self, batch: GrantBatch) -> OutboundMessage {
        OutboundMessage::call(
            self.address,
            MessageValue::Fixed(COLLABORATOR_CALL_VALUE),
            Instruction::ProcessBatchStep { batch },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{checker, root, root_address, NOW, RICH};
    use super::*;
    use tip3_protocol::PublicKey;

    fn entry(b: u8, tokens: u128) -> GrantEntry {
        GrantEntry {
            pubkey: PublicKey::from_bytes([b; 32]),
            tokens,
        }
    }

    fn self_ctx() -> CallContext {
        CallContext::internal(root_address(), NOW, RICH, COLLABORATOR_CALL_VALUE)
    }

    fn checker_ctx() -> CallContext {
        CallContext::internal(checker(), NOW, RICH, 0)
    }

    fn next_batch(messages: &[OutboundMessage]) -> GrantBatch {
        match &messages.last().unwrap().body {
            Some(Instruction::ProcessBatchStep { batch }) => batch.clone(),
            other => panic!("expected a batch step, got {other:?}"),
        }
    }

    #[test]
    fn only_checker_starts_batches() {
        let mut root = root(0);
        let stranger = CallContext::internal(root_address(), NOW, RICH, 0);
        assert_eq!(
            root.start_batch(&stranger, vec![entry(1, 1)], 0, 0).unwrap_err(),
            RootError::Unauthorized
        );
    }

    #[test]
    fn only_root_processes_steps() {
        let mut root = root(0);
        let batch = GrantBatch::new(vec![entry(1, 1)], FeeTransform::new(0, 0));
        assert_eq!(
            root.process_batch_step(&checker_ctx(), batch).unwrap_err(),
            RootError::Unauthorized
        );
        assert_eq!(root.total_supply(), 0);
    }

    #[test]
    fn start_emits_first_step_to_self() {
        let mut root = root(0);
        let receipt = root.start_batch(&checker_ctx(), vec![entry(1, 10)], 9_000, 5).unwrap();
        let msg = receipt.messages.last().unwrap();
        assert_eq!(msg.dest, root_address());
        let batch = next_batch(&receipt.messages);
        assert_eq!(batch.cursor, 0);
        assert_eq!(batch.batch_id, receipt.value);
    }

    #[test]
    fn zero_key_entries_are_refused() {
        let mut root = root(0);
        let bad = GrantEntry {
            pubkey: PublicKey::ZERO,
            tokens: 1,
        };
        assert!(root.start_batch(&checker_ctx(), vec![bad], 0, 0).is_err());
    }

    #[test]
    fn step_splits_amount_between_holder_and_owner() {
        let mut root = root(0);
        let batch = GrantBatch::new(vec![entry(1, 100)], FeeTransform::new(9_000, 5));
        let receipt = root.process_batch_step(&self_ctx(), batch).unwrap();
        assert_eq!(
            receipt.value,
            BatchStep::Continued {
                cursor: 0,
                holder_share: 5,
                owner_share: 95
            }
        );
        // deploy, holder credit, owner credit, next step
        assert_eq!(receipt.messages.len(), 4);
        assert_eq!(root.total_supply(), 100);
        assert_eq!(root.total_granted(), 100);
        assert_eq!(next_batch(&receipt.messages).cursor, 1);
    }

    #[test]
    fn degenerate_fee_credits_owner_only() {
        let mut root = root(0);
        let batch = GrantBatch::new(vec![entry(1, 10)], FeeTransform::new(10_000, 1));
        let receipt = root.process_batch_step(&self_ctx(), batch).unwrap();
        assert_eq!(
            receipt.value,
            BatchStep::Continued {
                cursor: 0,
                holder_share: 0,
                owner_share: 10
            }
        );
        // owner credit, next step
        assert_eq!(receipt.messages.len(), 2);
        let owner_wallet = root.owner_wallet().unwrap().1;
        assert_eq!(receipt.messages[0].dest, owner_wallet);
        assert_eq!(receipt.messages[0].minted_tokens(), Some(10));
        assert_eq!(root.total_granted(), 10);
    }

    #[test]
    fn exhausted_batch_completes_silently() {
        let mut root = root(0);
        let batch = GrantBatch::new(vec![entry(1, 10)], FeeTransform::new(0, 0)).advanced();
        let id = batch.batch_id;
        let receipt = root.process_batch_step(&self_ctx(), batch).unwrap();
        assert_eq!(receipt.value, BatchStep::Completed { batch_id: id });
        assert!(receipt.messages.is_empty());
        assert_eq!(root.total_supply(), 0);
    }

    #[test]
    fn overflowing_fee_drops_the_step() {
        let mut root = root(0);
        let batch = GrantBatch::new(vec![entry(1, u128::MAX)], FeeTransform::new(2, 0));
        assert_eq!(
            root.process_batch_step(&self_ctx(), batch).unwrap_err(),
            RootError::ArithmeticOverflow
        );
        assert_eq!(root.total_supply(), 0);
    }
}
