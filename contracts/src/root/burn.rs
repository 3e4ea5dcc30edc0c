//! # Burns
//!
//! A wallet destroys tokens it holds and tells the root, which shrinks the
//! supply and forwards the burn to whoever acts on it:
//!
//! ```text
//! burn              → receiver   RedeemBurned        (redeem on the external chain)
//! burn_to_new_root  → new root   DeployUpgradeWallet (replayed as a grant there)
//! burn_to_trusted   → trusted    ReturnTokenToDao
//! ```
//!
//! Only the holder's own wallet may report a burn; the sender is checked by
//! re-deriving the wallet address.

use tip3_protocol::config::{COLLABORATOR_CALL_VALUE, FUNDING_REQUEST_VALUE};
use tip3_protocol::{Address, HolderIdentity, Instruction, MessageValue, OutboundMessage};
use tracing::debug;

use super::{CallContext, Receipt, RootContract, RootError};

impl RootContract {
    /// Burns `tokens` for redemption at external address `to`.
    pub fn burn(
        &mut self,
        ctx: &CallContext,
        holder: HolderIdentity,
        tokens: u128,
        to: [u8; 32],
    ) -> Result<Receipt<()>, RootError> {
        let wallet = self.ensure_wallet_sender(ctx, &holder)?;

        let mut ledger = self.state.ledger.clone();
        ledger.burn(tokens)?;
        ledger.record_redemption()?;

        let mut messages = Vec::new();
        self.request_funds_if_low(ctx, &mut messages);
        messages.push(OutboundMessage::call(
            self.state.topology.receiver,
            MessageValue::Fixed(FUNDING_REQUEST_VALUE),
            Instruction::RedeemBurned {
                root: self.state.root_data(),
                pubkey: holder.pubkey,
                owner: holder.owner,
                tokens,
                to,
            },
        ));
        self.state.ledger = ledger;

        debug!(wallet = %wallet, tokens = %tokens, burn_count = %self.burn_count(), "tokens burned for redemption");
        Ok(Receipt::new((), messages))
    }

    /// Burns `tokens` here so the new root can grant them again.
    pub fn burn_to_new_root(
        &mut self,
        ctx: &CallContext,
        holder: HolderIdentity,
        tokens: u128,
    ) -> Result<Receipt<()>, RootError> {
        let wallet = self.ensure_wallet_sender(ctx, &holder)?;
        let new_root = self
            .state
            .topology
            .new_root
            .ok_or_else(|| RootError::InvalidConfiguration("new root not set".into()))?;

        let mut ledger = self.state.ledger.clone();
        ledger.burn(tokens)?;

        let mut messages = Vec::new();
        self.request_funds_if_low(ctx, &mut messages);
        messages.push(OutboundMessage::call(
            new_root,
            MessageValue::Fixed(COLLABORATOR_CALL_VALUE),
            Instruction::DeployUpgradeWallet {
                pubkey: holder.pubkey,
                owner: holder.owner,
                tokens,
            },
        ));
        self.state.ledger = ledger;

        debug!(wallet = %wallet, new_root = %new_root, tokens = %tokens, "tokens burned for migration");
        Ok(Receipt::new((), messages))
    }

    /// Burns `tokens` and hands them to the trusted DAO contract.
    pub fn burn_to_trusted(
        &mut self,
        ctx: &CallContext,
        system_contract: Address,
        pubaddr: Address,
        holder: HolderIdentity,
        tokens: u128,
    ) -> Result<Receipt<()>, RootError> {
        let trusted = self
            .state
            .topology
            .trusted
            .ok_or_else(|| RootError::InvalidConfiguration("trusted contract not set".into()))?;
        let wallet = self.ensure_wallet_sender(ctx, &holder)?;

        let mut ledger = self.state.ledger.clone();
        ledger.burn(tokens)?;

        let mut messages = Vec::new();
        self.request_funds_if_low(ctx, &mut messages);
        messages.push(OutboundMessage::call(
            trusted,
            MessageValue::Fixed(COLLABORATOR_CALL_VALUE),
            Instruction::ReturnTokenToDao {
                system_contract,
                root: self.state.root_data(),
                pubaddr,
                tokens,
            },
        ));
        self.state.ledger = ledger;

        debug!(wallet = %wallet, trusted = %trusted, tokens = %tokens, "tokens returned to dao");
        Ok(Receipt::new((), messages))
    }
}
