//! # Migration and Trusted Grants
//!
//! Two ways tokens arrive from outside the owner's control:
//!
//! - **Migration.** A holder burns on the old root, which asks this root
//!   to replay the grant. The counters were already moved on the old root,
//!   so here the grant is a pure credit: no counter changes.
//! - **Trusted grant.** The trusted DAO contract mints straight into a
//!   holder's wallet: supply and granted grow together.

use tip3_protocol::config::WALLET_DEPLOY_VALUE;
use tip3_protocol::{
    HolderIdentity, Instruction, MessageValue, OutboundMessage, PublicKey, WalletInit,
};
use tracing::debug;

use super::{CallContext, Receipt, RootContract, RootError};

impl RootContract {
    /// Replays a grant burned on the old root. Only the old root may call.
    pub fn accept_migrated_grant(
        &mut self,
        ctx: &CallContext,
        holder: HolderIdentity,
        tokens: u128,
    ) -> Result<Receipt<()>, RootError> {
        Self::ensure_sender(ctx, self.state.topology.old_root)?;
        holder.validate()?;
        let (init, wallet) = self.derive_wallet(&holder)?;

        let mut messages = Vec::new();
        self.request_funds_if_low(ctx, &mut messages);
        self.push_credit(&mut messages, init, tokens);

        debug!(holder = ?holder, wallet = %wallet, tokens = %tokens, "migrated grant replayed");
        Ok(Receipt::new((), messages))
    }

    /// Mints `value` into `pubkey`'s wallet. Only the trusted contract may
    /// call.
    pub fn grant_trusted(
        &mut self,
        ctx: &CallContext,
        pubkey: PublicKey,
        value: u128,
    ) -> Result<Receipt<()>, RootError> {
        Self::ensure_sender(ctx, self.state.topology.trusted)?;
        let holder = HolderIdentity::new(pubkey, None)?;
        let (init, wallet) = self.derive_wallet(&holder)?;

        let mut ledger = self.state.ledger.clone();
        ledger.mint_and_grant(value)?;

        let mut messages = Vec::new();
        self.request_funds_if_low(ctx, &mut messages);
        self.push_credit(&mut messages, init, value);
        self.state.ledger = ledger;

        debug!(wallet = %wallet, value = %value, "trusted grant");
        Ok(Receipt::new((), messages))
    }

    /// Deploy (no-op if present), then a zero-fee credit answering to the
    /// root.
    fn push_credit(
        &self,
        messages: &mut Vec<OutboundMessage>,
        init: WalletInit,
        tokens: u128,
    ) {
        let value = MessageValue::Fixed(WALLET_DEPLOY_VALUE);
        let wallet = init.address();
        messages.push(OutboundMessage::deploy(init, value));
        messages.push(OutboundMessage::call(
            wallet,
            value,
            Instruction::AcceptMint {
                tokens,
                answer_to: self.address,
                funds: 0,
                notify: None,
            },
        ));
    }
}
