//! # Wallet Lifecycle
//!
//! Creating holder wallets and crediting them.
//!
//! A wallet is created by attaching its init record to a message: if the
//! account already exists the host ignores the init, so provisioning is
//! idempotent and never fails because a wallet is already there.
//!
//! | Operation               | Caller          | Effect                         |
//! |-------------------------|-----------------|--------------------------------|
//! | `grant_tokens`          | owner           | deploy + credit, granted += n  |
//! | `provision_wallet`      | anyone          | deploy only                    |
//! | `provision_wallet_free` | anyone          | deploy only, root pays         |
//! | `request_funding`       | holder's wallet | top-up transfer                |
//! | `request_index`         | holder's wallet | DeployIndex → checker          |

use tip3_protocol::config::{COLLABORATOR_CALL_VALUE, WALLET_DEPLOY_VALUE, WALLET_TOPUP_VALUE};
use tip3_protocol::{Address, HolderIdentity, Instruction, MessageValue, OutboundMessage, PublicKey, Sender};
use tracing::debug;

use super::{CallContext, Receipt, RootContract, RootError};

impl RootContract {
    /// Credits `tokens` to `holder`'s wallet, creating it if needed.
    ///
    /// The credit travels in a single message carrying both the wallet init
    /// and the `AcceptMint` body. `total_granted` moves only once that
    /// message exists. If it bounces, `on_delivery_failure` takes the grant
    /// back.
    ///
    /// For a key owner the message carries `funds` and the wallet answers
    /// to the root. For an account owner the root's own balance is reserved,
    /// the message carries whatever the caller attached, and the wallet
    /// answers to the caller.
    ///
    /// # Errors
    ///
    /// - [`RootError::InvalidConfiguration`] without a wallet template or
    ///   with an empty holder identity.
    /// - [`RootError::InsufficientSupply`] if the grant exceeds the supply.
    /// - [`RootError::Unauthorized`] unless called by the owner.
    pub fn grant_tokens(
        &mut self,
        ctx: &CallContext,
        holder: HolderIdentity,
        tokens: u128,
        funds: u128,
        notify: Option<Vec<u8>>,
    ) -> Result<Receipt<Address>, RootError> {
        self.template()?;
        self.state.ledger.ensure_grantable(tokens)?;
        holder.validate()?;
        self.ensure_owner(ctx)?;

        let (answer_to, value) = match ctx.sender {
            Sender::Internal(caller) => (caller, MessageValue::AllRemaining),
            Sender::External(_) => (self.address, MessageValue::Fixed(funds)),
        };
        let (init, dest) = self.derive_wallet(&holder)?;

        let mut messages = Vec::new();
        self.request_funds_if_low(ctx, &mut messages);
        messages.push(OutboundMessage::deploy_and_call(
            init,
            value,
            Instruction::AcceptMint {
                tokens,
                answer_to,
                funds,
                notify,
            },
        ));
        self.state.ledger.grant(tokens)?;

        debug!(holder = ?holder, wallet = %dest, tokens = %tokens, "tokens granted");
        Ok(Receipt::new(dest, messages))
    }

    /// Deploys `holder`'s wallet without crediting it.
    ///
    /// The deploy carries `funds` out of the inbound value; the root's own
    /// balance is reserved and the remainder returns to the caller.
    pub fn provision_wallet(
        &mut self,
        ctx: &CallContext,
        holder: HolderIdentity,
        funds: u128,
    ) -> Result<Receipt<Address>, RootError> {
        self.template()?;
        holder.validate()?;
        let (init, dest) = self.derive_wallet(&holder)?;

        let mut messages = Vec::new();
        self.request_funds_if_low(ctx, &mut messages);
        messages.push(OutboundMessage::deploy(init, MessageValue::Fixed(funds)));

        debug!(holder = ?holder, wallet = %dest, "wallet provisioned");
        Ok(Receipt::new(dest, messages))
    }

    /// Deploys a key-only wallet for `pubkey`, paid for by the root.
    pub fn provision_wallet_free(
        &mut self,
        ctx: &CallContext,
        pubkey: PublicKey,
    ) -> Result<Receipt<Address>, RootError> {
        self.template()?;
        let holder = HolderIdentity::new(pubkey, None)?;
        let (init, dest) = self.derive_wallet(&holder)?;

        let mut messages = Vec::new();
        self.request_funds_if_low(ctx, &mut messages);
        messages.push(OutboundMessage::deploy(
            init,
            MessageValue::Fixed(WALLET_DEPLOY_VALUE),
        ));

        debug!(pubkey = %pubkey, wallet = %dest, "free wallet provisioned");
        Ok(Receipt::new(dest, messages))
    }

    /// A wallet asks for gas. Only the holder's own wallet may ask.
    pub fn request_funding(
        &mut self,
        ctx: &CallContext,
        holder: HolderIdentity,
    ) -> Result<Receipt<()>, RootError> {
        let wallet = self.ensure_wallet_sender(ctx, &holder)?;

        let mut messages = vec![OutboundMessage::transfer(wallet, WALLET_TOPUP_VALUE)];
        self.request_funds_if_low(ctx, &mut messages);

        debug!(wallet = %wallet, "wallet topped up");
        Ok(Receipt::new((), messages))
    }

    /// A wallet asks for a search index. Forwarded to the checker.
    pub fn request_index(
        &mut self,
        ctx: &CallContext,
        holder: HolderIdentity,
    ) -> Result<Receipt<()>, RootError> {
        let wallet = self.ensure_wallet_sender(ctx, &holder)?;

        let mut messages = vec![OutboundMessage::call(
            self.state.topology.checker,
            MessageValue::Fixed(COLLABORATOR_CALL_VALUE),
            Instruction::DeployIndex {
                root: self.state.root_data(),
                pubkey: holder.pubkey,
            },
        )];
        self.request_funds_if_low(ctx, &mut messages);

        debug!(wallet = %wallet, "index requested");
        Ok(Receipt::new((), messages))
    }
}
