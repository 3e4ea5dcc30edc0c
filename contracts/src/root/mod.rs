//! # Token Root
//!
//! The root of a TIP-3 token: owns the supply counters, knows the wallet
//! template, and is the only party that can credit wallets.
//!
//! ## Call Model
//!
//! Every operation takes a [`CallContext`] describing the inbound message
//! (who sent it, the host clock, the root's balance, the attached value) and
//! returns a [`Receipt`]: a result value plus the messages the host should
//! deliver. Operations never see the outcome of what they send. Failures
//! come back later as bounce reports (see `reconcile`).
//!
//! ```text
//!            ┌──────────────┐
//!  call ───▶ │ RootContract │ ───▶ Receipt { value, messages }
//!            └──────────────┘
//!                   ▲
//!  bounce ──────────┘  on_delivery_failure
//! ```
//!
//! ## Atomicity
//!
//! Every check runs before the first mutation, and messages only leave the
//! root inside an `Ok` receipt. A rejected call has no effect at all.
//!
//! ## Submodules
//!
//! - `ledger` — supply counters.
//! - `wallets` — grants, provisioning, wallet-initiated service calls.
//! - `burn` — redemption and migration burns.
//! - `batch` — self-resubmitting batch grants.
//! - `migration` — grants replayed from the old root, trusted grants.
//! - `reconcile` — bounced credits.
//! - `funding` — low-balance throttle.

pub mod batch;
pub mod burn;
pub mod error;
pub mod funding;
pub mod ledger;
pub mod migration;
pub mod reconcile;
pub mod state;
pub mod wallets;

use serde::{Deserialize, Serialize};
use tip3_protocol::config::WALLET_DEPLOY_VALUE;
use tip3_protocol::{
    derive_wallet_address, Address, CodeBlob, CodeHash, DerivationContext, HolderIdentity,
    MessageValue, OutboundMessage, OwnerCredential, PublicKey, Sender, TemplatePin, TokenMetadata,
    VerifiedTemplate, WalletInit,
};
use tracing::{debug, info};

pub use batch::BatchStep;
pub use error::RootError;
pub use funding::FundingState;
pub use ledger::SupplyLedger;
pub use state::{RootState, Topology};

// ---------------------------------------------------------------------------
// Call context and receipts
// ---------------------------------------------------------------------------

/// The inbound message an operation is executing for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub sender: Sender,
    /// Host clock, seconds.
    pub now: u64,
    /// Root balance before this call.
    pub balance: u128,
    /// Value attached to the inbound message.
    pub value: u128,
}

impl CallContext {
    /// An external message signed by `pubkey`.
    pub fn external(pubkey: PublicKey, now: u64, balance: u128) -> Self {
        Self {
            sender: Sender::External(pubkey),
            now,
            balance,
            value: 0,
        }
    }

    /// An internal message from `sender` carrying `value`.
    pub fn internal(sender: Address, now: u64, balance: u128, value: u128) -> Self {
        Self {
            sender: Sender::Internal(sender),
            now,
            balance,
            value,
        }
    }
}

/// What a successful operation produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt<T> {
    pub value: T,
    /// To be delivered in this order.
    pub messages: Vec<OutboundMessage>,
}

impl<T> Receipt<T> {
    pub fn new(value: T, messages: Vec<OutboundMessage>) -> Self {
        Self { value, messages }
    }

    /// Replaces the value, keeping the messages.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Receipt<U> {
        Receipt {
            value: f(self.value),
            messages: self.messages,
        }
    }
}

/// Constructor arguments of a root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitParams {
    pub metadata: TokenMetadata,
    /// Owner key. Zero when the owner is an account.
    pub root_pubkey: PublicKey,
    /// Owner account. `None` when the owner is a key.
    pub root_owner: Option<Address>,
    pub total_supply: u128,
    pub checker: Address,
    pub receiver: Address,
    pub eth_root: [u8; 32],
    pub old_root: Option<Address>,
    pub new_root: Option<Address>,
    pub trusted: Option<Address>,
    /// Wallet code, if known at construction. Can be supplied later with
    /// [`RootContract::set_wallet_template`].
    pub wallet_code: Option<CodeBlob>,
}

// ---------------------------------------------------------------------------
// RootContract
// ---------------------------------------------------------------------------

/// A live token root.
#[derive(Clone, Debug)]
pub struct RootContract {
    address: Address,
    /// Hash of the logic currently executing this root.
    logic: CodeHash,
    /// The only wallet code hash this root accepts.
    pin: TemplatePin,
    state: RootState,
}

impl RootContract {
    /// Creates a root.
    ///
    /// Sets metadata and supply, verifies the wallet code against `pin` if
    /// supplied, runs the funding throttle and deploys the owner's own
    /// wallet.
    ///
    /// # Errors
    ///
    /// - [`RootError::InvalidConfiguration`] unless exactly one of
    ///   `root_pubkey` / `root_owner` is set.
    /// - [`RootError::TemplateHashMismatch`] if the wallet code does not
    ///   match `pin`.
    pub fn initialize(
        address: Address,
        logic: CodeHash,
        pin: TemplatePin,
        params: InitParams,
        ctx: &CallContext,
    ) -> Result<Receipt<Self>, RootError> {
        let owner = OwnerCredential::from_parts(params.root_pubkey, params.root_owner)?;
        let wallet_template = params
            .wallet_code
            .map(|code| VerifiedTemplate::verify(code, &pin))
            .transpose()?;

        let mut root = Self {
            address,
            logic,
            pin,
            state: RootState {
                metadata: params.metadata,
                owner,
                ledger: SupplyLedger::new(params.total_supply),
                wallet_template,
                topology: Topology {
                    checker: params.checker,
                    receiver: params.receiver,
                    old_root: params.old_root,
                    new_root: params.new_root,
                    trusted: params.trusted,
                    eth_root: params.eth_root,
                },
                funding: FundingState::default(),
            },
        };

        let mut messages = Vec::new();
        root.request_funds_if_low(ctx, &mut messages);
        if root.has_wallet_template() {
            messages.push(root.deploy_owner_wallet()?);
        }

        info!(
            address = %root.address,
            symbol = %root.state.metadata.symbol,
            total_supply = %root.state.ledger.total_supply(),
            owner = ?root.state.owner,
            "root initialized"
        );
        Ok(Receipt::new(root, messages))
    }

    /// Rebuilds a root from a persisted state record.
    pub fn restore(
        address: Address,
        logic: CodeHash,
        pin: TemplatePin,
        record: &[u8],
    ) -> Result<Self, RootError> {
        let state = RootState::from_record(record)?;
        if let Some(template) = &state.wallet_template {
            if template.hash() != pin.code_hash {
                return Err(RootError::TemplateHashMismatch {
                    expected: pin.code_hash,
                    actual: template.hash(),
                });
            }
        }
        Ok(Self {
            address,
            logic,
            pin,
            state,
        })
    }

    // -----------------------------------------------------------------------
    // Owner operations
    // -----------------------------------------------------------------------

    /// Points migrations from a predecessor root at this one. `None`
    /// disables them.
    pub fn set_old_root(
        &mut self,
        ctx: &CallContext,
        old_root: Option<Address>,
    ) -> Result<Receipt<()>, RootError> {
        self.ensure_owner(ctx)?;
        let mut messages = Vec::new();
        self.request_funds_if_low(ctx, &mut messages);
        self.state.topology.old_root = old_root;
        debug!(old_root = ?old_root, "old root set");
        Ok(Receipt::new((), messages))
    }

    /// Sets the successor root burned tokens migrate to.
    pub fn set_new_root(
        &mut self,
        ctx: &CallContext,
        new_root: Option<Address>,
    ) -> Result<Receipt<()>, RootError> {
        self.ensure_owner(ctx)?;
        let mut messages = Vec::new();
        self.request_funds_if_low(ctx, &mut messages);
        self.state.topology.new_root = new_root;
        debug!(new_root = ?new_root, "new root set");
        Ok(Receipt::new((), messages))
    }

    /// Installs the wallet code. Write-once.
    ///
    /// # Errors
    ///
    /// - [`RootError::AlreadyInitialized`] if a template is already set.
    /// - [`RootError::Unauthorized`] unless called by the owner.
    /// - [`RootError::TemplateHashMismatch`] if `code` is not the pinned
    ///   code.
    pub fn set_wallet_template(
        &mut self,
        ctx: &CallContext,
        code: CodeBlob,
    ) -> Result<Receipt<CodeHash>, RootError> {
        if self.state.wallet_template.is_some() {
            return Err(RootError::AlreadyInitialized);
        }
        self.ensure_owner(ctx)?;
        let template = VerifiedTemplate::verify(code, &self.pin)?;
        let hash = template.hash();

        self.state.wallet_template = Some(template);
        let mut messages = Vec::new();
        self.request_funds_if_low(ctx, &mut messages);
        messages.push(self.deploy_owner_wallet()?);

        info!(hash = %hash, "wallet template installed");
        Ok(Receipt::new(hash, messages))
    }

    /// Credit to a raw address. Disabled: always returns without effect.
    /// [`RootContract::grant_tokens`] is the live path.
    pub fn grant(
        &mut self,
        _ctx: &CallContext,
        _dest: Address,
        _tokens: u128,
        _funds: u128,
        _notify: Option<Vec<u8>>,
    ) -> Receipt<()> {
        debug!("grant is disabled");
        Receipt::new((), Vec::new())
    }

    /// Supply increase by the owner. Disabled: always returns `false`
    /// without effect.
    pub fn mint(&mut self, _ctx: &CallContext, _tokens: u128) -> Receipt<bool> {
        debug!("mint is disabled");
        Receipt::new(false, Vec::new())
    }

    /// Replaces the root's logic, carrying its state across.
    ///
    /// The state is encoded into a record, the logic hash swapped, and the
    /// record decoded again as the new logic's state. Returns the record.
    pub fn upgrade(
        &mut self,
        ctx: &CallContext,
        new_logic: CodeBlob,
    ) -> Result<Receipt<Vec<u8>>, RootError> {
        self.ensure_owner(ctx)?;
        if new_logic.is_empty() {
            return Err(RootError::InvalidConfiguration("empty logic".into()));
        }
        let record = self.state.to_record()?;
        let state = RootState::from_record(&record)?;
        let previous = self.logic;

        self.logic = new_logic.hash();
        self.state = state;
        info!(from = %previous, to = %self.logic, "root logic upgraded");
        Ok(Receipt::new(record, Vec::new()))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn logic_hash(&self) -> CodeHash {
        self.logic
    }

    pub fn pin(&self) -> TemplatePin {
        self.pin
    }

    pub fn state(&self) -> &RootState {
        &self.state
    }

    /// Encodes the current state record.
    pub fn to_record(&self) -> Result<Vec<u8>, RootError> {
        self.state.to_record()
    }

    pub fn name(&self) -> &str {
        &self.state.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.state.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.state.metadata.decimals
    }

    pub fn root_pubkey(&self) -> PublicKey {
        self.state.owner.root_pubkey()
    }

    pub fn root_owner(&self) -> Option<Address> {
        self.state.owner.root_owner()
    }

    pub fn total_supply(&self) -> u128 {
        self.state.ledger.total_supply()
    }

    pub fn total_granted(&self) -> u128 {
        self.state.ledger.total_granted()
    }

    pub fn burn_count(&self) -> u128 {
        self.state.ledger.burn_count()
    }

    pub fn has_wallet_template(&self) -> bool {
        self.state.wallet_template.is_some()
    }

    pub fn wallet_template(&self) -> Option<&CodeBlob> {
        self.state.wallet_template.as_ref().map(VerifiedTemplate::code)
    }

    pub fn wallet_template_hash(&self) -> Option<CodeHash> {
        self.state.wallet_template.as_ref().map(VerifiedTemplate::hash)
    }

    /// Internal-message getter: answers with the granted total, carrying
    /// back whatever value the caller attached.
    pub fn request_total_granted(&self, _ctx: &CallContext) -> Receipt<u128> {
        Receipt::new(self.total_granted(), Vec::new())
    }

    /// Address of `holder`'s wallet.
    pub fn wallet_address_for(&self, holder: &HolderIdentity) -> Result<Address, RootError> {
        holder.validate()?;
        Ok(self.derive_wallet(holder)?.1)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    pub(crate) fn ensure_owner(&self, ctx: &CallContext) -> Result<(), RootError> {
        let authorized = match (&self.state.owner, &ctx.sender) {
            (OwnerCredential::PublicKey(owner), Sender::External(signer)) => owner == signer,
            (OwnerCredential::Account(owner), Sender::Internal(sender)) => owner == sender,
            _ => false,
        };
        if !authorized {
            return Err(RootError::Unauthorized);
        }
        Ok(())
    }

    /// Fails unless the call is an internal message from `expected`.
    pub(crate) fn ensure_sender(ctx: &CallContext, expected: Option<Address>) -> Result<(), RootError> {
        match (ctx.sender.address(), expected) {
            (Some(sender), Some(expected)) if sender == expected => Ok(()),
            _ => Err(RootError::Unauthorized),
        }
    }

    /// Fails unless the call came from `holder`'s own wallet. The wallet
    /// address is derived here, never taken from the caller.
    pub(crate) fn ensure_wallet_sender(
        &self,
        ctx: &CallContext,
        holder: &HolderIdentity,
    ) -> Result<Address, RootError> {
        let (_, wallet) = self.derive_wallet(holder)?;
        Self::ensure_sender(ctx, Some(wallet))?;
        Ok(wallet)
    }

    pub(crate) fn template(&self) -> Result<&VerifiedTemplate, RootError> {
        self.state
            .wallet_template
            .as_ref()
            .ok_or_else(|| RootError::InvalidConfiguration("wallet template not set".into()))
    }

    pub(crate) fn derive_wallet(
        &self,
        holder: &HolderIdentity,
    ) -> Result<(WalletInit, Address), RootError> {
        let ctx = DerivationContext {
            template: self.template()?,
            metadata: &self.state.metadata,
            root_address: self.address,
            root_pubkey: self.state.owner.root_pubkey(),
        };
        Ok(derive_wallet_address(holder, &ctx))
    }

    pub(crate) fn owner_wallet(&self) -> Result<(WalletInit, Address), RootError> {
        self.derive_wallet(&self.state.owner.as_holder())
    }

    fn deploy_owner_wallet(&self) -> Result<OutboundMessage, RootError> {
        let (init, _) = self.owner_wallet()?;
        Ok(OutboundMessage::deploy(init, MessageValue::Fixed(WALLET_DEPLOY_VALUE)))
    }
}
