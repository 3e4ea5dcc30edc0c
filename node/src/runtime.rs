//! # Root Runtime
//!
//! The host side of a token root. The root never sends anything itself; it
//! returns messages. The runtime owns the root and a FIFO queue of those
//! messages, and processes exactly one thing at a time:
//!
//! ```text
//!   API call ──▶ apply ──▶ RootContract op ──▶ commit(record, queue += msgs)
//!                                                   │
//!                      ┌────────────── drain ◀──────┘
//!                      ▼
//!        dest == root ──▶ process_batch_step ──▶ commit(done, queue += next)
//!        dest == wallet ─▶ WalletBook ── bounce? ──▶ on_delivery_failure
//!        otherwise ─────▶ external account (logged)
//! ```
//!
//! Every step is committed atomically with the state record, so a crash
//! resumes from the queue exactly where it stopped. A batch in flight
//! continues at its recorded cursor. The wallet side of a burn and a new
//! logic hash travel in the same checkpoint as the root's record.
//!
//! [`RuntimeHandle`] puts the runtime behind an mpsc channel so API
//! handlers can share it; replies come back over oneshot channels.

use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use tip3_contracts::{BatchStep, CallContext, Receipt, RootContract, RootError};
use tip3_protocol::config::RUNTIME_CHANNEL_CAPACITY;
use tip3_protocol::storage::{Checkpoint, DbError, LedgerDb};
use tip3_protocol::{
    Address, CodeBlob, DeliveryFailure, GrantEntry, HolderIdentity, Instruction, MessageValue,
    OutboundMessage, PublicKey, Sender, TemplateError, TemplateStore,
};

use crate::config::{AccountKey, NodeConfig};
use crate::metrics::SharedMetrics;
use crate::wallets::{Delivery, WalletBook, WalletError};

/// Source of unix time, injectable for tests.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Wall-clock unix seconds.
pub fn system_clock() -> Clock {
    Arc::new(|| u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0))
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The root refused the operation. Nothing changed.
    #[error(transparent)]
    Root(#[from] RootError),

    /// A holder wallet refused a debit.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// The pinned wallet code could not be loaded.
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Db(#[from] DbError),

    /// The runtime task is gone.
    #[error("runtime stopped")]
    Stopped,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// A state-changing root operation, as submitted through the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    SetOldRoot(Option<Address>),
    SetNewRoot(Option<Address>),
    SetWalletTemplate(CodeBlob),
    GrantTokens {
        holder: HolderIdentity,
        tokens: u128,
        funds: u128,
        notify: Option<Vec<u8>>,
    },
    /// Disabled on the root; accepted and ignored.
    Grant {
        dest: Address,
        tokens: u128,
        funds: u128,
        notify: Option<Vec<u8>>,
    },
    /// Disabled on the root; accepted and ignored.
    Mint { tokens: u128 },
    ProvisionWallet {
        holder: HolderIdentity,
        funds: u128,
    },
    ProvisionWalletFree { pubkey: PublicKey },
    RequestFunding { holder: HolderIdentity },
    RequestIndex { holder: HolderIdentity },
    Burn {
        holder: HolderIdentity,
        tokens: u128,
        to: [u8; 32],
    },
    BurnToNewRoot {
        holder: HolderIdentity,
        tokens: u128,
    },
    BurnToTrusted {
        system_contract: Address,
        pubaddr: Address,
        holder: HolderIdentity,
        tokens: u128,
    },
    AcceptMigratedGrant {
        holder: HolderIdentity,
        tokens: u128,
    },
    GrantTrusted { pubkey: PublicKey, value: u128 },
    StartBatch {
        entries: Vec<GrantEntry>,
        multiplier: u128,
        offset: u128,
    },
    Upgrade(CodeBlob),
    IdleNotice,
    RequestTotalGranted,
}

impl Operation {
    /// RPC method name, also the metric label.
    pub fn method(&self) -> &'static str {
        match self {
            Self::SetOldRoot(_) => "root_setOldRoot",
            Self::SetNewRoot(_) => "root_setNewRoot",
            Self::SetWalletTemplate(_) => "root_setWalletTemplate",
            Self::GrantTokens { .. } => "root_grantTokens",
            Self::Grant { .. } => "root_grant",
            Self::Mint { .. } => "root_mint",
            Self::ProvisionWallet { .. } => "root_provisionWallet",
            Self::ProvisionWalletFree { .. } => "root_provisionWalletFree",
            Self::RequestFunding { .. } => "root_requestFunding",
            Self::RequestIndex { .. } => "root_requestIndex",
            Self::Burn { .. } => "root_burn",
            Self::BurnToNewRoot { .. } => "root_burnToNewRoot",
            Self::BurnToTrusted { .. } => "root_burnToTrusted",
            Self::AcceptMigratedGrant { .. } => "root_acceptMigratedGrant",
            Self::GrantTrusted { .. } => "root_grantTrusted",
            Self::StartBatch { .. } => "root_startBatch",
            Self::Upgrade(_) => "root_upgrade",
            Self::IdleNotice => "root_onIdleNotice",
            Self::RequestTotalGranted => "root_requestTotalGranted",
        }
    }

    /// Tokens leaving the calling wallet, for the burn family.
    fn burned_tokens(&self) -> Option<u128> {
        match self {
            Self::Burn { tokens, .. }
            | Self::BurnToNewRoot { tokens, .. }
            | Self::BurnToTrusted { tokens, .. } => Some(*tokens),
            _ => None,
        }
    }
}

/// One submitted call: who, how much value, what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub sender: Sender,
    pub value: u128,
    pub op: Operation,
}

/// Result of an applied call.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    /// Operation-specific return value.
    pub result: Value,
    /// Messages the root emitted for this call, before the cascade.
    pub emitted: usize,
    /// Messages delivered while draining the queue afterwards.
    pub delivered: usize,
    /// Messages still queued when the call returned. Non-zero only when
    /// delivery stalled; the next call or restart retries them.
    pub pending: usize,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Read-only picture of the root, served by `/status` and `root_getInfo`.
/// Amounts are decimal strings; u128 does not survive JSON numbers in
/// most clients.
#[derive(Debug, Clone, Serialize)]
pub struct RootSnapshot {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub root_pubkey: String,
    pub root_owner: Option<String>,
    pub total_supply: String,
    pub total_granted: String,
    pub burn_count: String,
    pub wallet_template_hash: Option<String>,
    pub logic_hash: String,
    pub checker: String,
    pub receiver: String,
    pub old_root: Option<String>,
    pub new_root: Option<String>,
    pub trusted: Option<String>,
    pub funding_in_flight: bool,
    pub balance: String,
    pub pending_messages: usize,
    pub wallet_count: usize,
}

/// A holder's wallet as the node sees it.
#[derive(Debug, Clone, Serialize)]
pub struct WalletView {
    pub address: String,
    pub deployed: bool,
    pub balance: String,
    pub gas: String,
    pub created_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Owns the root, its queue and the wallet book.
pub struct Runtime {
    root: RootContract,
    db: LedgerDb,
    book: WalletBook,
    metrics: SharedMetrics,
    clock: Clock,
    /// Simulated operational balance of the root account.
    balance: u128,
    /// Keys of the accounts outside the wallet book the node relays for.
    accounts: Vec<AccountKey>,
}

impl Runtime {
    /// Brings a root up from `db`: restores it from the persisted record,
    /// or initializes it from `config` on first start. Pending messages
    /// left by a previous run are delivered before this returns.
    pub fn boot(
        config: &NodeConfig,
        db: LedgerDb,
        metrics: SharedMetrics,
        clock: Clock,
    ) -> Result<Self, RuntimeError> {
        let mut runtime = match db.get_state_record()? {
            Some(record) => {
                let logic = db.get_logic_hash()?.unwrap_or(config.logic_hash);
                let root =
                    RootContract::restore(config.address, logic, config.wallet_pin, &record)?;
                info!(
                    address = %root.address(),
                    pending = db.pending_count(),
                    "root restored"
                );
                Self::new(root, db, metrics, clock, config)
            }
            None => {
                let mut params = config.params.clone();
                if config.install_template {
                    params.wallet_code = Some(db.fetch_verified(&config.wallet_pin)?.code().clone());
                }
                let now = clock();
                let ctx = match params.root_owner {
                    Some(owner) => CallContext::internal(owner, now, config.initial_balance, 0),
                    None => CallContext::external(params.root_pubkey, now, config.initial_balance),
                };
                let receipt = RootContract::initialize(
                    config.address,
                    config.logic_hash,
                    config.wallet_pin,
                    params,
                    &ctx,
                )?;
                info!(address = %receipt.value.address(), "root initialized");

                let mut runtime = Self::new(receipt.value, db, metrics, clock, config);
                let mut step = Checkpoint::default();
                step.set_logic(config.logic_hash);
                runtime.commit(step, receipt.messages)?;
                runtime
            }
        };
        let resumed = runtime.drain()?;
        if resumed > 0 {
            info!(delivered = resumed, "pending messages delivered");
        }
        Ok(runtime)
    }

    fn new(
        root: RootContract,
        db: LedgerDb,
        metrics: SharedMetrics,
        clock: Clock,
        config: &NodeConfig,
    ) -> Self {
        metrics.observe_ledger(root.total_supply(), root.total_granted());
        metrics.queue_depth.set(db.pending_count() as i64);
        Self {
            book: WalletBook::new(db.clone()),
            root,
            db,
            metrics,
            clock,
            balance: config.initial_balance,
            accounts: config.accounts.clone(),
        }
    }

    pub fn root(&self) -> &RootContract {
        &self.root
    }

    pub fn book(&self) -> &WalletBook {
        &self.book
    }

    /// Runs one call to completion: the operation, then every message it
    /// caused, until the queue is empty.
    ///
    /// Once the operation is committed the call has happened. A delivery
    /// failure after that is logged and leaves the rest of the queue for
    /// the next call or restart; it shows in [`Outcome::pending`].
    pub fn apply(&mut self, call: Call) -> Result<Outcome, RuntimeError> {
        let timer = self.metrics.step_latency_seconds.start_timer();
        let (result, emitted) = self.execute_and_commit(call)?;
        let delivered = match self.drain() {
            Ok(delivered) => delivered,
            Err(e) => {
                error!(error = %e, "delivery stalled, messages stay queued");
                0
            }
        };
        timer.observe_duration();
        Ok(Outcome {
            result,
            emitted,
            delivered,
            pending: self.db.pending_count(),
        })
    }

    /// Runs the operation and persists its effects without delivering
    /// anything. On any failure the root is left as it was.
    fn execute_and_commit(&mut self, call: Call) -> Result<(Value, usize), RuntimeError> {
        let method = call.op.method();
        let upgrade = matches!(call.op, Operation::Upgrade(_));
        let debit = call.op.burned_tokens().zip(call.sender.address());
        let ctx = CallContext {
            sender: call.sender,
            now: (self.clock)(),
            balance: self.balance.saturating_add(call.value),
            value: call.value,
        };

        let snapshot = self.root.clone();
        let balance = self.balance;
        let receipt = match self.execute(&ctx, call.op) {
            Ok(receipt) => receipt,
            Err(e) => {
                self.reject(method, &e);
                return Err(e.into());
            }
        };

        self.balance = ctx.balance;
        let emitted = receipt.messages.len();
        if let Err(e) = self.settle(debit, upgrade, receipt.messages) {
            self.root = snapshot;
            self.balance = balance;
            if let RuntimeError::Wallet(reason) = &e {
                warn!(method, error = %reason, "burn rolled back");
                self.metrics
                    .ops_rejected_total
                    .with_label_values(&["wallet"])
                    .inc();
            }
            return Err(e);
        }

        self.metrics
            .ops_processed_total
            .with_label_values(&[method])
            .inc();
        debug!(method, emitted, "operation applied");
        Ok((receipt.value, emitted))
    }

    /// Commits an accepted operation. The calling wallet pays for its burn
    /// in the same checkpoint as the root's side of it.
    fn settle(
        &mut self,
        debit: Option<(u128, Address)>,
        upgrade: bool,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), RuntimeError> {
        let mut step = Checkpoint::default();
        if let Some((tokens, wallet)) = debit {
            let account = self.book.debited(&wallet, tokens)?;
            step.put_wallet(&wallet, &account)?;
        }
        if upgrade {
            step.set_logic(self.root.logic_hash());
        }
        self.commit(step, messages)
    }

    fn execute(&mut self, ctx: &CallContext, op: Operation) -> Result<Receipt<Value>, RootError> {
        let root = &mut self.root;
        let unit = |_: ()| Value::Null;
        match op {
            Operation::SetOldRoot(addr) => root.set_old_root(ctx, addr).map(|r| r.map(unit)),
            Operation::SetNewRoot(addr) => root.set_new_root(ctx, addr).map(|r| r.map(unit)),
            Operation::SetWalletTemplate(code) => root
                .set_wallet_template(ctx, code)
                .map(|r| r.map(|hash| json!({ "code_hash": hash.to_hex() }))),
            Operation::GrantTokens {
                holder,
                tokens,
                funds,
                notify,
            } => root
                .grant_tokens(ctx, holder, tokens, funds, notify)
                .map(|r| r.map(wallet_json)),
            Operation::Grant {
                dest,
                tokens,
                funds,
                notify,
            } => Ok(root.grant(ctx, dest, tokens, funds, notify).map(unit)),
            Operation::Mint { tokens } => Ok(root.mint(ctx, tokens).map(Value::Bool)),
            Operation::ProvisionWallet { holder, funds } => root
                .provision_wallet(ctx, holder, funds)
                .map(|r| r.map(wallet_json)),
            Operation::ProvisionWalletFree { pubkey } => root
                .provision_wallet_free(ctx, pubkey)
                .map(|r| r.map(wallet_json)),
            Operation::RequestFunding { holder } => {
                root.request_funding(ctx, holder).map(|r| r.map(unit))
            }
            Operation::RequestIndex { holder } => {
                root.request_index(ctx, holder).map(|r| r.map(unit))
            }
            Operation::Burn { holder, tokens, to } => {
                root.burn(ctx, holder, tokens, to).map(|r| r.map(unit))
            }
            Operation::BurnToNewRoot { holder, tokens } => root
                .burn_to_new_root(ctx, holder, tokens)
                .map(|r| r.map(unit)),
            Operation::BurnToTrusted {
                system_contract,
                pubaddr,
                holder,
                tokens,
            } => root
                .burn_to_trusted(ctx, system_contract, pubaddr, holder, tokens)
                .map(|r| r.map(unit)),
            Operation::AcceptMigratedGrant { holder, tokens } => root
                .accept_migrated_grant(ctx, holder, tokens)
                .map(|r| r.map(unit)),
            Operation::GrantTrusted { pubkey, value } => {
                root.grant_trusted(ctx, pubkey, value).map(|r| r.map(unit))
            }
            Operation::StartBatch {
                entries,
                multiplier,
                offset,
            } => root
                .start_batch(ctx, entries, multiplier, offset)
                .map(|r| r.map(|id| json!({ "batch_id": id.to_string() }))),
            Operation::Upgrade(logic) => root
                .upgrade(ctx, logic)
                .map(|r| r.map(|record| json!({ "record": hex::encode(record) }))),
            Operation::IdleNotice => Ok(root.on_idle_notice(ctx).map(Value::Bool)),
            Operation::RequestTotalGranted => Ok(root
                .request_total_granted(ctx)
                .map(|granted| Value::String(granted.to_string()))),
        }
    }

    fn reject(&self, what: &str, e: &RootError) {
        if e.is_fatal() {
            error!(what, code = e.code(), error = %e, "root refused with a fatal error");
        } else {
            debug!(what, code = e.code(), error = %e, "root refused");
        }
        let code = e.code().to_string();
        self.metrics
            .ops_rejected_total
            .with_label_values(&[code.as_str()])
            .inc();
    }

    /// Completes `step` with the current record and `messages`, and
    /// persists it atomically.
    fn commit(&mut self, mut step: Checkpoint, messages: Vec<OutboundMessage>) -> Result<(), RuntimeError> {
        step.set_record(self.root.to_record()?);
        for msg in &messages {
            step.enqueue(self.db.next_sequence()?, msg)?;
        }
        self.db.commit_step(step)?;

        for msg in &messages {
            if let MessageValue::Fixed(value) = msg.value {
                self.balance = self.balance.saturating_sub(value);
            }
        }
        self.metrics
            .observe_ledger(self.root.total_supply(), self.root.total_granted());
        self.metrics.queue_depth.set(self.db.pending_count() as i64);
        Ok(())
    }

    /// Delivers queued messages in sequence order until none is left.
    /// Returns how many were delivered.
    fn drain(&mut self) -> Result<usize, RuntimeError> {
        let mut delivered = 0;
        loop {
            let pending: Vec<(u64, OutboundMessage)> = self.db.pending()?;
            if pending.is_empty() {
                return Ok(delivered);
            }
            for (seq, msg) in pending {
                let snapshot = self.root.clone();
                let step = self
                    .deliver(seq, &msg)
                    .and_then(|produced| self.commit(Checkpoint::done(seq), produced));
                if let Err(e) = step {
                    self.root = snapshot;
                    return Err(e);
                }
                delivered += 1;
            }
        }
    }

    /// Delivers one message and returns whatever it caused.
    fn deliver(&mut self, seq: u64, msg: &OutboundMessage) -> Result<Vec<OutboundMessage>, RuntimeError> {
        self.metrics
            .messages_dispatched_total
            .with_label_values(&[msg.kind()])
            .inc();

        if msg.dest == self.root.address() {
            return Ok(self.deliver_to_self(msg));
        }

        if self.book.accepts(msg)? {
            if let Delivery::Bounced(reason) = self.book.deliver(seq, msg)? {
                match DeliveryFailure::of(msg) {
                    Some(report) => {
                        debug!(dest = %msg.dest, reason = %reason, "message bounced");
                        self.on_bounce(&report);
                    }
                    None => warn!(dest = %msg.dest, reason = %reason, "unbounceable message lost"),
                }
            }
            return Ok(Vec::new());
        }

        info!(dest = %msg.dest, kind = msg.kind(), seq, "delivered to external account");
        Ok(Vec::new())
    }

    fn deliver_to_self(&mut self, msg: &OutboundMessage) -> Vec<OutboundMessage> {
        let Some(Instruction::ProcessBatchStep { batch }) = &msg.body else {
            warn!(kind = msg.kind(), "unexpected self-addressed message ignored");
            return Vec::new();
        };
        let ctx = CallContext::internal(self.root.address(), (self.clock)(), self.balance, 0);
        match self.root.process_batch_step(&ctx, batch.clone()) {
            Ok(receipt) => {
                match receipt.value {
                    BatchStep::Continued {
                        cursor,
                        holder_share,
                        owner_share,
                    } => debug!(
                        batch = %batch.batch_id,
                        cursor = %cursor,
                        holder = %holder_share,
                        owner = %owner_share,
                        "batch step processed"
                    ),
                    BatchStep::Completed { batch_id } => {
                        info!(batch = %batch_id, "batch completed")
                    }
                }
                receipt.messages
            }
            Err(e) => {
                self.reject("process_batch_step", &e);
                Vec::new()
            }
        }
    }

    fn on_bounce(&mut self, report: &DeliveryFailure) {
        match self.root.on_delivery_failure(report) {
            Ok(receipt) => {
                self.metrics.bounces_reconciled_total.inc();
                info!(dest = %report.dest, tokens = %receipt.value, "bounce reconciled");
            }
            Err(e) => self.reject("on_delivery_failure", &e),
        }
    }

    /// Current picture of the root.
    pub fn snapshot(&self) -> RootSnapshot {
        let root = &self.root;
        let topology = root.state().topology();
        RootSnapshot {
            address: root.address().to_string(),
            name: root.name().to_string(),
            symbol: root.symbol().to_string(),
            decimals: root.decimals(),
            root_pubkey: root.root_pubkey().to_hex(),
            root_owner: root.root_owner().map(|a| a.to_string()),
            total_supply: root.total_supply().to_string(),
            total_granted: root.total_granted().to_string(),
            burn_count: root.burn_count().to_string(),
            wallet_template_hash: root.wallet_template_hash().map(|h| h.to_hex()),
            logic_hash: root.logic_hash().to_hex(),
            checker: topology.checker.to_string(),
            receiver: topology.receiver.to_string(),
            old_root: topology.old_root.map(|a| a.to_string()),
            new_root: topology.new_root.map(|a| a.to_string()),
            trusted: topology.trusted.map(|a| a.to_string()),
            funding_in_flight: root.funding_in_flight(),
            balance: self.balance.to_string(),
            pending_messages: self.db.pending_count(),
            wallet_count: self.book.count(),
        }
    }

    /// The key that must sign calls made in the name of `address`: a
    /// configured account key, or the holder key of a wallet in the book.
    pub fn signer_of(&self, address: &Address) -> Result<Option<PublicKey>, RuntimeError> {
        if let Some(account) = self.accounts.iter().find(|a| a.address == *address) {
            return Ok(Some(account.pubkey));
        }
        Ok(self.book.signer_of(address)?)
    }

    /// Where `holder`'s wallet lives and what it holds.
    pub fn wallet(&self, holder: &HolderIdentity) -> Result<WalletView, RuntimeError> {
        let address = self.root.wallet_address_for(holder)?;
        let account = self.book.get(&address)?;
        Ok(WalletView {
            address: address.to_string(),
            deployed: account.is_some(),
            balance: account
                .as_ref()
                .map_or(0, |a| a.balance)
                .to_string(),
            gas: account.as_ref().map_or(0, |a| a.gas).to_string(),
            created_at: account.map(|a| a.created_at.to_rfc3339()),
        })
    }
}

fn wallet_json(address: Address) -> Value {
    json!({ "wallet": address.to_string() })
}

// ---------------------------------------------------------------------------
// RuntimeHandle
// ---------------------------------------------------------------------------

enum Command {
    Apply(Call, oneshot::Sender<Result<Outcome, RuntimeError>>),
    Snapshot(oneshot::Sender<RootSnapshot>),
    Wallet(HolderIdentity, oneshot::Sender<Result<WalletView, RuntimeError>>),
    SignerOf(Address, oneshot::Sender<Result<Option<PublicKey>, RuntimeError>>),
}

/// Cloneable handle to a runtime running on its own task.
#[derive(Clone)]
pub struct RuntimeHandle {
    tx: mpsc::Sender<Command>,
}

impl RuntimeHandle {
    /// Moves `runtime` onto a task. The task ends when every handle is
    /// dropped.
    pub fn spawn(mut runtime: Runtime) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(RUNTIME_CHANNEL_CAPACITY);
        let task = tokio::spawn(async move {
            while let Some(cmd) = rx.recv().await {
                match cmd {
                    Command::Apply(call, reply) => {
                        let _ = reply.send(runtime.apply(call));
                    }
                    Command::Snapshot(reply) => {
                        let _ = reply.send(runtime.snapshot());
                    }
                    Command::Wallet(holder, reply) => {
                        let _ = reply.send(runtime.wallet(&holder));
                    }
                    Command::SignerOf(address, reply) => {
                        let _ = reply.send(runtime.signer_of(&address));
                    }
                }
            }
            debug!("runtime task stopped");
        });
        (Self { tx }, task)
    }

    pub async fn apply(&self, call: Call) -> Result<Outcome, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Apply(call, reply)).await?;
        rx.await.map_err(|_| RuntimeError::Stopped)?
    }

    pub async fn snapshot(&self) -> Result<RootSnapshot, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await?;
        rx.await.map_err(|_| RuntimeError::Stopped)
    }

    pub async fn wallet(&self, holder: HolderIdentity) -> Result<WalletView, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Wallet(holder, reply)).await?;
        rx.await.map_err(|_| RuntimeError::Stopped)?
    }

    pub async fn signer_of(&self, address: Address) -> Result<Option<PublicKey>, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SignerOf(address, reply)).await?;
        rx.await.map_err(|_| RuntimeError::Stopped)?
    }

    async fn send(&self, cmd: Command) -> Result<(), RuntimeError> {
        self.tx.send(cmd).await.map_err(|_| RuntimeError::Stopped)
    }
}
