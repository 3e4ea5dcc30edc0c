//! # Wallet Book
//!
//! The node has no real wallet contracts to deliver to, so it keeps a book
//! of simulated wallet accounts in the database's `wallets` tree. A wallet
//! exists once a message carrying its state init reaches it; a credit for
//! a wallet that does not exist bounces back to the root, which is the
//! path the reconciliation handler exists for.
//!
//! Every applied delivery records its queue sequence number. A message
//! redelivered after a crash, between the wallet write and the queue
//! commit, is recognized and skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use tip3_protocol::storage::{DbError, LedgerDb};
use tip3_protocol::{
    Address, CodeHash, Instruction, MessageValue, OutboundMessage, PublicKey, WalletInit,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a wallet refused a message or a debit.
#[derive(Debug, Error)]
pub enum WalletError {
    /// No account at this address.
    #[error("wallet {0} is not deployed")]
    NotDeployed(Address),

    /// The wallet holds fewer tokens than requested.
    #[error("insufficient balance in {wallet}: available {available}, requested {requested}")]
    InsufficientBalance {
        wallet: Address,
        available: u128,
        requested: u128,
    },

    /// A credit would overflow the wallet balance.
    #[error("balance overflow in {0}")]
    Overflow(Address),

    /// The backing database failed.
    #[error(transparent)]
    Db(#[from] DbError),
}

// ---------------------------------------------------------------------------
// WalletAccount
// ---------------------------------------------------------------------------

/// A simulated holder wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub address: Address,
    pub pubkey: PublicKey,
    pub owner: Option<Address>,
    pub code_hash: CodeHash,
    /// Token balance.
    pub balance: u128,
    /// Operational funds received with deliveries.
    pub gas: u128,
    /// Sequence of the last delivery applied, 0 before any.
    pub last_seq: u64,
    pub created_at: DateTime<Utc>,
}

impl WalletAccount {
    fn from_init(init: &WalletInit) -> Self {
        Self {
            address: init.address(),
            pubkey: init.data.pubkey,
            owner: init.data.owner,
            code_hash: init.code_hash,
            balance: 0,
            gas: 0,
            last_seq: 0,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of delivering one message to the book.
#[derive(Debug)]
pub enum Delivery {
    /// The message took effect.
    Applied,
    /// Already applied before a restart.
    Replayed,
    /// Non-bounceable message for a missing wallet; lost, like on chain.
    Dropped,
    /// Bounceable message the wallet failed; report it to the root.
    Bounced(WalletError),
}

// ---------------------------------------------------------------------------
// WalletBook
// ---------------------------------------------------------------------------

/// The set of wallet accounts known to the node.
#[derive(Debug, Clone)]
pub struct WalletBook {
    db: LedgerDb,
}

impl WalletBook {
    pub fn new(db: LedgerDb) -> Self {
        Self { db }
    }

    /// Loads one account.
    pub fn get(&self, address: &Address) -> Result<Option<WalletAccount>, WalletError> {
        Ok(self.db.get_wallet(address)?)
    }

    pub fn count(&self) -> usize {
        self.db.wallet_count()
    }

    /// True if `msg` is addressed to a wallet: it deploys one, credits
    /// one, or targets an account already in the book.
    pub fn accepts(&self, msg: &OutboundMessage) -> Result<bool, WalletError> {
        if msg.state_init.is_some() || msg.minted_tokens().is_some() {
            return Ok(true);
        }
        Ok(self.get(&msg.dest)?.is_some())
    }

    /// Delivers the message queued under `seq`.
    ///
    /// Database failures are errors; refusals by the wallet are reported
    /// as [`Delivery::Bounced`] or [`Delivery::Dropped`].
    pub fn deliver(&self, seq: u64, msg: &OutboundMessage) -> Result<Delivery, WalletError> {
        let existing: Option<WalletAccount> = self.db.get_wallet(&msg.dest)?;
        if let Some(account) = &existing {
            if account.last_seq >= seq {
                debug!(wallet = %msg.dest, seq, "delivery already applied");
                return Ok(Delivery::Replayed);
            }
        }

        let mut account = match (existing, &msg.state_init) {
            (Some(account), _) => account,
            (None, Some(init)) => WalletAccount::from_init(init),
            (None, None) if msg.bounce => {
                return Ok(Delivery::Bounced(WalletError::NotDeployed(msg.dest)));
            }
            (None, None) => {
                warn!(dest = %msg.dest, kind = msg.kind(), "message to missing wallet dropped");
                return Ok(Delivery::Dropped);
            }
        };

        if let Some(Instruction::AcceptMint { tokens, .. }) = &msg.body {
            match account.balance.checked_add(*tokens) {
                Some(balance) => account.balance = balance,
                None => return Ok(Delivery::Bounced(WalletError::Overflow(msg.dest))),
            }
        }
        if let MessageValue::Fixed(value) = msg.value {
            account.gas = account.gas.saturating_add(value);
        }
        account.last_seq = seq;

        self.db.put_wallet(&msg.dest, &account)?;
        debug!(wallet = %msg.dest, balance = %account.balance, kind = msg.kind(), "delivered");
        Ok(Delivery::Applied)
    }

    /// The account at `wallet` with `tokens` taken out, for a burn. Nothing
    /// is written; the caller stages the result with the root's step.
    pub fn debited(&self, wallet: &Address, tokens: u128) -> Result<WalletAccount, WalletError> {
        let mut account = self.get(wallet)?.ok_or(WalletError::NotDeployed(*wallet))?;
        account.balance = account.balance.checked_sub(tokens).ok_or(
            WalletError::InsufficientBalance {
                wallet: *wallet,
                available: account.balance,
                requested: tokens,
            },
        )?;
        Ok(account)
    }

    /// The key that signs for the wallet at `address`, if it is deployed
    /// and key-controlled.
    pub fn signer_of(&self, address: &Address) -> Result<Option<PublicKey>, WalletError> {
        Ok(self
            .get(address)?
            .map(|account| account.pubkey)
            .filter(|pubkey| !pubkey.is_zero()))
    }
}
