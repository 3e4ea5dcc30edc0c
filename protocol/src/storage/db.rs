//! # LedgerDb — Persistent Storage Engine
//!
//! The persistence layer of a root ledger node, built on sled's embedded
//! key-value store.
//!
//! ## Tree Layout
//!
//! | Tree        | Key                    | Value                              |
//! |-------------|------------------------|------------------------------------|
//! | `root`      | `state` / `logic`      | state record bytes / logic hash    |
//! | `templates` | code hash (32B)        | raw code bytes                     |
//! | `queue`     | sequence (8B BE)       | `bincode(T)` pending message       |
//! | `wallets`   | address (33B)          | `bincode(T)` wallet account        |
//!
//! Queue sequences are big-endian so that sled's lexicographic order is
//! delivery order.
//!
//! ## Checkpoints
//!
//! A [`Checkpoint`] stages everything one step writes: the new state
//! record, a new logic hash, the message just processed, the messages it
//! produced and any wallet accounts it changed. [`LedgerDb::commit_step`]
//! applies it in one sled transaction across the `root`, `queue` and
//! `wallets` trees. A crash either happens before the step is visible at
//! all or after all of it is: on restart the queue holds exactly the
//! messages still owed, batch cursors included.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::path::Path;
use tracing::debug;

use crate::identity::Address;
use crate::template::{CodeBlob, CodeHash, TemplateError, TemplateStore};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("transaction aborted: {0}")]
    Transaction(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<TransactionError<DbError>> for DbError {
    fn from(e: TransactionError<DbError>) -> Self {
        match e {
            TransactionError::Abort(inner) => inner,
            TransactionError::Storage(err) => DbError::Sled(err),
        }
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

const KEY_STATE: &[u8] = b"state";
const KEY_LOGIC: &[u8] = b"logic";

// ---------------------------------------------------------------------------
// LedgerDb
// ---------------------------------------------------------------------------

/// Persistent storage for one root ledger.
///
/// Cheap to clone; sled trees are reference counted and thread-safe.
#[derive(Debug, Clone)]
pub struct LedgerDb {
    db: Db,
    root: Tree,
    templates: Tree,
    queue: Tree,
    wallets: Tree,
}

impl LedgerDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// A database that lives in memory and disappears on drop.
    pub fn open_temporary() -> DbResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let root = db.open_tree("root")?;
        let templates = db.open_tree("templates")?;
        let queue = db.open_tree("queue")?;
        let wallets = db.open_tree("wallets")?;

        Ok(Self {
            db,
            root,
            templates,
            queue,
            wallets,
        })
    }

    // -- Root state -----------------------------------------------------------

    /// The persisted state record, if the root was ever initialized.
    pub fn get_state_record(&self) -> DbResult<Option<Vec<u8>>> {
        Ok(self.root.get(KEY_STATE)?.map(|v| v.to_vec()))
    }

    /// The installed logic hash.
    pub fn get_logic_hash(&self) -> DbResult<Option<CodeHash>> {
        match self.root.get(KEY_LOGIC)? {
            Some(bytes) => {
                let arr: [u8; 32] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| DbError::Serialization("invalid logic hash bytes".into()))?;
                Ok(Some(CodeHash::from_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    // -- Message queue ----------------------------------------------------------

    /// A fresh, strictly increasing sequence number. Never 0.
    pub fn next_sequence(&self) -> DbResult<u64> {
        Ok(self.db.generate_id()? + 1)
    }

    /// All queued messages in delivery order.
    pub fn pending<T: DeserializeOwned>(&self) -> DbResult<Vec<(u64, T)>> {
        let mut out = Vec::new();
        for item in self.queue.iter() {
            let (key, value) = item?;
            let seq = u64::from_be_bytes(
                key.as_ref()
                    .try_into()
                    .map_err(|_| DbError::Serialization("invalid queue key".into()))?,
            );
            out.push((seq, decode(&value)?));
        }
        Ok(out)
    }

    /// Number of queued messages.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Atomically persist everything `step` staged.
    pub fn commit_step(&self, step: Checkpoint) -> DbResult<()> {
        (&self.root, &self.queue, &self.wallets).transaction(|(root, queue, wallets)| {
            if let Some(record) = &step.record {
                root.insert(KEY_STATE, record.as_slice())?;
            }
            if let Some(logic) = &step.logic {
                root.insert(KEY_LOGIC, logic.as_bytes().as_slice())?;
            }
            if let Some(seq) = step.done {
                queue.remove(&seq.to_be_bytes())?;
            }
            for (seq, bytes) in &step.produced {
                queue.insert(&seq.to_be_bytes(), bytes.as_slice())?;
            }
            for (address, bytes) in &step.wallets {
                wallets.insert(address.to_bytes().as_slice(), bytes.as_slice())?;
            }
            Ok::<(), ConflictableTransactionError<DbError>>(())
        })?;

        self.db.flush()?;
        debug!(
            done = ?step.done,
            produced = step.produced.len(),
            wallets = step.wallets.len(),
            "step committed"
        );
        Ok(())
    }

    // -- Wallet accounts --------------------------------------------------------

    /// Persist a wallet account.
    pub fn put_wallet<T: Serialize>(&self, address: &Address, wallet: &T) -> DbResult<()> {
        self.wallets.insert(address.to_bytes(), encode(wallet)?)?;
        Ok(())
    }

    /// Load a wallet account.
    pub fn get_wallet<T: DeserializeOwned>(&self, address: &Address) -> DbResult<Option<T>> {
        match self.wallets.get(address.to_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Number of wallet accounts.
    pub fn wallet_count(&self) -> usize {
        self.wallets.len()
    }

    /// Force a flush of all pending writes to disk.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Checkpoint
// ---------------------------------------------------------------------------

/// The writes of one step, staged for [`LedgerDb::commit_step`].
/// Values are encoded as they are staged.
#[derive(Debug, Default)]
pub struct Checkpoint {
    record: Option<Vec<u8>>,
    logic: Option<CodeHash>,
    done: Option<u64>,
    produced: Vec<(u64, Vec<u8>)>,
    wallets: Vec<(Address, Vec<u8>)>,
}

impl Checkpoint {
    /// A checkpoint that retires the queued message `seq`.
    pub fn done(seq: u64) -> Self {
        Self {
            done: Some(seq),
            ..Self::default()
        }
    }

    /// Replaces the persisted state record.
    pub fn set_record(&mut self, record: Vec<u8>) {
        self.record = Some(record);
    }

    /// Records a newly installed logic hash.
    pub fn set_logic(&mut self, hash: CodeHash) {
        self.logic = Some(hash);
    }

    /// Queues `msg` under `seq`.
    pub fn enqueue<T: Serialize>(&mut self, seq: u64, msg: &T) -> DbResult<()> {
        self.produced.push((seq, encode(msg)?));
        Ok(())
    }

    /// Overwrites the wallet account at `address`.
    pub fn put_wallet<T: Serialize>(&mut self, address: &Address, wallet: &T) -> DbResult<()> {
        self.wallets.push((*address, encode(wallet)?));
        Ok(())
    }
}

impl TemplateStore for LedgerDb {
    fn put(&self, code: &CodeBlob) -> Result<CodeHash, TemplateError> {
        let hash = code.hash();
        self.templates
            .insert(hash.as_bytes(), code.as_bytes())
            .map_err(|e| TemplateError::Storage(e.to_string()))?;
        Ok(hash)
    }

    fn get(&self, hash: &CodeHash) -> Result<Option<CodeBlob>, TemplateError> {
        let bytes = self
            .templates
            .get(hash.as_bytes())
            .map_err(|e| TemplateError::Storage(e.to_string()))?;
        Ok(bytes.map(|b| CodeBlob::new(b.to_vec())))
    }
}

fn encode<T: Serialize>(value: &T) -> DbResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> DbResult<T> {
    bincode::deserialize(bytes).map_err(|e| DbError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
