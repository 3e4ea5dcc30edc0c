//! Root ledger errors.
//!
//! Every rejected operation surfaces exactly one of these, before anything
//! was mutated or sent. The numeric codes are what the host chain reports as
//! the exit code of a failed call, so they are stable.

use thiserror::Error;
use tip3_protocol::{CodeHash, IdentityError, TemplateError};

/// Errors that can occur during root ledger operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RootError {
    /// The caller is not the account or key this operation requires.
    #[error("message sender is not authorized for this operation")]
    Unauthorized,

    /// Granting (or burning) this amount would break
    /// `total_granted <= total_supply`.
    #[error("insufficient supply: requested {requested}, available {available}")]
    InsufficientSupply {
        /// Amount the operation needed.
        requested: u128,
        /// Amount that could be granted or burned.
        available: u128,
    },

    /// A bounce report for something other than a credit.
    #[error("bounced message is not a credit: {0}")]
    UnexpectedBounce(String),

    /// A required collaborator, template or credential is missing.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The wallet code does not match the pinned hash.
    #[error("wrong wallet code hash: expected {expected}, got {actual}")]
    TemplateHashMismatch {
        /// The pinned hash.
        expected: CodeHash,
        /// The hash of the supplied code.
        actual: CodeHash,
    },

    /// A write-once field was already written.
    #[error("already initialized")]
    AlreadyInitialized,

    /// The ledger is in a state that should be impossible. Fatal.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A u128 computation overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// The persisted state record could not be encoded or decoded.
    #[error("state record error: {0}")]
    Record(String),
}

impl RootError {
    /// Exit code reported to the host.
    pub fn code(&self) -> u32 {
        match self {
            RootError::Unauthorized => 100,
            RootError::InsufficientSupply { .. } => 101,
            RootError::UnexpectedBounce(_) => 102,
            RootError::InvalidConfiguration(_) => 106,
            RootError::TemplateHashMismatch { .. } => 107,
            RootError::AlreadyInitialized => 108,
            RootError::InvariantViolation(_) => 111,
            RootError::ArithmeticOverflow => 112,
            RootError::Record(_) => 113,
        }
    }

    /// True for errors that mean the ledger itself is corrupt rather than
    /// the request being wrong.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RootError::InvariantViolation(_))
    }
}

impl From<IdentityError> for RootError {
    fn from(e: IdentityError) -> Self {
        RootError::InvalidConfiguration(e.to_string())
    }
}

impl From<TemplateError> for RootError {
    fn from(e: TemplateError) -> Self {
        match e {
            TemplateError::HashMismatch { expected, actual } => {
                RootError::TemplateHashMismatch { expected, actual }
            }
            other => RootError::InvalidConfiguration(other.to_string()),
        }
    }
}
