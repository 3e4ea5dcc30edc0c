//! # Code Templates
//!
//! Wallet accounts are instances of one code template. The template is
//! content-addressed: its identity is the SHA-256 of its bytes, and the root
//! is built against one pinned hash. A blob whose hash differs from the pin
//! is refused at the door; [`VerifiedTemplate::verify`] is the only way to
//! obtain a template the address deriver accepts, so no other code path has
//! to re-check it.
//!
//! ```text
//! CodeBlob ──verify(pin)──▶ VerifiedTemplate ──▶ derive_wallet_address
//!     │
//!     └──put──▶ TemplateStore (keyed by CodeHash)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::crypto::sha256_array;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by template verification and template stores.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The blob does not hash to the pinned value.
    #[error("wrong wallet code hash: expected {expected}, got {actual}")]
    HashMismatch {
        /// The pinned hash.
        expected: CodeHash,
        /// The hash of the supplied blob.
        actual: CodeHash,
    },

    /// Empty code can never be a wallet.
    #[error("empty code blob")]
    Empty,

    /// The store has no blob under this hash.
    #[error("template not found: {0}")]
    NotFound(CodeHash),

    /// The backing store failed.
    #[error("template store error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// CodeBlob / CodeHash
// ---------------------------------------------------------------------------

/// Opaque contract code.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlob(Vec<u8>);

impl CodeBlob {
    /// Wraps raw code bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw code bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Size of the blob in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-length blob.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Content hash of the blob.
    pub fn hash(&self) -> CodeHash {
        CodeHash(sha256_array(&self.0))
    }
}

impl fmt::Debug for CodeBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodeBlob({} bytes, {})", self.0.len(), self.hash())
    }
}

/// SHA-256 content hash of a [`CodeBlob`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CodeHash([u8; 32]);

impl CodeHash {
    /// Wraps a raw digest.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a hex-encoded digest.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl fmt::Display for CodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for CodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodeHash({})", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Pinning & verification
// ---------------------------------------------------------------------------

/// The wallet code hash a root is built against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePin {
    /// Expected SHA-256 of the wallet code.
    pub code_hash: CodeHash,
}

impl TemplatePin {
    /// Pins the given hash.
    pub fn new(code_hash: CodeHash) -> Self {
        Self { code_hash }
    }

    /// Pins whatever `code` hashes to. Handy for tests and for `init`
    /// commands that receive the blob itself.
    pub fn of(code: &CodeBlob) -> Self {
        Self {
            code_hash: code.hash(),
        }
    }
}

/// A code blob whose hash matched the pin at acceptance time.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredTemplate", into = "StoredTemplate")]
pub struct VerifiedTemplate {
    code: CodeBlob,
    hash: CodeHash,
}

impl VerifiedTemplate {
    /// Accepts `code` if it hashes to `pin`.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::Empty`] for an empty blob.
    /// - [`TemplateError::HashMismatch`] when the hash differs from the pin.
    pub fn verify(code: CodeBlob, pin: &TemplatePin) -> Result<Self, TemplateError> {
        if code.is_empty() {
            return Err(TemplateError::Empty);
        }
        let hash = code.hash();
        if hash != pin.code_hash {
            return Err(TemplateError::HashMismatch {
                expected: pin.code_hash,
                actual: hash,
            });
        }
        Ok(Self { code, hash })
    }

    /// The verified code.
    pub fn code(&self) -> &CodeBlob {
        &self.code
    }

    /// The code's content hash.
    pub fn hash(&self) -> CodeHash {
        self.hash
    }
}

impl fmt::Debug for VerifiedTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifiedTemplate({})", self.hash)
    }
}

/// On-disk shape of a [`VerifiedTemplate`]: only the code is stored, the
/// hash is recomputed on load.
#[derive(Serialize, Deserialize)]
struct StoredTemplate {
    code: CodeBlob,
}

impl From<StoredTemplate> for VerifiedTemplate {
    fn from(stored: StoredTemplate) -> Self {
        let hash = stored.code.hash();
        Self {
            code: stored.code,
            hash,
        }
    }
}

impl From<VerifiedTemplate> for StoredTemplate {
    fn from(t: VerifiedTemplate) -> Self {
        Self { code: t.code }
    }
}

// ---------------------------------------------------------------------------
// TemplateStore
// ---------------------------------------------------------------------------

/// Content-addressable storage for code blobs.
pub trait TemplateStore {
    /// Stores `code` and returns its hash. Storing the same blob twice is a
    /// no-op.
    fn put(&self, code: &CodeBlob) -> Result<CodeHash, TemplateError>;

    /// Fetches the blob stored under `hash`.
    fn get(&self, hash: &CodeHash) -> Result<Option<CodeBlob>, TemplateError>;

    /// Fetches the blob for `pin` and verifies it.
    fn fetch_verified(&self, pin: &TemplatePin) -> Result<VerifiedTemplate, TemplateError> {
        let code = self
            .get(&pin.code_hash)?
            .ok_or(TemplateError::NotFound(pin.code_hash))?;
        VerifiedTemplate::verify(code, pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet_code() -> CodeBlob {
        CodeBlob::new(b"tip3 wallet code v1".to_vec())
    }

    #[test]
    fn verify_accepts_matching_pin() {
        let code = wallet_code();
        let pin = TemplatePin::of(&code);
        let t = VerifiedTemplate::verify(code.clone(), &pin).unwrap();
        assert_eq!(t.hash(), code.hash());
        assert_eq!(t.code(), &code);
    }

    #[test]
    fn verify_rejects_other_code() {
        let pin = TemplatePin::of(&wallet_code());
        let err = VerifiedTemplate::verify(CodeBlob::new(b"evil".to_vec()), &pin).unwrap_err();
        assert!(matches!(err, TemplateError::HashMismatch { .. }));
    }

    #[test]
    fn verify_rejects_empty_code() {
        let empty = CodeBlob::new(Vec::new());
        let pin = TemplatePin::of(&empty);
        assert!(matches!(
            VerifiedTemplate::verify(empty, &pin),
            Err(TemplateError::Empty)
        ));
    }

    #[test]
    fn serde_recomputes_hash() {
        let code = wallet_code();
        let t = VerifiedTemplate::verify(code.clone(), &TemplatePin::of(&code)).unwrap();
        let bytes = bincode::serialize(&t).unwrap();
        let back: VerifiedTemplate = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.hash(), code.hash());
    }
}
