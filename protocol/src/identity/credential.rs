//! # Credentials
//!
//! Who a token holder is, and who owns the root.
//!
//! A holder is identified by an Ed25519 public key, an owning account, or
//! both. Exactly which combination is part of the wallet's init data, so
//! `(pk, None)` and `(pk, Some(owner))` are two different wallets.
//!
//! The root owner is stricter: either a public key (external messages signed
//! by that key) or an account (internal messages sent from it), never both.
//! That choice is made once at construction and is encoded as an enum so no
//! code path ever has to wonder which one applies.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Address, IdentityError};

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// A 256-bit public key as the host chain sees it.
///
/// The all-zero key means "no key". It is a valid value of this type (the
/// host ABI has no optional integers) but never a valid credential on its
/// own.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// The absent key.
    pub const ZERO: PublicKey = PublicKey([0u8; 32]);

    /// Wraps raw key bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// True for [`PublicKey::ZERO`].
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Hex-encoded key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a 64-character hex key. A `0x` prefix is tolerated.
    pub fn from_hex(s: &str) -> Result<Self, IdentityError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|_| IdentityError::InvalidPublicKey)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| IdentityError::InvalidPublicKey)?;
        Ok(Self(arr))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// HolderIdentity
// ---------------------------------------------------------------------------

/// The credential pair a holder wallet is derived from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HolderIdentity {
    /// Holder's public key, [`PublicKey::ZERO`] when the wallet is owned by
    /// an account only.
    pub pubkey: PublicKey,
    /// Owning account, if any.
    pub owner: Option<Address>,
}

impl HolderIdentity {
    /// Builds a holder identity, rejecting the empty credential.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingCredential`] if `pubkey` is zero and
    /// `owner` is `None`.
    pub fn new(pubkey: PublicKey, owner: Option<Address>) -> Result<Self, IdentityError> {
        let identity = Self { pubkey, owner };
        identity.validate()?;
        Ok(identity)
    }

    /// A holder identified by key alone. Batch grants and trusted grants
    /// only ever address these.
    pub fn from_pubkey(pubkey: PublicKey) -> Self {
        Self {
            pubkey,
            owner: None,
        }
    }

    /// A holder identified by an owning account alone.
    pub fn from_owner(owner: Address) -> Self {
        Self {
            pubkey: PublicKey::ZERO,
            owner: Some(owner),
        }
    }

    /// Checks that at least one credential is present.
    ///
    /// Deserialized identities bypass [`HolderIdentity::new`], so every
    /// entry point that accepts one calls this again.
    pub fn validate(&self) -> Result<(), IdentityError> {
        if self.pubkey.is_zero() && self.owner.is_none() {
            return Err(IdentityError::MissingCredential);
        }
        Ok(())
    }
}

impl fmt::Debug for HolderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "Holder({}, owner={})", self.pubkey.to_hex(), owner),
            None => write!(f, "Holder({})", self.pubkey.to_hex()),
        }
    }
}

// ---------------------------------------------------------------------------
// OwnerCredential
// ---------------------------------------------------------------------------

/// How the root's owner authenticates.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerCredential {
    /// External owner: calls arrive as external messages signed by this key.
    PublicKey(PublicKey),
    /// Internal owner: calls arrive as internal messages from this account.
    Account(Address),
}

impl OwnerCredential {
    /// Builds the credential from the (pubkey, owner) pair the deployer
    /// supplies.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::MissingCredential`] if neither is set.
    /// - [`IdentityError::ConflictingCredentials`] if both are set.
    pub fn from_parts(pubkey: PublicKey, owner: Option<Address>) -> Result<Self, IdentityError> {
        match (pubkey.is_zero(), owner) {
            (true, None) => Err(IdentityError::MissingCredential),
            (false, Some(_)) => Err(IdentityError::ConflictingCredentials),
            (false, None) => Ok(Self::PublicKey(pubkey)),
            (true, Some(addr)) => Ok(Self::Account(addr)),
        }
    }

    /// The key half of the pair used in wallet init data. Zero for
    /// account-owned roots.
    pub fn root_pubkey(&self) -> PublicKey {
        match self {
            Self::PublicKey(pk) => *pk,
            Self::Account(_) => PublicKey::ZERO,
        }
    }

    /// The account half of the pair used in wallet init data.
    pub fn root_owner(&self) -> Option<Address> {
        match self {
            Self::PublicKey(_) => None,
            Self::Account(addr) => Some(*addr),
        }
    }

    /// True when the owner talks to the root through internal messages.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Account(_))
    }

    /// The identity of the owner's own token wallet.
    pub fn as_holder(&self) -> HolderIdentity {
        HolderIdentity {
            pubkey: self.root_pubkey(),
            owner: self.root_owner(),
        }
    }
}

impl fmt::Debug for OwnerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PublicKey(pk) => write!(f, "Owner::PublicKey({})", pk.to_hex()),
            Self::Account(addr) => write!(f, "Owner::Account({})", addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(b: u8) -> PublicKey {
        PublicKey::from_bytes([b; 32])
    }

    #[test]
    fn zero_key_is_absent() {
        assert!(PublicKey::ZERO.is_zero());
        assert!(!key(1).is_zero());
    }

    #[test]
    fn hex_roundtrip_with_prefix() {
        let pk = key(0x5a);
        let parsed = PublicKey::from_hex(&format!("0x{}", pk.to_hex())).unwrap();
        assert_eq!(parsed, pk);
    }

    #[test]
    fn hex_rejects_wrong_length() {
        assert!(PublicKey::from_hex("abcd").is_err());
    }

    #[test]
    fn holder_requires_a_credential() {
        assert!(HolderIdentity::new(PublicKey::ZERO, None).is_err());
        assert!(HolderIdentity::new(key(1), None).is_ok());
        assert!(HolderIdentity::new(PublicKey::ZERO, Some(Address::new(0, [1; 32]))).is_ok());
    }

    #[test]
    fn holder_with_owner_differs_from_key_only() {
        let a = HolderIdentity::from_pubkey(key(1));
        let b = HolderIdentity::new(key(1), Some(Address::new(0, [2; 32]))).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn owner_credential_is_mutually_exclusive() {
        let addr = Address::new(0, [9; 32]);
        assert!(matches!(
            OwnerCredential::from_parts(PublicKey::ZERO, None),
            Err(IdentityError::MissingCredential)
        ));
        assert!(matches!(
            OwnerCredential::from_parts(key(1), Some(addr)),
            Err(IdentityError::ConflictingCredentials)
        ));
        assert_eq!(
            OwnerCredential::from_parts(key(1), None).unwrap(),
            OwnerCredential::PublicKey(key(1))
        );
        assert_eq!(
            OwnerCredential::from_parts(PublicKey::ZERO, Some(addr)).unwrap(),
            OwnerCredential::Account(addr)
        );
    }

    #[test]
    fn owner_projection_matches_variant() {
        let addr = Address::new(0, [9; 32]);
        let internal = OwnerCredential::Account(addr);
        assert!(internal.is_internal());
        assert!(internal.root_pubkey().is_zero());
        assert_eq!(internal.root_owner(), Some(addr));

        let external = OwnerCredential::PublicKey(key(3));
        assert!(!external.is_internal());
        assert_eq!(external.as_holder(), HolderIdentity::from_pubkey(key(3)));
    }
}
