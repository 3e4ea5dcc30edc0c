//! # Address Derivation
//!
//! Wallet addresses are a pure function of what a wallet is: the verified
//! code template plus its init data.
//!
//! ```text
//! WalletData = (name, symbol, decimals,
//!               root_pubkey, root_address,
//!               holder_pubkey, holder_owner,
//!               code_hash, workchain)
//!
//! address    = workchain : BLAKE3-derive-key(WALLET_ADDRESS_CONTEXT,
//!                                            code_hash || encode(WalletData))
//! ```
//!
//! Nobody is ever trusted to tell the root where a wallet lives. To check
//! that a message came from a holder's wallet, the root derives the address
//! again and compares it with the sender.
//!
//! `encode` is a fixed, length-prefixed layout written by hand rather than a
//! serde format: addresses outlive any serialization library version.

use serde::{Deserialize, Serialize};

use crate::config::{ROOT_ADDRESS_CONTEXT, WALLET_ADDRESS_CONTEXT};
use crate::crypto::domain_separated_hash;
use crate::identity::{Address, HolderIdentity, OwnerCredential, PublicKey};
use crate::template::{CodeHash, VerifiedTemplate};
use crate::token::TokenMetadata;

// ---------------------------------------------------------------------------
// Wallet init data
// ---------------------------------------------------------------------------

/// Init data of one holder wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletData {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub root_pubkey: PublicKey,
    pub root_address: Address,
    pub pubkey: PublicKey,
    pub owner: Option<Address>,
    pub code_hash: CodeHash,
    pub workchain: i8,
}

impl WalletData {
    /// Canonical byte encoding fed into the address hash.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.name.len() + self.symbol.len() + 4 + 4 + 1 + 32 + 33 + 32 + 34 + 32 + 1,
        );
        put_str(&mut out, &self.name);
        put_str(&mut out, &self.symbol);
        out.push(self.decimals);
        out.extend_from_slice(self.root_pubkey.as_bytes());
        out.extend_from_slice(&self.root_address.to_bytes());
        out.extend_from_slice(self.pubkey.as_bytes());
        match &self.owner {
            Some(owner) => {
                out.push(1);
                out.extend_from_slice(&owner.to_bytes());
            }
            None => out.push(0),
        }
        out.extend_from_slice(self.code_hash.as_bytes());
        out.push(self.workchain as u8);
        out
    }
}

fn put_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Everything needed to create a wallet account: which code, which data.
/// Attached to deploy messages; deploying an account that already exists
/// with the same init is a no-op on the host chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInit {
    pub code_hash: CodeHash,
    pub data: WalletData,
}

impl WalletInit {
    /// Address this init deploys to.
    pub fn address(&self) -> Address {
        let encoded = self.data.encode();
        let id = domain_separated_hash(
            WALLET_ADDRESS_CONTEXT,
            &[self.code_hash.as_bytes().as_slice(), encoded.as_slice()],
        );
        Address::new(self.data.workchain, id)
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// The root-side inputs of a wallet derivation.
#[derive(Clone, Copy, Debug)]
pub struct DerivationContext<'a> {
    pub template: &'a VerifiedTemplate,
    pub metadata: &'a TokenMetadata,
    pub root_address: Address,
    pub root_pubkey: PublicKey,
}

impl<'a> DerivationContext<'a> {
    /// Wallets live in the root's workchain.
    pub fn workchain(&self) -> i8 {
        self.root_address.workchain()
    }
}

/// Derives the init record and address of `holder`'s wallet.
///
/// Pure: identical inputs give identical outputs, nothing is touched.
pub fn derive_wallet_address(
    holder: &HolderIdentity,
    ctx: &DerivationContext<'_>,
) -> (WalletInit, Address) {
    let data = WalletData {
        name: ctx.metadata.name.clone(),
        symbol: ctx.metadata.symbol.clone(),
        decimals: ctx.metadata.decimals,
        root_pubkey: ctx.root_pubkey,
        root_address: ctx.root_address,
        pubkey: holder.pubkey,
        owner: holder.owner,
        code_hash: ctx.template.hash(),
        workchain: ctx.workchain(),
    };
    let init = WalletInit {
        code_hash: ctx.template.hash(),
        data,
    };
    let address = init.address();
    (init, address)
}

/// Derives the address of a root contract from its logic hash, metadata and
/// owner. Used by the node to give a freshly initialized root an identity.
pub fn derive_root_address(
    logic: &CodeHash,
    metadata: &TokenMetadata,
    owner: &OwnerCredential,
    workchain: i8,
) -> Address {
    let mut encoded = Vec::new();
    put_str(&mut encoded, &metadata.name);
    put_str(&mut encoded, &metadata.symbol);
    encoded.push(metadata.decimals);
    encoded.extend_from_slice(owner.root_pubkey().as_bytes());
    match owner.root_owner() {
        Some(addr) => {
            encoded.push(1);
            encoded.extend_from_slice(&addr.to_bytes());
        }
        None => encoded.push(0),
    }
    let id = domain_separated_hash(
        ROOT_ADDRESS_CONTEXT,
        &[logic.as_bytes().as_slice(), encoded.as_slice()],
    );
    Address::new(workchain, id)
}
