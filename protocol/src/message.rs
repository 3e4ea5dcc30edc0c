//! # Messages
//!
//! The root never calls anyone. It returns messages, and the host delivers
//! them later, in order per destination, at most once, possibly bouncing
//! them back. This module is the vocabulary of that exchange:
//!
//! - [`Sender`] — who sent the call being processed.
//! - [`Instruction`] — the typed body of an outbound message.
//! - [`OutboundMessage`] — destination, attached value, optional state init
//!   (create-if-absent) and optional body.
//! - [`DeliveryFailure`] — the bounce report the transport hands back.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::batch::GrantBatch;
use crate::derivation::WalletInit;
use crate::identity::{Address, PublicKey};
use crate::token::RootData;

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

/// Origin of the call being processed.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    /// External message, signed by this key (signature already checked by
    /// the host).
    External(PublicKey),
    /// Internal message from this account.
    Internal(Address),
}

impl Sender {
    /// The sending account, for internal messages.
    pub fn address(&self) -> Option<Address> {
        match self {
            Self::Internal(addr) => Some(*addr),
            Self::External(_) => None,
        }
    }

    /// The signing key, for external messages.
    pub fn pubkey(&self) -> Option<PublicKey> {
        match self {
            Self::External(pk) => Some(*pk),
            Self::Internal(_) => None,
        }
    }
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::External(pk) => write!(f, "External({})", pk.to_hex()),
            Self::Internal(addr) => write!(f, "Internal({})", addr),
        }
    }
}

// ---------------------------------------------------------------------------
// Instruction
// ---------------------------------------------------------------------------

/// Typed body of an outbound message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Credit `tokens` to the destination wallet. The wallet answers to
    /// `answer_to` and forwards `notify` to its owner.
    AcceptMint {
        tokens: u128,
        answer_to: Address,
        funds: u128,
        notify: Option<Vec<u8>>,
    },
    /// Ask the checker for operational funds.
    AskFunds { root: RootData },
    /// Ask the checker to deploy a search index for a holder.
    DeployIndex { root: RootData, pubkey: PublicKey },
    /// Tell the receiver that tokens were burned for redemption at `to`.
    RedeemBurned {
        root: RootData,
        pubkey: PublicKey,
        owner: Option<Address>,
        tokens: u128,
        to: [u8; 32],
    },
    /// Ask the new root to replay a grant burned on this one.
    DeployUpgradeWallet {
        pubkey: PublicKey,
        owner: Option<Address>,
        tokens: u128,
    },
    /// Hand burned tokens back to a DAO system contract.
    ReturnTokenToDao {
        system_contract: Address,
        root: RootData,
        pubaddr: Address,
        tokens: u128,
    },
    /// Self-addressed: process the entry under the batch cursor.
    ProcessBatchStep { batch: GrantBatch },
}

impl Instruction {
    /// Stable short name, used as a log field and metric label.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AcceptMint { .. } => "accept_mint",
            Self::AskFunds { .. } => "ask_funds",
            Self::DeployIndex { .. } => "deploy_index",
            Self::RedeemBurned { .. } => "redeem_burned",
            Self::DeployUpgradeWallet { .. } => "deploy_upgrade_wallet",
            Self::ReturnTokenToDao { .. } => "return_token_to_dao",
            Self::ProcessBatchStep { .. } => "process_batch_step",
        }
    }
}

// ---------------------------------------------------------------------------
// OutboundMessage
// ---------------------------------------------------------------------------

/// How much value a message carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageValue {
    /// A fixed amount paid from the root's balance.
    Fixed(u128),
    /// Whatever remains of the inbound value after processing. The root's
    /// pre-call balance is reserved, so the caller funds the message.
    AllRemaining,
}

/// A message the root wants delivered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub dest: Address,
    pub value: MessageValue,
    /// Return the message to the root if the destination fails it.
    pub bounce: bool,
    /// Create the destination with this init if it does not exist yet.
    pub state_init: Option<WalletInit>,
    pub body: Option<Instruction>,
}

impl OutboundMessage {
    /// A bounceable call.
    pub fn call(dest: Address, value: MessageValue, body: Instruction) -> Self {
        Self {
            dest,
            value,
            bounce: true,
            state_init: None,
            body: Some(body),
        }
    }

    /// Create-if-absent with no body. Never bounces: deploying an account
    /// that already exists is not a failure.
    pub fn deploy(init: WalletInit, value: MessageValue) -> Self {
        Self {
            dest: init.address(),
            value,
            bounce: false,
            state_init: Some(init),
            body: None,
        }
    }

    /// Create-if-absent and call in one message.
    pub fn deploy_and_call(init: WalletInit, value: MessageValue, body: Instruction) -> Self {
        Self {
            dest: init.address(),
            value,
            bounce: true,
            state_init: Some(init),
            body: Some(body),
        }
    }

    /// A plain value transfer.
    pub fn transfer(dest: Address, value: u128) -> Self {
        Self {
            dest,
            value: MessageValue::Fixed(value),
            bounce: false,
            state_init: None,
            body: None,
        }
    }

    /// Name of the body, or `deploy` / `transfer` for bodiless messages.
    pub fn kind(&self) -> &'static str {
        match (&self.body, &self.state_init) {
            (Some(body), _) => body.name(),
            (None, Some(_)) => "deploy",
            (None, None) => "transfer",
        }
    }

    /// Tokens credited by this message, if it is a credit.
    pub fn minted_tokens(&self) -> Option<u128> {
        match &self.body {
            Some(Instruction::AcceptMint { tokens, .. }) => Some(*tokens),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// DeliveryFailure
// ---------------------------------------------------------------------------

/// A bounced message, as reported back to the root by the transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFailure {
    /// Where the message was going.
    pub dest: Address,
    /// The body that failed.
    pub body: Instruction,
}

impl DeliveryFailure {
    /// Builds the report for a bounceable message. `None` for messages that
    /// cannot bounce.
    pub fn of(msg: &OutboundMessage) -> Option<Self> {
        if !msg.bounce {
            return None;
        }
        msg.body.as_ref().map(|body| Self {
            dest: msg.dest,
            body: body.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new(0, [b; 32])
    }

    #[test]
    fn sender_projections() {
        let ext = Sender::External(PublicKey::from_bytes([1; 32]));
        assert!(ext.address().is_none());
        assert!(ext.pubkey().is_some());
        let int = Sender::Internal(addr(2));
        assert_eq!(int.address(), Some(addr(2)));
        assert!(int.pubkey().is_none());
    }

    #[test]
    fn transfers_never_bounce() {
        let msg = OutboundMessage::transfer(addr(1), 10);
        assert!(DeliveryFailure::of(&msg).is_none());
        assert_eq!(msg.kind(), "transfer");
    }

    #[test]
    fn calls_produce_bounce_reports() {
        let body = Instruction::AcceptMint {
            tokens: 42,
            answer_to: addr(9),
            funds: 0,
            notify: None,
        };
        let msg = OutboundMessage::call(addr(1), MessageValue::Fixed(1), body.clone());
        let report = DeliveryFailure::of(&msg).unwrap();
        assert_eq!(report.dest, addr(1));
        assert_eq!(report.body, body);
        assert_eq!(msg.minted_tokens(), Some(42));
        assert_eq!(msg.kind(), "accept_mint");
    }
}
