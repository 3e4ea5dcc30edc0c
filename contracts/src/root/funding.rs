//! # Funding Throttle
//!
//! A root pays for the messages it sends. When its balance runs low it asks
//! the checker for more, at most once per cooldown while a request is still
//! unanswered:
//!
//! ```text
//! balance > threshold                      → nothing
//! now - last_request < cooldown && pending → nothing
//! otherwise                                → pending, AskFunds → checker
//! ```
//!
//! The checker's idle notice clears the pending flag.

use serde::{Deserialize, Serialize};
use tip3_protocol::config::{FUNDING_BALANCE_THRESHOLD, FUNDING_COOLDOWN_SECS, FUNDING_REQUEST_VALUE};
use tip3_protocol::{Instruction, MessageValue, OutboundMessage, Sender};
use tracing::debug;

use super::{CallContext, Receipt, RootContract};

/// Throttle bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingState {
    /// When the last request went out (host clock, seconds).
    pub last_request_at: u64,
    /// A request is outstanding.
    pub in_flight: bool,
}

impl FundingState {
    /// Decides whether a request goes out now, and records it if so.
    pub fn should_request(&mut self, balance: u128, now: u64) -> bool {
        if balance > FUNDING_BALANCE_THRESHOLD {
            return false;
        }
        if now.saturating_sub(self.last_request_at) < FUNDING_COOLDOWN_SECS && self.in_flight {
            return false;
        }
        self.in_flight = true;
        self.last_request_at = now;
        true
    }
}

impl RootContract {
    /// Runs the throttle for the current call. Must only be reached once
    /// the call has passed validation.
    pub(crate) fn request_funds_if_low(&mut self, ctx: &CallContext, out: &mut Vec<OutboundMessage>) {
        if !self.state.funding.should_request(ctx.balance, ctx.now) {
            return;
        }
        debug!(balance = %ctx.balance, now = ctx.now, "requesting funds from checker");
        out.push(OutboundMessage::call(
            self.state.topology.checker,
            MessageValue::Fixed(FUNDING_REQUEST_VALUE),
            Instruction::AskFunds {
                root: self.state.root_data(),
            },
        ));
    }

    /// The checker has nothing pending for us. Clears the in-flight flag
    /// when it really came from the checker; ignored otherwise.
    pub fn on_idle_notice(&mut self, ctx: &CallContext) -> Receipt<bool> {
        let cleared = ctx.sender == Sender::Internal(self.state.topology.checker);
        if cleared {
            self.state.funding.in_flight = false;
        }
        Receipt::new(cleared, Vec::new())
    }

    pub fn funding_in_flight(&self) -> bool {
        self.state.funding.in_flight
    }
}
