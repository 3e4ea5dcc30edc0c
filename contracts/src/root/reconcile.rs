//! # Reconciliation
//!
//! A credit that bounces never reached its wallet, so the grant it carried
//! is taken back. Nothing else is expected to bounce; any other report is
//! refused and the ledger left alone.

use tip3_protocol::{DeliveryFailure, Instruction};
use tracing::{error, info, warn};

use super::{Receipt, RootContract, RootError};

impl RootContract {
    /// Handles a bounce report. Returns the amount taken back.
    ///
    /// # Errors
    ///
    /// - [`RootError::UnexpectedBounce`] for anything but an `AcceptMint`.
    /// - [`RootError::InvariantViolation`] if the bounced amount exceeds
    ///   `total_granted`. Nothing changes.
    pub fn on_delivery_failure(
        &mut self,
        report: &DeliveryFailure,
    ) -> Result<Receipt<u128>, RootError> {
        let tokens = match &report.body {
            Instruction::AcceptMint { tokens, .. } => *tokens,
            other => {
                warn!(dest = %report.dest, kind = other.name(), "ignoring unexpected bounce");
                return Err(RootError::UnexpectedBounce(other.name().to_string()));
            }
        };

        if let Err(e) = self.state.ledger.reconcile_failed_grant(tokens) {
            error!(dest = %report.dest, tokens = %tokens, error = %e, "bounced credit exceeds granted");
            return Err(e);
        }

        info!(dest = %report.dest, tokens = %tokens, granted = %self.total_granted(), "bounced credit reconciled");
        Ok(Receipt::new(tokens, Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{owner_ctx, root};
    use super::*;
    use tip3_protocol::{HolderIdentity, PublicKey};

    fn holder() -> HolderIdentity {
        HolderIdentity::from_pubkey(PublicKey::from_bytes([1; 32]))
    }

    #[test]
    fn bounced_grant_is_taken_back() {
        let mut root = root(1_000);
        let receipt = root.grant_tokens(&owner_ctx(), holder(), 250, 0, None).unwrap();
        let report = DeliveryFailure::of(&receipt.messages[0]).unwrap();

        assert_eq!(root.on_delivery_failure(&report).unwrap().value, 250);
        assert_eq!(root.total_granted(), 0);
        assert_eq!(root.total_supply(), 1_000);
    }

    #[test]
    fn oversized_bounce_is_fatal_and_inert() {
        let mut root = root(1_000);
        root.grant_tokens(&owner_ctx(), holder(), 10, 0, None).unwrap();
        let report = DeliveryFailure {
            dest: root.address(),
            body: Instruction::AcceptMint {
                tokens: 11,
                answer_to: root.address(),
                funds: 0,
                notify: None,
            },
        };
        let before = root.to_record().unwrap();
        let err = root.on_delivery_failure(&report).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(root.to_record().unwrap(), before);
    }

    #[test]
    fn non_credit_bounce_is_refused() {
        let mut root = root(1_000);
        let report = DeliveryFailure {
            dest: root.address(),
            body: Instruction::AskFunds {
                root: root.state().root_data(),
            },
        };
        assert!(matches!(
            root.on_delivery_failure(&report),
            Err(RootError::UnexpectedBounce(_))
        ));
    }
}
