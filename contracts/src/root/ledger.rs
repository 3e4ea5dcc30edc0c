//! # Supply Ledger
//!
//! The three counters a root owns and nobody else may touch:
//!
//! ```text
//! total_supply   — tokens in existence
//! total_granted  — tokens credited to wallets
//! burn_count     — redemption burns processed
//! ```
//!
//! `total_granted <= total_supply` holds after every method here. Each
//! method computes the new values first and only writes them once every
//! check passed, so an `Err` always leaves the ledger untouched.

use serde::{Deserialize, Serialize};

use super::error::RootError;

/// Supply counters of one root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyLedger {
    total_supply: u128,
    total_granted: u128,
    burn_count: u128,
}

impl SupplyLedger {
    /// A ledger with `total_supply` tokens, none of them granted.
    pub fn new(total_supply: u128) -> Self {
        Self {
            total_supply,
            total_granted: 0,
            burn_count: 0,
        }
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn total_granted(&self) -> u128 {
        self.total_granted
    }

    pub fn burn_count(&self) -> u128 {
        self.burn_count
    }

    /// Supply not yet credited to any wallet.
    pub fn available(&self) -> u128 {
        self.total_supply.saturating_sub(self.total_granted)
    }

    /// Fails unless `amount` more tokens can be granted.
    pub fn ensure_grantable(&self, amount: u128) -> Result<(), RootError> {
        self.granted_after(amount).map(|_| ())
    }

    fn granted_after(&self, amount: u128) -> Result<u128, RootError> {
        let granted = self
            .total_granted
            .checked_add(amount)
            .ok_or(RootError::ArithmeticOverflow)?;
        if granted > self.total_supply {
            return Err(RootError::InsufficientSupply {
                requested: amount,
                available: self.available(),
            });
        }
        Ok(granted)
    }

    /// Records `amount` as granted.
    ///
    /// # Errors
    ///
    /// [`RootError::InsufficientSupply`] if that would exceed the supply.
    pub fn grant(&mut self, amount: u128) -> Result<(), RootError> {
        self.total_granted = self.granted_after(amount)?;
        Ok(())
    }

    /// Mints `amount` and grants it in one step. Either both counters move
    /// or neither does.
    pub fn mint_and_grant(&mut self, amount: u128) -> Result<(), RootError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(RootError::ArithmeticOverflow)?;
        let granted = self
            .total_granted
            .checked_add(amount)
            .ok_or(RootError::ArithmeticOverflow)?;
        if granted > supply {
            return Err(RootError::InvariantViolation(format!(
                "granted {granted} would exceed supply {supply}"
            )));
        }
        self.total_supply = supply;
        self.total_granted = granted;
        Ok(())
    }

    /// Removes `amount` from both supply and granted.
    ///
    /// # Errors
    ///
    /// [`RootError::InsufficientSupply`] if either counter is below
    /// `amount`.
    pub fn burn(&mut self, amount: u128) -> Result<(), RootError> {
        if self.total_granted < amount || self.total_supply < amount {
            return Err(RootError::InsufficientSupply {
                requested: amount,
                available: self.total_granted.min(self.total_supply),
            });
        }
        self.total_granted -= amount;
        self.total_supply -= amount;
        Ok(())
    }

    /// Counts one redemption burn.
    pub fn record_redemption(&mut self) -> Result<(), RootError> {
        self.burn_count = self
            .burn_count
            .checked_add(1)
            .ok_or(RootError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Takes back a grant whose credit bounced.
    ///
    /// # Errors
    ///
    /// [`RootError::InvariantViolation`] if `amount` exceeds what was ever
    /// granted. The ledger is not touched.
    pub fn reconcile_failed_grant(&mut self, amount: u128) -> Result<(), RootError> {
        if amount > self.total_granted {
            return Err(RootError::InvariantViolation(format!(
                "bounced credit of {amount} exceeds total granted {}",
                self.total_granted
            )));
        }
        self.total_granted -= amount;
        Ok(())
    }

    /// Checks `total_granted <= total_supply`.
    pub fn check_invariant(&self) -> Result<(), RootError> {
        if self.total_granted > self.total_supply {
            return Err(RootError::InvariantViolation(format!(
                "granted {} exceeds supply {}",
                self.total_granted, self.total_supply
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_within_supply() {
        let mut ledger = SupplyLedger::new(1_000);
        ledger.grant(600).unwrap();
        ledger.grant(400).unwrap();
        assert_eq!(ledger.total_granted(), 1_000);
        assert_eq!(ledger.available(), 0);
    }

    #[test]
    fn grant_beyond_supply_is_rejected_untouched() {
        let mut ledger = SupplyLedger::new(1_000);
        ledger.grant(900).unwrap();
        let before = ledger.clone();
        let err = ledger.grant(101).unwrap_err();
        assert_eq!(
            err,
            RootError::InsufficientSupply {
                requested: 101,
                available: 100
            }
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn grant_overflow() {
        let mut ledger = SupplyLedger::new(u128::MAX);
        ledger.grant(u128::MAX).unwrap();
        assert_eq!(ledger.grant(1), Err(RootError::ArithmeticOverflow));
    }

    #[test]
    fn mint_and_grant_moves_both() {
        let mut ledger = SupplyLedger::new(10);
        ledger.mint_and_grant(300).unwrap();
        assert_eq!(ledger.total_supply(), 310);
        assert_eq!(ledger.total_granted(), 300);
    }

    #[test]
    fn mint_and_grant_overflow_moves_neither() {
        let mut ledger = SupplyLedger::new(u128::MAX - 1);
        let before = ledger.clone();
        assert_eq!(ledger.mint_and_grant(5), Err(RootError::ArithmeticOverflow));
        assert_eq!(ledger, before);
    }

    #[test]
    fn burn_decrements_both() {
        let mut ledger = SupplyLedger::new(1_000);
        ledger.grant(500).unwrap();
        ledger.burn(200).unwrap();
        assert_eq!(ledger.total_supply(), 800);
        assert_eq!(ledger.total_granted(), 300);
        assert_eq!(ledger.burn_count(), 0);
    }

    #[test]
    fn burn_more_than_granted_is_rejected() {
        let mut ledger = SupplyLedger::new(1_000);
        ledger.grant(100).unwrap();
        assert!(matches!(
            ledger.burn(101),
            Err(RootError::InsufficientSupply { .. })
        ));
        assert_eq!(ledger.total_supply(), 1_000);
    }

    #[test]
    fn reconcile_restores_available_supply() {
        let mut ledger = SupplyLedger::new(1_000);
        ledger.grant(400).unwrap();
        ledger.reconcile_failed_grant(400).unwrap();
        assert_eq!(ledger.total_granted(), 0);
        assert_eq!(ledger.total_supply(), 1_000);
    }

    #[test]
    fn reconcile_more_than_granted_is_fatal() {
        let mut ledger = SupplyLedger::new(1_000);
        ledger.grant(10).unwrap();
        let err = ledger.reconcile_failed_grant(11).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(ledger.total_granted(), 10);
    }

    #[test]
    fn redemption_counter() {
        let mut ledger = SupplyLedger::new(0);
        ledger.record_redemption().unwrap();
        ledger.record_redemption().unwrap();
        assert_eq!(ledger.burn_count(), 2);
        assert!(ledger.check_invariant().is_ok());
    }
}
