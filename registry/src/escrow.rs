//! # Pull-Payment Escrow Ledger
//!
//! Every unit of value the registry owes to anyone sits in this ledger
//! until the creditor pulls it out themselves. Marketplace settlements,
//! outbid refunds, and purchase change are all *credits* here; the only
//! way value leaves is an explicit [`EscrowLedger::withdraw`] by the
//! creditor (or the treasurer's solvency-guarded sweep, which lives a
//! level up because it needs the bid-escrow total too).
//!
//! Push transfers are deliberately impossible: a failed push can never
//! corrupt this ledger because there are no pushes. Credit first, let
//! the recipient come collect.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::address::Address;
use crate::error::{RegistryError, Result};

/// The map of pending (withdrawable) balances, plus a maintained total
/// so the solvency check is O(1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EscrowLedger {
    pending: HashMap<Address, u64>,
    total_pending: u64,
}

impl EscrowLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount` to `to`'s pending balance.
    ///
    /// # Errors
    ///
    /// [`RegistryError::AmountOverflow`] if either the entry or the
    /// running total would wrap. Nothing is mutated on failure.
    pub fn credit(&mut self, to: Address, amount: u64) -> Result<u64> {
        let current = self.pending.get(&to).copied().unwrap_or(0);
        let new_balance = current
            .checked_add(amount)
            .ok_or(RegistryError::AmountOverflow)?;
        let new_total = self
            .total_pending
            .checked_add(amount)
            .ok_or(RegistryError::AmountOverflow)?;

        self.pending.insert(to, new_balance);
        self.total_pending = new_total;
        Ok(new_balance)
    }

    /// Credits several amounts in one all-or-nothing step.
    ///
    /// Settlement paths credit two parties at once (seller proceeds plus
    /// buyer change); committing one and failing the other would violate
    /// the no-partial-mutation rule, so every credit is validated against
    /// simulated balances before any is applied. Zero amounts are skipped.
    pub fn credit_many(&mut self, credits: &[(Address, u64)]) -> Result<()> {
        let mut simulated_total = self.total_pending;
        let mut simulated: HashMap<Address, u64> = HashMap::new();
        for &(to, amount) in credits {
            if amount == 0 {
                continue;
            }
            let current = simulated
                .get(&to)
                .copied()
                .unwrap_or_else(|| self.pending_of(to));
            let next = current
                .checked_add(amount)
                .ok_or(RegistryError::AmountOverflow)?;
            simulated_total = simulated_total
                .checked_add(amount)
                .ok_or(RegistryError::AmountOverflow)?;
            simulated.insert(to, next);
        }

        self.pending.extend(simulated);
        self.total_pending = simulated_total;
        Ok(())
    }

    /// Zeroes and returns `caller`'s pending balance.
    ///
    /// A zero balance is a silent no-op returning 0, not an error — the
    /// caller asked for everything they are owed and got exactly that.
    pub fn withdraw(&mut self, caller: Address) -> u64 {
        match self.pending.remove(&caller) {
            Some(amount) => {
                self.total_pending -= amount;
                amount
            }
            None => 0,
        }
    }

    /// The pending balance of one address.
    pub fn pending_of(&self, addr: Address) -> u64 {
        self.pending.get(&addr).copied().unwrap_or(0)
    }

    /// Sum of all pending balances. Input to the solvency invariant.
    pub fn total_pending(&self) -> u64 {
        self.total_pending
    }

    /// Number of addresses currently owed something.
    pub fn creditor_count(&self) -> usize {
        self.pending.len()
    }

    /// Drops every entry. Only the registry's destroy path calls this.
    pub fn wipe(&mut self) {
        self.pending.clear();
        self.total_pending = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_accumulates_and_tracks_total() {
        let mut ledger = EscrowLedger::new();
        let a = Address::random();
        let b = Address::random();

        ledger.credit(a, 500).unwrap();
        ledger.credit(a, 300).unwrap();
        ledger.credit(b, 100).unwrap();

        assert_eq!(ledger.pending_of(a), 800);
        assert_eq!(ledger.pending_of(b), 100);
        assert_eq!(ledger.total_pending(), 900);
        assert_eq!(ledger.creditor_count(), 2);
    }

    #[test]
    fn withdraw_zeroes_own_balance_only() {
        let mut ledger = EscrowLedger::new();
        let a = Address::random();
        let b = Address::random();
        ledger.credit(a, 700).unwrap();
        ledger.credit(b, 50).unwrap();

        assert_eq!(ledger.withdraw(a), 700);
        assert_eq!(ledger.pending_of(a), 0);
        assert_eq!(ledger.pending_of(b), 50);
        assert_eq!(ledger.total_pending(), 50);
    }

    #[test]
    fn withdraw_with_no_balance_is_a_noop() {
        let mut ledger = EscrowLedger::new();
        assert_eq!(ledger.withdraw(Address::random()), 0);
        assert_eq!(ledger.total_pending(), 0);
    }

    #[test]
    fn overflow_leaves_state_untouched() {
        let mut ledger = EscrowLedger::new();
        let a = Address::random();
        ledger.credit(a, u64::MAX).unwrap();

        let err = ledger.credit(a, 1).unwrap_err();
        assert_eq!(err, RegistryError::AmountOverflow);
        assert_eq!(ledger.pending_of(a), u64::MAX);
        assert_eq!(ledger.total_pending(), u64::MAX);
    }

    #[test]
    fn total_overflow_rejected_across_entries() {
        let mut ledger = EscrowLedger::new();
        ledger.credit(Address::random(), u64::MAX - 10).unwrap();
        let err = ledger.credit(Address::random(), 11).unwrap_err();
        assert_eq!(err, RegistryError::AmountOverflow);
        assert_eq!(ledger.total_pending(), u64::MAX - 10);
    }

    #[test]
    fn credit_many_is_all_or_nothing() {
        let mut ledger = EscrowLedger::new();
        let a = Address::random();
        let b = Address::random();
        ledger.credit(b, u64::MAX - 5).unwrap();

        let err = ledger.credit_many(&[(a, 100), (b, 10)]).unwrap_err();
        assert_eq!(err, RegistryError::AmountOverflow);
        assert_eq!(ledger.pending_of(a), 0, "first credit must not stick");
        assert_eq!(ledger.pending_of(b), u64::MAX - 5);
        assert_eq!(ledger.total_pending(), u64::MAX - 5);
    }

    #[test]
    fn credit_many_merges_duplicate_addresses() {
        let mut ledger = EscrowLedger::new();
        let a = Address::random();
        ledger.credit_many(&[(a, 100), (a, 50), (a, 0)]).unwrap();
        assert_eq!(ledger.pending_of(a), 150);
        assert_eq!(ledger.total_pending(), 150);
        assert_eq!(ledger.creditor_count(), 1);
    }

    #[test]
    fn wipe_clears_everything() {
        let mut ledger = EscrowLedger::new();
        ledger.credit(Address::random(), 123).unwrap();
        ledger.wipe();
        assert_eq!(ledger.total_pending(), 0);
        assert_eq!(ledger.creditor_count(), 0);
    }
}
