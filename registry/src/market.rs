//! # Marketplace State
//!
//! Per spinner, two independent sub-state machines:
//!
//! - an **offer** (ask): the owner's standing sale price, optionally
//!   restricted to a single buyer;
//! - a **bid**: a buyer's standing purchase price, with the bid amount
//!   held in escrow against that specific bid.
//!
//! At most one of each per spinner; they coexist without any priority
//! rule between them. This module is the state container — pricing
//! rules, fee math, and settlement live in [`crate::registry`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::address::Address;
use crate::spinner::SpinnerId;

/// A standing sale offer posted by a spinner's owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    /// The owner who posted the offer. Must still own the spinner when
    /// the offer is evaluated.
    pub seller: Address,
    /// When set, only this address may buy.
    pub target: Option<Address>,
    /// Minimum acceptable payment.
    pub price: u64,
    /// When the offer was posted.
    pub created_at: DateTime<Utc>,
}

/// A standing bid. The amount is already held by the registry, earmarked
/// for this bid — it is neither spendable by the bidder nor a pending
/// payment until the bid resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    /// Who placed the bid.
    pub bidder: Address,
    /// Escrowed bid amount. Strictly positive.
    pub amount: u64,
    /// When the bid was placed.
    pub placed_at: DateTime<Utc>,
}

/// Offers and bids keyed by spinner id, plus the maintained total of all
/// escrowed bid amounts (the other input to the solvency invariant).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketBook {
    offers: HashMap<SpinnerId, Offer>,
    bids: HashMap<SpinnerId, Bid>,
    bid_escrow_total: u64,
}

impl MarketBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active offer on `id`, if any.
    pub fn offer(&self, id: SpinnerId) -> Option<&Offer> {
        self.offers.get(&id)
    }

    /// The active bid on `id`, if any.
    pub fn bid(&self, id: SpinnerId) -> Option<&Bid> {
        self.bids.get(&id)
    }

    /// Posts (or replaces) the offer on `id`.
    pub fn put_offer(&mut self, id: SpinnerId, offer: Offer) {
        self.offers.insert(id, offer);
    }

    /// Removes the offer on `id`, returning it if one stood.
    pub fn clear_offer(&mut self, id: SpinnerId) -> Option<Offer> {
        self.offers.remove(&id)
    }

    /// Installs a bid on `id`, returning the displaced one if a bid stood.
    /// The caller has already validated monotonicity and moved the
    /// displaced amount into the escrow ledger.
    pub fn put_bid(&mut self, id: SpinnerId, bid: Bid) -> Option<Bid> {
        self.bid_escrow_total += bid.amount;
        let previous = self.bids.insert(id, bid);
        if let Some(ref prev) = previous {
            self.bid_escrow_total -= prev.amount;
        }
        previous
    }

    /// Removes the bid on `id`, returning it if one stood.
    pub fn clear_bid(&mut self, id: SpinnerId) -> Option<Bid> {
        let bid = self.bids.remove(&id);
        if let Some(ref b) = bid {
            self.bid_escrow_total -= b.amount;
        }
        bid
    }

    /// Sum of all escrowed bid amounts.
    pub fn bid_escrow_total(&self) -> u64 {
        self.bid_escrow_total
    }

    /// Number of active offers.
    pub fn offer_count(&self) -> usize {
        self.offers.len()
    }

    /// Number of active bids.
    pub fn bid_count(&self) -> usize {
        self.bids.len()
    }

    /// Drops everything. Only the registry's destroy path calls this.
    pub fn wipe(&mut self) {
        self.offers.clear();
        self.bids.clear();
        self.bid_escrow_total = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(amount: u64) -> Bid {
        Bid {
            bidder: Address::random(),
            amount,
            placed_at: Utc::now(),
        }
    }

    #[test]
    fn offer_replacement() {
        let mut book = MarketBook::new();
        let seller = Address::random();
        book.put_offer(
            7,
            Offer {
                seller,
                target: None,
                price: 3000,
                created_at: Utc::now(),
            },
        );
        book.put_offer(
            7,
            Offer {
                seller,
                target: Some(Address::random()),
                price: 2000,
                created_at: Utc::now(),
            },
        );
        assert_eq!(book.offer_count(), 1);
        assert_eq!(book.offer(7).unwrap().price, 2000);
        assert!(book.clear_offer(7).is_some());
        assert!(book.offer(7).is_none());
    }

    #[test]
    fn bid_escrow_total_tracks_replacements() {
        let mut book = MarketBook::new();
        assert!(book.put_bid(1, bid(1000)).is_none());
        assert_eq!(book.bid_escrow_total(), 1000);

        let displaced = book.put_bid(1, bid(1001)).unwrap();
        assert_eq!(displaced.amount, 1000);
        assert_eq!(book.bid_escrow_total(), 1001);

        book.put_bid(2, bid(500));
        assert_eq!(book.bid_escrow_total(), 1501);

        let cleared = book.clear_bid(1).unwrap();
        assert_eq!(cleared.amount, 1001);
        assert_eq!(book.bid_escrow_total(), 500);
    }

    #[test]
    fn offer_and_bid_coexist_independently() {
        let mut book = MarketBook::new();
        book.put_offer(
            3,
            Offer {
                seller: Address::random(),
                target: None,
                price: 100_000,
                created_at: Utc::now(),
            },
        );
        book.put_bid(3, bid(90_000));
        assert!(book.offer(3).is_some());
        assert!(book.bid(3).is_some());

        book.clear_offer(3);
        assert!(book.bid(3).is_some(), "clearing the offer leaves the bid");
    }
}
