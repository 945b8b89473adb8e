//! # Spinners & the Ownership Book
//!
//! A spinner is one uniquely-identified collectible: an immutable content
//! hash, three physics traits, a rarity tier, and two mint-time flags.
//! Ids are assigned sequentially at mint and never reused; a spinner is
//! never destroyed short of the registry-wide destroy switch.
//!
//! [`SpinnerBook`] is the ownership registry underneath every transfer
//! path: owner per id, approval per id, and an ordered per-owner holdings
//! index. The book maintains one invariant above all: the holdings
//! indices, taken together, partition the set of minted ids — every
//! spinner appears in exactly one owner's list.
//!
//! The book is a container. Authorization, phase gates, and event
//! emission live in [`crate::registry`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::address::{Address, ContentHash};
use crate::error::{RegistryError, Result};

/// Sequentially-assigned spinner identifier.
pub type SpinnerId = u64;

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

/// Mint-time rarity classification. Each tier carries an independent
/// supply cap and a fixed direct-purchase price (see [`crate::config`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tier {
    Common = 0,
    Uncommon = 1,
    Rare = 2,
    Legendary = 3,
}

impl Tier {
    /// All tiers, cap/price array order.
    pub const ALL: [Tier; 4] = [Tier::Common, Tier::Uncommon, Tier::Rare, Tier::Legendary];

    /// Index into per-tier cap/price arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Common => write!(f, "Common"),
            Tier::Uncommon => write!(f, "Uncommon"),
            Tier::Rare => write!(f, "Rare"),
            Tier::Legendary => write!(f, "Legendary"),
        }
    }
}

// ---------------------------------------------------------------------------
// Spinner
// ---------------------------------------------------------------------------

/// One collectible. Everything here is fixed at mint time; ownership and
/// approval live in the [`SpinnerBook`], not on the spinner itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spinner {
    /// Sequential id, assigned at mint, never reused.
    pub id: SpinnerId,
    /// Digest of the spinner's artwork.
    pub content_hash: ContentHash,
    /// Spin-up responsiveness trait.
    pub flux: u16,
    /// Momentum retention trait.
    pub inertia: u16,
    /// Spin-down drag trait.
    pub friction: u16,
    /// Rarity tier.
    pub tier: Tier,
    /// Gold edition flag.
    pub gold: bool,
    /// Reserved spinners are excluded from direct tier sales.
    pub reserved: bool,
    /// When the spinner was minted.
    pub minted_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// SpinnerBook
// ---------------------------------------------------------------------------

/// The ownership registry: spinners by id, owner and approval per id,
/// ordered holdings per owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpinnerBook {
    /// All minted spinners; the vector index is the spinner id.
    spinners: Vec<Spinner>,
    /// Current owner per id, parallel to `spinners`.
    owners: Vec<Address>,
    /// Approved transferee per id. Absent means no approval.
    approvals: HashMap<SpinnerId, Address>,
    /// Ordered holdings per owner: append on receipt, remove (order
    /// preserving) on send.
    holdings: HashMap<Address, Vec<SpinnerId>>,
}

impl SpinnerBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of spinners ever minted.
    pub fn total_minted(&self) -> u64 {
        self.spinners.len() as u64
    }

    /// Inserts a freshly minted spinner owned by `owner` and returns its id.
    /// The caller (the minting subsystem) decides the id-independent fields;
    /// the book decides the id.
    pub fn insert(&mut self, spinner: SpinnerFields, owner: Address) -> SpinnerId {
        let id = self.spinners.len() as SpinnerId;
        self.spinners.push(Spinner {
            id,
            content_hash: spinner.content_hash,
            flux: spinner.flux,
            inertia: spinner.inertia,
            friction: spinner.friction,
            tier: spinner.tier,
            gold: spinner.gold,
            reserved: spinner.reserved,
            minted_at: Utc::now(),
        });
        self.owners.push(owner);
        self.holdings.entry(owner).or_default().push(id);
        id
    }

    /// The spinner record, or [`RegistryError::InvalidAsset`] for an
    /// unminted id.
    pub fn get(&self, id: SpinnerId) -> Result<&Spinner> {
        self.spinners
            .get(id as usize)
            .ok_or(RegistryError::InvalidAsset(id))
    }

    /// Current owner of `id`.
    pub fn owner_of(&self, id: SpinnerId) -> Result<Address> {
        self.owners
            .get(id as usize)
            .copied()
            .ok_or(RegistryError::InvalidAsset(id))
    }

    /// Currently approved transferee of `id`, if any.
    pub fn approved_for(&self, id: SpinnerId) -> Result<Option<Address>> {
        self.get(id)?;
        Ok(self.approvals.get(&id).copied())
    }

    /// Sets the approval for `id`. Validation (ownership, self-approval)
    /// is the registry's job.
    pub fn set_approval(&mut self, id: SpinnerId, approved: Address) {
        self.approvals.insert(id, approved);
    }

    /// Clears the approval for `id`, returning the previous approvee.
    pub fn clear_approval(&mut self, id: SpinnerId) -> Option<Address> {
        self.approvals.remove(&id)
    }

    /// Moves `id` to `to`, maintaining both holdings indices. Returns the
    /// previous owner. Does not touch approvals — transfer paths clear
    /// those explicitly so they can emit the right notifications.
    pub fn move_to(&mut self, id: SpinnerId, to: Address) -> Result<Address> {
        let from = self.owner_of(id)?;

        let from_holdings = self
            .holdings
            .get_mut(&from)
            .expect("holder has a holdings entry");
        let pos = from_holdings
            .iter()
            .position(|&held| held == id)
            .expect("owned spinner appears in holdings");
        from_holdings.remove(pos);
        if from_holdings.is_empty() {
            self.holdings.remove(&from);
        }

        self.owners[id as usize] = to;
        self.holdings.entry(to).or_default().push(id);
        Ok(from)
    }

    /// Ordered list of spinner ids held by `owner`. Empty for strangers.
    pub fn holdings_of(&self, owner: Address) -> &[SpinnerId] {
        self.holdings.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of spinners held by `owner`.
    pub fn count_of(&self, owner: Address) -> u64 {
        self.holdings_of(owner).len() as u64
    }

    /// Iterates all minted spinners.
    pub fn iter(&self) -> impl Iterator<Item = &Spinner> {
        self.spinners.iter()
    }

    /// Drops everything. Only the registry's destroy path calls this.
    pub fn wipe(&mut self) {
        self.spinners.clear();
        self.owners.clear();
        self.approvals.clear();
        self.holdings.clear();
    }

    /// Debug check of the partition invariant: every holdings entry owns
    /// exactly the ids whose owner field points back at it, and every
    /// minted id appears exactly once. Test helper; O(n).
    #[cfg(test)]
    pub fn check_partition(&self) -> bool {
        let mut seen = vec![false; self.spinners.len()];
        for (addr, held) in &self.holdings {
            for &id in held {
                if self.owners[id as usize] != *addr || seen[id as usize] {
                    return false;
                }
                seen[id as usize] = true;
            }
        }
        seen.into_iter().all(|s| s)
    }
}

/// The id-independent fields of a spinner, as handed to [`SpinnerBook::insert`].
#[derive(Debug, Clone, Copy)]
pub struct SpinnerFields {
    pub content_hash: ContentHash,
    pub flux: u16,
    pub inertia: u16,
    pub friction: u16,
    pub tier: Tier,
    pub gold: bool,
    pub reserved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(tier: Tier) -> SpinnerFields {
        SpinnerFields {
            content_hash: ContentHash::digest(b"imagehash"),
            flux: 1,
            inertia: 2,
            friction: 3,
            tier,
            gold: false,
            reserved: false,
        }
    }

    #[test]
    fn ids_are_sequential() {
        let mut book = SpinnerBook::new();
        let owner = Address::random();
        for expected in 0..5u64 {
            assert_eq!(book.insert(fields(Tier::Common), owner), expected);
        }
        assert_eq!(book.total_minted(), 5);
    }

    #[test]
    fn unminted_id_is_invalid() {
        let book = SpinnerBook::new();
        assert_eq!(book.owner_of(0), Err(RegistryError::InvalidAsset(0)));
        assert_eq!(book.owner_of(20_000), Err(RegistryError::InvalidAsset(20_000)));
    }

    #[test]
    fn move_maintains_both_indices() {
        let mut book = SpinnerBook::new();
        let a = Address::random();
        let b = Address::random();
        let x = book.insert(fields(Tier::Common), a);
        let y = book.insert(fields(Tier::Common), a);

        let from = book.move_to(x, b).unwrap();
        assert_eq!(from, a);
        assert_eq!(book.owner_of(x).unwrap(), b);
        assert_eq!(book.holdings_of(a), &[y]);
        assert_eq!(book.holdings_of(b), &[x]);
        assert!(book.check_partition());
    }

    #[test]
    fn holdings_preserve_order_on_send() {
        let mut book = SpinnerBook::new();
        let a = Address::random();
        let b = Address::random();
        let ids: Vec<_> = (0..4).map(|_| book.insert(fields(Tier::Rare), a)).collect();

        book.move_to(ids[1], b).unwrap();
        assert_eq!(book.holdings_of(a), &[ids[0], ids[2], ids[3]]);
        assert!(book.check_partition());
    }

    #[test]
    fn self_move_keeps_one_entry() {
        let mut book = SpinnerBook::new();
        let a = Address::random();
        let id = book.insert(fields(Tier::Common), a);
        book.move_to(id, a).unwrap();
        assert_eq!(book.holdings_of(a), &[id]);
        assert!(book.check_partition());
    }

    #[test]
    fn approvals_per_id() {
        let mut book = SpinnerBook::new();
        let a = Address::random();
        let x = Address::random();
        let id = book.insert(fields(Tier::Legendary), a);

        assert_eq!(book.approved_for(id).unwrap(), None);
        book.set_approval(id, x);
        assert_eq!(book.approved_for(id).unwrap(), Some(x));
        assert_eq!(book.clear_approval(id), Some(x));
        assert_eq!(book.approved_for(id).unwrap(), None);
        assert!(book.approved_for(99).is_err());
    }

    #[test]
    fn properties_survive_as_minted() {
        let mut book = SpinnerBook::new();
        let id = book.insert(fields(Tier::Uncommon), Address::random());
        let s = book.get(id).unwrap();
        assert_eq!(s.content_hash, ContentHash::digest(b"imagehash"));
        assert_eq!((s.flux, s.inertia, s.friction), (1, 2, 3));
        assert_eq!(s.tier, Tier::Uncommon);
        assert!(!s.gold);
        assert!(!s.reserved);
    }
}
