//! # Notification Events
//!
//! Every externally observable state change appends an [`Event`] to the
//! registry's buffer. Consumers (the node's API, tests) drain the buffer
//! after each operation. Events are appended only during the commit half
//! of an operation, so a failed call never leaves any behind.
//!
//! Ordering matters in one place: a transfer that clears a standing
//! approval emits `Approval` (cleared) before `Transfer`, and clients
//! rely on it.

use serde::{Deserialize, Serialize};

use crate::access::Role;
use crate::address::Address;
use crate::phase::Phase;
use crate::spinner::{SpinnerId, Tier};

/// A registry notification. Serde-tagged for API transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A privileged role changed hands.
    RoleChanged {
        role: Role,
        previous: Address,
        new: Address,
    },
    /// The lifecycle advanced one step.
    PhaseAdvanced { from: Phase, to: Phase },
    /// A spinner was minted into the vault.
    Minted {
        id: SpinnerId,
        tier: Tier,
        owner: Address,
    },
    /// Ownership of a spinner changed, by any path.
    Transfer {
        from: Address,
        to: Address,
        id: SpinnerId,
    },
    /// The approved transferee changed. `approved: None` is a clear.
    Approval {
        owner: Address,
        approved: Option<Address>,
        id: SpinnerId,
    },
    /// An offer was posted (or replaced).
    Offered {
        id: SpinnerId,
        seller: Address,
        price: u64,
        target: Option<Address>,
    },
    /// An offer was explicitly withdrawn by its seller.
    OfferCancelled { id: SpinnerId, seller: Address },
    /// A spinner sold through its standing offer.
    Bought {
        id: SpinnerId,
        seller: Address,
        buyer: Address,
        price: u64,
    },
    /// A bid was placed (possibly displacing a lower one).
    BidEntered {
        id: SpinnerId,
        bidder: Address,
        amount: u64,
    },
    /// A bid was withdrawn by its bidder.
    BidWithdrawn {
        id: SpinnerId,
        bidder: Address,
        amount: u64,
    },
    /// The owner accepted the standing bid.
    BidAccepted {
        id: SpinnerId,
        seller: Address,
        bidder: Address,
        amount: u64,
    },
    /// A creditor pulled their pending balance.
    PaymentWithdrawn { to: Address, amount: u64 },
    /// The treasurer swept unencumbered funds.
    FundsSwept { to: Address, amount: u64 },
    /// An approved election outcome registered a moderator.
    ModeratorAdded {
        election_id: u64,
        moderator: Address,
    },
    /// Minting was permanently closed.
    MintingFinished,
    /// The registry was destroyed. The last event ever.
    Destroyed,
}
