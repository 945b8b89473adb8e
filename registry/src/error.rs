//! # Error Taxonomy
//!
//! Every precondition the registry can reject has its own named variant,
//! so callers and tests assert on cause instead of pattern-matching error
//! strings. All failures are synchronous and fully reverting: an entry
//! point that returns an error has mutated nothing.

use thiserror::Error;

use crate::access::Role;
use crate::address::Address;
use crate::phase::Phase;
use crate::spinner::{SpinnerId, Tier};

/// Convenience alias used by every fallible registry operation.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur during registry, marketplace, and escrow operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The caller does not hold the role the operation requires.
    #[error("unauthorized: {caller} is not the {role}")]
    Unauthorized {
        /// The role the operation requires.
        role: Role,
        /// Who actually called.
        caller: Address,
    },

    /// The lifecycle phase forbids this operation.
    #[error("phase gate failed: currently {current}, operation requires {requirement}")]
    PhaseNotAllowed {
        /// The phase the registry is currently in.
        current: Phase,
        /// Human-readable description of the required phase window.
        requirement: &'static str,
    },

    /// `advance_phase` was called at the terminal phase.
    #[error("invalid phase transition: {current} is terminal")]
    InvalidPhaseTransition {
        /// The (terminal) current phase.
        current: Phase,
    },

    /// The spinner id has never been minted.
    #[error("invalid asset: spinner {0} does not exist")]
    InvalidAsset(SpinnerId),

    /// The caller does not own the spinner this operation requires them to.
    #[error("not owner: {caller} does not own spinner {id}")]
    NotOwner { id: SpinnerId, caller: Address },

    /// Transfers to the null address are forbidden.
    #[error("invalid recipient: the null address cannot own spinners")]
    InvalidRecipient,

    /// Self-approval is meaningless and rejected.
    #[error("invalid approval: {caller} cannot approve themselves for spinner {id}")]
    InvalidApproval { id: SpinnerId, caller: Address },

    /// The caller is not the approved transferee of the spinner.
    #[error("not approved: {caller} is not approved for spinner {id}")]
    NotApproved { id: SpinnerId, caller: Address },

    /// The caller is not the seller behind the standing offer.
    #[error("not seller: {caller} did not post the offer on spinner {id}")]
    NotSeller { id: SpinnerId, caller: Address },

    /// The caller is not the bidder behind the standing bid.
    #[error("not bidder: {caller} does not hold the bid on spinner {id}")]
    NotBidder { id: SpinnerId, caller: Address },

    /// The offer is restricted to a different buyer.
    #[error("not authorized buyer: the offer on spinner {id} is not addressed to {caller}")]
    NotAuthorizedBuyer { id: SpinnerId, caller: Address },

    /// There is no active offer on the spinner.
    #[error("not for sale: spinner {0} has no active offer")]
    NotForSale(SpinnerId),

    /// Payment fell short of the asked price.
    #[error("insufficient payment: required {required}, sent {sent}")]
    InsufficientPayment { required: u64, sent: u64 },

    /// The bid does not strictly exceed the standing one (or was zero).
    #[error("bid too low: {offered} does not exceed the standing {standing}")]
    BidTooLow {
        /// The amount that must be strictly exceeded (0 when no bid stands).
        standing: u64,
        /// The rejected bid amount.
        offered: u64,
    },

    /// Owners cannot bid on their own spinners.
    #[error("cannot bid on own spinner {0}")]
    CannotBidOwnAsset(SpinnerId),

    /// The standing bid differs from what the seller agreed to accept.
    #[error("bid mismatch on spinner {id}: standing bid {standing:?}, minimum acceptable {min_accept}")]
    BidMismatch {
        id: SpinnerId,
        /// The standing bid amount, if any bid stands at all.
        standing: Option<u64>,
        /// The floor the seller passed to `accept_bid`.
        min_accept: u64,
    },

    /// An administrative sweep would eat into funds owed to others.
    #[error("insufficient unencumbered funds: requested {requested}, unencumbered {unencumbered}")]
    InsufficientUnencumberedFunds { requested: u64, unencumbered: u64 },

    /// The tier's supply cap (or direct-sale inventory) is exhausted.
    #[error("tier sold out: {tier} (cap {cap})")]
    TierSoldOut { tier: Tier, cap: u64 },

    /// Minting was permanently finished.
    #[error("minting closed: finish_minting is permanent")]
    MintingClosed,

    /// Bulk mint was handed sequences of unequal length.
    #[error("batch length mismatch: all bulk mint sequences must be equally long")]
    BatchLengthMismatch,

    /// A balance or counter would overflow. With u64 balances this is an
    /// attack or a bug, not a use case.
    #[error("amount overflow")]
    AmountOverflow,

    /// The registry was destroyed; no further operations are possible.
    #[error("registry destroyed")]
    Destroyed,
}
