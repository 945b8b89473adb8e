// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Gyro Registry — Core Library
//!
//! The complete state machine behind the Gyro collectible spinners:
//! a tiered minting pipeline, an ownership registry with approvals, a
//! built-in offer/bid marketplace, and a pull-payment escrow that keeps
//! the whole thing solvent. Pure and synchronous by construction — no
//! I/O, no clocks it doesn't own, no async. The node crate wraps it in
//! an HTTP surface; tests drive it directly.
//!
//! ## Architecture
//!
//! The modules mirror the concerns of running a collectibles registry:
//!
//! - **address** — Identities and content hashes. Everything is 20 or 32 bytes.
//! - **access** — Owner, operator, treasurer. Three roles, zero ambiguity.
//! - **phase** — The forward-only lifecycle: Created through OfficialRelease.
//! - **spinner** — The collectibles themselves and the ownership book.
//! - **market** — Standing offers and escrowed bids, one of each per spinner.
//! - **escrow** — The pull-payment ledger. Nobody gets pushed money. Ever.
//! - **config** — Supply caps, tier prices, the sale fee. Economic policy.
//! - **event** — What the outside world gets told, and in what order.
//! - **registry** — The facade where authorization, gates, and settlement meet.
//! - **error** — One named variant per way an operation can be refused.
//!
//! ## Design Philosophy
//!
//! 1. All-or-nothing: an entry point that errors has mutated nothing.
//! 2. Solvency is an invariant, not a report. Sweeps cannot touch owed funds.
//! 3. Every refusal has a name. String-matching errors is how money gets lost.
//! 4. If it moves a spinner or a balance, it has tests. Plural.

pub mod access;
pub mod address;
pub mod config;
pub mod error;
pub mod escrow;
pub mod event;
pub mod market;
pub mod phase;
pub mod registry;
pub mod spinner;

pub use access::Role;
pub use address::{Address, ContentHash};
pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use event::Event;
pub use market::{Bid, Offer};
pub use phase::Phase;
pub use registry::{Call, Registry};
pub use spinner::{Spinner, SpinnerId, Tier};
