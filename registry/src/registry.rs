//! # The Registry
//!
//! The single service object owning every map in the system: the spinner
//! ownership book, the marketplace book, the escrow ledger, the role set,
//! the lifecycle phase, and the total value held. All external entry
//! points live here; the sub-modules are containers and this module is
//! where authorization, phase gates, value rules, and event emission are
//! enforced.
//!
//! ## Discipline
//!
//! Every entry point follows the same shape: destroyed check, role guard,
//! phase guard, relationship and value validation — and only then the
//! commit, which cannot fail except for checked-arithmetic credits that
//! are themselves validated first. A returned error means nothing moved.
//!
//! ## Money
//!
//! The registry models value custody, not value transport. Payable entry
//! points receive the sent amount inside a [`Call`]; `held_value` tracks
//! everything the registry is sitting on. Outbound value follows the pull
//! pattern exclusively: [`Registry::withdraw`] and
//! [`Registry::sweep_operator_funds`] return the disbursed amount to the
//! hosting environment, which is responsible for actually moving it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::access::{AccessControl, Role};
use crate::address::{Address, ContentHash};
use crate::config::{RegistryConfig, VAULT_ADDRESS};
use crate::error::{RegistryError, Result};
use crate::escrow::EscrowLedger;
use crate::event::Event;
use crate::market::{Bid, MarketBook, Offer};
use crate::phase::Phase;
use crate::spinner::{Spinner, SpinnerBook, SpinnerFields, SpinnerId, Tier};

// ---------------------------------------------------------------------------
// Call context
// ---------------------------------------------------------------------------

/// The execution context of one external call: who is calling and how
/// much value rides along. Non-payable entry points take a bare
/// [`Address`]; payable ones take a `Call`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// The calling identity.
    pub caller: Address,
    /// Value sent with the call, in base units.
    pub value: u64,
}

impl Call {
    /// A call carrying no value.
    pub fn from(caller: Address) -> Self {
        Self { caller, value: 0 }
    }

    /// A call carrying `value` base units.
    pub fn with_value(caller: Address, value: u64) -> Self {
        Self { caller, value }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The Gyro registry: collectible ownership, tiered minting, marketplace,
/// and pull-payment escrow behind one phase- and role-gated surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    config: RegistryConfig,
    access: AccessControl,
    phase: Phase,
    minting_finished: bool,
    tier_minted: [u64; 4],
    spinners: SpinnerBook,
    market: MarketBook,
    escrow: EscrowLedger,
    /// Total value the registry holds: escrowed bids, pending payments,
    /// and unencumbered (sweepable) funds together.
    held_value: u64,
    voting_contract: Option<Address>,
    moderators: BTreeSet<Address>,
    destroyed: bool,
    events: Vec<Event>,
}

impl Registry {
    /// Constructs the registry in [`Phase::Created`] with `owner` holding
    /// all three roles.
    pub fn new(owner: Address, config: RegistryConfig) -> Self {
        Self {
            config,
            access: AccessControl::new(owner),
            phase: Phase::Created,
            minting_finished: false,
            tier_minted: [0; 4],
            spinners: SpinnerBook::new(),
            market: MarketBook::new(),
            escrow: EscrowLedger::new(),
            held_value: 0,
            voting_contract: None,
            moderators: BTreeSet::new(),
            destroyed: false,
            events: Vec::new(),
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            Err(RegistryError::Destroyed)
        } else {
            Ok(())
        }
    }

    // -----------------------------------------------------------------------
    // Access control & administration
    // -----------------------------------------------------------------------

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    pub fn operator(&self) -> Address {
        self.access.operator()
    }

    pub fn treasurer(&self) -> Address {
        self.access.treasurer()
    }

    /// Reassigns the operator. Owner only.
    pub fn set_operator(&mut self, caller: Address, operator: Address) -> Result<()> {
        self.ensure_alive()?;
        let previous = self.access.set_operator(caller, operator)?;
        self.events.push(Event::RoleChanged {
            role: Role::Operator,
            previous,
            new: operator,
        });
        Ok(())
    }

    /// Reassigns the treasurer. Owner only.
    pub fn set_treasurer(&mut self, caller: Address, treasurer: Address) -> Result<()> {
        self.ensure_alive()?;
        let previous = self.access.set_treasurer(caller, treasurer)?;
        self.events.push(Event::RoleChanged {
            role: Role::Treasurer,
            previous,
            new: treasurer,
        });
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Advances the lifecycle exactly one step. Owner only.
    pub fn advance_phase(&mut self, caller: Address) -> Result<Phase> {
        self.ensure_alive()?;
        self.access.require_owner(caller)?;
        let from = self.phase;
        let to = self.phase.advance()?;
        tracing::info!(%from, %to, "phase advanced");
        self.events.push(Event::PhaseAdvanced { from, to });
        Ok(to)
    }

    /// Destroys the registry: wipes every book and ledger, permanently.
    /// Owner only, any phase. A pre-launch safety valve, nothing more.
    pub fn destroy(&mut self, caller: Address) -> Result<()> {
        self.ensure_alive()?;
        self.access.require_owner(caller)?;
        tracing::warn!(%caller, "registry destroyed");
        self.spinners.wipe();
        self.market.wipe();
        self.escrow.wipe();
        self.moderators.clear();
        self.voting_contract = None;
        self.held_value = 0;
        self.destroyed = true;
        self.events.push(Event::Destroyed);
        Ok(())
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // -----------------------------------------------------------------------
    // Minting
    // -----------------------------------------------------------------------

    /// Whether new spinners can still be minted.
    pub fn is_minting_open(&self) -> bool {
        !self.minting_finished && self.phase <= Phase::Beta && !self.destroyed
    }

    /// Number minted so far within one tier.
    pub fn tier_minted(&self, tier: Tier) -> u64 {
        self.tier_minted[tier.index()]
    }

    /// Mints one spinner into the vault. Operator only, phase ≤ Beta,
    /// minting not finished, tier cap not reached.
    #[allow(clippy::too_many_arguments)]
    pub fn mint(
        &mut self,
        caller: Address,
        content_hash: ContentHash,
        flux: u16,
        inertia: u16,
        friction: u16,
        tier: Tier,
        gold: bool,
        reserved: bool,
    ) -> Result<SpinnerId> {
        self.ensure_alive()?;
        self.access.require_operator(caller)?;
        self.phase
            .require_at_most(Phase::Beta, "minting is open through Beta")?;
        if self.minting_finished {
            return Err(RegistryError::MintingClosed);
        }
        let cap = self.config.cap(tier);
        if self.tier_minted[tier.index()] >= cap {
            return Err(RegistryError::TierSoldOut { tier, cap });
        }

        let id = self.commit_mint(SpinnerFields {
            content_hash,
            flux,
            inertia,
            friction,
            tier,
            gold,
            reserved,
        });
        Ok(id)
    }

    /// Mints a batch, all-or-nothing: every element is validated against
    /// the caps (counting the batch itself) before any spinner exists.
    ///
    /// The parallel-slice shape mirrors the minting pipeline's column
    /// format. All slices must be equally long.
    #[allow(clippy::too_many_arguments)]
    pub fn bulk_mint(
        &mut self,
        caller: Address,
        content_hashes: &[ContentHash],
        fluxes: &[u16],
        inertias: &[u16],
        frictions: &[u16],
        tiers: &[Tier],
        golds: &[bool],
        reserveds: &[bool],
    ) -> Result<Vec<SpinnerId>> {
        self.ensure_alive()?;
        self.access.require_operator(caller)?;
        self.phase
            .require_at_most(Phase::Beta, "minting is open through Beta")?;
        if self.minting_finished {
            return Err(RegistryError::MintingClosed);
        }

        let len = content_hashes.len();
        if [
            fluxes.len(),
            inertias.len(),
            frictions.len(),
            tiers.len(),
            golds.len(),
            reserveds.len(),
        ]
        .iter()
        .any(|&l| l != len)
        {
            return Err(RegistryError::BatchLengthMismatch);
        }

        // Validate the whole batch against simulated tier counts first.
        let mut simulated = self.tier_minted;
        for &tier in tiers {
            let cap = self.config.cap(tier);
            if simulated[tier.index()] >= cap {
                return Err(RegistryError::TierSoldOut { tier, cap });
            }
            simulated[tier.index()] += 1;
        }

        let mut ids = Vec::with_capacity(len);
        for i in 0..len {
            ids.push(self.commit_mint(SpinnerFields {
                content_hash: content_hashes[i],
                flux: fluxes[i],
                inertia: inertias[i],
                friction: frictions[i],
                tier: tiers[i],
                gold: golds[i],
                reserved: reserveds[i],
            }));
        }
        Ok(ids)
    }

    fn commit_mint(&mut self, fields: SpinnerFields) -> SpinnerId {
        let tier = fields.tier;
        let id = self.spinners.insert(fields, VAULT_ADDRESS);
        self.tier_minted[tier.index()] += 1;
        tracing::debug!(id, %tier, "spinner minted");
        self.events.push(Event::Minted {
            id,
            tier,
            owner: VAULT_ADDRESS,
        });
        id
    }

    /// Permanently closes minting. Operator only, OfficialRelease only.
    /// Calling it again once closed is a harmless no-op.
    pub fn finish_minting(&mut self, caller: Address) -> Result<()> {
        self.ensure_alive()?;
        self.access.require_operator(caller)?;
        self.phase.require_exactly(
            Phase::OfficialRelease,
            "minting can only be finished at OfficialRelease",
        )?;
        if !self.minting_finished {
            self.minting_finished = true;
            tracing::info!("minting finished");
            self.events.push(Event::MintingFinished);
        }
        Ok(())
    }

    /// Buys a vault-held spinner of `tier` at the fixed tier price.
    /// Payable, phase ≥ Deployed. Underpayment fails; overpayment is
    /// credited back to the payer's pending balance as change.
    pub fn purchase_tier(&mut self, call: Call, tier: Tier) -> Result<SpinnerId> {
        self.ensure_alive()?;
        self.phase
            .require_at_least(Phase::Deployed, "tier purchases open at Deployed")?;

        let price = self.config.price(tier);
        if call.value < price {
            return Err(RegistryError::InsufficientPayment {
                required: price,
                sent: call.value,
            });
        }

        // Lowest-id vault-held, non-reserved spinner of the tier.
        let id = self
            .spinners
            .holdings_of(VAULT_ADDRESS)
            .iter()
            .copied()
            .find(|&id| {
                let s = self.spinners.get(id).expect("vault holdings are minted");
                s.tier == tier && !s.reserved
            })
            .ok_or(RegistryError::TierSoldOut {
                tier,
                cap: self.config.cap(tier),
            })?;

        let new_held = self
            .held_value
            .checked_add(call.value)
            .ok_or(RegistryError::AmountOverflow)?;
        let change = call.value - price;
        if change > 0 {
            self.escrow.credit(call.caller, change)?;
        }
        self.held_value = new_held;

        self.events.push(Event::Bought {
            id,
            seller: VAULT_ADDRESS,
            buyer: call.caller,
            price,
        });
        self.settle_transfer(VAULT_ADDRESS, call.caller, id);
        tracing::debug!(id, %tier, buyer = %call.caller, "tier purchase settled");
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Ownership registry
    // -----------------------------------------------------------------------

    pub fn count_of_deeds(&self) -> u64 {
        self.spinners.total_minted()
    }

    pub fn count_of_deeds_by_owner(&self, owner: Address) -> u64 {
        self.spinners.count_of(owner)
    }

    /// Ordered spinner ids held by `owner`.
    pub fn deeds_of(&self, owner: Address) -> &[SpinnerId] {
        self.spinners.holdings_of(owner)
    }

    pub fn spinner(&self, id: SpinnerId) -> Result<&Spinner> {
        self.spinners.get(id)
    }

    pub fn owner_of(&self, id: SpinnerId) -> Result<Address> {
        self.spinners.owner_of(id)
    }

    pub fn approved_for(&self, id: SpinnerId) -> Result<Option<Address>> {
        self.spinners.approved_for(id)
    }

    /// Direct ownership transfer. Caller must own `id`; `to` must not be
    /// null. Clears any approval and any standing offer on the spinner.
    pub fn transfer(&mut self, caller: Address, to: Address, id: SpinnerId) -> Result<()> {
        self.ensure_alive()?;
        let owner = self.spinners.owner_of(id)?;
        if owner != caller {
            return Err(RegistryError::NotOwner { id, caller });
        }
        if to.is_null() {
            return Err(RegistryError::InvalidRecipient);
        }
        self.settle_transfer(caller, to, id);
        Ok(())
    }

    /// Sets (or clears, via [`Address::NULL`]) the approved transferee.
    ///
    /// Self-approval is rejected. Clearing an already-clear approval is
    /// silent; every transition that changes — or restates — a live
    /// approval emits an `Approval` event, matching what wallet UIs key on.
    pub fn approve(&mut self, caller: Address, to: Address, id: SpinnerId) -> Result<()> {
        self.ensure_alive()?;
        let owner = self.spinners.owner_of(id)?;
        if owner != caller {
            return Err(RegistryError::NotOwner { id, caller });
        }
        if to == caller {
            return Err(RegistryError::InvalidApproval { id, caller });
        }

        let previous = self.spinners.approved_for(id)?;
        if to.is_null() {
            if previous.is_some() {
                self.spinners.clear_approval(id);
                self.events.push(Event::Approval {
                    owner,
                    approved: None,
                    id,
                });
            }
            // Null over clear: nothing changed, nothing to announce.
        } else {
            self.spinners.set_approval(id, to);
            self.events.push(Event::Approval {
                owner,
                approved: Some(to),
                id,
            });
        }
        Ok(())
    }

    /// The approved transferee claims the spinner. Emits `Approval`
    /// (cleared) then `Transfer`, in that order.
    pub fn take_ownership(&mut self, caller: Address, id: SpinnerId) -> Result<()> {
        self.ensure_alive()?;
        let owner = self.spinners.owner_of(id)?;
        match self.spinners.approved_for(id)? {
            Some(approved) if approved == caller => {}
            _ => return Err(RegistryError::NotApproved { id, caller }),
        }
        self.settle_transfer(owner, caller, id);
        Ok(())
    }

    /// The one transfer path every settlement funnels through. Clears the
    /// approval (announcing it) and the standing offer (silently), moves
    /// the spinner, and emits `Transfer`. Infallible by construction: the
    /// caller has already validated ownership and recipient.
    fn settle_transfer(&mut self, from: Address, to: Address, id: SpinnerId) {
        if self.spinners.clear_approval(id).is_some() {
            self.events.push(Event::Approval {
                owner: from,
                approved: None,
                id,
            });
        }
        self.market.clear_offer(id);
        self.spinners
            .move_to(id, to)
            .expect("settlement moves a validated spinner");
        self.events.push(Event::Transfer { from, to, id });
    }

    // -----------------------------------------------------------------------
    // Marketplace: offers
    // -----------------------------------------------------------------------

    pub fn offer_of(&self, id: SpinnerId) -> Option<&Offer> {
        self.market.offer(id)
    }

    /// Posts (or replaces) a sale offer. Owner only, phase ≥ Beta.
    /// `target` restricts the offer to a single buyer.
    pub fn offer_for_sale(
        &mut self,
        caller: Address,
        id: SpinnerId,
        price: u64,
        target: Option<Address>,
    ) -> Result<()> {
        self.ensure_alive()?;
        self.phase
            .require_at_least(Phase::Beta, "the marketplace opens at Beta")?;
        let owner = self.spinners.owner_of(id)?;
        if owner != caller {
            return Err(RegistryError::NotOwner { id, caller });
        }

        self.market.put_offer(
            id,
            Offer {
                seller: caller,
                target,
                price,
                created_at: chrono::Utc::now(),
            },
        );
        self.events.push(Event::Offered {
            id,
            seller: caller,
            price,
            target,
        });
        Ok(())
    }

    /// Withdraws a standing offer. Only its seller — who must still own
    /// the spinner — may cancel.
    pub fn cancel_offer(&mut self, caller: Address, id: SpinnerId) -> Result<()> {
        self.ensure_alive()?;
        self.phase
            .require_at_least(Phase::Beta, "the marketplace opens at Beta")?;
        let owner = self.spinners.owner_of(id)?;
        let offer = self.market.offer(id).ok_or(RegistryError::NotForSale(id))?;
        if offer.seller != caller || owner != caller {
            return Err(RegistryError::NotSeller { id, caller });
        }

        self.market.clear_offer(id);
        self.events.push(Event::OfferCancelled { id, seller: caller });
        Ok(())
    }

    /// Buys a spinner through its standing offer. Payable, phase ≥ Beta.
    ///
    /// The sale fee comes out of the seller's proceeds; any payment above
    /// the asked price is credited back to the buyer. Both credits land in
    /// the escrow ledger — nobody gets pushed value.
    pub fn buy(&mut self, call: Call, id: SpinnerId) -> Result<()> {
        self.ensure_alive()?;
        self.phase
            .require_at_least(Phase::Beta, "the marketplace opens at Beta")?;
        let owner = self.spinners.owner_of(id)?;
        let offer = self.market.offer(id).ok_or(RegistryError::NotForSale(id))?;
        if offer.seller != owner {
            // A stale offer from a previous owner is not a live offer.
            return Err(RegistryError::NotForSale(id));
        }
        if let Some(target) = offer.target {
            if call.caller != target {
                return Err(RegistryError::NotAuthorizedBuyer {
                    id,
                    caller: call.caller,
                });
            }
        }
        if call.value < offer.price {
            return Err(RegistryError::InsufficientPayment {
                required: offer.price,
                sent: call.value,
            });
        }

        let price = offer.price;
        let seller = offer.seller;
        let fee = self.config.sale_fee(price);
        let excess = call.value - price;
        let new_held = self
            .held_value
            .checked_add(call.value)
            .ok_or(RegistryError::AmountOverflow)?;

        self.escrow
            .credit_many(&[(seller, price - fee), (call.caller, excess)])?;
        self.held_value = new_held;

        self.events.push(Event::Bought {
            id,
            seller,
            buyer: call.caller,
            price,
        });
        self.settle_transfer(seller, call.caller, id);
        tracing::debug!(id, %seller, buyer = %call.caller, price, fee, "offer settled");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Marketplace: bids
    // -----------------------------------------------------------------------

    pub fn bid_of(&self, id: SpinnerId) -> Option<&Bid> {
        self.market.bid(id)
    }

    /// Places a bid. Payable, phase ≥ Beta. The sent value must be
    /// positive and strictly above any standing bid; the displaced
    /// bidder's escrowed amount becomes their pending balance in the
    /// same operation.
    pub fn enter_bid(&mut self, call: Call, id: SpinnerId) -> Result<()> {
        self.ensure_alive()?;
        self.phase
            .require_at_least(Phase::Beta, "the marketplace opens at Beta")?;
        let owner = self.spinners.owner_of(id)?;
        if owner == call.caller {
            return Err(RegistryError::CannotBidOwnAsset(id));
        }
        let standing = self.market.bid(id).map(|b| b.amount).unwrap_or(0);
        if call.value == 0 || call.value <= standing {
            return Err(RegistryError::BidTooLow {
                standing,
                offered: call.value,
            });
        }
        let new_held = self
            .held_value
            .checked_add(call.value)
            .ok_or(RegistryError::AmountOverflow)?;

        // Release the displaced bidder before installing the new bid;
        // the credit is the only fallible commit step, so it goes first.
        if let Some(prev) = self.market.bid(id).cloned() {
            self.escrow.credit(prev.bidder, prev.amount)?;
        }
        self.market.put_bid(
            id,
            Bid {
                bidder: call.caller,
                amount: call.value,
                placed_at: chrono::Utc::now(),
            },
        );
        self.held_value = new_held;

        self.events.push(Event::BidEntered {
            id,
            bidder: call.caller,
            amount: call.value,
        });
        Ok(())
    }

    /// Withdraws the caller's standing bid; the escrowed amount becomes
    /// their pending balance (pull pattern — no push refund).
    pub fn withdraw_bid(&mut self, caller: Address, id: SpinnerId) -> Result<()> {
        self.ensure_alive()?;
        self.phase
            .require_at_least(Phase::Beta, "the marketplace opens at Beta")?;
        self.spinners.owner_of(id)?;
        match self.market.bid(id) {
            Some(bid) if bid.bidder == caller => {}
            _ => return Err(RegistryError::NotBidder { id, caller }),
        }

        let bid = self.market.bid(id).cloned().expect("bidder check passed");
        self.escrow.credit(bid.bidder, bid.amount)?;
        self.market.clear_bid(id);
        self.events.push(Event::BidWithdrawn {
            id,
            bidder: caller,
            amount: bid.amount,
        });
        Ok(())
    }

    /// Accepts the standing bid. Owner only, phase ≥ Beta.
    ///
    /// `min_accept` pins the amount the seller saw: if the standing bid
    /// differs (withdrawn, outbid, or simply absent), the call fails with
    /// `BidMismatch` instead of settling at a surprise price.
    pub fn accept_bid(&mut self, caller: Address, id: SpinnerId, min_accept: u64) -> Result<()> {
        self.ensure_alive()?;
        self.phase
            .require_at_least(Phase::Beta, "the marketplace opens at Beta")?;
        let owner = self.spinners.owner_of(id)?;
        if owner != caller {
            return Err(RegistryError::NotOwner { id, caller });
        }
        let amount = match self.market.bid(id) {
            Some(bid) if bid.amount >= min_accept => bid.amount,
            other => {
                return Err(RegistryError::BidMismatch {
                    id,
                    standing: other.map(|b| b.amount),
                    min_accept,
                })
            }
        };

        let fee = self.config.sale_fee(amount);
        self.escrow.credit(caller, amount - fee)?;
        let bid = self.market.clear_bid(id).expect("bid presence validated");

        self.events.push(Event::BidAccepted {
            id,
            seller: caller,
            bidder: bid.bidder,
            amount,
        });
        self.settle_transfer(caller, bid.bidder, id);
        tracing::debug!(id, seller = %caller, bidder = %bid.bidder, amount, fee, "bid settled");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Escrow & funds
    // -----------------------------------------------------------------------

    pub fn pending_of(&self, addr: Address) -> u64 {
        self.escrow.pending_of(addr)
    }

    pub fn total_pending(&self) -> u64 {
        self.escrow.total_pending()
    }

    pub fn bid_escrow_total(&self) -> u64 {
        self.market.bid_escrow_total()
    }

    pub fn offer_count(&self) -> usize {
        self.market.offer_count()
    }

    pub fn bid_count(&self) -> usize {
        self.market.bid_count()
    }

    pub fn held_value(&self) -> u64 {
        self.held_value
    }

    /// Held value minus everything already owed: pending balances and
    /// escrowed bids. The only funds an administrative sweep may touch.
    pub fn unencumbered_funds(&self) -> u64 {
        debug_assert!(
            self.held_value >= self.escrow.total_pending() + self.market.bid_escrow_total(),
            "solvency invariant violated"
        );
        self.held_value
            .saturating_sub(self.escrow.total_pending())
            .saturating_sub(self.market.bid_escrow_total())
    }

    /// Pulls the caller's entire pending balance. A zero balance is a
    /// silent no-op. Returns the amount owed to the caller, which the
    /// hosting environment must actually disburse.
    pub fn withdraw(&mut self, caller: Address) -> Result<u64> {
        self.ensure_alive()?;
        let amount = self.escrow.withdraw(caller);
        if amount > 0 {
            self.held_value -= amount;
            self.events.push(Event::PaymentWithdrawn { to: caller, amount });
        }
        Ok(amount)
    }

    /// Sweeps `amount` of unencumbered funds to `to`. Treasurer only.
    ///
    /// This is the solvency invariant's enforcement point: funds earmarked
    /// for bidders and sellers are simply not available here, no matter
    /// who asks.
    pub fn sweep_operator_funds(&mut self, caller: Address, to: Address, amount: u64) -> Result<u64> {
        self.ensure_alive()?;
        self.access.require_treasurer(caller)?;
        let unencumbered = self.unencumbered_funds();
        if amount > unencumbered {
            return Err(RegistryError::InsufficientUnencumberedFunds {
                requested: amount,
                unencumbered,
            });
        }

        self.held_value -= amount;
        tracing::info!(%to, amount, "operator funds swept");
        self.events.push(Event::FundsSwept { to, amount });
        Ok(amount)
    }

    // -----------------------------------------------------------------------
    // Governance collaborator
    // -----------------------------------------------------------------------

    pub fn voting_contract(&self) -> Option<Address> {
        self.voting_contract
    }

    pub fn is_moderator(&self, addr: Address) -> bool {
        self.moderators.contains(&addr)
    }

    /// Registers the external voting contract allowed to report election
    /// outcomes. Operator only, and only before OfficialRelease — the
    /// governance wiring is frozen at launch.
    pub fn set_voting_contract(&mut self, caller: Address, contract: Address) -> Result<()> {
        self.ensure_alive()?;
        self.access.require_operator(caller)?;
        self.phase.require_before(
            Phase::OfficialRelease,
            "governance wiring is frozen at OfficialRelease",
        )?;
        self.voting_contract = Some(contract);
        Ok(())
    }

    /// Records an election outcome. Operator or the registered voting
    /// contract only. An approved outcome registers `moderator`; a
    /// rejected one records nothing. Replays are idempotent — the
    /// moderator set is a set.
    pub fn record_election_outcome(
        &mut self,
        caller: Address,
        election_id: u64,
        approved: bool,
        moderator: Address,
    ) -> Result<()> {
        self.ensure_alive()?;
        self.access
            .require_operator_or(caller, self.voting_contract)?;
        if approved && self.moderators.insert(moderator) {
            tracing::info!(election_id, %moderator, "moderator registered");
            self.events.push(Event::ModeratorAdded {
                election_id,
                moderator,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Drains and returns every event emitted since the last drain.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    #[cfg(test)]
    fn spinner_book(&self) -> &SpinnerBook {
        &self.spinners
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
