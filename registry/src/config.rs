//! # Registry Configuration & Constants
//!
//! Every magic number in Gyro lives here. Supply caps and tier prices are
//! economic policy; change them before launch or not at all — the caps in
//! particular are a public promise about scarcity.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::spinner::Tier;

// ---------------------------------------------------------------------------
// Collection identity
// ---------------------------------------------------------------------------

/// Human-readable collection name.
pub const COLLECTION_NAME: &str = "Gyro";

/// Ticker symbol.
pub const COLLECTION_SYMBOL: &str = "GYRO";

/// Spinners are indivisible. Zero decimals, and it stays zero.
pub const COLLECTION_DECIMALS: u8 = 0;

/// The registry's own vault address — the identity that holds minted but
/// unsold spinners. Deliberately not derivable from any key: nothing can
/// ever sign for the vault, so inventory only leaves through purchase
/// flows.
pub const VAULT_ADDRESS: Address = Address([
    0x47, 0x59, 0x52, 0x4f, // "GYRO"
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x01,
]);

// ---------------------------------------------------------------------------
// Market economics
// ---------------------------------------------------------------------------

/// Flat sale fee on every marketplace settlement, in basis points.
/// 300 bp = 3%, floor-rounded. Applied identically to offer buys and
/// accepted bids; the fee remains in the registry as unencumbered funds.
pub const SALE_FEE_BPS: u64 = 300;

/// Basis-point denominator.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Fixed direct-purchase prices per tier, in base units.
/// Common is 0.002 of the network's major unit; rarer tiers scale up.
pub const TIER_PRICES: [u64; 4] = [
    2_000_000_000_000_000,   // Common
    8_000_000_000_000_000,   // Uncommon
    20_000_000_000_000_000,  // Rare
    100_000_000_000_000_000, // Legendary
];

/// Per-tier supply caps. Independent; exhausting one tier says nothing
/// about the others.
pub const TIER_CAPS: [u64; 4] = [
    5_000, // Common
    3_000, // Uncommon
    1_500, // Rare
    500,   // Legendary
];

// ---------------------------------------------------------------------------
// RegistryConfig
// ---------------------------------------------------------------------------

/// Tunable economic parameters, fixed at registry construction.
///
/// Production uses [`RegistryConfig::default`]; tests shrink the caps to
/// make exhaustion scenarios cheap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Per-tier supply caps, [`Tier`] index order.
    pub tier_caps: [u64; 4],
    /// Per-tier fixed purchase prices, [`Tier`] index order.
    pub tier_prices: [u64; 4],
    /// Marketplace sale fee in basis points.
    pub fee_bps: u64,
}

impl RegistryConfig {
    /// Cap for one tier.
    pub fn cap(&self, tier: Tier) -> u64 {
        self.tier_caps[tier.index()]
    }

    /// Fixed purchase price for one tier.
    pub fn price(&self, tier: Tier) -> u64 {
        self.tier_prices[tier.index()]
    }

    /// The flat sale fee on `amount`, floor-rounded.
    ///
    /// Works in u128 internally so fee math cannot overflow even at
    /// amounts near `u64::MAX`.
    pub fn sale_fee(&self, amount: u64) -> u64 {
        ((amount as u128 * self.fee_bps as u128) / BPS_DENOMINATOR as u128) as u64
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            tier_caps: TIER_CAPS,
            tier_prices: TIER_PRICES,
            fee_bps: SALE_FEE_BPS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_is_three_percent_floored() {
        let config = RegistryConfig::default();
        assert_eq!(config.sale_fee(1000), 30);
        assert_eq!(config.sale_fee(1001), 30); // floor, not round
        assert_eq!(config.sale_fee(33), 0);
        assert_eq!(config.sale_fee(0), 0);
    }

    #[test]
    fn fee_does_not_overflow_at_extremes() {
        let config = RegistryConfig::default();
        let fee = config.sale_fee(u64::MAX);
        assert!(fee < u64::MAX);
        assert_eq!(fee, ((u64::MAX as u128 * 300) / 10_000) as u64);
    }

    #[test]
    fn prices_scale_with_rarity() {
        let config = RegistryConfig::default();
        assert!(config.price(Tier::Common) < config.price(Tier::Uncommon));
        assert!(config.price(Tier::Uncommon) < config.price(Tier::Rare));
        assert!(config.price(Tier::Rare) < config.price(Tier::Legendary));
    }

    #[test]
    fn caps_shrink_with_rarity() {
        let config = RegistryConfig::default();
        assert!(config.cap(Tier::Common) > config.cap(Tier::Legendary));
    }

    #[test]
    fn vault_address_is_not_null() {
        assert!(!VAULT_ADDRESS.is_null());
    }
}
