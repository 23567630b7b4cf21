use std::mem::size_of;

use bytemuck::{Pod, Zeroable};
use solana_program::pubkey::Pubkey;
use static_assertions::const_assert_eq;

use crate::account::{decode_pod, AccountDecode};
use crate::error::DecodeError;
use crate::types::Asset;

pub const PRICING_SIZE: usize = 336;

/// sha256("account:Pricing")[0..8]
pub const PRICING_DISCRIMINATOR: [u8; 8] = [190, 123, 210, 182, 143, 11, 152, 136];

/// Mark prices are fixed-point with 6 decimals (USDC atoms per base unit).
pub const MARK_PRICE_SCALE: f64 = 1e6;

/// Funding rates are 1e9-scaled daily fractions.
pub const FUNDING_RATE_SCALE: f64 = 1e9;

/// Exchange-wide pricing account: per-asset mark prices, funding rates and
/// oracle references, updated by the pricing crank every epoch.
///
/// Per-asset arrays are indexed by [`Asset::to_index`].
#[repr(C)]
#[derive(Debug, Copy, Clone, Zeroable, Pod)]
pub struct Pricing {
    pub mark_prices: [u64; Asset::COUNT],
    pub mark_price_update_timestamps: [i64; Asset::COUNT],
    pub funding_rates: [i64; Asset::COUNT],
    pub latest_midpoints: [u64; Asset::COUNT],
    pub oracles: [Pubkey; Asset::COUNT],
    pub total_insurance_vault_deposits: u64,
    pub nonce: u8,
    _padding: [u8; 7],
}
//  8 * 5 * 4 + // mark prices, timestamps, funding rates, midpoints
// 32 * 5 +     // oracles
//  8 +         // insurance vault deposits
//  1 +         // nonce
//  7           // padding
// = 336
const_assert_eq!(size_of::<Pricing>(), PRICING_SIZE);
const_assert_eq!(size_of::<Pricing>() % 8, 0);

impl Pricing {
    /// Mark price in fixed-point atoms.
    pub fn mark_price(&self, asset: Asset) -> u64 {
        self.mark_prices[asset.to_index()]
    }

    /// Mark price as a human-readable USD value.
    pub fn mark_price_usd(&self, asset: Asset) -> f64 {
        self.mark_price(asset) as f64 / MARK_PRICE_SCALE
    }

    /// Daily funding rate as a signed fraction (positive = longs pay).
    pub fn funding_rate_daily(&self, asset: Asset) -> f64 {
        self.funding_rates[asset.to_index()] as f64 / FUNDING_RATE_SCALE
    }

    /// Unix timestamp of the last mark price update for `asset`.
    pub fn last_update_ts(&self, asset: Asset) -> i64 {
        self.mark_price_update_timestamps[asset.to_index()]
    }

    pub fn oracle(&self, asset: Asset) -> Pubkey {
        self.oracles[asset.to_index()]
    }
}

impl AccountDecode for Pricing {
    const DISCRIMINATOR: Option<[u8; 8]> = Some(PRICING_DISCRIMINATOR);

    fn decode_fields(body: &[u8]) -> Result<Self, DecodeError> {
        decode_pod(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pricing_blob(pricing: &Pricing) -> Vec<u8> {
        [
            PRICING_DISCRIMINATOR.as_slice(),
            bytemuck::bytes_of(pricing),
        ]
        .concat()
    }

    #[test]
    fn decodes_per_asset_fields() {
        let mut pricing = Pricing::zeroed();
        pricing.mark_prices[Asset::Sol.to_index()] = 142_500_000;
        pricing.funding_rates[Asset::Eth.to_index()] = -2_000_000;
        pricing.oracles[Asset::Btc.to_index()] = Pubkey::new_unique();

        let decoded = Pricing::decode(&pricing_blob(&pricing)).unwrap();
        assert_eq!(decoded.mark_price(Asset::Sol), 142_500_000);
        assert!((decoded.mark_price_usd(Asset::Sol) - 142.5).abs() < 1e-9);
        assert!((decoded.funding_rate_daily(Asset::Eth) + 0.002).abs() < 1e-12);
        assert_eq!(decoded.oracle(Asset::Btc), pricing.oracles[1]);
    }

    #[test]
    fn rejects_truncated_blob() {
        let data = pricing_blob(&Pricing::zeroed());
        assert!(matches!(
            Pricing::decode(&data[..100]),
            Err(DecodeError::Truncated { .. })
        ));
    }
}
