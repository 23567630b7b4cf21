//! Priority fee estimation from recent prioritization fee samples.
//!
//! Estimation is best effort with a narrow failure contract: any RPC
//! failure or an empty sample set surfaces as
//! [`ZenithError::EstimationUnavailable`] and the caller falls back to its
//! configured default fee.

use log::warn;
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_response::RpcPrioritizationFee;
use solana_program::pubkey::Pubkey;

use crate::error::{Result, ZenithError};

/// Newest samples considered for the median.
const SAMPLE_WINDOW: usize = 20;

/// Median prioritization fee over the newest [`SAMPLE_WINDOW`] slots among
/// fees recently paid to write `accounts`, capped at `cap` microlamports
/// per CU.
pub fn estimate_priority_fee(rpc: &RpcClient, accounts: &[Pubkey], cap: u64) -> Result<u64> {
    let samples = rpc.get_recent_prioritization_fees(accounts).map_err(|e| {
        warn!("priority fee estimation failed: {e}");
        ZenithError::EstimationUnavailable
    })?;
    median_of_newest(&samples, cap)
}

fn median_of_newest(samples: &[RpcPrioritizationFee], cap: u64) -> Result<u64> {
    let mut by_slot: Vec<&RpcPrioritizationFee> = samples.iter().collect();
    by_slot.sort_by(|a, b| b.slot.cmp(&a.slot));

    let mut fees: Vec<u64> = by_slot
        .iter()
        .take(SAMPLE_WINDOW)
        .map(|s| s.prioritization_fee)
        .collect();
    if fees.is_empty() {
        return Err(ZenithError::EstimationUnavailable);
    }
    fees.sort_unstable();

    let mid = fees.len() / 2;
    let median = if fees.len() % 2 == 0 {
        // Widened so two near-u64::MAX samples cannot wrap.
        ((fees[mid - 1] as u128 + fees[mid] as u128) / 2) as u64
    } else {
        fees[mid]
    };
    Ok(median.min(cap))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(slot: u64, fee: u64) -> RpcPrioritizationFee {
        RpcPrioritizationFee {
            slot,
            prioritization_fee: fee,
        }
    }

    #[test]
    fn median_of_odd_sample_count() {
        let samples = vec![sample(1, 100), sample(2, 300), sample(3, 200)];
        assert_eq!(median_of_newest(&samples, u64::MAX).unwrap(), 200);
    }

    #[test]
    fn median_of_even_sample_count() {
        let samples = vec![sample(1, 100), sample(2, 200)];
        assert_eq!(median_of_newest(&samples, u64::MAX).unwrap(), 150);
    }

    #[test]
    fn only_newest_window_is_considered() {
        // 30 samples; the oldest 10 carry huge fees that must be ignored.
        let mut samples: Vec<RpcPrioritizationFee> =
            (0..10).map(|i| sample(i, 1_000_000)).collect();
        samples.extend((10..40).map(|i| sample(i, 50)));
        assert_eq!(median_of_newest(&samples, u64::MAX).unwrap(), 50);
    }

    #[test]
    fn even_median_of_huge_fees_does_not_wrap() {
        let samples = vec![sample(1, u64::MAX), sample(2, u64::MAX - 1)];
        assert_eq!(
            median_of_newest(&samples, u64::MAX).unwrap(),
            u64::MAX - 1
        );
    }

    #[test]
    fn cap_is_applied() {
        let samples = vec![sample(1, 90_000), sample(2, 80_000), sample(3, 85_000)];
        assert_eq!(median_of_newest(&samples, 50_000).unwrap(), 50_000);
    }

    #[test]
    fn empty_samples_are_unavailable() {
        assert!(matches!(
            median_of_newest(&[], u64::MAX),
            Err(ZenithError::EstimationUnavailable)
        ));
    }
}
