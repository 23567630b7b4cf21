use std::mem::size_of;

use bytemuck::{Pod, Zeroable};
use solana_program::pubkey::Pubkey;
use static_assertions::const_assert_eq;

use crate::account::{decode_pod, AccountDecode};
use crate::error::DecodeError;

pub const STATE_SIZE: usize = 168;

/// sha256("account:State")[0..8]
pub const STATE_DISCRIMINATOR: [u8; 8] = [216, 146, 107, 94, 104, 75, 182, 177];

/// Exchange-wide configuration account, written only by governance.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, Zeroable, Pod)]
pub struct State {
    pub admin: Pubkey,
    pub mint_authority: Pubkey,
    pub treasury_wallet: Pubkey,
    pub referrals_admin: Pubkey,
    /// Max USDC atoms depositable in a single call.
    pub native_deposit_limit: u64,
    pub native_withdraw_limit: u64,
    pub trade_fee_bps: u64,
    pub pricing_frequency_seconds: u32,
    pub funding_interval_seconds: u32,
    pub liquidator_reward_bps: u16,
    pub insurance_reward_bps: u16,
    /// Non-zero while trading is halted by the admin.
    pub halted: u8,
    pub state_nonce: u8,
    pub vault_nonce: u8,
    _padding: [u8; 1],
}
// 32 * 4 + // admin, mint_authority, treasury_wallet, referrals_admin
//  8 * 3 + // deposit limit, withdraw limit, trade fee
//  4 * 2 + // pricing frequency, funding interval
//  2 * 2 + // liquidator reward, insurance reward
//  1 * 3 + // halted, state nonce, vault nonce
//  1       // padding
// = 168
const_assert_eq!(size_of::<State>(), STATE_SIZE);
const_assert_eq!(size_of::<State>() % 8, 0);

impl State {
    pub fn is_halted(&self) -> bool {
        self.halted != 0
    }

    /// Taker fee as a fraction (bps / 10_000).
    pub fn trade_fee(&self) -> f64 {
        self.trade_fee_bps as f64 / 10_000.0
    }
}

impl AccountDecode for State {
    const DISCRIMINATOR: Option<[u8; 8]> = Some(STATE_DISCRIMINATOR);

    fn decode_fields(body: &[u8]) -> Result<Self, DecodeError> {
        decode_pod(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_blob(state: &State) -> Vec<u8> {
        [
            STATE_DISCRIMINATOR.as_slice(),
            bytemuck::bytes_of(state),
        ]
        .concat()
    }

    #[test]
    fn decodes_round_trip_blob() {
        let state = State {
            admin: Pubkey::new_unique(),
            trade_fee_bps: 10,
            halted: 1,
            ..Default::default()
        };
        let decoded = State::decode(&state_blob(&state)).unwrap();
        assert_eq!(decoded.admin, state.admin);
        assert_eq!(decoded.trade_fee_bps, 10);
        assert!(decoded.is_halted());
    }

    #[test]
    fn rejects_wrong_discriminator() {
        let mut data = state_blob(&State::default());
        data[0] ^= 0xff;
        assert!(matches!(
            State::decode(&data),
            Err(DecodeError::Discriminator { .. })
        ));
    }

    #[test]
    fn rejects_truncated_body() {
        let data = state_blob(&State::default());
        assert!(matches!(
            State::decode(&data[..data.len() - 1]),
            Err(DecodeError::Truncated { .. })
        ));
    }
}
