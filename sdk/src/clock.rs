//! Mirror support for the sysvar clock, the session's time source.

use solana_program::pubkey::Pubkey;

use crate::account::AccountDecode;
use crate::error::DecodeError;

pub use solana_program::clock::Clock;

/// Bincode fixed layout: five little-endian 8-byte fields.
pub const CLOCK_SIZE: usize = 40;

pub fn id() -> Pubkey {
    solana_program::sysvar::clock::id()
}

impl AccountDecode for Clock {
    /// Sysvars carry no discriminator.
    const DISCRIMINATOR: Option<[u8; 8]> = None;

    fn decode_fields(body: &[u8]) -> Result<Self, DecodeError> {
        if body.len() < CLOCK_SIZE {
            return Err(DecodeError::Truncated {
                expected: CLOCK_SIZE,
                actual: body.len(),
            });
        }
        Ok(Clock {
            slot: u64::from_le_bytes(body[0..8].try_into().unwrap()),
            epoch_start_timestamp: i64::from_le_bytes(body[8..16].try_into().unwrap()),
            epoch: u64::from_le_bytes(body[16..24].try_into().unwrap()),
            leader_schedule_epoch: u64::from_le_bytes(body[24..32].try_into().unwrap()),
            unix_timestamp: i64::from_le_bytes(body[32..40].try_into().unwrap()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_sysvar_layout() {
        let mut data = Vec::new();
        data.extend_from_slice(&250_000_000u64.to_le_bytes());
        data.extend_from_slice(&1_700_000_000i64.to_le_bytes());
        data.extend_from_slice(&580u64.to_le_bytes());
        data.extend_from_slice(&581u64.to_le_bytes());
        data.extend_from_slice(&1_700_000_500i64.to_le_bytes());

        let clock = Clock::decode(&data).unwrap();
        assert_eq!(clock.slot, 250_000_000);
        assert_eq!(clock.epoch, 580);
        assert_eq!(clock.unix_timestamp, 1_700_000_500);
    }

    #[test]
    fn rejects_short_data() {
        assert!(matches!(
            Clock::decode(&[0u8; 39]),
            Err(DecodeError::Truncated { .. })
        ));
    }
}
