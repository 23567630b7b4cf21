//! PDA derivation for the Zenith program's accounts.

use solana_program::pubkey::Pubkey;

use crate::types::Asset;

/// Exchange-wide state account.
pub fn get_state_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"state"], program_id)
}

/// Exchange-wide pricing account (mark prices, funding).
pub fn get_pricing_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"pricing"], program_id)
}

pub fn get_mint_authority_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"mint-auth"], program_id)
}

/// Collateral vault holding all deposited USDC.
pub fn get_vault_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"vault"], program_id)
}

/// A user's cross-margin account.
pub fn get_margin_account_address(program_id: &Pubkey, authority: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"margin", authority.as_ref()], program_id)
}

/// A user's open-orders account on one perp market.
pub fn get_open_orders_address(
    program_id: &Pubkey,
    asset: Asset,
    authority: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[b"open-orders", &[u8::from(asset)], authority.as_ref()],
        program_id,
    )
}
