//! Instruction builders for the Zenith program.
//!
//! Wire format is anchor-style: an 8-byte method sighash followed by the
//! borsh-serialized params struct. Account metas are listed in the order
//! the program's interface fixes.

use borsh::BorshSerialize;
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};
use spl_associated_token_account::get_associated_token_address;

use crate::pda::{
    get_margin_account_address, get_open_orders_address, get_pricing_address, get_state_address,
    get_vault_address,
};
use crate::types::{Asset, OrderOptions, Side};

/// sha256("global:initialize_margin_account")[0..8]
pub const INITIALIZE_MARGIN_ACCOUNT_SIGHASH: [u8; 8] = [67, 235, 66, 102, 167, 171, 120, 197];
/// sha256("global:deposit")[0..8]
pub const DEPOSIT_SIGHASH: [u8; 8] = [242, 35, 198, 137, 82, 225, 242, 182];
/// sha256("global:withdraw")[0..8]
pub const WITHDRAW_SIGHASH: [u8; 8] = [183, 18, 70, 156, 148, 109, 161, 34];
/// sha256("global:place_perp_order")[0..8]
pub const PLACE_PERP_ORDER_SIGHASH: [u8; 8] = [69, 161, 93, 202, 120, 126, 76, 185];
/// sha256("global:cancel_order")[0..8]
pub const CANCEL_ORDER_SIGHASH: [u8; 8] = [95, 129, 237, 240, 8, 49, 223, 132];

#[derive(BorshSerialize)]
struct DepositParams {
    amount: u64,
}

#[derive(BorshSerialize)]
struct WithdrawParams {
    amount: u64,
}

#[derive(BorshSerialize)]
pub struct PlacePerpOrderParams {
    pub price: u64,
    pub size: u64,
    pub side: u8,
    pub order_type: u8,
    pub client_order_id: Option<u64>,
    pub expiry_ts: Option<u64>,
    pub tag: Option<String>,
}

#[derive(BorshSerialize)]
struct CancelOrderParams {
    order_id: u128,
    side: u8,
}

pub fn initialize_margin_account_instruction(
    program_id: &Pubkey,
    authority: &Pubkey,
    payer: &Pubkey,
) -> Instruction {
    let (margin_account, _) = get_margin_account_address(program_id, authority);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(margin_account, false),
            AccountMeta::new_readonly(*authority, true),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: INITIALIZE_MARGIN_ACCOUNT_SIGHASH.to_vec(),
    }
}

pub fn deposit_instruction(
    program_id: &Pubkey,
    authority: &Pubkey,
    usdc_mint: &Pubkey,
    amount: u64,
) -> Instruction {
    let (state, _) = get_state_address(program_id);
    let (vault, _) = get_vault_address(program_id);
    let (margin_account, _) = get_margin_account_address(program_id, authority);
    let user_token_account = get_associated_token_address(authority, usdc_mint);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(state, false),
            AccountMeta::new(vault, false),
            AccountMeta::new(margin_account, false),
            AccountMeta::new(user_token_account, false),
            AccountMeta::new_readonly(*authority, true),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: [
            DEPOSIT_SIGHASH.to_vec(),
            DepositParams { amount }.try_to_vec().unwrap(),
        ]
        .concat(),
    }
}

pub fn withdraw_instruction(
    program_id: &Pubkey,
    authority: &Pubkey,
    usdc_mint: &Pubkey,
    amount: u64,
) -> Instruction {
    let (state, _) = get_state_address(program_id);
    let (vault, _) = get_vault_address(program_id);
    let (margin_account, _) = get_margin_account_address(program_id, authority);
    let user_token_account = get_associated_token_address(authority, usdc_mint);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(state, false),
            AccountMeta::new(vault, false),
            AccountMeta::new(margin_account, false),
            AccountMeta::new(user_token_account, false),
            AccountMeta::new_readonly(*authority, true),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: [
            WITHDRAW_SIGHASH.to_vec(),
            WithdrawParams { amount }.try_to_vec().unwrap(),
        ]
        .concat(),
    }
}

/// `now` is the current unix timestamp, used to resolve a relative
/// time-in-force to its absolute on-chain expiry.
#[allow(clippy::too_many_arguments)]
pub fn place_perp_order_instruction(
    program_id: &Pubkey,
    asset: Asset,
    authority: &Pubkey,
    price: u64,
    size: u64,
    side: Side,
    options: &OrderOptions,
    now: u64,
) -> Instruction {
    let (state, _) = get_state_address(program_id);
    let (pricing, _) = get_pricing_address(program_id);
    let (margin_account, _) = get_margin_account_address(program_id, authority);
    let (open_orders, _) = get_open_orders_address(program_id, asset, authority);
    let params = PlacePerpOrderParams {
        price,
        size,
        side: side.into(),
        order_type: options.order_type.into(),
        client_order_id: options.client_order_id,
        expiry_ts: options.time_in_force.expiry_ts(now),
        tag: Some(options.tag.clone()),
    };
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(state, false),
            AccountMeta::new(pricing, false),
            AccountMeta::new(margin_account, false),
            AccountMeta::new(open_orders, false),
            AccountMeta::new_readonly(*authority, true),
        ],
        data: [
            PLACE_PERP_ORDER_SIGHASH.to_vec(),
            params.try_to_vec().unwrap(),
        ]
        .concat(),
    }
}

pub fn cancel_order_instruction(
    program_id: &Pubkey,
    asset: Asset,
    authority: &Pubkey,
    order_id: u128,
    side: Side,
) -> Instruction {
    let (state, _) = get_state_address(program_id);
    let (margin_account, _) = get_margin_account_address(program_id, authority);
    let (open_orders, _) = get_open_orders_address(program_id, asset, authority);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(state, false),
            AccountMeta::new(margin_account, false),
            AccountMeta::new(open_orders, false),
            AccountMeta::new_readonly(*authority, true),
        ],
        data: [
            CANCEL_ORDER_SIGHASH.to_vec(),
            CancelOrderParams {
                order_id,
                side: side.into(),
            }
            .try_to_vec()
            .unwrap(),
        ]
        .concat(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderType, TimeInForce};

    #[test]
    fn deposit_wire_format() {
        let program_id = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let ix = deposit_instruction(&program_id, &authority, &mint, 1_000_000);

        assert_eq!(ix.data[..8], DEPOSIT_SIGHASH);
        assert_eq!(ix.data[8..16], 1_000_000u64.to_le_bytes());
        assert_eq!(ix.accounts.len(), 6);
        // Authority signs; the state account is read-only.
        assert!(ix.accounts[4].is_signer);
        assert!(!ix.accounts[0].is_writable);
        assert!(ix.accounts[1].is_writable);
    }

    #[test]
    fn place_perp_order_encodes_options() {
        let program_id = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let options = OrderOptions {
            order_type: OrderType::PostOnly,
            time_in_force: TimeInForce::ExpiresIn(60),
            client_order_id: Some(7),
            tag: "SDK".to_string(),
        };
        let ix = place_perp_order_instruction(
            &program_id,
            Asset::Sol,
            &authority,
            142_500_000,
            2_000_000,
            Side::Ask,
            &options,
            1_000,
        );

        assert_eq!(ix.data[..8], PLACE_PERP_ORDER_SIGHASH);
        let body = &ix.data[8..];
        assert_eq!(body[..8], 142_500_000u64.to_le_bytes());
        assert_eq!(body[8..16], 2_000_000u64.to_le_bytes());
        assert_eq!(body[16], u8::from(Side::Ask));
        assert_eq!(body[17], u8::from(OrderType::PostOnly));
        // Option<u64> client order id: Some tag then value.
        assert_eq!(body[18], 1);
        assert_eq!(body[19..27], 7u64.to_le_bytes());
        // Expiry resolved to now + 60.
        assert_eq!(body[27], 1);
        assert_eq!(body[28..36], 1_060u64.to_le_bytes());
    }

    #[test]
    fn cancel_order_wire_format() {
        let program_id = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let ix = cancel_order_instruction(&program_id, Asset::Btc, &authority, 42, Side::Bid);

        assert_eq!(ix.data[..8], CANCEL_ORDER_SIGHASH);
        assert_eq!(ix.data[8..24], 42u128.to_le_bytes());
        assert_eq!(ix.data[24], u8::from(Side::Bid));
        assert_eq!(ix.accounts.len(), 4);
        assert!(ix.accounts[3].is_signer);
    }

    #[test]
    fn initialize_margin_account_targets_derived_pda() {
        let program_id = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let ix = initialize_margin_account_instruction(&program_id, &authority, &payer);

        let (expected, _) = get_margin_account_address(&program_id, &authority);
        assert_eq!(ix.accounts[0].pubkey, expected);
        assert_eq!(ix.data, INITIALIZE_MARGIN_ACCOUNT_SIGHASH.to_vec());
    }
}
