use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_program::{instruction::Instruction, pubkey::Pubkey};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    compute_budget::ComputeBudgetInstruction,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};

use crate::account::Account;
use crate::clock::{self, Clock};
use crate::config::ZenithConfig;
use crate::error::Result;
use crate::fees;
use crate::instructions;
use crate::pda;
use crate::pricing::Pricing;
use crate::state::State;
use crate::subscription::SubscriptionManager;
use crate::types::{Asset, OrderOptions, Side};

/// A session against the Zenith exchange.
///
/// Owns the RPC connection, the subscription manager and the mirrors of the
/// exchange-wide accounts. Lifecycle is explicit: construct with [`load`],
/// optionally [`subscribe`], drop to release every feed.
///
/// Mirrored values read through the session are snapshots; they are only
/// kept in sync while subscribed.
///
/// # Example
/// ```rust,no_run
/// use zenith_sdk::config::ZenithConfig;
/// use zenith_sdk::exchange::Exchange;
/// use zenith_sdk::types::Asset;
/// use solana_sdk::commitment_config::CommitmentConfig;
///
/// let mut exchange = Exchange::load(ZenithConfig::default()).unwrap();
/// exchange.subscribe(CommitmentConfig::confirmed()).unwrap();
/// println!("SOL mark: {:.2}", exchange.mark_price(Asset::Sol));
/// ```
///
/// [`load`]: Exchange::load
/// [`subscribe`]: Exchange::subscribe
pub struct Exchange {
    pub config: ZenithConfig,
    pub rpc: RpcClient,
    pub subscriptions: SubscriptionManager,
    pub state_address: Pubkey,
    pub pricing_address: Pubkey,
    pub state: Account<State>,
    pub pricing: Account<Pricing>,
    pub clock: Account<Clock>,
    priority_fee: u64,
}

impl Exchange {
    /// Load the exchange-wide accounts and derive the session's addresses.
    pub fn load(config: ZenithConfig) -> Result<Self> {
        let rpc = RpcClient::new_with_commitment(
            config.rpc_url.clone(),
            CommitmentConfig::confirmed(),
        );
        let (state_address, _) = pda::get_state_address(&config.program_id);
        let (pricing_address, _) = pda::get_pricing_address(&config.program_id);

        let state = Account::load(state_address, &rpc)?;
        let pricing = Account::load(pricing_address, &rpc)?;
        let clock = Account::load(clock::id(), &rpc)?;

        let subscriptions = SubscriptionManager::new(&config.ws_url);
        let priority_fee = config.priority_fee;
        Ok(Self {
            config,
            rpc,
            subscriptions,
            state_address,
            pricing_address,
            state,
            pricing,
            clock,
            priority_fee,
        })
    }

    /// Keep the pricing and clock mirrors live. Idempotent. On error the
    /// session holds no feed registrations; retry after fixing the
    /// connection.
    pub fn subscribe(&mut self, commitment: CommitmentConfig) -> Result<()> {
        self.pricing.subscribe(&self.subscriptions, commitment)?;
        if let Err(e) = self.clock.subscribe(&self.subscriptions, commitment) {
            self.pricing.unsubscribe(&self.subscriptions);
            return Err(e);
        }
        Ok(())
    }

    /// Release the session's feed registrations.
    pub fn unsubscribe(&mut self) {
        self.pricing.unsubscribe(&self.subscriptions);
        self.clock.unsubscribe(&self.subscriptions);
    }

    // ── Read operations ─────────────────────────────────────────────────

    /// Mark price in USD, as of the last observed pricing update.
    pub fn mark_price(&self, asset: Asset) -> f64 {
        self.pricing.get().mark_price_usd(asset)
    }

    /// Daily funding rate as a signed fraction.
    pub fn funding_rate(&self, asset: Asset) -> f64 {
        self.pricing.get().funding_rate_daily(asset)
    }

    /// Cluster time from the clock mirror.
    pub fn unix_timestamp(&self) -> i64 {
        self.clock.get().unix_timestamp
    }

    /// A user's margin account address.
    pub fn margin_account_address(&self, authority: &Pubkey) -> Pubkey {
        pda::get_margin_account_address(&self.config.program_id, authority).0
    }

    // ── Priority fees ───────────────────────────────────────────────────

    /// Fee currently applied to sent transactions, microlamports per CU.
    pub fn priority_fee(&self) -> u64 {
        self.priority_fee
    }

    pub fn set_priority_fee(&mut self, microlamports: u64) {
        self.priority_fee = microlamports;
    }

    /// Re-estimate the priority fee from recent fees paid to the exchange's
    /// most written-to accounts. On `EstimationUnavailable` the session
    /// falls back to the configured default fee before returning the error.
    pub fn update_priority_fee(&mut self) -> Result<u64> {
        let busiest = [self.pricing_address, self.state_address];
        match fees::estimate_priority_fee(&self.rpc, &busiest, self.config.priority_fee_cap) {
            Ok(fee) => {
                self.priority_fee = fee;
                Ok(fee)
            }
            Err(e) => {
                self.priority_fee = self.config.priority_fee;
                Err(e)
            }
        }
    }

    // ── Write operations ────────────────────────────────────────────────

    /// Create the caller's margin account.
    pub fn initialize_margin_account(&self, payer: &Keypair) -> Result<Signature> {
        let ix = instructions::initialize_margin_account_instruction(
            &self.config.program_id,
            &payer.pubkey(),
            &payer.pubkey(),
        );
        self.send(&[ix], &[payer])
    }

    /// Deposit USDC margin from the payer's associated token account.
    pub fn deposit(&self, payer: &Keypair, amount: u64) -> Result<Signature> {
        let ix = instructions::deposit_instruction(
            &self.config.program_id,
            &payer.pubkey(),
            &self.config.usdc_mint,
            amount,
        );
        self.send(&[ix], &[payer])
    }

    /// Withdraw USDC margin to the payer's associated token account.
    pub fn withdraw(&self, payer: &Keypair, amount: u64) -> Result<Signature> {
        let ix = instructions::withdraw_instruction(
            &self.config.program_id,
            &payer.pubkey(),
            &self.config.usdc_mint,
            amount,
        );
        self.send(&[ix], &[payer])
    }

    /// Place a perp order. Relative time-in-force is resolved against the
    /// clock mirror.
    pub fn place_perp_order(
        &self,
        payer: &Keypair,
        asset: Asset,
        price: u64,
        size: u64,
        side: Side,
        options: &OrderOptions,
    ) -> Result<Signature> {
        let now = self.unix_timestamp().max(0) as u64;
        let ix = instructions::place_perp_order_instruction(
            &self.config.program_id,
            asset,
            &payer.pubkey(),
            price,
            size,
            side,
            options,
            now,
        );
        self.send(&[ix], &[payer])
    }

    /// Cancel a resting order by id.
    pub fn cancel_order(
        &self,
        payer: &Keypair,
        asset: Asset,
        order_id: u128,
        side: Side,
    ) -> Result<Signature> {
        let ix = instructions::cancel_order_instruction(
            &self.config.program_id,
            asset,
            &payer.pubkey(),
            order_id,
            side,
        );
        self.send(&[ix], &[payer])
    }

    // ── Utility ─────────────────────────────────────────────────────────

    /// Sign and send a transaction, prepending the session's priority fee
    /// as a compute budget instruction when non-zero.
    pub fn send(&self, ixs: &[Instruction], signers: &[&Keypair]) -> Result<Signature> {
        let mut all_ixs = Vec::with_capacity(ixs.len() + 1);
        if self.priority_fee > 0 {
            all_ixs.push(ComputeBudgetInstruction::set_compute_unit_price(
                self.priority_fee,
            ));
        }
        all_ixs.extend_from_slice(ixs);

        let blockhash = self.rpc.get_latest_blockhash()?;
        let tx = Transaction::new_signed_with_payer(
            &all_ixs,
            Some(&signers[0].pubkey()),
            signers,
            blockhash,
        );
        let sig = self.rpc.send_and_confirm_transaction_with_spinner_and_config(
            &tx,
            CommitmentConfig::processed(),
            RpcSendTransactionConfig {
                skip_preflight: true,
                ..Default::default()
            },
        )?;
        Ok(sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    fn offline_session() -> Exchange {
        let config = ZenithConfig::default();
        let (state_address, _) = pda::get_state_address(&config.program_id);
        let (pricing_address, _) = pda::get_pricing_address(&config.program_id);
        Exchange {
            rpc: RpcClient::new_mock("succeeds".to_string()),
            // Nothing listens on port 1; any real subscribe attempt fails.
            subscriptions: SubscriptionManager::new("ws://127.0.0.1:1"),
            state_address,
            pricing_address,
            state: Account::detached(state_address, State::zeroed(), 1),
            pricing: Account::detached(pricing_address, Pricing::zeroed(), 1),
            clock: Account::detached(clock::id(), Clock::default(), 1),
            priority_fee: config.priority_fee,
            config,
        }
    }

    #[test]
    fn failed_subscribe_rolls_back_partial_registrations() {
        let mut exchange = offline_session();
        let commitment = CommitmentConfig::confirmed();

        // Pricing is already registered; the clock subscribe is the first to
        // reach the unreachable websocket and fails.
        exchange
            .pricing
            .subscribe_detached(&exchange.subscriptions, commitment);
        assert!(exchange.pricing.is_subscribed());

        assert!(exchange.subscribe(commitment).is_err());
        assert!(!exchange.pricing.is_subscribed());
        assert!(!exchange.clock.is_subscribed());
        assert_eq!(exchange.subscriptions.feed_count(), 0);
    }
}
