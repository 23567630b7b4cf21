use solana_program::pubkey::Pubkey;
use std::str::FromStr;

use crate::error::{Result, ZenithError};
use crate::types::Network;

const DEFAULT_PROGRAM_ID: &str = "EndKxsNLAv4VvRMPZPUFreWoewivTRtfUWigMi7w7k5t";
const DEFAULT_USDC_MINT: &str = "3gGTNLybqEEAdhZmZMRVEJzu7TQP3tWfba6SaxWDS9gp";
const DEFAULT_PRIORITY_FEE: u64 = 0;
/// Upper bound on the auto-estimated priority fee, microlamports per CU.
const DEFAULT_PRIORITY_FEE_CAP: u64 = 50_000;

/// SDK configuration. All fields have devnet defaults.
///
/// # Example
/// ```rust,no_run
/// use zenith_sdk::config::ZenithConfig;
/// use zenith_sdk::types::Network;
///
/// // Use defaults (devnet)
/// let config = ZenithConfig::default();
///
/// // Custom endpoint on mainnet
/// let config = ZenithConfig::builder()
///     .network(Network::Mainnet)
///     .rpc_url("https://my-node.example.com")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ZenithConfig {
    /// Cluster the exchange is deployed to.
    pub network: Network,
    /// JSON-RPC endpoint for point-in-time reads and transaction submission.
    pub rpc_url: String,
    /// Websocket endpoint for account subscriptions.
    pub ws_url: String,
    /// Zenith exchange program ID.
    pub program_id: Pubkey,
    /// Collateral (USDC) mint.
    pub usdc_mint: Pubkey,
    /// Priority fee in microlamports per CU applied to every transaction,
    /// and the fallback when auto estimation is unavailable.
    pub priority_fee: u64,
    /// Cap applied to auto-estimated priority fees.
    pub priority_fee_cap: u64,
}

impl Default for ZenithConfig {
    fn default() -> Self {
        let network = Network::Devnet;
        Self {
            network,
            rpc_url: network.default_rpc_url().to_string(),
            ws_url: network.default_ws_url().to_string(),
            program_id: Pubkey::from_str(DEFAULT_PROGRAM_ID).unwrap(),
            usdc_mint: Pubkey::from_str(DEFAULT_USDC_MINT).unwrap(),
            priority_fee: DEFAULT_PRIORITY_FEE,
            priority_fee_cap: DEFAULT_PRIORITY_FEE_CAP,
        }
    }
}

impl ZenithConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for [`ZenithConfig`]. Any field left unset uses the default for
/// the selected network. Invalid pubkey strings are rejected by `build`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    network: Option<Network>,
    rpc_url: Option<String>,
    ws_url: Option<String>,
    program_id: Option<String>,
    usdc_mint: Option<String>,
    priority_fee: Option<u64>,
    priority_fee_cap: Option<u64>,
}

impl ConfigBuilder {
    pub fn network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    pub fn rpc_url(mut self, url: &str) -> Self {
        self.rpc_url = Some(url.to_string());
        self
    }

    pub fn ws_url(mut self, url: &str) -> Self {
        self.ws_url = Some(url.to_string());
        self
    }

    pub fn program_id(mut self, id: &str) -> Self {
        self.program_id = Some(id.to_string());
        self
    }

    pub fn usdc_mint(mut self, mint: &str) -> Self {
        self.usdc_mint = Some(mint.to_string());
        self
    }

    pub fn priority_fee(mut self, microlamports: u64) -> Self {
        self.priority_fee = Some(microlamports);
        self
    }

    pub fn priority_fee_cap(mut self, microlamports: u64) -> Self {
        self.priority_fee_cap = Some(microlamports);
        self
    }

    pub fn build(self) -> Result<ZenithConfig> {
        let defaults = ZenithConfig::default();
        let network = self.network.unwrap_or(defaults.network);
        Ok(ZenithConfig {
            network,
            rpc_url: self
                .rpc_url
                .unwrap_or_else(|| network.default_rpc_url().to_string()),
            ws_url: self
                .ws_url
                .unwrap_or_else(|| network.default_ws_url().to_string()),
            program_id: parse_pubkey("program_id", self.program_id)?
                .unwrap_or(defaults.program_id),
            usdc_mint: parse_pubkey("usdc_mint", self.usdc_mint)?
                .unwrap_or(defaults.usdc_mint),
            priority_fee: self.priority_fee.unwrap_or(defaults.priority_fee),
            priority_fee_cap: self.priority_fee_cap.unwrap_or(defaults.priority_fee_cap),
        })
    }
}

fn parse_pubkey(field: &'static str, value: Option<String>) -> Result<Option<Pubkey>> {
    match value {
        None => Ok(None),
        Some(s) => Pubkey::from_str(&s)
            .map(Some)
            .map_err(|_| ZenithError::InvalidConfig { field, value: s }),
    }
}
