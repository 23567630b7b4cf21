use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// Underlying assets with listed perp markets.
///
/// The discriminant is the wire code used by the on-chain program; the
/// same value indexes the per-asset arrays in [`crate::pricing::Pricing`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
pub enum Asset {
    Sol = 0,
    Btc = 1,
    Eth = 2,
    Apt = 3,
    Arb = 4,
}

impl Asset {
    pub const COUNT: usize = 5;

    pub fn all() -> [Asset; Self::COUNT] {
        [Asset::Sol, Asset::Btc, Asset::Eth, Asset::Apt, Asset::Arb]
    }

    /// Index into the per-asset arrays of the pricing account.
    pub fn to_index(self) -> usize {
        u8::from(self) as usize
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Asset::Sol => "SOL",
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Apt => "APT",
            Asset::Arb => "ARB",
        };
        write!(f, "{name}")
    }
}

/// Cluster the exchange is deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Localnet,
    Devnet,
    Testnet,
    Mainnet,
}

impl Network {
    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Network::Localnet => "http://127.0.0.1:8899",
            Network::Devnet => "https://api.devnet.solana.com",
            Network::Testnet => "https://api.testnet.solana.com",
            Network::Mainnet => "https://api.mainnet-beta.solana.com",
        }
    }

    pub fn default_ws_url(self) -> &'static str {
        match self {
            Network::Localnet => "ws://127.0.0.1:8900",
            Network::Devnet => "wss://api.devnet.solana.com",
            Network::Testnet => "wss://api.testnet.solana.com",
            Network::Mainnet => "wss://api.mainnet-beta.solana.com",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Localnet => "localnet",
            Network::Devnet => "devnet",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet-beta",
        };
        write!(f, "{name}")
    }
}

/// Side of the book to trade.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum Side {
    Bid = 0,
    Ask = 1,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum OrderType {
    Limit = 0,
    PostOnly = 1,
    FillOrKill = 2,
    ImmediateOrCancel = 3,
    PostOnlySlide = 4,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum SelfTradeBehavior {
    DecrementTake = 0,
    CancelProvide = 1,
    AbortTransaction = 2,
}

/// Expiry policy for a resting order. The expires-in and expires-at forms
/// are mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeInForce {
    #[default]
    GoodTilCancelled,
    /// Seconds from placement until expiry.
    ExpiresIn(u32),
    /// Absolute unix timestamp of expiry.
    ExpiresAt(u64),
}

impl TimeInForce {
    /// Resolve to the absolute expiry timestamp encoded on the wire.
    /// `None` means the order never expires.
    pub fn expiry_ts(self, now: u64) -> Option<u64> {
        match self {
            TimeInForce::GoodTilCancelled => None,
            TimeInForce::ExpiresIn(offset) => Some(now + u64::from(offset)),
            TimeInForce::ExpiresAt(ts) => Some(ts),
        }
    }
}

/// Optional order parameters, every field with an explicit default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderOptions {
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub client_order_id: Option<u64>,
    pub tag: String,
}

impl Default for OrderOptions {
    fn default() -> Self {
        Self {
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::GoodTilCancelled,
            client_order_id: None,
            tag: "SDK".to_string(),
        }
    }
}
