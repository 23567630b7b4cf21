//! Rust SDK for the Zenith derivatives exchange on Solana.
//!
//! Provides an [`Exchange`](exchange::Exchange) session for interacting
//! with the on-chain program, built around a typed account mirror
//! ([`Account`](account::Account)) that loads fixed-layout accounts by
//! address and optionally keeps them fresh through shared websocket feeds
//! ([`SubscriptionManager`](subscription::SubscriptionManager)).
//!
//! # Quick start
//!
//! ```rust,no_run
//! use zenith_sdk::config::ZenithConfig;
//! use zenith_sdk::exchange::Exchange;
//! use zenith_sdk::types::Asset;
//! use solana_sdk::commitment_config::CommitmentConfig;
//!
//! let mut exchange = Exchange::load(ZenithConfig::default()).unwrap();
//! exchange.subscribe(CommitmentConfig::confirmed()).unwrap();
//!
//! for asset in Asset::all() {
//!     println!(
//!         "{}: {:.2} (slot {})",
//!         asset,
//!         exchange.mark_price(asset),
//!         exchange.pricing.slot(),
//!     );
//! }
//! ```

pub mod account;
pub mod clock;
pub mod config;
pub mod error;
pub mod exchange;
pub mod fees;
pub mod instructions;
pub mod pda;
pub mod pricing;
pub mod state;
pub mod subscription;
pub mod types;

pub use account::{Account, AccountDecode};
pub use config::ZenithConfig;
pub use error::{DecodeError, Result, ZenithError};
pub use exchange::Exchange;
pub use subscription::{FeedEvent, FeedKey, SubscriptionManager, SubscriptionToken};
