use solana_client::client_error::ClientError;
use solana_client::pubsub_client::PubsubClientError;
use solana_program::pubkey::Pubkey;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ZenithError>;

/// Errors surfaced by the SDK.
///
/// Staleness is deliberately not represented here: a subscription that has
/// stopped delivering updates keeps returning the last good value from
/// `Account::get`, and callers observe it through the held slot number.
#[derive(Debug, Error)]
pub enum ZenithError {
    /// The address has no on-chain data at load time. Recoverable by retry
    /// once the account has been created.
    #[error("account {0} not found on-chain")]
    AccountNotFound(Pubkey),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The underlying account feed disconnected. Recovery is an explicit
    /// unsubscribe + subscribe by the caller.
    #[error("subscription feed closed for account {0}")]
    FeedClosed(Pubkey),

    /// Priority fee estimation failed or returned no samples. Callers fall
    /// back to their configured default fee.
    #[error("priority fee estimation unavailable")]
    EstimationUnavailable,

    #[error("invalid {field}: {value}")]
    InvalidConfig { field: &'static str, value: String },

    #[error(transparent)]
    Rpc(#[from] ClientError),

    #[error(transparent)]
    Pubsub(#[from] PubsubClientError),
}

/// A blob did not match the expected fixed binary layout.
///
/// Always a total failure of that single decode attempt; never a panic and
/// never an out-of-bounds read. On the subscription dispatch path these are
/// logged and the previous decoded value is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("account data truncated: need at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("unexpected account discriminator {found:?}")]
    Discriminator { found: [u8; 8] },
}
