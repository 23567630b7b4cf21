//! Typed mirror of a single on-chain account.
//!
//! An [`Account`] binds an address to the most recently decoded value of
//! its on-chain data. `load` takes a point-in-time snapshot; `subscribe`
//! keeps the value fresh from a shared websocket feed. The held value is
//! always the decode of the highest slot observed so far: feeds may
//! redeliver or deliver out of order, and a later delivery never regresses
//! the mirror to an older slot.

use std::sync::{Arc, RwLock};

use bytemuck::Pod;
use log::warn;
use solana_client::rpc_client::RpcClient;
use solana_program::pubkey::Pubkey;
use solana_sdk::commitment_config::CommitmentConfig;

use crate::error::{DecodeError, Result, ZenithError};
use crate::subscription::{FeedEvent, FeedKey, Listener, SubscriptionManager, SubscriptionToken};

/// Decoding of one account type's fixed binary layout.
///
/// Implementations are total: truncated data and unknown discriminators
/// yield a [`DecodeError`], never a panic or an out-of-bounds read.
pub trait AccountDecode: Clone {
    /// 8-byte tag prefixing the account data; `None` for sysvars.
    const DISCRIMINATOR: Option<[u8; 8]>;

    /// Decode the field body, discriminator already stripped.
    fn decode_fields(body: &[u8]) -> std::result::Result<Self, DecodeError>;

    fn decode(data: &[u8]) -> std::result::Result<Self, DecodeError> {
        let body = match Self::DISCRIMINATOR {
            Some(expected) => {
                if data.len() < 8 {
                    return Err(DecodeError::Truncated {
                        expected: 8,
                        actual: data.len(),
                    });
                }
                let (tag, body) = data.split_at(8);
                if tag != expected.as_slice() {
                    let mut found = [0u8; 8];
                    found.copy_from_slice(tag);
                    return Err(DecodeError::Discriminator { found });
                }
                body
            }
            None => data,
        };
        Self::decode_fields(body)
    }
}

/// Decode a fixed-layout Pod struct from the front of `body`. Tolerates
/// trailing bytes and unaligned input.
pub(crate) fn decode_pod<T: Pod>(body: &[u8]) -> std::result::Result<T, DecodeError> {
    let need = std::mem::size_of::<T>();
    if body.len() < need {
        return Err(DecodeError::Truncated {
            expected: need,
            actual: body.len(),
        });
    }
    Ok(bytemuck::pod_read_unaligned(&body[..need]))
}

struct Held<T> {
    value: T,
    slot: u64,
    feed_closed: bool,
}

/// The single mutable slot shared between the feed dispatch path (writer)
/// and `get` (reader).
pub(crate) struct AccountCell<T> {
    address: Pubkey,
    held: RwLock<Held<T>>,
}

impl<T: AccountDecode> AccountCell<T> {
    pub(crate) fn new(address: Pubkey, value: T, slot: u64) -> Self {
        Self {
            address,
            held: RwLock::new(Held {
                value,
                slot,
                feed_closed: false,
            }),
        }
    }

    /// Decode a feed delivery and install it if it is strictly newer than
    /// the held slot. A decode failure keeps the previous value: a stale
    /// but valid state beats a crash.
    pub(crate) fn apply_update(&self, slot: u64, data: &[u8]) {
        let value = match T::decode(data) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "dropping undecodable update for {} at slot {slot}: {e}",
                    self.address
                );
                return;
            }
        };
        let mut held = self.held.write().expect("account cell poisoned");
        if slot > held.slot {
            held.value = value;
            held.slot = slot;
        }
    }

    pub(crate) fn mark_closed(&self) {
        self.held.write().expect("account cell poisoned").feed_closed = true;
    }
}

/// Listener closure wiring a shared feed into one account cell.
pub(crate) fn make_listener<T>(cell: Arc<AccountCell<T>>) -> Listener
where
    T: AccountDecode + Send + Sync + 'static,
{
    Box::new(move |event| match event {
        FeedEvent::Update { slot, data } => cell.apply_update(slot, data),
        FeedEvent::Closed => cell.mark_closed(),
    })
}

/// A typed account mirror. See the module docs.
pub struct Account<T: AccountDecode> {
    address: Pubkey,
    cell: Arc<AccountCell<T>>,
    token: Option<SubscriptionToken>,
}

impl<T: AccountDecode> Account<T> {
    /// One-shot fetch and decode of the account at `address`.
    ///
    /// Fails with [`ZenithError::AccountNotFound`] when the address holds no
    /// on-chain data, or [`ZenithError::Decode`] when the blob does not
    /// match `T`'s layout. No partially constructed mirror is ever returned.
    pub fn load(address: Pubkey, rpc: &RpcClient) -> Result<Self> {
        let response = rpc.get_account_with_commitment(&address, rpc.commitment())?;
        let slot = response.context.slot;
        let raw = response
            .value
            .ok_or(ZenithError::AccountNotFound(address))?;
        let value = T::decode(&raw.data)?;
        Ok(Self {
            address,
            cell: Arc::new(AccountCell::new(address, value, slot)),
            token: None,
        })
    }

    /// Re-fetch the account. The held value advances only if the fetch
    /// observed a newer slot.
    pub fn reload(&self, rpc: &RpcClient) -> Result<()> {
        let response = rpc.get_account_with_commitment(&self.address, rpc.commitment())?;
        let slot = response.context.slot;
        let raw = response
            .value
            .ok_or(ZenithError::AccountNotFound(self.address))?;
        let value = T::decode(&raw.data)?;
        let mut held = self.cell.held.write().expect("account cell poisoned");
        if slot > held.slot {
            held.value = value;
            held.slot = slot;
        }
        Ok(())
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    /// Snapshot of the most recently decoded value. Never blocks on the
    /// network; possibly stale when not subscribed or when the feed has
    /// stalled — callers apply their own staleness policy via [`Self::slot`].
    pub fn get(&self) -> T {
        self.cell
            .held
            .read()
            .expect("account cell poisoned")
            .value
            .clone()
    }

    /// Slot at which the held value was observed. Non-decreasing over the
    /// lifetime of the mirror.
    pub fn slot(&self) -> u64 {
        self.cell.held.read().expect("account cell poisoned").slot
    }

    pub fn is_subscribed(&self) -> bool {
        self.token.is_some()
    }

    /// Whether the feed backing this mirror has disconnected.
    pub fn is_feed_closed(&self) -> bool {
        self.cell
            .held
            .read()
            .expect("account cell poisoned")
            .feed_closed
    }

    /// Fails with [`ZenithError::FeedClosed`] when the backing feed has
    /// disconnected; recovery is an explicit unsubscribe + subscribe.
    pub fn ensure_live(&self) -> Result<()> {
        if self.is_feed_closed() {
            return Err(ZenithError::FeedClosed(self.address));
        }
        Ok(())
    }
}

impl<T> Account<T>
where
    T: AccountDecode + Send + Sync + 'static,
{
    /// Keep this mirror fresh from the shared feed for
    /// `(address, commitment)`. Idempotent: a second call while subscribed
    /// is a no-op and opens no additional feed.
    pub fn subscribe(
        &mut self,
        manager: &SubscriptionManager,
        commitment: CommitmentConfig,
    ) -> Result<()> {
        if self.token.is_some() {
            return Ok(());
        }
        self.cell.held.write().expect("account cell poisoned").feed_closed = false;
        let key = FeedKey {
            address: self.address,
            commitment,
        };
        let token = manager.subscribe(key, make_listener(Arc::clone(&self.cell)))?;
        self.token = Some(token);
        Ok(())
    }

    /// Release this mirror's feed registration. No-op when not subscribed;
    /// other mirrors sharing the feed are unaffected.
    pub fn unsubscribe(&mut self, manager: &SubscriptionManager) {
        if let Some(token) = self.token.take() {
            manager.unsubscribe(token);
        }
    }
}

#[cfg(test)]
impl<T: AccountDecode> Account<T> {
    /// A mirror seeded directly, bypassing the RPC fetch.
    pub(crate) fn detached(address: Pubkey, value: T, slot: u64) -> Self {
        Self {
            address,
            cell: Arc::new(AccountCell::new(address, value, slot)),
            token: None,
        }
    }
}

#[cfg(test)]
impl<T> Account<T>
where
    T: AccountDecode + Send + Sync + 'static,
{
    /// Register on a detached feed driven through
    /// [`SubscriptionManager::dispatch`] instead of a websocket.
    pub(crate) fn subscribe_detached(
        &mut self,
        manager: &SubscriptionManager,
        commitment: CommitmentConfig,
    ) {
        let key = FeedKey {
            address: self.address,
            commitment,
        };
        let token = manager.subscribe_detached(key, make_listener(Arc::clone(&self.cell)));
        self.token = Some(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use bytemuck::{Pod, Zeroable};
    use serde_json::json;
    use solana_client::rpc_request::RpcRequest;

    const COUNTER_TAG: [u8; 8] = *b"counter\0";

    #[repr(C)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Zeroable, Pod)]
    struct Counter {
        value: u64,
    }

    impl AccountDecode for Counter {
        const DISCRIMINATOR: Option<[u8; 8]> = Some(COUNTER_TAG);

        fn decode_fields(body: &[u8]) -> std::result::Result<Self, DecodeError> {
            decode_pod(body)
        }
    }

    fn blob(value: u64) -> Vec<u8> {
        [COUNTER_TAG.as_slice(), &value.to_le_bytes()].concat()
    }

    fn mirror(value: u64, slot: u64) -> Account<Counter> {
        Account::detached(Pubkey::new_unique(), Counter { value }, slot)
    }

    #[test]
    fn load_of_missing_account_is_not_found() {
        let mut mocks = HashMap::new();
        mocks.insert(
            RpcRequest::GetAccountInfo,
            json!({"context": {"slot": 1}, "value": null}),
        );
        let rpc = RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks);

        let address = Pubkey::new_unique();
        assert!(matches!(
            Account::<Counter>::load(address, &rpc),
            Err(ZenithError::AccountNotFound(missing)) if missing == address
        ));
    }

    #[test]
    fn load_of_foreign_blob_fails_without_a_mirror() {
        let mut mocks = HashMap::new();
        mocks.insert(
            RpcRequest::GetAccountInfo,
            json!({
                "context": {"slot": 1},
                "value": {
                    "lamports": 1,
                    // Three junk bytes, far too short for a counter.
                    "data": ["AQID", "base64"],
                    "owner": Pubkey::new_unique().to_string(),
                    "executable": false,
                    "rentEpoch": 0,
                    "space": 3,
                },
            }),
        );
        let rpc = RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks);

        assert!(matches!(
            Account::<Counter>::load(Pubkey::new_unique(), &rpc),
            Err(ZenithError::Decode(DecodeError::Truncated { .. }))
        ));
    }

    #[test]
    fn decode_rejects_truncated_and_mistagged_blobs() {
        assert!(matches!(
            Counter::decode(&[1, 2, 3]),
            Err(DecodeError::Truncated { .. })
        ));
        assert!(matches!(
            Counter::decode(&blob(1)[..10]),
            Err(DecodeError::Truncated { .. })
        ));
        let mut wrong_tag = blob(1);
        wrong_tag[0] ^= 0xff;
        assert!(matches!(
            Counter::decode(&wrong_tag),
            Err(DecodeError::Discriminator { .. })
        ));
    }

    #[test]
    fn decode_tolerates_trailing_padding() {
        let mut data = blob(7);
        data.extend_from_slice(&[0u8; 16]);
        assert_eq!(Counter::decode(&data).unwrap(), Counter { value: 7 });
    }

    #[test]
    fn newer_slot_replaces_value() {
        let account = mirror(1, 100);
        account.cell.apply_update(101, &blob(2));
        assert_eq!(account.get(), Counter { value: 2 });
        assert_eq!(account.slot(), 101);
    }

    #[test]
    fn stale_and_duplicate_deliveries_are_discarded() {
        let account = mirror(1, 100);
        account.cell.apply_update(99, &blob(2));
        assert_eq!(account.get(), Counter { value: 1 });
        assert_eq!(account.slot(), 100);

        // Same-slot redelivery never rewrites state.
        account.cell.apply_update(100, &blob(3));
        assert_eq!(account.get(), Counter { value: 1 });
    }

    #[test]
    fn decode_failure_leaves_value_and_slot_unchanged() {
        let account = mirror(1, 100);
        account.cell.apply_update(105, &blob(9)[..12]);
        assert_eq!(account.get(), Counter { value: 1 });
        assert_eq!(account.slot(), 100);
    }

    /// Loaded at slot 100, an older delivery is discarded, an undecodable
    /// delivery is dropped, and the valid redelivery at slot 105 lands.
    #[test]
    fn out_of_order_then_bad_then_good_delivery() {
        let account = mirror(100, 100);

        account.cell.apply_update(99, &blob(99));
        assert_eq!(account.get(), Counter { value: 100 });
        assert_eq!(account.slot(), 100);

        account.cell.apply_update(105, &blob(105)[..9]);
        assert_eq!(account.get(), Counter { value: 100 });
        assert_eq!(account.slot(), 100);

        account.cell.apply_update(105, &blob(105));
        assert_eq!(account.get(), Counter { value: 105 });
        assert_eq!(account.slot(), 105);
    }

    #[test]
    fn slot_is_max_of_successfully_decoded_deliveries() {
        let account = mirror(0, 0);
        let deliveries: [(u64, Vec<u8>); 5] = [
            (5, blob(5)),
            (3, blob(3)),
            (8, blob(8)[..9].to_vec()),
            (8, blob(8)),
            (6, blob(6)),
        ];
        for (slot, data) in &deliveries {
            account.cell.apply_update(*slot, data);
        }
        assert_eq!(account.slot(), 8);
        assert_eq!(account.get(), Counter { value: 8 });
    }

    #[test]
    fn subscribed_mirror_tracks_dispatched_updates() {
        let manager = SubscriptionManager::new("ws://unused");
        let mut account = mirror(1, 100);
        let key = FeedKey {
            address: account.address(),
            commitment: CommitmentConfig::confirmed(),
        };
        account.subscribe_detached(&manager, key.commitment);

        manager.dispatch(&key, 110, &blob(4));
        assert_eq!(account.get(), Counter { value: 4 });
        assert_eq!(account.slot(), 110);

        account.unsubscribe(&manager);
        assert!(!account.is_subscribed());

        // Deliveries after unsubscribe are invisible.
        manager.dispatch(&key, 120, &blob(5));
        assert_eq!(account.get(), Counter { value: 4 });
        assert_eq!(account.slot(), 110);
    }

    #[test]
    fn feed_close_is_observable_and_keeps_last_value() {
        let manager = SubscriptionManager::new("ws://unused");
        let account = mirror(1, 100);
        let key = FeedKey {
            address: account.address(),
            commitment: CommitmentConfig::confirmed(),
        };
        manager.subscribe_detached(key, make_listener(Arc::clone(&account.cell)));

        assert!(account.ensure_live().is_ok());
        manager.dispatch_closed(&key);
        assert!(account.is_feed_closed());
        assert!(matches!(
            account.ensure_live(),
            Err(ZenithError::FeedClosed(addr)) if addr == account.address()
        ));
        // Last good value survives the disconnect.
        assert_eq!(account.get(), Counter { value: 1 });
    }
}
