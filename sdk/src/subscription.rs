//! Multiplexes account mirrors onto a bounded set of websocket feeds.
//!
//! One underlying pubsub subscription is kept per (address, commitment)
//! pair; every mirror of that account registers a listener on the shared
//! feed. Deliveries are dispatched in the order received from the network.
//! The slot-monotonicity check is each listener's job, not the manager's.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::{info, warn};
use solana_account_decoder::{UiAccount, UiAccountEncoding};
use solana_client::pubsub_client::{PubsubClient, PubsubClientSubscription};
use solana_client::rpc_config::RpcAccountInfoConfig;
use solana_client::rpc_response::Response;
use solana_program::pubkey::Pubkey;
use solana_sdk::account::Account as OnChainAccount;
use solana_sdk::commitment_config::CommitmentConfig;

use crate::error::Result;

/// One delivery from an account feed.
pub enum FeedEvent<'a> {
    /// A new blob for the account, observed at `slot`.
    Update { slot: u64, data: &'a [u8] },
    /// The underlying feed disconnected. Nothing further will arrive until
    /// the caller resubscribes.
    Closed,
}

pub(crate) type Listener = Box<dyn Fn(FeedEvent) + Send + Sync>;

/// Identity of an underlying feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedKey {
    pub address: Pubkey,
    pub commitment: CommitmentConfig,
}

/// Handle to one registered listener; required to unsubscribe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionToken {
    key: FeedKey,
    id: u64,
}

/// Network half of a live feed. Absent for feeds driven directly in tests.
struct FeedConnection {
    subscription: PubsubClientSubscription<Response<UiAccount>>,
    reader: JoinHandle<()>,
}

struct Feed {
    listeners: Arc<Mutex<Vec<(u64, Listener)>>>,
    /// Set before a deliberate teardown so the reader does not report the
    /// resulting disconnect as a broken feed.
    closing: Arc<AtomicBool>,
    connection: Option<FeedConnection>,
}

/// Owns every live account feed of a session.
pub struct SubscriptionManager {
    ws_url: String,
    next_id: AtomicU64,
    feeds: Mutex<HashMap<FeedKey, Feed>>,
}

impl SubscriptionManager {
    pub fn new(ws_url: &str) -> Self {
        Self {
            ws_url: ws_url.to_string(),
            next_id: AtomicU64::new(0),
            feeds: Mutex::new(HashMap::new()),
        }
    }

    /// Number of live underlying feeds.
    pub fn feed_count(&self) -> usize {
        self.feeds.lock().expect("feed table poisoned").len()
    }

    /// Attach a listener to the feed for `key`, opening the feed if this is
    /// its first listener.
    pub(crate) fn subscribe(&self, key: FeedKey, listener: Listener) -> Result<SubscriptionToken> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut feeds = self.feeds.lock().expect("feed table poisoned");

        if let Some(feed) = feeds.get(&key) {
            feed.listeners
                .lock()
                .expect("listener set poisoned")
                .push((id, listener));
            return Ok(SubscriptionToken { key, id });
        }

        let config = RpcAccountInfoConfig {
            encoding: Some(UiAccountEncoding::Base64),
            data_slice: None,
            commitment: Some(key.commitment),
            min_context_slot: None,
        };
        let (subscription, receiver) =
            PubsubClient::account_subscribe(&self.ws_url, &key.address, Some(config))?;

        let listeners = Arc::new(Mutex::new(vec![(id, listener)]));
        let closing = Arc::new(AtomicBool::new(false));
        let reader = spawn_reader(key, receiver, Arc::clone(&listeners), Arc::clone(&closing));
        feeds.insert(
            key,
            Feed {
                listeners,
                closing,
                connection: Some(FeedConnection {
                    subscription,
                    reader,
                }),
            },
        );
        info!(
            "opened account feed for {} at {:?}",
            key.address, key.commitment.commitment
        );
        Ok(SubscriptionToken { key, id })
    }

    /// Remove one listener. Tears the underlying feed down when it was the
    /// last one. Safe to call with an already-released token.
    pub(crate) fn unsubscribe(&self, token: SubscriptionToken) {
        let removed = {
            let mut feeds = self.feeds.lock().expect("feed table poisoned");
            let Some(feed) = feeds.get_mut(&token.key) else {
                return;
            };
            let now_empty = {
                let mut listeners = feed.listeners.lock().expect("listener set poisoned");
                listeners.retain(|(id, _)| *id != token.id);
                listeners.is_empty()
            };
            if !now_empty {
                return;
            }
            feeds.remove(&token.key)
        };
        if let Some(feed) = removed {
            teardown_feed(&token.key.address, feed);
        }
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        if let Ok(mut feeds) = self.feeds.lock() {
            for (key, feed) in feeds.drain() {
                teardown_feed(&key.address, feed);
            }
        }
    }
}

fn teardown_feed(address: &Pubkey, feed: Feed) {
    feed.closing.store(true, Ordering::SeqCst);
    if let Some(connection) = feed.connection {
        let FeedConnection {
            mut subscription,
            reader,
        } = connection;
        let _ = subscription.send_unsubscribe();
        let _ = subscription.shutdown();
        let _ = reader.join();
        info!("closed account feed for {address}");
    }
}

/// Reads feed deliveries until the channel disconnects, dispatching each to
/// every listener in delivery order. A disconnect that was not requested is
/// surfaced to all listeners as [`FeedEvent::Closed`].
fn spawn_reader<R>(
    key: FeedKey,
    receiver: R,
    listeners: Arc<Mutex<Vec<(u64, Listener)>>>,
    closing: Arc<AtomicBool>,
) -> JoinHandle<()>
where
    R: IntoIterator<Item = Response<UiAccount>> + Send + 'static,
{
    std::thread::spawn(move || {
        for response in receiver {
            let slot = response.context.slot;
            let Some(account) = response.value.decode::<OnChainAccount>() else {
                warn!(
                    "unreadable feed payload for {} at slot {slot}",
                    key.address
                );
                continue;
            };
            let guard = listeners.lock().expect("listener set poisoned");
            for (_, listener) in guard.iter() {
                listener(FeedEvent::Update {
                    slot,
                    data: &account.data,
                });
            }
        }
        if !closing.load(Ordering::SeqCst) {
            warn!("account feed closed for {}", key.address);
            let guard = listeners.lock().expect("listener set poisoned");
            for (_, listener) in guard.iter() {
                listener(FeedEvent::Closed);
            }
        }
    })
}

#[cfg(test)]
impl SubscriptionManager {
    /// Register a listener without opening a websocket. Deliveries are
    /// driven through [`Self::dispatch`].
    pub(crate) fn subscribe_detached(&self, key: FeedKey, listener: Listener) -> SubscriptionToken {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut feeds = self.feeds.lock().expect("feed table poisoned");
        match feeds.get(&key) {
            Some(feed) => feed
                .listeners
                .lock()
                .expect("listener set poisoned")
                .push((id, listener)),
            None => {
                feeds.insert(
                    key,
                    Feed {
                        listeners: Arc::new(Mutex::new(vec![(id, listener)])),
                        closing: Arc::new(AtomicBool::new(false)),
                        connection: None,
                    },
                );
            }
        }
        SubscriptionToken { key, id }
    }

    pub(crate) fn dispatch(&self, key: &FeedKey, slot: u64, data: &[u8]) {
        let listeners = {
            let feeds = self.feeds.lock().expect("feed table poisoned");
            feeds.get(key).map(|feed| Arc::clone(&feed.listeners))
        };
        if let Some(listeners) = listeners {
            for (_, listener) in listeners.lock().expect("listener set poisoned").iter() {
                listener(FeedEvent::Update { slot, data });
            }
        }
    }

    pub(crate) fn dispatch_closed(&self, key: &FeedKey) {
        let listeners = {
            let feeds = self.feeds.lock().expect("feed table poisoned");
            feeds.get(key).map(|feed| Arc::clone(&feed.listeners))
        };
        if let Some(listeners) = listeners {
            for (_, listener) in listeners.lock().expect("listener set poisoned").iter() {
                listener(FeedEvent::Closed);
            }
        }
    }
}
