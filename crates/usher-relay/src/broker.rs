//! Message broker seam.
//!
//! The bus talks to the outside world through [`Broker`], a thin
//! publish/subscribe abstraction over named channels. Production deployments
//! back it with a real message broker; [`MemoryBroker`] is the in-process
//! implementation used by single-node setups and the test suite.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::{RelayError, Result};

/// Raw message stream for one channel subscription.
pub type Subscription = mpsc::Receiver<Vec<u8>>;

/// Buffered messages per subscriber before publishes start failing.
const SUBSCRIPTION_CAPACITY: usize = 256;

/// Publish/subscribe transport over named channels.
///
/// Channel semantics are fan-out: every active subscriber of a channel
/// receives every message published to it. Delivery is at-most-once and
/// ordering is only guaranteed per publisher.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Verifies the transport is usable, reconnecting if needed.
    async fn ensure_connected(&self) -> Result<()>;

    /// Publishes a message to every subscriber of `channel`.
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<()>;

    /// Opens a new subscription to `channel`.
    async fn subscribe(&self, channel: &str) -> Result<Subscription>;

    /// Implementation name for logs.
    fn name(&self) -> &str;
}

#[derive(Default)]
struct Channels {
    subscribers: HashMap<String, Vec<mpsc::Sender<Vec<u8>>>>,
}

/// In-process broker backed by per-channel mpsc fan-out.
///
/// Cloning is cheap; clones share the same channel table, so two components
/// holding clones of one `MemoryBroker` see each other's traffic. The
/// connected flag lets tests cut the wire without tearing anything down.
#[derive(Clone)]
pub struct MemoryBroker {
    channels: Arc<Mutex<Channels>>,
    connected: Arc<AtomicBool>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Mutex::new(Channels::default())),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulates the broker going away (or coming back).
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Active subscriber count for a channel, dead senders included until
    /// the next publish prunes them.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .subscribers
            .get(channel)
            .map_or(0, Vec::len)
    }

    fn check_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(RelayError::broker("memory broker is disconnected"))
        }
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn ensure_connected(&self) -> Result<()> {
        self.check_connected()
    }

    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<()> {
        self.check_connected()?;
        let senders = {
            let guard = self.channels.lock();
            guard
                .subscribers
                .get(channel)
                .cloned()
                .unwrap_or_default()
        };
        let mut dead = false;
        for sender in &senders {
            if sender.send(payload.clone()).await.is_err() {
                dead = true;
            }
        }
        if dead {
            let mut guard = self.channels.lock();
            if let Some(subs) = guard.subscribers.get_mut(channel) {
                subs.retain(|s| !s.is_closed());
            }
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription> {
        self.check_connected()?;
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_CAPACITY);
        self.channels
            .lock()
            .subscribers
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
