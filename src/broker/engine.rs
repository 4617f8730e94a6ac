//! Broker engine
//!
//! `MessageBroker` owns the subscriber registry and the delivery queue, and
//! runs the dispatch loop that fans every queued message out to all current
//! subscribers.
//!
//! Concurrency and usage notes:
//! - All methods take `&self`; share the broker behind an `Arc` and start
//!   `run` once on its own task.
//! - Each message is serialized once per broadcast round and the same bytes
//!   are pushed to every subscriber.
//! - A push to a subscriber waits at most `subscriber_timeout`; a full or
//!   closed sink is logged and skipped so one consumer cannot stall the rest.
//! - When the shutdown future resolves, no further round is started, queued
//!   messages are discarded and later `deliver` calls fail with `Stopped`.
//!   The same happens if the `run` future is dropped before completing.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::{debug, error, info, warn};

use super::message::Message;
use super::queue::{DeliveryQueue, PushError};
use super::registry::SubscriberRegistry;
use super::subscriber::Subscriber;
use crate::config::BrokerSettings;
use crate::utils::{BrokerError, Result};

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Used to tell brokers apart in logs.
    pub name: String,
    pub queue_capacity: usize,
    /// How long `deliver` waits for a free queue slot.
    pub delivery_timeout: Duration,
    /// How long the dispatch loop waits on a single subscriber's sink.
    pub subscriber_timeout: Duration,
}

impl BrokerConfig {
    pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;
    pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_SUBSCRIBER_TIMEOUT: Duration = Duration::from_secs(1);
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            queue_capacity: Self::DEFAULT_QUEUE_CAPACITY,
            delivery_timeout: Self::DEFAULT_DELIVERY_TIMEOUT,
            subscriber_timeout: Self::DEFAULT_SUBSCRIBER_TIMEOUT,
        }
    }
}

impl From<&BrokerSettings> for BrokerConfig {
    fn from(settings: &BrokerSettings) -> Self {
        Self {
            name: settings.name.clone(),
            queue_capacity: settings.queue_capacity,
            delivery_timeout: Duration::from_millis(settings.delivery_timeout_ms),
            subscriber_timeout: Duration::from_millis(settings.subscriber_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerState {
    /// Constructed, dispatch loop not started.
    Idle,
    Running,
    /// Terminal; the dispatch loop has exited.
    Stopped,
}

/// Point-in-time copy of the broker counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrokerStats {
    pub queued: u64,
    pub dispatched: u64,
    pub delivery_timeouts: u64,
    pub serialization_failures: u64,
    pub subscriber_skips: u64,
    pub discarded: u64,
}

#[derive(Debug, Default)]
struct Counters {
    queued: AtomicU64,
    dispatched: AtomicU64,
    delivery_timeouts: AtomicU64,
    serialization_failures: AtomicU64,
    subscriber_skips: AtomicU64,
    discarded: AtomicU64,
}

struct StopOnDrop<'a> {
    broker: &'a MessageBroker,
}

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.broker.stop();
    }
}

#[derive(Debug)]
pub struct MessageBroker {
    config: BrokerConfig,
    registry: SubscriberRegistry,
    queue: DeliveryQueue,
    state: Mutex<BrokerState>,
    counters: Counters,
}

impl Default for MessageBroker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}

impl MessageBroker {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            queue: DeliveryQueue::new(config.queue_capacity),
            registry: SubscriberRegistry::new(),
            state: Mutex::new(BrokerState::Idle),
            counters: Counters::default(),
            config,
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub fn state(&self) -> BrokerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: BrokerState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Register a subscriber. Subscribing the same handle twice has no effect.
    pub fn subscribe(&self, subscriber: &Subscriber) {
        if self.registry.insert(subscriber) {
            debug!(broker = %self.config.name, subscriber = %subscriber.id(), "subscribed");
        }
    }

    /// Remove a subscriber. Unknown handles are ignored.
    pub fn unsubscribe(&self, subscriber: &Subscriber) {
        if self.registry.remove(subscriber) {
            debug!(broker = %self.config.name, subscriber = %subscriber.id(), "unsubscribed");
        }
    }

    pub fn is_subscribed(&self, subscriber: &Subscriber) -> bool {
        self.registry.contains(subscriber)
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of messages waiting for the dispatch loop.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Queue a message for broadcast.
    ///
    /// Waits up to `delivery_timeout` for a free slot. On timeout the message
    /// is dropped and `DeliveryTimeout` is returned; retrying is up to the
    /// caller. Fails fast with `Stopped` once the dispatch loop has exited.
    pub async fn deliver(&self, message: Message) -> Result<()> {
        let id = message.id().to_string();

        if self.state() == BrokerState::Stopped {
            warn!(broker = %self.config.name, id = %id, "rejected message, broker is stopped");
            return Err(BrokerError::Stopped { id });
        }

        match self.queue.push(message, self.config.delivery_timeout).await {
            Ok(()) => {
                self.counters.queued.fetch_add(1, Ordering::Relaxed);
                debug!(broker = %self.config.name, id = %id, "queued message");
                Ok(())
            }
            Err(PushError::Timeout) => {
                self.counters
                    .delivery_timeouts
                    .fetch_add(1, Ordering::Relaxed);
                warn!(
                    broker = %self.config.name,
                    id = %id,
                    timeout = ?self.config.delivery_timeout,
                    "timed out while trying to deliver message"
                );
                Err(BrokerError::DeliveryTimeout { id })
            }
            Err(PushError::Closed) => {
                warn!(broker = %self.config.name, id = %id, "rejected message, broker is stopped");
                Err(BrokerError::Stopped { id })
            }
        }
    }

    /// Run the dispatch loop until `shutdown` resolves.
    ///
    /// Shutdown is checked before every dequeue; a broadcast round already
    /// in progress is allowed to finish. Whatever is still queued afterwards
    /// is discarded. Dropping the `run` future (an aborted task, a runtime
    /// shutting down) stops the broker the same way.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future,
    {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != BrokerState::Idle {
                return Err(BrokerError::AlreadyStarted);
            }
            *state = BrokerState::Running;
        }
        info!(
            broker = %self.config.name,
            capacity = self.queue.capacity(),
            "dispatch loop started"
        );

        // stops the broker on every exit path, including the task being aborted
        let _stopped = StopOnDrop { broker: self };

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                message = self.queue.pop() => self.dispatch(message).await,
            }
        }

        Ok(())
    }

    /// Move to `Stopped`, close the queue and count what was left in it.
    fn stop(&self) {
        self.set_state(BrokerState::Stopped);
        let discarded = self.queue.close();
        self.counters
            .discarded
            .fetch_add(discarded as u64, Ordering::Relaxed);
        info!(broker = %self.config.name, discarded, "dispatch loop stopped");
    }

    async fn dispatch(&self, message: Message) {
        let encoded = message.to_wire();
        self.broadcast(&message, encoded).await;
    }

    /// One broadcast round: push the same encoded bytes to every subscriber
    /// registered at the start of the round. An encoding failure skips the
    /// round for everyone.
    pub(super) async fn broadcast(&self, message: &Message, encoded: Result<Bytes>) {
        let payload = match encoded {
            Ok(payload) => payload,
            Err(e) => {
                self.counters
                    .serialization_failures
                    .fetch_add(1, Ordering::Relaxed);
                error!(broker = %self.config.name, id = %message.id(), error = %e, "could not encode message, round skipped");
                return;
            }
        };

        let subscribers = self.registry.snapshot();
        for subscriber in &subscribers {
            match subscriber
                .push(payload.clone(), self.config.subscriber_timeout)
                .await
            {
                Ok(()) => {}
                Err(SendTimeoutError::Timeout(_)) => {
                    self.counters
                        .subscriber_skips
                        .fetch_add(1, Ordering::Relaxed);
                    warn!(
                        broker = %self.config.name,
                        id = %message.id(),
                        subscriber = %subscriber.id(),
                        "subscriber did not accept message in time, skipped"
                    );
                }
                Err(SendTimeoutError::Closed(_)) => {
                    self.counters
                        .subscriber_skips
                        .fetch_add(1, Ordering::Relaxed);
                    warn!(
                        broker = %self.config.name,
                        id = %message.id(),
                        subscriber = %subscriber.id(),
                        "subscriber sink is closed, skipped"
                    );
                }
            }
        }

        self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
        debug!(
            broker = %self.config.name,
            id = %message.id(),
            subscribers = subscribers.len(),
            "dispatched message"
        );
    }

    pub fn stats(&self) -> BrokerStats {
        BrokerStats {
            queued: self.counters.queued.load(Ordering::Relaxed),
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            delivery_timeouts: self.counters.delivery_timeouts.load(Ordering::Relaxed),
            serialization_failures: self
                .counters
                .serialization_failures
                .load(Ordering::Relaxed),
            subscriber_skips: self.counters.subscriber_skips.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
        }
    }
}
