//! Delivery queue
//!
//! Bounded FIFO between producers and the dispatch loop. Free slots are
//! tracked by a semaphore so producers can wait for room with a timeout;
//! the single consumer parks on a `Notify` until something is queued.
//!
//! With a capacity of zero the queue behaves as a rendezvous: the consumer
//! offers one slot while it is parked in `pop`, so a push only succeeds when
//! someone is actually waiting to take the message.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, Semaphore};

use super::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushError {
    /// No slot freed up within the timeout.
    Timeout,
    /// The queue was closed before or while waiting.
    Closed,
}

#[derive(Debug, Default)]
struct Inner {
    items: VecDeque<Message>,
    closed: bool,
    // capacity 0 only: a slot has been handed out to a parked consumer
    offered: bool,
}

#[derive(Debug)]
pub struct DeliveryQueue {
    inner: Mutex<Inner>,
    slots: Semaphore,
    ready: Notify,
    capacity: usize,
}

impl DeliveryQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(Semaphore::MAX_PERMITS);
        Self {
            inner: Mutex::new(Inner::default()),
            slots: Semaphore::new(capacity),
            ready: Notify::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `message`, waiting at most `timeout` for a free slot.
    pub async fn push(&self, message: Message, timeout: Duration) -> Result<(), PushError> {
        let permit = match tokio::time::timeout(timeout, self.slots.acquire()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(PushError::Closed),
            Err(_) => return Err(PushError::Timeout),
        };

        let mut inner = self.lock();
        if inner.closed {
            return Err(PushError::Closed);
        }
        // the slot is given back by `pop`, not on drop
        permit.forget();
        inner.items.push_back(message);
        drop(inner);

        self.ready.notify_one();
        Ok(())
    }

    /// Wait for the next message. Single consumer only.
    ///
    /// Cancel-safe: a message is only removed in the same poll that returns it.
    pub async fn pop(&self) -> Message {
        loop {
            {
                let mut inner = self.lock();
                if let Some(message) = inner.items.pop_front() {
                    if self.capacity == 0 {
                        inner.offered = false;
                    } else {
                        self.slots.add_permits(1);
                    }
                    return message;
                }
                if self.capacity == 0 && !inner.offered && !inner.closed {
                    inner.offered = true;
                    self.slots.add_permits(1);
                }
            }
            self.ready.notified().await;
        }
    }

    /// Reject all further pushes, wake blocked producers and drop whatever
    /// is still queued. Returns the number of discarded messages.
    pub fn close(&self) -> usize {
        let mut inner = self.lock();
        inner.closed = true;
        let discarded = inner.items.len();
        inner.items.clear();
        self.slots.close();
        discarded
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
