//! Subscriber handles
//!
//! A `Subscriber` wraps the sending side of a per-consumer channel. The
//! consumer keeps the receiving side and reads serialized payloads from it.
//! Identity is assigned when the handle is built; clones share it.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc::{self, Receiver, Sender, error::SendTimeoutError};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone)]
pub struct Subscriber {
    id: SubscriberId,
    sender: Sender<Bytes>,
}

impl Subscriber {
    /// Wrap an existing sender. Every call yields a distinct subscriber,
    /// even for clones of the same sender.
    pub fn new(sender: Sender<Bytes>) -> Self {
        Self {
            id: SubscriberId(Uuid::new_v4()),
            sender,
        }
    }

    /// Create a subscriber together with the receiver its consumer reads.
    /// A zero `buffer` is raised to one.
    pub fn channel(buffer: usize) -> (Self, Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Push a payload, waiting at most `timeout` for room in the sink.
    pub async fn push(
        &self,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<(), SendTimeoutError<Bytes>> {
        self.sender.send_timeout(payload, timeout).await
    }
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Subscriber {}

impl Hash for Subscriber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
