//! Subscriber registry
//!
//! Holds the live set of subscribers. Mutation and iteration both go through
//! the lock; the dispatch loop only ever works on a snapshot, so the lock is
//! never held across an await.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::subscriber::{Subscriber, SubscriberId};

#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    members: RwLock<HashMap<SubscriberId, Subscriber>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber. Re-adding the same identity is a no-op.
    pub fn insert(&self, subscriber: &Subscriber) -> bool {
        let mut members = self.members.write().unwrap_or_else(PoisonError::into_inner);
        if members.contains_key(&subscriber.id()) {
            return false;
        }
        members.insert(subscriber.id(), subscriber.clone());
        true
    }

    /// Remove a subscriber if present.
    pub fn remove(&self, subscriber: &Subscriber) -> bool {
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&subscriber.id())
            .is_some()
    }

    pub fn contains(&self, subscriber: &Subscriber) -> bool {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&subscriber.id())
    }

    pub fn len(&self) -> usize {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current members, cloned out from under the read lock.
    pub fn snapshot(&self) -> Vec<Subscriber> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}
