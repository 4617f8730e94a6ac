//! Message definitions for the broker
//!
//! `Message` is the value producers hand to the broker. The broker never
//! routes on any field; `channel` is metadata carried through to the wire.
//!
//! Wire layout (field order is fixed by declaration order):
//!
//! ```text
//! {"id":"some-uuid","content":{"just":"testing"},"created":123456,"channel_id":"some-channel"}
//! ```

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::{BrokerError, Result};

/// An immutable message. Fields are only readable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: String,
    content: BTreeMap<String, String>,
    #[serde(rename = "created")]
    creation_time: i64,
    #[serde(rename = "channel_id")]
    channel: String,
}

impl Message {
    /// Build a message from producer-supplied fields. Uniqueness of `id` is
    /// the producer's responsibility.
    pub fn new(
        id: impl Into<String>,
        content: BTreeMap<String, String>,
        creation_time: i64,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content,
            creation_time,
            channel: channel.into(),
        }
    }

    /// Build a message stamped with a fresh UUID and the current Unix time.
    pub fn now(channel: impl Into<String>, content: BTreeMap<String, String>) -> Self {
        Self::new(
            Uuid::new_v4().to_string(),
            content,
            chrono::Utc::now().timestamp(),
            channel,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &BTreeMap<String, String> {
        &self.content
    }

    /// Seconds since the Unix epoch, as set by the producer.
    pub fn creation_time(&self) -> i64 {
        self.creation_time
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Encode to the canonical JSON wire representation.
    pub fn to_wire(&self) -> Result<Bytes> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|source| BrokerError::Serialization {
                id: self.id.clone(),
                source,
            })
    }

    /// Decode a payload produced by [`Message::to_wire`].
    pub fn from_wire(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }
}
