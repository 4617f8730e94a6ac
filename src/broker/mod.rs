//! The `broker` module is the core of the relay: message values, subscriber
//! handles, the registry, the bounded delivery queue and the dispatch loop.

pub mod engine;
pub mod message;
pub mod queue;
pub mod registry;
pub mod subscriber;

pub use engine::{BrokerConfig, BrokerState, BrokerStats, MessageBroker};
pub use message::Message;
pub use subscriber::{Subscriber, SubscriberId};
