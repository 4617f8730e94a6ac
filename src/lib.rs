//! # eventrelay
//!
//! `eventrelay` is a small in-process publish/subscribe relay built with
//! Rust and tokio. Producers hand it discrete messages and it fans each one
//! out, as a JSON payload, to every currently registered subscriber.
//!
//! ## Core Modules
//!
//! - `broker`: message values, subscriber handles, the bounded delivery
//!   queue and the dispatch loop.
//! - `config`: loading and merging relay configuration.
//! - `utils`: the shared error type and logging setup.
//!
//! ## Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! use eventrelay::broker::{Message, MessageBroker, Subscriber};
//!
//! # async fn demo() -> eventrelay::utils::Result<()> {
//! let broker = Arc::new(MessageBroker::default());
//! let (subscriber, mut inbox) = Subscriber::channel(16);
//! broker.subscribe(&subscriber);
//!
//! let runner = broker.clone();
//! tokio::spawn(async move { runner.run(tokio::signal::ctrl_c()).await });
//!
//! broker
//!     .deliver(Message::now("greetings", BTreeMap::from([("hello".into(), "world".into())])))
//!     .await?;
//! let payload = inbox.recv().await;
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod config;
pub mod utils;
