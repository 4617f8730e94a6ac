//! The `utils` module holds the pieces shared across `eventrelay`: the
//! error type and logging setup.

pub mod error;
pub mod logging;

pub use error::{BrokerError, Result};
