//! The `error` module defines the error type shared by the broker and its
//! collaborators.
//!
//! Every delivery-path failure is local to one call or one broadcast round;
//! none of these variants leaves the broker unusable.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    /// The delivery queue did not accept the message within the timeout.
    /// The message has been dropped.
    #[error("timed out while trying to deliver message {id}")]
    DeliveryTimeout { id: String },

    /// The dispatch loop has stopped; nothing will drain the queue again.
    #[error("broker is stopped, message {id} was not accepted")]
    Stopped { id: String },

    #[error("dispatch loop already started")]
    AlreadyStarted,

    #[error("could not encode message {id}: {source}")]
    Serialization {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not decode wire payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type alias for broker operations
pub type Result<T> = std::result::Result<T, BrokerError>;
