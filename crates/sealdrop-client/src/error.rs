//! Client error types.

use sealdrop_core::{LinkError, ReceiverError, SealError};
use thiserror::Error;

/// Errors talking to a relay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayClientError {
    /// Connection could not be established; the request never reached the relay
    #[error("relay unreachable: {0}")]
    Connect(String),

    /// Request was sent but no usable response arrived (timeout, reset)
    #[error("relay transport failed: {0}")]
    Transport(String),

    /// Relay answered with a server-side failure (5xx)
    #[error("relay unavailable ({status}): {message}")]
    Unavailable {
        /// HTTP status
        status: u16,
        /// Relay's message
        message: String,
    },

    /// Relay refused the request (4xx other than not-found on fetch)
    #[error("relay rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status
        status: u16,
        /// Relay's message
        message: String,
    },

    /// Relay answered 2xx with a body that does not decode
    #[error("unexpected relay response: {0}")]
    InvalidResponse(String),
}

impl RelayClientError {
    /// Returns true if a create request may be sent again without leaving
    /// a second record at the relay.
    ///
    /// Only failures where the relay stored nothing qualify: no connection,
    /// or an explicit 5xx. A `Transport` failure may follow a completed
    /// create and is not transient. A fetch is never resent at all.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Unavailable { .. })
    }
}

/// Errors from the sender and receiver flows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Secret could not be sealed
    #[error(transparent)]
    Seal(#[from] SealError),

    /// Share link did not parse
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Relay request failed
    #[error(transparent)]
    Relay(#[from] RelayClientError),

    /// Session driven in a state that does not accept input
    #[error(transparent)]
    Receiver(#[from] ReceiverError),

    /// Blocking crypto task was cancelled or panicked
    #[error("crypto task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for ClientError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
