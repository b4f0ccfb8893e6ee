//! Error types for the sealdrop protocol core.
//!
//! Errors are split by the step that produces them so callers can tell the
//! user something precise: a wrong PIN is retryable, a consumed or expired
//! secret is gone for good, and a corrupted link will never decrypt.

use sealdrop_crypto::CryptoError;
use thiserror::Error;

/// Errors building an envelope on the sender side.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SealError {
    /// Nothing to share
    #[error("secret text is empty")]
    EmptySecret,

    /// PIN mode requested with an empty PIN
    #[error("PIN must not be empty")]
    EmptyPin,
}

/// Errors opening an envelope on the receiver side.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    /// PIN-wrapped envelope opened without a PIN
    #[error("this secret is protected by a PIN")]
    PinRequired,

    /// Key unwrap failed authentication.
    ///
    /// The only step where a retry loop is meaningful.
    #[error("incorrect PIN")]
    IncorrectPin,

    /// Secret decryption failed authentication, or the plaintext is not text.
    ///
    /// In PIN mode the data key already authenticated, so this means the link
    /// or the stored ciphertext is damaged.
    #[error("link is invalid or the secret is corrupted")]
    CorruptedLink,
}

/// Errors decoding a URL fragment token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FragmentError {
    /// Fragment is empty
    #[error("fragment is empty")]
    Empty,

    /// Token carries a version prefix this build does not understand
    #[error("unsupported fragment version: {0}")]
    UnsupportedVersion(String),

    /// Token does not decode to any known layout
    #[error("malformed fragment: {0}")]
    Malformed(String),
}

impl From<CryptoError> for FragmentError {
    fn from(err: CryptoError) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Errors parsing a share link.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// No `#fragment` present; without it the secret cannot be decrypted
    #[error("link has no key fragment")]
    MissingFragment,

    /// No `/s/<id>` path segment
    #[error("link has no secret id")]
    MissingId,

    /// Id segment is not a valid secret id
    #[error("invalid secret id: {0}")]
    InvalidId(String),

    /// Fragment does not decode
    #[error(transparent)]
    Fragment(#[from] FragmentError),
}

/// Errors validating relay request and response bodies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Required field absent
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Field present but malformed
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// TTL outside the offered set
    #[error("unsupported ttl_seconds {0}: expected one of 3600, 86400, 604800")]
    UnsupportedTtl(u64),
}

/// Why a reveal attempt ended.
///
/// Each variant renders as a distinct user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevealError {
    /// Relay has no record: never existed, already viewed, or expired
    #[error("secret not found: it was already viewed or has expired")]
    NotFound,

    /// Wrong PIN. Retryable while the ciphertext is cached in memory.
    #[error("incorrect PIN")]
    IncorrectPin,

    /// Link or ciphertext damaged
    #[error("link is invalid or the secret is corrupted")]
    CorruptedLink,

    /// Relay unreachable or returned garbage.
    ///
    /// Fetching is not retried automatically: a fetch whose response was lost
    /// may already have consumed the secret.
    #[error("relay unavailable: {0}")]
    Transport(String),
}

impl RevealError {
    /// Returns true if re-entering a PIN may still reveal the secret.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::IncorrectPin)
    }
}

impl From<OpenError> for RevealError {
    fn from(err: OpenError) -> Self {
        match err {
            OpenError::IncorrectPin | OpenError::PinRequired => Self::IncorrectPin,
            OpenError::CorruptedLink => Self::CorruptedLink,
        }
    }
}

/// Receiver state machine misuse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReceiverError {
    /// Event not valid in the current state
    #[error("invalid transition: cannot handle {event} in state {state}")]
    InvalidTransition {
        /// Current state name
        state: &'static str,
        /// Event name
        event: &'static str,
    },
}
