//! Sealdrop protocol core.
//!
//! Everything needed to turn a secret into relay-safe ciphertext plus
//! out-of-band key material, and back, without performing any I/O.
//!
//! # Architecture
//!
//! Follows the Sans-IO pattern: the [`receiver::Receiver`] state machine takes
//! events and returns actions for a driver to execute (fetch from the relay,
//! run a decrypt job, show the result). Time and randomness come from the
//! [`env::Environment`] trait so tests can run with a seeded RNG and a virtual
//! clock.
//!
//! # Components
//!
//! - [`envelope`]: seal a secret (Direct or PIN-wrapped) and open it again
//! - [`fragment`]: canonical URL-fragment token for an envelope
//! - [`link`]: shareable link (`{base}/s/{id}#{fragment}`)
//! - [`wire`]: JSON bodies exchanged with the relay
//! - [`receiver`]: receiver-side state machine with one-shot fetch
//!
//! # Zero Knowledge
//!
//! The relay only ever sees `(ciphertext, iv)` and an opaque id. The key (or
//! wrapped key and salt) lives in the fragment, which browsers and the client
//! in this workspace never put on the wire.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod envelope;
pub mod env;
pub mod error;
pub mod fragment;
pub mod id;
pub mod link;
pub mod receiver;
pub mod wire;

pub use envelope::{SealedSecret, SecretEnvelope, seal};
pub use error::{FragmentError, LinkError, OpenError, ReceiverError, RevealError, SealError, WireError};
pub use id::SecretId;
pub use link::ShareLink;
pub use receiver::{DecryptJob, FetchOutcome, FetchedSecret, Receiver, ReceiverAction, ReceiverEvent, ReceiverState};
