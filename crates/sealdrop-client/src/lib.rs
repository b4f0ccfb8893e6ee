//! Sealdrop client flows.
//!
//! # Sender
//!
//! [`share_secret`] seals a text (optionally under a PIN), stores the
//! ciphertext at the relay and returns a [`ShareLink`] whose fragment carries
//! the key material.
//!
//! # Receiver
//!
//! [`RevealSession`] turns a pasted link back into plaintext. It is an async
//! driver for the Sans-IO [`sealdrop_core::Receiver`]: it executes the fetch
//! and decrypt actions the state machine emits and feeds the results back.
//!
//! # Transport
//!
//! Both flows take any [`RelayClient`]. [`HttpRelay`] is the production
//! implementation; tests use an in-process relay.
//!
//! [`ShareLink`]: sealdrop_core::ShareLink

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod http;
mod relay;
mod reveal;
mod sender;
mod system_env;

pub use error::{ClientError, RelayClientError};
pub use http::HttpRelay;
pub use relay::RelayClient;
pub use reveal::{RevealOutcome, RevealSession};
pub use sender::share_secret;
pub use system_env::SystemEnv;
