//! Deterministic simulation harness for sealdrop.
//!
//! - [`SimEnv`]: seeded ChaCha RNG and a virtual wall clock shared by every
//!   clone, so relay expiry can be tested without waiting
//! - [`LocalRelay`]: the client [`RelayClient`](sealdrop_client::RelayClient)
//!   capability over an in-process relay
//! - [`model`]: reference model of the single-read store for model-based
//!   tests

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod local_relay;
pub mod model;
mod sim_env;

pub use local_relay::LocalRelay;
pub use model::{ModelRelay, OpResult, RelayOp, TtlChoice};
pub use sim_env::{SIM_EPOCH_MILLIS, SimEnv};
