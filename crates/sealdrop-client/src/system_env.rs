//! Sender-side environment backed by the OS.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sealdrop_core::env::Environment;

/// Environment for sealing secrets on a real machine.
///
/// Every data key, nonce and salt comes from getrandom.
///
/// # Panics
///
/// Panics if the OS RNG fails. Sealing with predictable key material would
/// hand the plaintext to anyone who can guess it.
#[derive(Clone, Debug, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable - cannot draw keys");
    }

    fn wall_clock_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }
}
