//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` is the production implementation of the Environment trait using
//! the real wall clock and the OS cryptographic RNG.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sealdrop_core::env::Environment;

/// Production environment using system time and cryptographic RNG.
///
/// Uses `SystemTime` for record expiry, `tokio::time::sleep()` for the reaper
/// interval, and getrandom for secret ids.
///
/// # Security
///
/// The RNG uses getrandom which provides OS-level cryptographic randomness
/// (e.g., /dev/urandom on Linux, `BCryptGenRandom` on Windows). Secret ids are
/// the only access control the relay has, so they must be unguessable.
///
/// # Panics
///
/// Panics if the OS RNG fails. A relay that cannot draw unguessable ids must
/// not hand any out.
#[derive(Clone, Default)]
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
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - relay cannot issue ids");
    }

    fn wall_clock_millis(&self) -> u64 {
        // A clock before 1970 reads as 0: records would expire late, never early
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }
}
