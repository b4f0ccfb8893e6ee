//! Simulated environment: seeded RNG and a virtual wall clock.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sealdrop_core::env::Environment;

/// Virtual epoch the clock starts at (2024-01-01T00:00:00Z)
pub const SIM_EPOCH_MILLIS: u64 = 1_704_067_200_000;

/// Deterministic [`Environment`] for tests.
///
/// Clones share the RNG and the clock, so a relay and a client built from the
/// same `SimEnv` observe the same time. Time only moves through
/// [`advance`](Self::advance) or [`sleep`](Environment::sleep).
#[derive(Clone, Debug)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha20Rng>>,
    now_ms: Arc<AtomicU64>,
}

impl SimEnv {
    /// Environment with seed 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment whose random stream is fixed by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
            now_ms: Arc::new(AtomicU64::new(SIM_EPOCH_MILLIS)),
        }
    }

    /// Move the virtual clock forward.
    pub fn advance(&self, duration: Duration) {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.now_ms.fetch_add(millis, Ordering::SeqCst);
    }

    /// Virtual time elapsed since [`SIM_EPOCH_MILLIS`].
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.now_ms.load(Ordering::SeqCst) - SIM_EPOCH_MILLIS)
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        tokio::task::yield_now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }

    fn wall_clock_millis(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
