//! Chaotic storage wrapper for fault injection testing
//!
//! Storage wrapper that randomly fails operations to test error handling and
//! recovery. Used for chaos testing to check the relay surfaces storage
//! failures as transport failures without ever serving a record twice.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use sealdrop_core::SecretId;

use super::{RelayStorage, StorageError, StoredRecord};

/// Chaotic storage wrapper that randomly injects failures
///
/// Delegates to an underlying storage implementation but randomly fails
/// operations based on a configured failure rate.
///
/// With `lose_take_responses`, a failing `take` runs against the inner store
/// first and then reports an error: the record is consumed but the caller
/// never learns it. This is the ambiguous outcome that makes retrying a
/// consume unsafe.
#[derive(Clone)]
pub struct ChaoticStorage<S: RelayStorage> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// Fail `take` after it has already removed the record
    lose_take_responses: bool,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    /// Operation counter
    operation_count: Arc<AtomicUsize>,
}

/// Simple deterministic RNG for chaos injection
///
/// Uses linear congruential generator (LCG) for fast, deterministic randomness.
/// This ensures chaos tests are reproducible with the same seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate next random value [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }

    /// Check if we should fail (returns true with probability = `failure_rate`)
    fn should_fail(&mut self, failure_rate: f64) -> bool {
        self.next() < failure_rate
    }
}

impl<S: RelayStorage> ChaoticStorage<S> {
    /// Create a new chaotic storage wrapper
    ///
    /// `failure_rate` is clamped to [0.0, 1.0].
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with explicit seed for reproducible chaos
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        Self {
            inner,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            lose_take_responses: false,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make failing `take` calls consume the record before reporting an error.
    #[must_use]
    pub fn losing_take_responses(mut self) -> Self {
        self.lose_take_responses = true;
        self
    }

    /// Underlying storage (for checking invariants after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of storage operations attempted.
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::Relaxed)
    }

    /// Count the operation and decide whether it fails.
    fn should_fail(&self) -> bool {
        self.operation_count.fetch_add(1, Ordering::Relaxed);
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).should_fail(self.failure_rate)
    }
}

fn injected() -> StorageError {
    StorageError::Io("chaotic failure injection".to_string())
}

impl<S: RelayStorage> RelayStorage for ChaoticStorage<S> {
    fn insert(&self, id: SecretId, record: &StoredRecord) -> Result<(), StorageError> {
        if self.should_fail() {
            return Err(injected());
        }
        self.inner.insert(id, record)
    }

    fn take(&self, id: SecretId, now_ms: u64) -> Result<Option<StoredRecord>, StorageError> {
        if self.should_fail() {
            if self.lose_take_responses {
                let _ = self.inner.take(id, now_ms)?;
            }
            return Err(injected());
        }
        self.inner.take(id, now_ms)
    }

    fn purge_expired(&self, now_ms: u64) -> Result<usize, StorageError> {
        if self.should_fail() {
            return Err(injected());
        }
        self.inner.purge_expired(now_ms)
    }

    fn len(&self) -> Result<usize, StorageError> {
        if self.should_fail() {
            return Err(injected());
        }
        self.inner.len()
    }
}
