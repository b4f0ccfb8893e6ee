//! Relay store operations.
//!
//! The relay is the only synchronization point between concurrent requests:
//! `create` is insert-only under a fresh id and `consume` delegates to the
//! backend's atomic take. There is no other write path.

use std::time::Duration;

use sealdrop_core::{SecretId, env::Environment};
use sealdrop_crypto::Nonce;
use thiserror::Error;

use crate::storage::{RelayStorage, StorageError, StoredRecord};

/// Attempts at drawing a non-colliding id before giving up
const MAX_ID_ATTEMPTS: usize = 4;

/// Errors from relay operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// TTL of zero would create an already-expired record
    #[error("ttl must be positive")]
    ZeroTtl,

    /// Every id drawn collided with an existing record
    #[error("could not allocate a unique secret id after {0} attempts")]
    IdExhausted(usize),

    /// Backing store failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RelayError {
    /// Returns true if the request may succeed when retried.
    ///
    /// Never retry a consume on this basis: a failed consume may already have
    /// removed the record.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(err) => err.is_transient(),
            Self::IdExhausted(_) => true,
            Self::ZeroTtl => false,
        }
    }
}

/// Single-read, TTL-bound ciphertext store.
///
/// Generic over the environment (id randomness, wall clock) and storage
/// backend. Clone is cheap; clones share the backend.
#[derive(Clone)]
pub struct Relay<E: Environment, S: RelayStorage> {
    env: E,
    storage: S,
}

impl<E: Environment, S: RelayStorage> Relay<E, S> {
    /// Relay over the given environment and storage.
    pub fn new(env: E, storage: S) -> Self {
        Self { env, storage }
    }

    /// Environment (clock, randomness).
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Persist a ciphertext under a fresh unguessable id.
    ///
    /// The record expires `ttl` after now. Any positive TTL is accepted here;
    /// the HTTP layer restricts callers to the offered set.
    ///
    /// # Errors
    ///
    /// - `ZeroTtl` if `ttl` is zero
    /// - `IdExhausted` if every drawn id collided
    /// - `Storage` if the backend failed
    pub fn create(
        &self,
        ciphertext: Vec<u8>,
        iv: Nonce,
        ttl: Duration,
    ) -> Result<SecretId, RelayError> {
        if ttl.is_zero() {
            return Err(RelayError::ZeroTtl);
        }

        let now_ms = self.env.wall_clock_millis();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let record = StoredRecord {
            ciphertext,
            iv: *iv.as_bytes(),
            created_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(ttl_ms),
        };

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = SecretId::generate(&self.env);
            match self.storage.insert(id, &record) {
                Ok(()) => {
                    tracing::debug!(%id, ttl_secs = ttl.as_secs(), "secret stored");
                    return Ok(id);
                },
                Err(StorageError::Conflict { .. }) => {
                    tracing::warn!("secret id collision, drawing a new id");
                },
                Err(err) => return Err(err.into()),
            }
        }

        Err(RelayError::IdExhausted(MAX_ID_ATTEMPTS))
    }

    /// Atomically fetch and delete the record under `id`.
    ///
    /// Returns `None` if the record never existed, was already consumed, or
    /// has expired.
    pub fn consume(&self, id: SecretId) -> Result<Option<StoredRecord>, RelayError> {
        let now_ms = self.env.wall_clock_millis();
        let record = self.storage.take(id, now_ms)?;
        tracing::debug!(%id, found = record.is_some(), "secret consumed");
        Ok(record)
    }

    /// Remove every expired record. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, RelayError> {
        let purged = self.storage.purge_expired(self.env.wall_clock_millis())?;
        if purged > 0 {
            tracing::info!(purged, "expired secrets reclaimed");
        }
        Ok(purged)
    }
}
