//! Storage abstraction for the relay.
//!
//! Trait-based abstraction for persisting ciphertext records. The trait is
//! synchronous (no async) to keep the single-read primitive a plain function
//! call that each backend implements atomically.

mod chaotic;
mod error;
mod memory;
mod redb;

pub use chaotic::ChaoticStorage;
pub use error::StorageError;
pub use memory::MemoryStorage;
use sealdrop_core::SecretId;
use sealdrop_crypto::{NONCE_SIZE, Nonce};
use serde::{Deserialize, Serialize};

pub use self::redb::RedbStorage;

/// A stored ciphertext blob.
///
/// Contains nothing that can decrypt it: the key material stays in the share
/// link fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Ciphertext with GCM tag
    pub ciphertext: Vec<u8>,
    /// Data nonce
    pub iv: [u8; NONCE_SIZE],
    /// Unix milliseconds at creation
    pub created_at_ms: u64,
    /// Unix milliseconds after which the record is gone
    pub expires_at_ms: u64,
}

impl StoredRecord {
    /// Data nonce as a typed value.
    pub fn nonce(&self) -> Nonce {
        Nonce::from_bytes(self.iv)
    }

    /// Returns true if the record is past its expiry at `now_ms`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Storage abstraction for relay records.
///
/// Must be Clone (shared between request handlers and the reaper), Send +
/// Sync (thread-safe), and synchronous (no async methods). Implementations
/// share internal state via Arc, so clones access the same underlying
/// storage.
///
/// `insert`, `take` and `purge_expired` are the only write paths. There is no
/// read-without-delete operation.
pub trait RelayStorage: Clone + Send + Sync + 'static {
    /// Persist a new record under `id`.
    ///
    /// # Errors
    ///
    /// - `Conflict` if a record already exists under `id`
    fn insert(&self, id: SecretId, record: &StoredRecord) -> Result<(), StorageError>;

    /// Atomically remove and return the record under `id`.
    ///
    /// # Invariants
    ///
    /// - Of any number of concurrent calls for the same `id`, at most one
    ///   returns `Some`
    /// - An expired record is removed and reported as `None`
    fn take(&self, id: SecretId, now_ms: u64) -> Result<Option<StoredRecord>, StorageError>;

    /// Remove every record expired at `now_ms`. Returns how many were removed.
    fn purge_expired(&self, now_ms: u64) -> Result<usize, StorageError>;

    /// Number of records currently held, expired or not.
    fn len(&self) -> Result<usize, StorageError>;

    /// Returns true if no records are held.
    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}
