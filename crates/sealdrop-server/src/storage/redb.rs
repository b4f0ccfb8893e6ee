//! Redb-backed durable storage implementation.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. Every
//! operation is one write transaction, so `take` (remove + return) is atomic
//! with respect to every other writer. Records survive server restarts; expiry
//! is an absolute wall-clock instant, so a restarted relay still honors it.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use sealdrop_core::SecretId;

use super::{RelayStorage, StorageError, StoredRecord};

/// Table: records
/// Key: secret id [16 bytes]
/// Value: CBOR-encoded StoredRecord
const RECORDS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("records");

/// Table: expiry
/// Key: (expires_at_ms: u64 BE, id: 16 bytes) [24 bytes]
/// Value: empty
///
/// Ordered by expiry so purging is a prefix range scan.
const EXPIRY: TableDefinition<&[u8], &[u8]> = TableDefinition::new("expiry");

/// Durable storage backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates tables if they don't exist (RECORDS, EXPIRY).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        let txn = db.begin_write().map_err(io_err)?;
        {
            let _ = txn.open_table(RECORDS).map_err(io_err)?;
            let _ = txn.open_table(EXPIRY).map_err(io_err)?;
        }
        txn.commit().map_err(io_err)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl RelayStorage for RedbStorage {
    fn insert(&self, id: SecretId, record: &StoredRecord) -> Result<(), StorageError> {
        let mut bytes = Vec::with_capacity(record.ciphertext.len() + 64);
        ciborium::into_writer(record, &mut bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut records = txn.open_table(RECORDS).map_err(io_err)?;

            if records.get(id.as_bytes().as_slice()).map_err(io_err)?.is_some() {
                return Err(StorageError::Conflict { id: id.to_string() });
            }

            records.insert(id.as_bytes().as_slice(), bytes.as_slice()).map_err(io_err)?;

            let mut expiry = txn.open_table(EXPIRY).map_err(io_err)?;
            let key = encode_expiry_key(record.expires_at_ms, id);
            expiry.insert(key.as_slice(), b"".as_slice()).map_err(io_err)?;
        }
        txn.commit().map_err(io_err)?;

        Ok(())
    }

    fn take(&self, id: SecretId, now_ms: u64) -> Result<Option<StoredRecord>, StorageError> {
        let txn = self.db.begin_write().map_err(io_err)?;
        let removed = {
            let mut records = txn.open_table(RECORDS).map_err(io_err)?;
            let bytes = records
                .remove(id.as_bytes().as_slice())
                .map_err(io_err)?
                .map(|value| value.value().to_vec());

            match bytes {
                Some(bytes) => {
                    let record: StoredRecord = ciborium::from_reader(bytes.as_slice())
                        .map_err(|e| StorageError::Serialization(e.to_string()))?;

                    let mut expiry = txn.open_table(EXPIRY).map_err(io_err)?;
                    let key = encode_expiry_key(record.expires_at_ms, id);
                    expiry.remove(key.as_slice()).map_err(io_err)?;

                    Some(record)
                },
                None => None,
            }
        };
        txn.commit().map_err(io_err)?;

        Ok(removed.filter(|record| !record.is_expired(now_ms)))
    }

    fn purge_expired(&self, now_ms: u64) -> Result<usize, StorageError> {
        let txn = self.db.begin_write().map_err(io_err)?;
        let purged = {
            let mut expiry = txn.open_table(EXPIRY).map_err(io_err)?;

            // Every key with expires_at_ms <= now_ms
            let end = encode_expiry_key_bound(now_ms);
            let mut due = Vec::new();
            for entry in expiry.range(..=end.as_slice()).map_err(io_err)? {
                let (key, _) = entry.map_err(io_err)?;
                due.push(key.value().to_vec());
            }

            let mut records = txn.open_table(RECORDS).map_err(io_err)?;
            let mut purged = 0;
            for key in &due {
                expiry.remove(key.as_slice()).map_err(io_err)?;
                let id = &key[8..];
                if records.remove(id).map_err(io_err)?.is_some() {
                    purged += 1;
                }
            }
            purged
        };
        txn.commit().map_err(io_err)?;

        Ok(purged)
    }

    fn len(&self) -> Result<usize, StorageError> {
        let txn = self.db.begin_read().map_err(io_err)?;
        let records = txn.open_table(RECORDS).map_err(io_err)?;
        let len = records.len().map_err(io_err)?;
        usize::try_from(len).map_err(|e| StorageError::Io(e.to_string()))
    }
}

fn io_err(err: impl std::fmt::Display) -> StorageError {
    StorageError::Io(err.to_string())
}

/// Encode (expires_at_ms, id) as a 24-byte big-endian key.
///
/// Layout: [expires_at_ms: 8 bytes BE][id: 16 bytes]
/// Lexicographic ordering matches expiry ordering.
fn encode_expiry_key(expires_at_ms: u64, id: SecretId) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..8].copy_from_slice(&expires_at_ms.to_be_bytes());
    key[8..].copy_from_slice(id.as_bytes());
    key
}

/// Largest possible expiry key at `expires_at_ms`.
fn encode_expiry_key_bound(expires_at_ms: u64) -> [u8; 24] {
    encode_expiry_key(expires_at_ms, SecretId::from_bytes([0xFF; 16]))
}
