//! Chaos property tests for `RelayStorage` implementations
//!
//! These tests verify that storage implementations keep the single-read
//! invariant even when wrapped in `ChaoticStorage`:
//! - A failed insert leaves nothing behind
//! - No record is ever returned by two takes
//! - A take whose response was lost still consumed the record

use std::collections::HashSet;

use proptest::prelude::*;
use sealdrop_core::SecretId;
use sealdrop_server::storage::{
    ChaoticStorage, MemoryStorage, RedbStorage, RelayStorage, StorageError, StoredRecord,
};
use tempfile::tempdir;

fn record(byte: u8) -> StoredRecord {
    StoredRecord { ciphertext: vec![byte; 24], iv: [byte; 12], created_at_ms: 0, expires_at_ms: u64::MAX }
}

fn id(n: u16) -> SecretId {
    let mut bytes = [0u8; 16];
    bytes[..2].copy_from_slice(&n.to_be_bytes());
    SecretId::from_bytes(bytes)
}

/// Insert `count` records through chaos, then drain them through chaos and
/// check every stored record is handed out at most once.
fn check_single_read<S: RelayStorage>(
    storage: &ChaoticStorage<S>,
    count: u16,
) -> Result<(), TestCaseError> {
    let mut stored = HashSet::new();
    for n in 0..count {
        match storage.insert(id(n), &record(n as u8)) {
            Ok(()) => {
                stored.insert(n);
            },
            Err(StorageError::Io(_)) => {},
            Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
        }
    }

    prop_assert_eq!(storage.inner().len().map_err(|e| TestCaseError::fail(e.to_string()))?, stored.len());

    let mut served = HashSet::new();
    for _round in 0..3 {
        for n in 0..count {
            if let Ok(Some(found)) = storage.take(id(n), 0) {
                prop_assert!(stored.contains(&n), "served a record that was never stored");
                prop_assert!(served.insert(n), "record {} served twice", n);
                prop_assert_eq!(found, record(n as u8));
            }
        }
    }

    Ok(())
}

#[test]
fn prop_memory_chaos_single_read() {
    proptest!(|(
        failure_rate in 0.0..0.8,
        seed in any::<u64>(),
        count in 10u16..100,
    )| {
        let storage = ChaoticStorage::with_seed(MemoryStorage::new(), failure_rate, seed);
        check_single_read(&storage, count)?;
    });
}

#[test]
fn prop_memory_chaos_lost_responses_single_read() {
    proptest!(|(
        failure_rate in 0.0..0.8,
        seed in any::<u64>(),
        count in 10u16..100,
    )| {
        let storage =
            ChaoticStorage::with_seed(MemoryStorage::new(), failure_rate, seed).losing_take_responses();
        check_single_read(&storage, count)?;
    });
}

#[test]
fn prop_redb_chaos_single_read() {
    proptest!(ProptestConfig::with_cases(16), |(
        failure_rate in 0.0..0.5,
        seed in any::<u64>(),
        count in 5u16..30,
    )| {
        let dir = tempdir().unwrap();
        let redb = RedbStorage::open(dir.path().join("relay.redb")).unwrap();
        let storage = ChaoticStorage::with_seed(redb, failure_rate, seed);
        check_single_read(&storage, count)?;
    });
}

#[test]
fn lost_take_response_looks_like_not_found_on_retry() {
    let inner = MemoryStorage::new();
    inner.insert(id(1), &record(1)).unwrap();

    let chaotic = ChaoticStorage::new(inner.clone(), 1.0).losing_take_responses();
    assert!(chaotic.take(id(1), 0).is_err());

    // The retry sees nothing: the first attempt already consumed it
    assert_eq!(inner.take(id(1), 0).unwrap(), None);
}
