//! Fuzz target for relay storage under injected failures
//!
//! # Strategy
//!
//! - Variable failure rates (0% to 90%), optionally losing take responses
//! - Arbitrary interleaving of inserts, takes and purges on a small id space
//!
//! # Invariants
//!
//! - NEVER panic on storage errors
//! - No record is returned by two takes
//! - A take never returns a record that was not inserted successfully
//! - Failures surface as `StorageError::Io`, conflicts as `Conflict`

#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealdrop_core::SecretId;
use sealdrop_server::storage::{
    ChaoticStorage, MemoryStorage, RelayStorage, StorageError, StoredRecord,
};

#[derive(Debug, Arbitrary)]
struct ChaosScenario {
    chaos_seed: u64,
    failure_rate_tenth: u8,
    lose_take_responses: bool,
    operations: Vec<ChaosOperation>,
}

#[derive(Debug, Arbitrary)]
enum ChaosOperation {
    Insert { slot: u8, expires_at_ms: u16 },
    Take { slot: u8, now_ms: u16 },
    Purge { now_ms: u16 },
}

fn id(slot: u8) -> SecretId {
    SecretId::from_bytes([slot % 16; 16])
}

fuzz_target!(|scenario: ChaosScenario| {
    let failure_rate = f64::from(scenario.failure_rate_tenth % 10) / 10.0;
    let mut storage =
        ChaoticStorage::with_seed(MemoryStorage::new(), failure_rate, scenario.chaos_seed);
    if scenario.lose_take_responses {
        storage = storage.losing_take_responses();
    }

    let mut inserted: HashSet<SecretId> = HashSet::new();
    let mut served: HashSet<SecretId> = HashSet::new();

    for op in scenario.operations {
        match op {
            ChaosOperation::Insert { slot, expires_at_ms } => {
                let record = StoredRecord {
                    ciphertext: vec![slot; 16],
                    iv: [slot; 12],
                    created_at_ms: 0,
                    expires_at_ms: u64::from(expires_at_ms),
                };
                match storage.insert(id(slot), &record) {
                    Ok(()) => {
                        inserted.insert(id(slot));
                        // A fresh insert under a served id is a new record
                        served.remove(&id(slot));
                    }
                    Err(StorageError::Io(_) | StorageError::Conflict { .. }) => {}
                    Err(other) => panic!("unexpected insert error: {other}"),
                }
            }
            ChaosOperation::Take { slot, now_ms } => match storage.take(id(slot), u64::from(now_ms)) {
                Ok(Some(record)) => {
                    assert!(inserted.contains(&id(slot)), "served a record never inserted");
                    assert!(served.insert(id(slot)), "record served twice");
                    assert_eq!(record.ciphertext.len(), 16);
                }
                Ok(None) => {}
                Err(StorageError::Io(_)) => {}
                Err(other) => panic!("unexpected take error: {other}"),
            },
            ChaosOperation::Purge { now_ms } => match storage.purge_expired(u64::from(now_ms)) {
                Ok(_) | Err(StorageError::Io(_)) => {}
                Err(other) => panic!("unexpected purge error: {other}"),
            },
        }
    }
});
