//! Reference model of the relay store.
//!
//! A plain list of records with a clock. Operations are applied to both the
//! model and a real [`Relay`](sealdrop_server::Relay), and their results are
//! compared. The model is the oracle: single read, expiry at
//! `created + ttl`, purge removes exactly the expired records.

use std::time::Duration;

use sealdrop_core::wire::ALLOWED_TTL_SECONDS;

/// Lifetime offered to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlChoice {
    /// One hour
    Hour,
    /// One day
    Day,
    /// One week
    Week,
}

impl TtlChoice {
    /// Lifetime as a duration.
    pub fn duration(self) -> Duration {
        let index = match self {
            Self::Hour => 0,
            Self::Day => 1,
            Self::Week => 2,
        };
        Duration::from_secs(ALLOWED_TTL_SECONDS[index])
    }
}

/// Operations on the relay.
///
/// Records are addressed by creation order so generated sequences can refer
/// to them without knowing the ids the relay will draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOp {
    /// Store a record whose ciphertext is filled with `payload`
    Create {
        /// Marker byte identifying the record
        payload: u8,
        /// Lifetime
        ttl: TtlChoice,
    },
    /// Consume the record created `handle % created` -th, or an id never
    /// issued when nothing was created yet
    Consume {
        /// Creation-order handle
        handle: u8,
    },
    /// Move the clock forward
    Advance {
        /// Seconds to advance
        secs: u32,
    },
    /// Run one expiry sweep
    Purge,
}

/// Observable result of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpResult {
    /// Record stored
    Created,
    /// Consume returned this payload, or nothing
    Consumed(Option<u8>),
    /// Sweep removed this many records
    Purged(usize),
    /// Clock moved
    Advanced,
}

#[derive(Debug, Clone)]
struct ModelRecord {
    payload: u8,
    expires_at_ms: u64,
    present: bool,
}

/// The oracle.
#[derive(Debug, Clone)]
pub struct ModelRelay {
    now_ms: u64,
    records: Vec<ModelRecord>,
}

impl ModelRelay {
    /// Empty relay with the clock at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self { now_ms, records: Vec::new() }
    }

    /// Records created so far, consumed or not.
    pub fn created(&self) -> usize {
        self.records.len()
    }

    /// Records still held (consumed and purged ones excluded, expired
    /// but unswept ones included).
    pub fn held(&self) -> usize {
        self.records.iter().filter(|r| r.present).count()
    }

    /// Resolve a consume handle to a creation index.
    pub fn resolve(&self, handle: u8) -> Option<usize> {
        (!self.records.is_empty()).then(|| usize::from(handle) % self.records.len())
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: RelayOp) -> OpResult {
        match op {
            RelayOp::Create { payload, ttl } => {
                let ttl_ms = u64::try_from(ttl.duration().as_millis()).unwrap_or(u64::MAX);
                self.records.push(ModelRecord {
                    payload,
                    expires_at_ms: self.now_ms.saturating_add(ttl_ms),
                    present: true,
                });
                OpResult::Created
            },
            RelayOp::Consume { handle } => {
                let now_ms = self.now_ms;
                let payload = self.resolve(handle).and_then(|index| {
                    let record = &mut self.records[index];
                    let was_present = std::mem::replace(&mut record.present, false);
                    (was_present && now_ms < record.expires_at_ms).then_some(record.payload)
                });
                OpResult::Consumed(payload)
            },
            RelayOp::Advance { secs } => {
                self.now_ms = self.now_ms.saturating_add(u64::from(secs) * 1_000);
                OpResult::Advanced
            },
            RelayOp::Purge => {
                let now_ms = self.now_ms;
                let mut purged = 0;
                for record in self.records.iter_mut().filter(|r| r.present && now_ms >= r.expires_at_ms) {
                    record.present = false;
                    purged += 1;
                }
                OpResult::Purged(purged)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_is_single_read() {
        let mut model = ModelRelay::new(0);
        model.apply(RelayOp::Create { payload: 9, ttl: TtlChoice::Hour });

        assert_eq!(model.apply(RelayOp::Consume { handle: 0 }), OpResult::Consumed(Some(9)));
        assert_eq!(model.apply(RelayOp::Consume { handle: 0 }), OpResult::Consumed(None));
        assert_eq!(model.held(), 0);
    }

    #[test]
    fn expired_records_are_swept_once() {
        let mut model = ModelRelay::new(0);
        model.apply(RelayOp::Create { payload: 1, ttl: TtlChoice::Hour });
        model.apply(RelayOp::Create { payload: 2, ttl: TtlChoice::Week });

        model.apply(RelayOp::Advance { secs: 3_600 });
        assert_eq!(model.apply(RelayOp::Purge), OpResult::Purged(1));
        assert_eq!(model.apply(RelayOp::Purge), OpResult::Purged(0));
        assert_eq!(model.apply(RelayOp::Consume { handle: 1 }), OpResult::Consumed(Some(2)));
    }

    #[test]
    fn consume_without_records_finds_nothing() {
        let mut model = ModelRelay::new(0);
        assert_eq!(model.resolve(3), None);
        assert_eq!(model.apply(RelayOp::Consume { handle: 3 }), OpResult::Consumed(None));
    }
}
