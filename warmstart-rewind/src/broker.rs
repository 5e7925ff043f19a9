//! Broker context abstraction.
//!
//! The planner only needs one thing from the broker: translate a wall-clock
//! timestamp into a position, per partition. `SimulatedBroker` answers that
//! question from an in-memory timestamp index with the same semantics as a
//! Kafka `ListOffsets` lookup by timestamp.

#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use warmstart_core::{Offset, StreamPartition, StreamPosition, Timestamp};

use crate::error::{BrokerError, BrokerResult};

/// Per-partition timestamp lookups submitted to the broker.
pub type TimestampLookups = HashMap<StreamPartition, Timestamp>;

/// Per-partition lookup results; `None` means the broker had no answer.
pub type ResolvedPositions = HashMap<StreamPartition, Option<StreamPosition>>;

// -----------------------------------------------------------------------------
// Broker Context Trait
// -----------------------------------------------------------------------------

/// Broker client context used for watermark-based rewinds.
#[async_trait]
pub trait BrokerContext: Send + Sync {
    /// Resolves each timestamp to the earliest position at or after it.
    ///
    /// Lookups are best-effort: a partition may be missing from the result or
    /// mapped to `None` when the broker cannot answer.
    async fn resolve_positions_for_timestamps(
        &self,
        lookups: &TimestampLookups,
    ) -> BrokerResult<ResolvedPositions>;
}

#[async_trait]
impl<T: BrokerContext + ?Sized> BrokerContext for Arc<T> {
    async fn resolve_positions_for_timestamps(
        &self,
        lookups: &TimestampLookups,
    ) -> BrokerResult<ResolvedPositions> {
        (**self).resolve_positions_for_timestamps(lookups).await
    }
}

// -----------------------------------------------------------------------------
// Simulated Broker
// -----------------------------------------------------------------------------

/// In-memory broker with a per-partition timestamp index.
///
/// Clones share state via `Arc`. Every request is recorded so tests can
/// assert which partitions were (or were not) looked up.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBroker {
    /// `(offset, timestamp)` entries per partition, sorted by offset.
    index: Arc<Mutex<HashMap<StreamPartition, Vec<(Offset, Timestamp)>>>>,
    /// Requests received, in order.
    requests: Arc<Mutex<Vec<TimestampLookups>>>,
    /// Remaining number of calls that fail outright.
    fail_next: Arc<AtomicU64>,
}

impl SimulatedBroker {
    /// Creates a broker with an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `offset` on `partition` carries `timestamp`.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn index_record(&self, partition: StreamPartition, offset: Offset, timestamp: Timestamp) {
        let mut index = self.index.lock().expect("index lock poisoned");
        let entries = index.entry(partition).or_default();
        match entries.binary_search_by_key(&offset, |(o, _)| *o) {
            Ok(pos) => entries[pos].1 = timestamp,
            Err(pos) => entries.insert(pos, (offset, timestamp)),
        }
    }

    /// Builder: index a run of records with evenly spaced timestamps.
    #[must_use]
    pub fn with_records(
        self,
        partition: StreamPartition,
        offsets: std::ops::Range<u64>,
        first_timestamp: Timestamp,
        spacing_ms: i64,
    ) -> Self {
        let mut ts = first_timestamp.as_millis();
        for offset in offsets {
            self.index_record(partition, Offset::new(offset), Timestamp::from_millis(ts));
            ts = ts.saturating_add(spacing_ms);
        }
        self
    }

    /// Makes the next `count` calls fail with `Unavailable`.
    pub fn fail_next_calls(&self, count: u64) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Returns every request received so far.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<TimestampLookups> {
        self.requests.lock().expect("requests lock poisoned").clone()
    }

    /// Finds the first indexed entry whose timestamp is at or after `target`.
    fn lookup(&self, partition: StreamPartition, target: Timestamp) -> Option<StreamPosition> {
        let index = self.index.lock().expect("index lock poisoned");
        index
            .get(&partition)?
            .iter()
            .find(|(_, ts)| *ts >= target)
            .map(|(offset, ts)| StreamPosition::new(*offset, *ts))
    }
}

#[async_trait]
impl BrokerContext for SimulatedBroker {
    async fn resolve_positions_for_timestamps(
        &self,
        lookups: &TimestampLookups,
    ) -> BrokerResult<ResolvedPositions> {
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .push(lookups.clone());

        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(BrokerError::Unavailable {
                message: "simulated failure".to_string(),
            });
        }

        Ok(lookups
            .iter()
            .map(|(partition, ts)| (*partition, self.lookup(*partition, *ts)))
            .collect())
    }
}
