//! Per-record routing between the touch hook and the live write path.

use tracing::{debug, info, trace};
use warmstart_core::{OriginalOffsets, StreamInterval, StreamRecord};

use crate::tracker::{CatchUpTracker, Latch};

/// Where a record goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Replay: hand to the touch hook, do not write.
    Touch,
    /// Live: write through to the wrapped sink.
    Forward,
}

/// Classifies records against the committed-position snapshot.
///
/// The snapshot is taken once and never updated; all comparisons are
/// against where each partition stood before the rewind.
#[derive(Debug, Clone)]
pub struct RecordRouter {
    original: OriginalOffsets,
    tracker: CatchUpTracker,
}

impl RecordRouter {
    /// Creates a router for the given snapshot.
    ///
    /// With a zero interval nothing is replayed, so the router starts
    /// caught up.
    #[must_use]
    pub fn new(original: OriginalOffsets, interval: StreamInterval) -> Self {
        let tracker = if interval.is_zero() {
            CatchUpTracker::caught_up()
        } else {
            CatchUpTracker::rewinding(original.keys().copied())
        };
        Self { original, tracker }
    }

    /// Returns the committed-position snapshot.
    #[must_use]
    pub const fn original(&self) -> &OriginalOffsets {
        &self.original
    }

    /// Returns the catch-up tracker.
    #[must_use]
    pub const fn tracker(&self) -> &CatchUpTracker {
        &self.tracker
    }

    /// Routes one record, latching its partition if it is the first live one.
    pub fn route(&mut self, record: &StreamRecord) -> Route {
        let partition = record.partition;
        if self.tracker.is_partition_caught_up(partition) {
            return Route::Forward;
        }

        if let Some(Some(committed)) = self.original.get(&partition) {
            if record.offset < committed.offset {
                trace!(
                    partition = %partition,
                    offset = record.offset.get(),
                    committed = committed.offset.get(),
                    "Replaying record"
                );
                return Route::Touch;
            }
        }

        match self.tracker.mark_caught_up(partition) {
            Latch::Unchanged => {}
            Latch::Partition => {
                debug!(
                    partition = %partition,
                    offset = record.offset.get(),
                    remaining = self.tracker.rewinding_count(),
                    "Partition caught up"
                );
            }
            Latch::All => {
                info!(
                    partition = %partition,
                    offset = record.offset.get(),
                    "All partitions caught up, rewind complete"
                );
            }
        }
        Route::Forward
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use warmstart_core::{
        Offset, PartitionId, StreamPartition, StreamPosition, Timestamp, TopicId,
    };

    fn p(n: u64) -> StreamPartition {
        StreamPartition::new(TopicId::new(1), PartitionId::new(n))
    }

    fn record(partition: StreamPartition, offset: u64) -> StreamRecord {
        StreamRecord::new(partition, Offset::new(offset), "v")
    }

    fn committed(offset: u64) -> Option<StreamPosition> {
        Some(StreamPosition::new(Offset::new(offset), Timestamp::from_millis(1000)))
    }

    #[test]
    fn test_zero_interval_forwards_everything() {
        let original = HashMap::from([(p(0), committed(100))]);
        let mut router = RecordRouter::new(original, StreamInterval::Zero);

        assert!(router.tracker().is_caught_up());
        assert_eq!(router.route(&record(p(0), 0)), Route::Forward);
        assert_eq!(router.route(&record(p(0), 99)), Route::Forward);
    }

    #[test]
    fn test_replay_below_committed_offset() {
        let original = HashMap::from([(p(0), committed(100))]);
        let mut router = RecordRouter::new(original, StreamInterval::OffsetRange(50));

        assert_eq!(router.route(&record(p(0), 50)), Route::Touch);
        assert_eq!(router.route(&record(p(0), 99)), Route::Touch);
        assert!(!router.tracker().is_caught_up());

        assert_eq!(router.route(&record(p(0), 100)), Route::Forward);
        assert!(router.tracker().is_caught_up());
    }

    #[test]
    fn test_latch_survives_out_of_order_redelivery() {
        let original = HashMap::from([(p(0), committed(100)), (p(1), committed(10))]);
        let mut router = RecordRouter::new(original, StreamInterval::OffsetRange(50));

        assert_eq!(router.route(&record(p(0), 101)), Route::Forward);
        // Redelivered older record on a latched partition is still live.
        assert_eq!(router.route(&record(p(0), 60)), Route::Forward);
        // The other partition is unaffected.
        assert_eq!(router.route(&record(p(1), 5)), Route::Touch);
    }

    #[test]
    fn test_fresh_partition_latches_on_first_record() {
        let original = HashMap::from([(p(0), committed(100)), (p(1), None)]);
        let mut router = RecordRouter::new(original, StreamInterval::OffsetRange(50));

        assert_eq!(router.route(&record(p(1), 0)), Route::Forward);
        assert!(router.tracker().is_partition_caught_up(p(1)));
        assert!(!router.tracker().is_caught_up());
    }

    #[test]
    fn test_unowned_partition_is_forwarded() {
        let original = HashMap::from([(p(0), committed(100))]);
        let mut router = RecordRouter::new(original, StreamInterval::OffsetRange(50));

        assert_eq!(router.route(&record(p(7), 3)), Route::Forward);
        assert_eq!(router.tracker().rewinding_count(), 1);
    }

    #[test]
    fn test_snapshot_is_not_mutated() {
        let original = HashMap::from([(p(0), committed(100))]);
        let mut router = RecordRouter::new(original.clone(), StreamInterval::OffsetRange(50));

        let _ = router.route(&record(p(0), 120));
        assert_eq!(router.original(), &original);
    }
}
