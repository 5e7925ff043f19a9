//! Catch-up tracking.
//!
//! Each owned partition starts `Rewinding` and latches to `CaughtUp` the
//! first time a live record shows up on it. The latch never reopens, even if
//! the broker later redelivers smaller offsets. Once every owned partition
//! has latched, the whole tracker is caught up and stays that way.

use std::collections::HashMap;

use warmstart_core::StreamPartition;

/// Catch-up state of one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchUpState {
    /// Still replaying records below the committed offset.
    Rewinding,
    /// Reached the committed offset; all records are live. Terminal.
    CaughtUp,
}

/// Outcome of latching a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Latch {
    /// The partition was already caught up; nothing changed.
    Unchanged,
    /// The partition flipped; others are still rewinding.
    Partition,
    /// The partition flipped and it was the last one rewinding.
    All,
}

/// Per-partition catch-up latches plus the global aggregate.
#[derive(Debug, Clone)]
pub struct CatchUpTracker {
    /// Latch per partition. Unowned partitions are added as `CaughtUp`.
    states: HashMap<StreamPartition, CatchUpState>,
    /// Number of owned partitions still `Rewinding`.
    rewinding: usize,
    /// Global flag. Monotonic.
    caught_up: bool,
}

impl CatchUpTracker {
    /// Creates a tracker with every owned partition rewinding.
    ///
    /// An empty owned set is caught up from the start.
    #[must_use]
    pub fn rewinding<I>(owned: I) -> Self
    where
        I: IntoIterator<Item = StreamPartition>,
    {
        let states: HashMap<_, _> = owned
            .into_iter()
            .map(|partition| (partition, CatchUpState::Rewinding))
            .collect();
        let rewinding = states.len();

        Self {
            states,
            rewinding,
            caught_up: rewinding == 0,
        }
    }

    /// Creates a tracker that is caught up with no per-partition state.
    #[must_use]
    pub fn caught_up() -> Self {
        Self {
            states: HashMap::new(),
            rewinding: 0,
            caught_up: true,
        }
    }

    /// Returns true once every owned partition has latched.
    #[must_use]
    pub const fn is_caught_up(&self) -> bool {
        self.caught_up
    }

    /// Returns true if records on `partition` are live.
    #[must_use]
    pub fn is_partition_caught_up(&self, partition: StreamPartition) -> bool {
        self.caught_up || self.states.get(&partition) == Some(&CatchUpState::CaughtUp)
    }

    /// Returns the latch state of `partition`, if it is tracked.
    #[must_use]
    pub fn state(&self, partition: StreamPartition) -> Option<CatchUpState> {
        self.states.get(&partition).copied()
    }

    /// Returns the number of owned partitions still rewinding.
    #[must_use]
    pub const fn rewinding_count(&self) -> usize {
        self.rewinding
    }

    /// Latches `partition` to `CaughtUp`.
    ///
    /// A partition that was never owned is recorded as caught up without
    /// affecting the global flag.
    pub fn mark_caught_up(&mut self, partition: StreamPartition) -> Latch {
        let state = self
            .states
            .entry(partition)
            .or_insert(CatchUpState::CaughtUp);
        if *state == CatchUpState::CaughtUp {
            return Latch::Unchanged;
        }

        *state = CatchUpState::CaughtUp;
        debug_assert!(self.rewinding > 0, "rewinding count underflow");
        self.rewinding = self.rewinding.saturating_sub(1);

        if self.rewinding == 0 {
            self.caught_up = true;
            Latch::All
        } else {
            Latch::Partition
        }
    }
}
