//! Partition sink abstraction.
//!
//! Provides the `PartitionSink` trait that the rewinding decorator wraps and
//! exposes, and `SimulatedSink` for deterministic testing.

#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use warmstart_core::{OriginalOffsets, StreamPartition, StreamPosition, StreamRecord};

use crate::error::{SinkError, SinkResult};

// -----------------------------------------------------------------------------
// Partition Sink Trait
// -----------------------------------------------------------------------------

/// A per-partition stream sink.
///
/// The owning framework calls `initialize` once to learn where to start
/// consuming, then feeds every record through `write` in partition order.
/// Calls are strictly sequential, hence `&mut self`.
#[async_trait]
pub trait PartitionSink: Send {
    /// Returns the starting position for every owned partition.
    ///
    /// A `None` entry marks a partition with no prior commit.
    async fn initialize(&mut self) -> SinkResult<OriginalOffsets>;

    /// Durably writes one record.
    async fn write(&mut self, record: StreamRecord) -> SinkResult<()>;

    /// Flushes buffered writes and commits positions.
    async fn flush(&mut self) -> SinkResult<()> {
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Fault Configuration
// -----------------------------------------------------------------------------

/// Fault configuration for the simulated sink.
#[derive(Debug, Clone, Default)]
pub struct SinkFaultConfig {
    /// Probability of write operations failing (0.0 - 1.0).
    pub write_fail_rate: f64,
    /// Force next initialize to fail (one-shot).
    pub force_init_fail: bool,
    /// Force next write to fail (one-shot).
    pub force_write_fail: bool,
}

impl SinkFaultConfig {
    /// No faults (all operations succeed).
    #[must_use]
    pub const fn none() -> Self {
        Self {
            write_fail_rate: 0.0,
            force_init_fail: false,
            force_write_fail: false,
        }
    }

    /// Builder: set write fail rate.
    #[must_use]
    pub const fn with_write_fail_rate(mut self, rate: f64) -> Self {
        self.write_fail_rate = rate;
        self
    }
}

// -----------------------------------------------------------------------------
// Simulated Sink
// -----------------------------------------------------------------------------

/// In-memory sink for tests and simulation.
///
/// Clones share state via `Arc`, so a test can keep a handle after moving
/// one clone into a decorator. `flush` commits the position after the last
/// written record of each partition, which lets a test restart a consumer
/// against the same sink.
#[derive(Debug, Clone)]
pub struct SimulatedSink {
    /// Committed positions handed out by `initialize`.
    committed: Arc<Mutex<OriginalOffsets>>,
    /// Records accepted by `write`, in arrival order.
    written: Arc<Mutex<Vec<StreamRecord>>>,
    /// Fault configuration.
    fault_config: Arc<Mutex<SinkFaultConfig>>,
    /// RNG seed for deterministic faults.
    seed: u64,
    /// Operation counter for deterministic RNG.
    counter: Arc<AtomicU64>,
}

impl SimulatedSink {
    /// Creates an empty sink with no owned partitions and no faults.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_faults(seed, SinkFaultConfig::none())
    }

    /// Creates an empty sink with fault injection.
    #[must_use]
    pub fn with_faults(seed: u64, config: SinkFaultConfig) -> Self {
        Self {
            committed: Arc::new(Mutex::new(HashMap::new())),
            written: Arc::new(Mutex::new(Vec::new())),
            fault_config: Arc::new(Mutex::new(config)),
            seed,
            counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Builder: assign a partition with the given committed position.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn with_partition(
        self,
        partition: StreamPartition,
        position: Option<StreamPosition>,
    ) -> Self {
        self.committed
            .lock()
            .expect("committed lock poisoned")
            .insert(partition, position);
        self
    }

    /// Returns fault config for modification.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn fault_config(&self) -> std::sync::MutexGuard<'_, SinkFaultConfig> {
        self.fault_config.lock().expect("fault config lock poisoned")
    }

    /// Returns every record written so far.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn written(&self) -> Vec<StreamRecord> {
        self.written.lock().expect("written lock poisoned").clone()
    }

    /// Returns the raw offsets written to one partition, in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn written_offsets(&self, partition: StreamPartition) -> Vec<u64> {
        self.written
            .lock()
            .expect("written lock poisoned")
            .iter()
            .filter(|r| r.partition == partition)
            .map(|r| r.offset.get())
            .collect()
    }

    /// Returns the currently committed position of a partition.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn committed(&self, partition: StreamPartition) -> Option<StreamPosition> {
        self.committed
            .lock()
            .expect("committed lock poisoned")
            .get(&partition)
            .copied()
            .flatten()
    }

    /// Deterministic RNG: `(seed + counter) * M` normalized to [0, 1).
    fn should_inject_fault(&self, rate: f64) -> bool {
        if rate <= 0.0 {
            return false;
        }
        if rate >= 1.0 {
            return true;
        }
        let counter = self.counter.fetch_add(1, Ordering::Relaxed);
        let hash = self
            .seed
            .wrapping_add(counter)
            .wrapping_mul(0x9e37_79b9_7f4a_7c15);
        #[allow(clippy::cast_precision_loss)]
        let normalized = (hash as f64) / (u64::MAX as f64);
        normalized < rate
    }
}

#[async_trait]
impl PartitionSink for SimulatedSink {
    async fn initialize(&mut self) -> SinkResult<OriginalOffsets> {
        {
            let mut faults = self.fault_config();
            if faults.force_init_fail {
                faults.force_init_fail = false;
                return Err(SinkError::Io {
                    operation: "initialize",
                    message: "simulated failure".to_string(),
                });
            }
        }

        Ok(self.committed.lock().expect("committed lock poisoned").clone())
    }

    async fn write(&mut self, record: StreamRecord) -> SinkResult<()> {
        let rate = {
            let mut faults = self.fault_config();
            if faults.force_write_fail {
                faults.force_write_fail = false;
                return Err(SinkError::Io {
                    operation: "write",
                    message: "simulated failure".to_string(),
                });
            }
            faults.write_fail_rate
        };

        if self.should_inject_fault(rate) {
            return Err(SinkError::Io {
                operation: "write",
                message: "simulated random failure".to_string(),
            });
        }

        self.written.lock().expect("written lock poisoned").push(record);
        Ok(())
    }

    async fn flush(&mut self) -> SinkResult<()> {
        let written = self.written.lock().expect("written lock poisoned");
        let mut committed = self.committed.lock().expect("committed lock poisoned");

        for record in written.iter() {
            let next = StreamPosition::new(record.offset.next(), record.timestamp);
            let slot = committed.entry(record.partition).or_insert(None);
            if slot.map_or(true, |pos| pos.offset < next.offset) {
                *slot = Some(next);
            }
        }
        Ok(())
    }
}
