//! Rewind-and-warm-up decorator for per-partition stream sinks.
//!
//! When a consumer restarts, resuming exactly at its committed position
//! leaves any in-memory state built from earlier records (deduplication
//! indexes, caches) cold. [`RewindingSink`] fixes that by starting a little
//! earlier: it moves each partition's start position back by a configured
//! interval, sends the records between the rewound position and the committed
//! one to a touch hook, and only resumes normal writes once a partition
//! reaches where it originally stood.
//!
//! # Overview
//!
//! - **Planner**: rewinds committed positions by record count or by
//!   wall-clock duration. Duration rewinds are translated to offsets by a
//!   [`BrokerContext`]; lookups are best-effort and a miss means no rewind.
//! - **Tracker**: one latch per owned partition, `Rewinding -> CaughtUp`,
//!   plus a global flag once every partition has latched.
//! - **Router**: sends each record to the touch hook (replay) or to the
//!   wrapped sink (live).
//!
//! # Example
//!
//! ```ignore
//! use warmstart_rewind::{PartitionSink, RewindingSink, SimulatedBroker, SimulatedSink};
//! use warmstart_core::StreamInterval;
//!
//! let sink = SimulatedSink::new(42).with_partition(p0, Some(committed));
//! let mut rewinding = RewindingSink::new(
//!     sink,
//!     SimulatedBroker::new(),
//!     |record: &StreamRecord| dedup_index.insert(record.key.clone()),
//!     StreamInterval::OffsetRange(1000),
//! );
//!
//! // Start consuming from the rewound positions.
//! let start = rewinding.initialize().await?;
//!
//! // Replayed records warm the index; live records are written.
//! rewinding.write(record).await?;
//! ```
//!
//! # Concurrency
//!
//! A `RewindingSink` is driven by one owner. `initialize` and `write` take
//! `&mut self`, so no locking is needed. Run one instance per partition
//! group; instances share nothing.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Allow these for cleaner code in this crate.
#![allow(clippy::module_name_repetitions)]

mod broker;
mod config;
mod error;
pub mod planner;
mod rewinding;
mod router;
mod sink;
mod touch;
mod tracker;

// Re-export public API.
pub use broker::{BrokerContext, ResolvedPositions, SimulatedBroker, TimestampLookups};
pub use config::{IntervalConfig, RewindConfig};
pub use error::{BrokerError, BrokerResult, ConfigError, SinkError, SinkResult};
pub use planner::EffectiveOffsets;
pub use rewinding::{RewindStats, RewindingSink};
pub use router::{RecordRouter, Route};
pub use sink::{PartitionSink, SimulatedSink, SinkFaultConfig};
pub use touch::{RecordingTouch, TouchHook};
pub use tracker::{CatchUpState, CatchUpTracker, Latch};
