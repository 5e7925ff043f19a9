//! Warmstart Core - positions, intervals and records shared by the warmstart crates.
//!
//! This crate holds plain data only. The rewind planner, catch-up tracking
//! and record routing live in `warmstart-rewind`.
//!
//! # Design Principles
//!
//! - **Strongly-typed IDs**: A `TopicId` can't be passed where a `PartitionId` is expected
//! - **Immutable positions**: `StreamPosition` is `Copy` and never mutated in place
//! - **Explicit types**: Offsets are u64, timestamps are i64 milliseconds
//! - **No unsafe code**

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod position;
mod record;
mod types;

pub use error::Error;
pub use position::{OriginalOffsets, StreamInterval, StreamPosition};
pub use record::{Header, Offset, StreamRecord, Timestamp};
pub use types::{PartitionId, StreamPartition, TopicId};
