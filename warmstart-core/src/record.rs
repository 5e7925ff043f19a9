//! Record, offset and timestamp types.
//!
//! A [`StreamRecord`] is what the owning framework hands to a sink: the
//! partition it was read from, its offset within that partition, a broker
//! timestamp, and a Kafka-style key/value/headers payload. Sinks only read
//! records; nothing in warmstart mutates them.

use std::time::Duration;

use bytes::Bytes;

use crate::StreamPartition;

/// A record header (key-value metadata).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Header key.
    pub key: Bytes,
    /// Header value.
    pub value: Bytes,
}

impl Header {
    /// Creates a new header.
    #[must_use]
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Wall-clock timestamp in milliseconds since the Unix epoch.
///
/// Negative values mean "no timestamp", matching the Kafka convention of -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from milliseconds since Unix epoch.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Creates a timestamp representing "no timestamp".
    #[must_use]
    pub const fn none() -> Self {
        Self(-1)
    }

    /// Returns true if this represents "no timestamp".
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 < 0
    }

    /// Returns true if this is a usable, strictly positive timestamp.
    ///
    /// Zero is treated as unset: brokers report it for records that were
    /// never stamped.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Moves the timestamp back by `duration`, clamping at the epoch.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Clamped to i64::MAX first.
    pub fn saturating_sub(self, duration: Duration) -> Self {
        let millis = duration.as_millis().min(i64::MAX as u128) as i64;
        Self(self.0.saturating_sub(millis).max(0))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "{}ms", self.0)
        }
    }
}

/// Offset in a partition log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Offset(u64);

impl Offset {
    /// Creates an offset from a raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw offset value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the next offset.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Moves the offset back by `count` records, clamping at zero.
    #[must_use]
    pub const fn saturating_sub(self, count: u64) -> Self {
        Self(self.0.saturating_sub(count))
    }
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single record delivered to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    /// Partition the record was read from.
    pub partition: StreamPartition,
    /// Offset of the record within its partition.
    pub offset: Offset,
    /// Broker timestamp of the record.
    pub timestamp: Timestamp,
    /// Optional key.
    pub key: Option<Bytes>,
    /// The record value/payload.
    pub value: Bytes,
    /// Optional headers.
    pub headers: Vec<Header>,
}

impl StreamRecord {
    /// Creates a record at `offset` on `partition` with just a value.
    #[must_use]
    pub fn new(partition: StreamPartition, offset: Offset, value: impl Into<Bytes>) -> Self {
        Self {
            partition,
            offset,
            timestamp: Timestamp::none(),
            key: None,
            value: value.into(),
            headers: Vec::new(),
        }
    }

    /// Sets the key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<Bytes>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the timestamp.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        self.headers.push(Header::new(key, value));
        self
    }
}
