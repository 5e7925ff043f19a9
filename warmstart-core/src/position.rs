//! Committed positions and rewind intervals.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;
use crate::record::{Offset, Timestamp};
use crate::StreamPartition;

/// Per-partition starting positions as reported by a sink.
///
/// `None` marks a fresh partition with no prior commit.
pub type OriginalOffsets = HashMap<StreamPartition, Option<StreamPosition>>;

/// A committed read position for one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamPosition {
    /// Next offset to read.
    pub offset: Offset,
    /// Event-time watermark at that offset.
    pub watermark: Timestamp,
}

impl StreamPosition {
    /// Creates a new position.
    #[must_use]
    pub const fn new(offset: Offset, watermark: Timestamp) -> Self {
        Self { offset, watermark }
    }
}

impl fmt::Display for StreamPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(offset={}, watermark={})", self.offset, self.watermark)
    }
}

/// How far a consumer rewinds before resuming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamInterval {
    /// No rewind; start exactly at the committed position.
    #[default]
    Zero,
    /// Rewind by a number of records.
    OffsetRange(u64),
    /// Rewind by wall-clock time, resolved to offsets through the broker.
    WatermarkRange(Duration),
}

impl StreamInterval {
    /// Returns true if this interval performs no rewind.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        matches!(self, Self::Zero)
    }
}

impl fmt::Display for StreamInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "none"),
            Self::OffsetRange(count) => write!(f, "offset:{count}"),
            Self::WatermarkRange(duration) => write!(f, "watermark:{}", duration.as_millis()),
        }
    }
}

impl FromStr for StreamInterval {
    type Err = Error;

    /// Parses `none`, `offset:<records>` or `watermark:<millis>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = |reason| Error::Parse {
            what: "stream interval",
            input: s.to_string(),
            reason,
        };

        let s = s.trim();
        if s.eq_ignore_ascii_case("none") || s == "0" {
            return Ok(Self::Zero);
        }

        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| parse_err("expected 'none', 'offset:<n>' or 'watermark:<ms>'"))?;

        match kind {
            "offset" => value
                .parse::<u64>()
                .map(Self::OffsetRange)
                .map_err(|_| parse_err("record count must be an unsigned integer")),
            "watermark" => value
                .trim_end_matches("ms")
                .parse::<u64>()
                .map(|ms| Self::WatermarkRange(Duration::from_millis(ms)))
                .map_err(|_| parse_err("duration must be whole milliseconds")),
            _ => Err(parse_err("unknown interval kind")),
        }
    }
}
