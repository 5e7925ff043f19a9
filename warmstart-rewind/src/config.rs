//! Rewind configuration.
//!
//! The only setting is the rewind interval. It can be given as a TOML file:
//!
//! ```toml
//! [interval]
//! kind = "watermark"
//! duration_ms = 300000
//! ```
//!
//! or in compact form on the command line (`none`, `offset:<n>`,
//! `watermark:<ms>`), see [`StreamInterval`]'s `FromStr` impl.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use warmstart_core::StreamInterval;

use crate::error::ConfigError;

/// Serializable form of [`StreamInterval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntervalConfig {
    /// No rewind.
    #[default]
    None,
    /// Rewind by a number of records.
    Offset {
        /// Records to rewind per partition.
        records: u64,
    },
    /// Rewind by wall-clock time.
    Watermark {
        /// Milliseconds to rewind per partition.
        duration_ms: u64,
    },
}

impl From<IntervalConfig> for StreamInterval {
    fn from(config: IntervalConfig) -> Self {
        match config {
            IntervalConfig::None => Self::Zero,
            IntervalConfig::Offset { records } => Self::OffsetRange(records),
            IntervalConfig::Watermark { duration_ms } => {
                Self::WatermarkRange(Duration::from_millis(duration_ms))
            }
        }
    }
}

impl From<StreamInterval> for IntervalConfig {
    #[allow(clippy::cast_possible_truncation)] // u64 millis covers 584 million years.
    fn from(interval: StreamInterval) -> Self {
        match interval {
            StreamInterval::Zero => Self::None,
            StreamInterval::OffsetRange(records) => Self::Offset { records },
            StreamInterval::WatermarkRange(duration) => Self::Watermark {
                duration_ms: duration.as_millis().min(u128::from(u64::MAX)) as u64,
            },
        }
    }
}

/// Configuration for a rewinding sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RewindConfig {
    /// How far to rewind on startup.
    pub interval: IntervalConfig,
}

impl RewindConfig {
    /// Creates a config for `interval`.
    #[must_use]
    pub fn new(interval: StreamInterval) -> Self {
        Self {
            interval: interval.into(),
        }
    }

    /// Returns the configured interval.
    #[must_use]
    pub fn stream_interval(&self) -> StreamInterval {
        self.interval.into()
    }

    /// Load a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Serialize the config to a TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
