//! Rewind error types.
//!
//! Sink errors pass through the rewinding decorator untouched. Broker errors
//! never leave the planner: a failed lookup degrades to "no rewind" for the
//! affected partitions.

use thiserror::Error;
use warmstart_core::{Offset, StreamPartition};

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Result type for broker lookups.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Errors raised by a partition sink.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// I/O error in the underlying sink.
    #[error("I/O error: {operation}: {message}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// Error message.
        message: String,
    },

    /// The sink rejected a record.
    #[error("record {partition}@{offset} rejected: {reason}")]
    Rejected {
        /// Partition of the rejected record.
        partition: StreamPartition,
        /// Offset of the rejected record.
        offset: Offset,
        /// Why it was rejected.
        reason: String,
    },

    /// The sink is closed.
    #[error("sink is closed")]
    Closed,

    /// A record arrived before `initialize` completed.
    #[error("sink used before initialize")]
    NotInitialized,

    /// `initialize` was called a second time.
    #[error("sink already initialized")]
    AlreadyInitialized,
}

/// Errors raised by a broker time-to-offset lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// The broker could not be reached or refused the request.
    #[error("broker unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },

    /// The lookup timed out on the client side.
    #[error("broker lookup timed out after {waited_ms}ms")]
    Timeout {
        /// How long the client waited.
        waited_ms: u64,
    },
}

/// Errors raised while loading rewind configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the config file.
    #[error("failed to read config from {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Parse error in TOML.
    #[error("failed to parse config: {message}")]
    Parse {
        /// Error message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use warmstart_core::{PartitionId, TopicId};

    #[test]
    fn test_error_display() {
        let err = SinkError::Rejected {
            partition: StreamPartition::new(TopicId::new(1), PartitionId::new(2)),
            offset: Offset::new(99),
            reason: "payload too large".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("topic-1/partition-2@99"));
        assert!(msg.contains("payload too large"));

        let err = BrokerError::Timeout { waited_ms: 5000 };
        assert!(err.to_string().contains("5000ms"));
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(SinkError::Closed, SinkError::Closed);
        assert_ne!(SinkError::Closed, SinkError::NotInitialized);
    }
}
