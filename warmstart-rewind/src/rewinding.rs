//! Rewinding sink decorator.
//!
//! `RewindingSink` wraps another [`PartitionSink`] and exposes the same
//! contract. On `initialize` it rewinds the wrapped sink's committed
//! positions; on `write` it replays records below those positions through a
//! touch hook and forwards everything else.
//!
//! # Lifecycle
//!
//! 1. `initialize` calls the wrapped sink, snapshots its positions, plans the
//!    rewind, and returns the rewound positions to the framework.
//! 2. `write` routes each record. Replayed records are touched, never
//!    written; they were already written by a previous run.
//! 3. Once every owned partition has seen a live record the decorator is a
//!    pass-through.
//!
//! Errors from the wrapped sink are returned unchanged. Broker failures only
//! shrink the rewind; they never fail `initialize`.

use async_trait::async_trait;
use tracing::debug;
use warmstart_core::{OriginalOffsets, StreamInterval, StreamPartition, StreamRecord};

use crate::broker::BrokerContext;
use crate::error::{SinkError, SinkResult};
use crate::planner::{self, EffectiveOffsets};
use crate::router::{RecordRouter, Route};
use crate::sink::PartitionSink;
use crate::touch::TouchHook;

/// Counters describing what the decorator did with incoming records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewindStats {
    /// Records handed to the touch hook.
    pub touched: u64,
    /// Records the wrapped sink accepted.
    pub forwarded: u64,
}

/// Decorator that rewinds and warms up a partition sink.
pub struct RewindingSink<S, B, T> {
    inner: S,
    broker: B,
    touch: T,
    interval: StreamInterval,
    /// Set by `initialize`.
    router: Option<RecordRouter>,
    stats: RewindStats,
}

impl<S, B, T> RewindingSink<S, B, T>
where
    S: PartitionSink,
    B: BrokerContext,
    T: TouchHook,
{
    /// Wraps `inner`, rewinding by `interval` on initialize.
    #[must_use]
    pub const fn new(inner: S, broker: B, touch: T, interval: StreamInterval) -> Self {
        Self {
            inner,
            broker,
            touch,
            interval,
            router: None,
            stats: RewindStats {
                touched: 0,
                forwarded: 0,
            },
        }
    }

    /// Returns the configured interval.
    #[must_use]
    pub const fn interval(&self) -> StreamInterval {
        self.interval
    }

    /// Returns the wrapped sink.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns the touch hook.
    #[must_use]
    pub const fn touch_hook(&self) -> &T {
        &self.touch
    }

    /// Returns the routing counters.
    #[must_use]
    pub const fn stats(&self) -> RewindStats {
        self.stats
    }

    /// Returns the positions reported by the wrapped sink, once initialized.
    #[must_use]
    pub fn original_offsets(&self) -> Option<&OriginalOffsets> {
        self.router.as_ref().map(RecordRouter::original)
    }

    /// Returns true once no more records will be replayed.
    ///
    /// False before `initialize`.
    #[must_use]
    pub fn is_caught_up(&self) -> bool {
        self.router
            .as_ref()
            .is_some_and(|router| router.tracker().is_caught_up())
    }

    /// Returns true if records on `partition` are forwarded.
    #[must_use]
    pub fn is_partition_caught_up(&self, partition: StreamPartition) -> bool {
        self.router
            .as_ref()
            .is_some_and(|router| router.tracker().is_partition_caught_up(partition))
    }

    /// Unwraps the decorator, returning the wrapped sink.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S, B, T> PartitionSink for RewindingSink<S, B, T>
where
    S: PartitionSink,
    B: BrokerContext,
    T: TouchHook,
{
    /// Returns the rewound starting positions.
    async fn initialize(&mut self) -> SinkResult<EffectiveOffsets> {
        if self.router.is_some() {
            return Err(SinkError::AlreadyInitialized);
        }

        let original = self.inner.initialize().await?;
        let effective = planner::plan(&original, self.interval, &self.broker).await;

        self.router = Some(RecordRouter::new(original, self.interval));
        Ok(effective)
    }

    async fn write(&mut self, record: StreamRecord) -> SinkResult<()> {
        let router = self.router.as_mut().ok_or(SinkError::NotInitialized)?;

        match router.route(&record) {
            Route::Touch => {
                self.touch.touch(&record);
                self.stats.touched += 1;
                Ok(())
            }
            Route::Forward => {
                self.inner.write(record).await?;
                self.stats.forwarded += 1;
                Ok(())
            }
        }
    }

    async fn flush(&mut self) -> SinkResult<()> {
        debug!(
            touched = self.stats.touched,
            forwarded = self.stats.forwarded,
            "Flushing wrapped sink"
        );
        self.inner.flush().await
    }
}
