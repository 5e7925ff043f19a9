//! Rewind planner.
//!
//! Translates the wrapped sink's committed positions into the earlier
//! positions consumption should actually start from.
//!
//! # Rewind Modes
//!
//! - **Zero**: positions pass through unchanged.
//! - **Offset range**: each committed offset moves back by a record count,
//!   clamped at zero. The watermark is kept as-is. It is stale after the
//!   rewind and must not be relied on.
//! - **Watermark range**: each committed watermark moves back by a duration
//!   and the broker translates the result into a position. Partitions the
//!   broker cannot answer for keep their committed position.
//!
//! Fresh partitions (no committed position) are never rewound.

use std::time::Duration;

use tracing::{debug, info, warn};
use warmstart_core::{OriginalOffsets, StreamInterval, StreamPosition};

use crate::broker::{BrokerContext, TimestampLookups};

/// Starting positions after rewinding. Same shape as [`OriginalOffsets`].
pub type EffectiveOffsets = OriginalOffsets;

/// Computes the effective starting positions for `interval`.
///
/// Broker failures are not errors here: every partition whose lookup fails
/// or comes back empty keeps its original position.
pub async fn plan<B>(
    original: &OriginalOffsets,
    interval: StreamInterval,
    broker: &B,
) -> EffectiveOffsets
where
    B: BrokerContext + ?Sized,
{
    let effective = match interval {
        StreamInterval::Zero => original.clone(),
        StreamInterval::OffsetRange(count) => rewind_by_offset(original, count),
        StreamInterval::WatermarkRange(duration) => {
            rewind_by_watermark(original, duration, broker).await
        }
    };

    log_plan(original, &effective, interval);
    effective
}

/// Moves every committed offset back by `count`, keeping the watermark.
#[must_use]
pub fn rewind_by_offset(original: &OriginalOffsets, count: u64) -> EffectiveOffsets {
    original
        .iter()
        .map(|(partition, position)| {
            let rewound = position.map(|pos| {
                StreamPosition::new(pos.offset.saturating_sub(count), pos.watermark)
            });
            (*partition, rewound)
        })
        .collect()
}

/// Moves every committed watermark back by `duration` and asks the broker
/// for the matching positions.
pub async fn rewind_by_watermark<B>(
    original: &OriginalOffsets,
    duration: Duration,
    broker: &B,
) -> EffectiveOffsets
where
    B: BrokerContext + ?Sized,
{
    let lookups: TimestampLookups = original
        .iter()
        .filter_map(|(partition, position)| {
            let pos = (*position)?;
            pos.watermark
                .is_positive()
                .then(|| (*partition, pos.watermark.saturating_sub(duration)))
        })
        .collect();

    let mut effective = original.clone();
    if lookups.is_empty() {
        debug!("No partition has a usable watermark, skipping broker lookup");
        return effective;
    }

    let resolved = match broker.resolve_positions_for_timestamps(&lookups).await {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(
                error = %e,
                partitions = lookups.len(),
                "Broker timestamp lookup failed, keeping committed positions"
            );
            return effective;
        }
    };

    for (partition, target) in &lookups {
        match resolved.get(partition).copied().flatten() {
            Some(position) => {
                if let Some(Some(committed)) = original.get(partition) {
                    if position.offset > committed.offset {
                        warn!(
                            partition = %partition,
                            resolved = %position,
                            committed = %committed,
                            "Broker resolved a position past the committed offset"
                        );
                    }
                }
                effective.insert(*partition, Some(position));
            }
            None => {
                warn!(
                    partition = %partition,
                    target = %target,
                    "Broker returned no position, partition will not rewind"
                );
            }
        }
    }

    effective
}

fn log_plan(original: &OriginalOffsets, effective: &EffectiveOffsets, interval: StreamInterval) {
    let mut rewound = 0_usize;
    for (partition, before) in original {
        let after = effective.get(partition).copied().flatten();
        if *before != after {
            rewound += 1;
        }
        debug!(
            partition = %partition,
            before = ?before,
            after = ?after,
            "Planned start position"
        );
    }

    info!(
        %interval,
        partitions = original.len(),
        rewound,
        "Planned rewind"
    );
}
