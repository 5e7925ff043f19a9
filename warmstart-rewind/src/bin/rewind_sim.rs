//! Rewind simulation binary.
//!
//! Builds an in-memory topic, commits every partition part-way through, and
//! restarts a consumer behind a [`RewindingSink`] so the rewind plan and the
//! touched/forwarded split can be inspected without a broker.
//!
//! ```bash
//! # Rewind 200 records on 4 partitions committed at offset 800.
//! rewind-sim --partitions 4 --records 1000 --committed 800 --interval offset:200
//!
//! # Rewind 30 seconds of event time, records stamped every 100ms.
//! rewind-sim --interval watermark:30000 --spacing-ms 100 --log-level debug
//!
//! # Read the interval from a TOML file.
//! rewind-sim --config rewind.toml
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use warmstart_core::{
    Offset, PartitionId, StreamInterval, StreamPartition, StreamPosition, StreamRecord, Timestamp,
    TopicId,
};
use warmstart_rewind::{PartitionSink, RewindConfig, RewindingSink, SimulatedBroker, SimulatedSink};

/// First record timestamp in the simulated topic.
const BASE_TIMESTAMP_MS: i64 = 1_700_000_000_000;

/// Rewinding sink simulator.
#[derive(Parser, Debug)]
#[command(name = "rewind-sim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of partitions with a committed position.
    #[arg(long, default_value = "3")]
    partitions: u64,

    /// Number of additional partitions with no committed position.
    #[arg(long, default_value = "0")]
    fresh_partitions: u64,

    /// Records per partition.
    #[arg(long, default_value = "1000")]
    records: u64,

    /// Committed offset of every non-fresh partition.
    #[arg(long, default_value = "800")]
    committed: u64,

    /// Rewind interval: `none`, `offset:<n>` or `watermark:<ms>`.
    #[arg(long, default_value = "offset:100")]
    interval: StreamInterval,

    /// TOML config file; overrides `--interval`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Milliseconds between consecutive record timestamps.
    #[arg(long, default_value = "100")]
    spacing_ms: i64,

    /// Seed for the simulated sink.
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: Level,
}

impl Args {
    fn timestamp_of(&self, offset: u64) -> Timestamp {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        Timestamp::from_millis(
            BASE_TIMESTAMP_MS.saturating_add(offset.saturating_mul(self.spacing_ms)),
        )
    }

    fn committed_position(&self) -> StreamPosition {
        let committed = self.committed.min(self.records);
        let watermark = committed
            .checked_sub(1)
            .map_or_else(Timestamp::none, |last| self.timestamp_of(last));
        StreamPosition::new(Offset::new(committed), watermark)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let interval = match &args.config {
        Some(path) => RewindConfig::from_file(path)?.stream_interval(),
        None => args.interval,
    };

    let topic = TopicId::new(1);
    let total = args.partitions + args.fresh_partitions;
    let partitions: Vec<StreamPartition> = (0..total)
        .map(|n| StreamPartition::new(topic, PartitionId::new(n)))
        .collect();

    let mut sink = SimulatedSink::new(args.seed);
    let mut broker = SimulatedBroker::new();
    for (n, partition) in (0_u64..).zip(&partitions) {
        let committed = (n < args.partitions).then(|| args.committed_position());
        sink = sink.with_partition(*partition, committed);
        broker = broker.with_records(
            *partition,
            0..args.records,
            args.timestamp_of(0),
            args.spacing_ms,
        );
    }
    let handle = sink.clone();

    info!(
        partitions = args.partitions,
        fresh_partitions = args.fresh_partitions,
        records = args.records,
        committed = args.committed,
        %interval,
        "Starting simulation"
    );

    let mut touched: HashMap<StreamPartition, u64> = HashMap::new();
    let touch = |record: &StreamRecord| *touched.entry(record.partition).or_default() += 1;
    let mut rewinding = RewindingSink::new(sink, broker, touch, interval);

    let effective = rewinding.initialize().await?;
    let mut next: Vec<(StreamPartition, u64)> = partitions
        .iter()
        .map(|p| (*p, effective.get(p).copied().flatten().map_or(0, |pos| pos.offset.get())))
        .collect();

    // Interleave partitions the way a consumer poll loop would.
    let mut delivered = true;
    while delivered {
        delivered = false;
        for (partition, offset) in &mut next {
            if *offset >= args.records {
                continue;
            }
            let payload = format!("payload-{offset}");
            let record = StreamRecord::new(*partition, Offset::new(*offset), payload)
                .with_timestamp(args.timestamp_of(*offset));
            rewinding.write(record).await?;
            *offset += 1;
            delivered = true;
        }
    }
    rewinding.flush().await?;

    let stats = rewinding.stats();
    let caught_up = rewinding.is_caught_up();
    drop(rewinding);

    for partition in &partitions {
        let start = effective.get(partition).copied().flatten();
        let written = handle.written_offsets(*partition);
        info!(
            partition = %partition,
            start = ?start.map(|pos| pos.offset.get()),
            touched = touched.get(partition).copied().unwrap_or(0),
            written = written.len(),
            first_written = ?written.first(),
            "Partition summary"
        );
    }

    info!(
        touched = stats.touched,
        forwarded = stats.forwarded,
        caught_up,
        "Simulation complete"
    );
    Ok(())
}
