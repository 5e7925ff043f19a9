//! End-to-end rewind scenarios driven through `RewindingSink` with the
//! simulated sink and broker.

use std::time::Duration;

use warmstart_core::{
    Offset, PartitionId, StreamInterval, StreamPartition, StreamPosition, StreamRecord, Timestamp,
    TopicId,
};
use warmstart_rewind::{
    PartitionSink, RecordingTouch, RewindingSink, SimulatedBroker, SimulatedSink,
};

fn p(n: u64) -> StreamPartition {
    StreamPartition::new(TopicId::new(1), PartitionId::new(n))
}

fn pos(offset: u64, watermark: i64) -> Option<StreamPosition> {
    Some(StreamPosition::new(
        Offset::new(offset),
        Timestamp::from_millis(watermark),
    ))
}

fn record(partition: StreamPartition, offset: u64) -> StreamRecord {
    StreamRecord::new(partition, Offset::new(offset), format!("payload-{offset}"))
        .with_timestamp(Timestamp::from_millis(i64::try_from(offset).unwrap() * 10))
}

fn touched_offsets(touch: &RecordingTouch, partition: StreamPartition) -> Vec<u64> {
    touch
        .touched()
        .iter()
        .filter(|r| r.partition == partition)
        .map(|r| r.offset.get())
        .collect()
}

#[tokio::test]
async fn test_offset_rewind_replays_then_forwards() {
    let sink = SimulatedSink::new(42).with_partition(p(0), pos(100, 1000));
    let handle = sink.clone();
    let touch = RecordingTouch::new();
    let mut rewinding = RewindingSink::new(
        sink,
        SimulatedBroker::new(),
        touch.clone(),
        StreamInterval::OffsetRange(50),
    );

    let effective = rewinding.initialize().await.unwrap();
    assert_eq!(effective[&p(0)], pos(50, 1000));

    for offset in 50..100 {
        rewinding.write(record(p(0), offset)).await.unwrap();
        assert!(!rewinding.is_partition_caught_up(p(0)));
    }
    assert_eq!(touched_offsets(&touch, p(0)), (50..100).collect::<Vec<_>>());
    assert!(handle.written().is_empty());

    rewinding.write(record(p(0), 100)).await.unwrap();
    assert!(rewinding.is_caught_up());

    for offset in 101..120 {
        rewinding.write(record(p(0), offset)).await.unwrap();
    }
    assert_eq!(handle.written_offsets(p(0)), (100..120).collect::<Vec<_>>());
    assert_eq!(touch.count(), 50);
}

#[tokio::test]
async fn test_fresh_partition_is_never_replayed() {
    for interval in [
        StreamInterval::Zero,
        StreamInterval::OffsetRange(10),
        StreamInterval::WatermarkRange(Duration::from_secs(10)),
    ] {
        let sink = SimulatedSink::new(42).with_partition(p(1), None);
        let handle = sink.clone();
        let touch = RecordingTouch::new();
        let mut rewinding =
            RewindingSink::new(sink, SimulatedBroker::new(), touch.clone(), interval);

        let effective = rewinding.initialize().await.unwrap();
        assert_eq!(effective[&p(1)], None, "interval {interval}");

        rewinding.write(record(p(1), 0)).await.unwrap();
        assert!(rewinding.is_partition_caught_up(p(1)));
        assert!(rewinding.is_caught_up());
        assert_eq!(handle.written_offsets(p(1)), vec![0]);
        assert_eq!(touch.count(), 0);
    }
}

#[tokio::test]
async fn test_watermark_miss_means_no_replay() {
    // P0 is indexed at 10ms per offset; P2 is unknown to the broker.
    let broker = SimulatedBroker::new().with_records(p(0), 0..200, Timestamp::from_millis(0), 10);
    let sink = SimulatedSink::new(42)
        .with_partition(p(0), pos(150, 1490))
        .with_partition(p(2), pos(70, 5000));
    let handle = sink.clone();
    let touch = RecordingTouch::new();
    let mut rewinding = RewindingSink::new(
        sink,
        broker.clone(),
        touch.clone(),
        StreamInterval::WatermarkRange(Duration::from_millis(500)),
    );

    let effective = rewinding.initialize().await.unwrap();
    // 1490 - 500 = 990 -> offset 99.
    assert_eq!(effective[&p(0)], pos(99, 990));
    assert_eq!(effective[&p(2)], pos(70, 5000));
    assert_eq!(broker.requests().len(), 1);

    for offset in 70..80 {
        rewinding.write(record(p(2), offset)).await.unwrap();
    }
    assert!(touched_offsets(&touch, p(2)).is_empty());
    assert_eq!(handle.written_offsets(p(2)), (70..80).collect::<Vec<_>>());

    for offset in 99..160 {
        rewinding.write(record(p(0), offset)).await.unwrap();
    }
    assert_eq!(touched_offsets(&touch, p(0)), (99..150).collect::<Vec<_>>());
    assert_eq!(handle.written_offsets(p(0)), (150..160).collect::<Vec<_>>());
    assert!(rewinding.is_caught_up());
}

#[tokio::test]
async fn test_broker_outage_degrades_to_no_rewind() {
    let broker = SimulatedBroker::new().with_records(p(0), 0..200, Timestamp::from_millis(0), 10);
    broker.fail_next_calls(1);
    let sink = SimulatedSink::new(42).with_partition(p(0), pos(150, 1490));
    let touch = RecordingTouch::new();
    let mut rewinding = RewindingSink::new(
        sink,
        broker,
        touch.clone(),
        StreamInterval::WatermarkRange(Duration::from_millis(500)),
    );

    let effective = rewinding.initialize().await.unwrap();
    assert_eq!(effective[&p(0)], pos(150, 1490));

    rewinding.write(record(p(0), 150)).await.unwrap();
    assert!(rewinding.is_caught_up());
    assert_eq!(touch.count(), 0);
}

#[tokio::test]
async fn test_zero_interval_is_pass_through() {
    let sink = SimulatedSink::new(42)
        .with_partition(p(0), pos(100, 1000))
        .with_partition(p(1), pos(5, 50));
    let handle = sink.clone();
    let touch = RecordingTouch::new();
    let mut rewinding =
        RewindingSink::new(sink, SimulatedBroker::new(), touch.clone(), StreamInterval::Zero);

    let effective = rewinding.initialize().await.unwrap();
    assert_eq!(effective[&p(0)], pos(100, 1000));
    assert!(rewinding.is_caught_up());

    // Even offsets below the committed one are forwarded.
    rewinding.write(record(p(0), 3)).await.unwrap();
    rewinding.write(record(p(1), 1)).await.unwrap();
    assert_eq!(handle.written().len(), 2);
    assert_eq!(touch.count(), 0);
}

#[tokio::test]
async fn test_interleaved_partitions_latch_independently() {
    let sink = SimulatedSink::new(42)
        .with_partition(p(0), pos(20, 200))
        .with_partition(p(1), pos(5, 50));
    let handle = sink.clone();
    let touch = RecordingTouch::new();
    let mut rewinding = RewindingSink::new(
        sink,
        SimulatedBroker::new(),
        touch.clone(),
        StreamInterval::OffsetRange(10),
    );

    let effective = rewinding.initialize().await.unwrap();
    assert_eq!(effective[&p(0)], pos(10, 200));
    assert_eq!(effective[&p(1)], pos(0, 50));

    let mut p0 = 10..30;
    let mut p1 = 0..15;
    let mut was_caught_up = Vec::new();
    loop {
        let a = p0.next();
        let b = p1.next();
        if a.is_none() && b.is_none() {
            break;
        }
        if let Some(offset) = a {
            rewinding.write(record(p(0), offset)).await.unwrap();
        }
        if let Some(offset) = b {
            rewinding.write(record(p(1), offset)).await.unwrap();
        }
        was_caught_up.push(rewinding.is_caught_up());
    }

    // Once the global flag flips it never reverts.
    let first = was_caught_up.iter().position(|c| *c).unwrap();
    assert!(was_caught_up[first..].iter().all(|c| *c));

    assert_eq!(touched_offsets(&touch, p(0)), (10..20).collect::<Vec<_>>());
    assert_eq!(touched_offsets(&touch, p(1)), (0..5).collect::<Vec<_>>());
    assert_eq!(handle.written_offsets(p(0)), (20..30).collect::<Vec<_>>());
    assert_eq!(handle.written_offsets(p(1)), (5..15).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_redelivery_after_latch_is_forwarded() {
    let sink = SimulatedSink::new(42).with_partition(p(0), pos(100, 1000));
    let handle = sink.clone();
    let touch = RecordingTouch::new();
    let mut rewinding = RewindingSink::new(
        sink,
        SimulatedBroker::new(),
        touch.clone(),
        StreamInterval::OffsetRange(50),
    );
    rewinding.initialize().await.unwrap();

    rewinding.write(record(p(0), 98)).await.unwrap();
    rewinding.write(record(p(0), 100)).await.unwrap();
    // Broker redelivers an older record after the latch.
    rewinding.write(record(p(0), 99)).await.unwrap();

    assert_eq!(touched_offsets(&touch, p(0)), vec![98]);
    assert_eq!(handle.written_offsets(p(0)), vec![100, 99]);
}

#[tokio::test]
async fn test_restart_rewinds_from_flushed_position() {
    let sink = SimulatedSink::new(42).with_partition(p(0), None);

    // First run: fresh partition, everything is live.
    let mut first = RewindingSink::new(
        sink.clone(),
        SimulatedBroker::new(),
        RecordingTouch::new(),
        StreamInterval::OffsetRange(25),
    );
    first.initialize().await.unwrap();
    for offset in 0..60 {
        first.write(record(p(0), offset)).await.unwrap();
    }
    first.flush().await.unwrap();
    assert_eq!(sink.committed(p(0)), pos(60, 590));

    // Second run: rewinds 25 records behind the flushed position.
    let touch = RecordingTouch::new();
    let mut second = RewindingSink::new(
        sink.clone(),
        SimulatedBroker::new(),
        touch.clone(),
        StreamInterval::OffsetRange(25),
    );
    let effective = second.initialize().await.unwrap();
    assert_eq!(effective[&p(0)], pos(35, 590));

    for offset in 35..70 {
        second.write(record(p(0), offset)).await.unwrap();
    }
    assert_eq!(touched_offsets(&touch, p(0)), (35..60).collect::<Vec<_>>());
    // Nothing from the first run was written twice.
    let written = sink.written_offsets(p(0));
    assert_eq!(written, (0..70).collect::<Vec<_>>());
}
