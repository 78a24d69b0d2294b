use core::time::Duration;
use std::{
    collections::{HashSet, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicI64, AtomicU32, Ordering},
    },
    thread::scope,
};

use crate::{
    ClockBackwardStrategy, EPOCH_MILLIS, Error, Generator, GeneratorConfig, MAX_BATCH_SIZE,
    MAX_CLOCK_BACKWARD_RETRIES, MAX_SEQUENCE, MAX_TIMESTAMP, SnowflakeGenerator, SnowflakeId,
    SystemClock, TimeSource,
};

const T0: i64 = EPOCH_MILLIS + 1_000_000;

/// A clock that only moves when told to. `sleep` advances it by the slept
/// duration (at least 1 ms) unless frozen.
struct ManualClock {
    now: AtomicI64,
    sleeps: AtomicU32,
    frozen: bool,
}

impl ManualClock {
    fn at(now: i64) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(now),
            sleeps: AtomicU32::new(0),
            frozen: false,
        })
    }

    fn frozen_at(now: i64) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(now),
            sleeps: AtomicU32::new(0),
            frozen: true,
        })
    }

    fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    fn sleeps(&self) -> u32 {
        self.sleeps.load(Ordering::SeqCst)
    }
}

impl TimeSource for ManualClock {
    fn current_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep(&self, dur: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        if !self.frozen {
            let step = i64::try_from(dur.as_millis()).unwrap_or(i64::MAX).max(1);
            self.now.fetch_add(step, Ordering::SeqCst);
        }
    }
}

/// Plays back a fixed list of readings, repeating the last one.
struct ScriptedClock {
    readings: Mutex<VecDeque<i64>>,
}

impl ScriptedClock {
    fn new(readings: impl IntoIterator<Item = i64>) -> Self {
        Self {
            readings: Mutex::new(readings.into_iter().collect()),
        }
    }
}

impl TimeSource for ScriptedClock {
    fn current_millis(&self) -> i64 {
        let mut readings = self.readings.lock().unwrap();
        if readings.len() > 1 {
            readings.pop_front().unwrap()
        } else {
            *readings.front().unwrap()
        }
    }

    fn sleep(&self, _dur: Duration) {}
}

fn manual_generator(
    config: GeneratorConfig,
    now: i64,
) -> (SnowflakeGenerator<Arc<ManualClock>>, Arc<ManualClock>) {
    let clock = ManualClock::at(now);
    let generator = SnowflakeGenerator::with_time(config, clock.clone()).unwrap();
    (generator, clock)
}

fn offset(ms: i64) -> i64 {
    ms - EPOCH_MILLIS
}

#[test]
fn sequence_increments_within_same_millisecond() {
    let (generator, _) = manual_generator(GeneratorConfig::new(1, 2), T0);

    let id1 = generator.next_id().unwrap();
    let id2 = generator.next_id().unwrap();
    let id3 = generator.next_id().unwrap();

    for (i, id) in [id1, id2, id3].into_iter().enumerate() {
        assert_eq!(id.timestamp(), offset(T0));
        assert_eq!(id.sequence(), i as i64);
        assert_eq!(id.datacenter_id(), 1);
        assert_eq!(id.worker_id(), 2);
    }
    assert!(id1 < id2 && id2 < id3);
}

#[test]
fn sequence_resets_on_new_millisecond() {
    let (generator, clock) = manual_generator(GeneratorConfig::new(0, 0), T0);
    generator.next_id().unwrap();
    generator.next_id().unwrap();

    clock.set(T0 + 1);
    let id = generator.next_id().unwrap();
    assert_eq!(id.timestamp(), offset(T0 + 1));
    assert_eq!(id.sequence(), 0);
}

#[test]
fn exhausted_sequence_waits_for_next_millisecond() {
    let (generator, clock) = manual_generator(GeneratorConfig::new(0, 0), T0);

    for i in 0..=MAX_SEQUENCE {
        let id = generator.next_id().unwrap();
        assert_eq!(id.sequence(), i);
        assert_eq!(id.timestamp(), offset(T0));
    }
    assert_eq!(clock.sleeps(), 0);

    let id = generator.next_id().unwrap();
    assert_eq!(id.timestamp(), offset(T0 + 1));
    assert_eq!(id.sequence(), 0);
    assert_eq!(clock.sleeps(), 1);

    let metrics = generator.metrics();
    assert_eq!(metrics["sequence_overflow"], 1);
    assert_eq!(metrics["wait_count"], 1);
    assert_eq!(metrics["id_count"], 4097);
}

#[test]
fn fifty_thousand_ids_are_unique_and_ordered() {
    let (generator, _) = manual_generator(GeneratorConfig::new(3, 7), T0);

    let mut seen = HashSet::with_capacity(50_000);
    let mut last = SnowflakeId::default();
    for _ in 0..50_000 {
        let id = generator.next_id().unwrap();
        assert!(id > last);
        assert!(seen.insert(id));
        last = id;
    }

    let metrics = generator.metrics();
    assert_eq!(metrics["id_count"], 50_000);
    assert!(metrics["sequence_overflow"] >= 1);
    assert!(metrics["wait_count"] >= 1);
}

#[test]
fn round_trip_through_parser() {
    let generator = SnowflakeGenerator::new(GeneratorConfig::new(5, 10)).unwrap();
    let before = SystemClock.current_millis();
    let id = generator.next_id().unwrap();
    let after = SystemClock.current_millis();

    assert_eq!(generator.validate_id(id), Ok(()));
    let info = generator.parse_id(id).unwrap();
    assert_eq!(info.id, id);
    assert_eq!(info.datacenter_id, 5);
    assert_eq!(info.worker_id, 10);
    assert_eq!(i64::from(info.sequence), id.sequence());
    assert_eq!(info.timestamp_ms, id.timestamp_ms());
    assert!(
        before <= info.timestamp_ms && info.timestamp_ms <= after,
        "{} not in [{before}, {after}]",
        info.timestamp_ms
    );
}

#[test]
fn parse_uses_generator_clock() {
    let (generator, clock) = manual_generator(GeneratorConfig::new(0, 0), T0);
    let id = generator.next_id().unwrap();
    assert!(generator.parse_id(id).is_ok());

    // An ID minted "later" than the mock clock allows is rejected.
    clock.set(T0 - 120_000);
    assert!(matches!(
        generator.validate_id(id),
        Err(Error::InvalidSnowflakeId { .. })
    ));
}

#[test]
fn error_strategy_fails_on_backward_clock() {
    let (generator, clock) = manual_generator(GeneratorConfig::new(0, 0), T0);
    let before = generator.next_id().unwrap();

    clock.set(T0 - 3);
    assert_eq!(
        generator.next_id(),
        Err(Error::ClockMovedBackwards { drift_ms: 3 })
    );
    assert!(generator.next_id().unwrap_err().is_clock_backward());
    assert_eq!(generator.metrics()["clock_backward"], 2);
    assert_eq!(clock.sleeps(), 0);

    // Recovery continues the sequence where it stopped.
    clock.set(T0);
    let after = generator.next_id().unwrap();
    assert_eq!(after.sequence(), before.sequence() + 1);
    assert!(after > before);
}

#[test]
fn wait_strategy_absorbs_drift_within_tolerance() {
    let config = GeneratorConfig::new(0, 0).with_clock_backward_strategy(ClockBackwardStrategy::Wait);
    let (generator, clock) = manual_generator(config, T0);
    let before = generator.next_id().unwrap();

    clock.set(T0 - 5);
    let after = generator.next_id().unwrap();
    assert!(after > before);
    assert!(after.timestamp_ms() >= T0);
    assert_eq!(clock.sleeps(), 1);

    let metrics = generator.metrics();
    assert_eq!(metrics["clock_backward"], 1);
    assert_eq!(metrics["wait_count"], 1);
}

#[test]
fn wait_strategy_rejects_drift_beyond_tolerance() {
    let config = GeneratorConfig::new(0, 0).with_clock_backward_strategy(ClockBackwardStrategy::Wait);
    let (generator, clock) = manual_generator(config, T0);
    generator.next_id().unwrap();

    clock.set(T0 - 6);
    assert_eq!(
        generator.next_id(),
        Err(Error::ClockMovedBackwards { drift_ms: 6 })
    );
    assert_eq!(clock.sleeps(), 0);
}

#[test]
fn wait_strategy_honours_custom_tolerance() {
    let config = GeneratorConfig::new(0, 0)
        .with_clock_backward_strategy(ClockBackwardStrategy::Wait)
        .with_clock_backward_tolerance_ms(50);
    let (generator, clock) = manual_generator(config, T0);
    generator.next_id().unwrap();

    clock.set(T0 - 30);
    assert!(generator.next_id().is_ok());
}

#[test]
fn wait_strategy_gives_up_after_retries() {
    let config = GeneratorConfig::new(0, 0).with_clock_backward_strategy(ClockBackwardStrategy::Wait);
    let clock = ManualClock::frozen_at(T0);
    let generator = SnowflakeGenerator::with_time(config, clock.clone()).unwrap();
    generator.next_id().unwrap();

    clock.set(T0 - 2);
    assert_eq!(
        generator.next_id(),
        Err(Error::ClockMovedBackwards { drift_ms: 2 })
    );
    assert_eq!(clock.sleeps(), MAX_CLOCK_BACKWARD_RETRIES);
}

#[test]
fn use_last_timestamp_never_fails() {
    let config = GeneratorConfig::new(0, 0)
        .with_clock_backward_strategy(ClockBackwardStrategy::UseLastTimestamp);
    let (generator, clock) = manual_generator(config, T0);
    let first = generator.next_id().unwrap();

    clock.set(T0 - 1_000);
    let mut last = first;
    for _ in 0..10 {
        let id = generator.next_id().unwrap();
        assert_eq!(id.timestamp(), offset(T0));
        assert!(id > last);
        last = id;
    }
    assert_eq!(generator.metrics()["clock_backward"], 10);
}

#[test]
fn use_last_timestamp_stays_unique_past_sequence_exhaustion() {
    let config = GeneratorConfig::new(0, 0)
        .with_clock_backward_strategy(ClockBackwardStrategy::UseLastTimestamp);
    let (generator, clock) = manual_generator(config, T0);
    generator.next_id().unwrap();

    clock.set(T0 - 20);
    let ids = generator.next_id_batch(2 * 4096).unwrap();
    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert!(ids.last().unwrap().timestamp_ms() > T0);
}

#[test]
fn clock_outside_encodable_range() {
    let (generator, clock) = manual_generator(GeneratorConfig::new(0, 0), EPOCH_MILLIS - 1);
    assert_eq!(
        generator.next_id(),
        Err(Error::ClockOutOfRange {
            timestamp_ms: EPOCH_MILLIS - 1
        })
    );

    let horizon = EPOCH_MILLIS + MAX_TIMESTAMP;
    clock.set(horizon);
    let id = generator.next_id().unwrap();
    assert_eq!(id.timestamp(), MAX_TIMESTAMP);
    assert!(id.to_raw() > 0);

    clock.set(horizon + 1);
    assert_eq!(
        generator.next_id(),
        Err(Error::ClockOutOfRange {
            timestamp_ms: horizon + 1
        })
    );
}

#[test]
fn resumes_from_components() {
    let clock = ManualClock::at(T0);
    let generator = SnowflakeGenerator::from_components(
        GeneratorConfig::new(0, 0),
        T0,
        MAX_SEQUENCE,
        clock.clone(),
    )
    .unwrap();

    let id = generator.next_id().unwrap();
    assert_eq!(id.timestamp(), offset(T0 + 1));
    assert_eq!(id.sequence(), 0);
    assert_eq!(generator.metrics_snapshot().sequence_overflow_count, 1);

    for bad in [-2, MAX_SEQUENCE + 1] {
        assert!(matches!(
            SnowflakeGenerator::from_components(GeneratorConfig::new(0, 0), T0, bad, clock.clone()),
            Err(Error::InvalidConfig { .. })
        ));
    }
    for bad in [-2, i64::MIN, EPOCH_MILLIS + MAX_TIMESTAMP + 1, i64::MAX] {
        assert!(matches!(
            SnowflakeGenerator::from_components(GeneratorConfig::new(0, 0), bad, 0, clock.clone()),
            Err(Error::InvalidConfig { .. })
        ));
    }
}

#[test]
fn resumed_horizon_with_clock_before_epoch_errors() {
    let horizon = EPOCH_MILLIS + MAX_TIMESTAMP;
    let clock = ManualClock::at(-5);
    let generator =
        SnowflakeGenerator::from_components(GeneratorConfig::new(0, 0), horizon, 0, clock.clone())
            .unwrap();
    assert_eq!(
        generator.next_id(),
        Err(Error::ClockMovedBackwards {
            drift_ms: horizon + 5
        })
    );

    let waiting = SnowflakeGenerator::from_components(
        GeneratorConfig::new(0, 0).with_clock_backward_strategy(ClockBackwardStrategy::Wait),
        horizon,
        0,
        ManualClock::at(i64::MIN),
    )
    .unwrap();
    assert_eq!(
        waiting.next_id(),
        Err(Error::ClockMovedBackwards { drift_ms: i64::MAX })
    );
    assert_eq!(clock.sleeps(), 0);
}

#[test]
fn rejects_invalid_config() {
    assert_eq!(
        SnowflakeGenerator::new(GeneratorConfig::new(32, 0)).err().map(|e| e.to_string()),
        Some(Error::InvalidDatacenterId { id: 32 }.to_string())
    );
    assert_eq!(
        SnowflakeGenerator::new(GeneratorConfig::new(0, 32)).err().map(|e| e.to_string()),
        Some(Error::InvalidWorkerId { id: 32 }.to_string())
    );
    let config = GeneratorConfig::new(0, 0).with_clock_backward_tolerance_ms(1_001);
    assert!(matches!(
        SnowflakeGenerator::new(config),
        Err(Error::InvalidConfig { .. })
    ));
}

#[test]
fn batch_hands_out_sequence_runs() {
    let (generator, _) = manual_generator(GeneratorConfig::new(2, 4), T0);
    generator.next_id().unwrap();

    let ids = generator.next_id_batch(3).unwrap();
    let sequences: Vec<_> = ids.iter().map(SnowflakeId::sequence).collect();
    assert_eq!(sequences, [1, 2, 3]);
    assert!(ids.iter().all(|id| id.worker_id() == 4 && id.datacenter_id() == 2));
    assert_eq!(generator.id_count(), 4);
}

#[test]
fn batch_spans_milliseconds() {
    let (generator, clock) = manual_generator(GeneratorConfig::new(0, 0), T0);

    let ids = generator.next_id_batch(10_000).unwrap();
    assert_eq!(ids.len(), 10_000);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    let timestamps: HashSet<_> = ids.iter().map(SnowflakeId::timestamp).collect();
    assert_eq!(timestamps.len(), 3);
    assert_eq!(clock.sleeps(), 2);
    assert_eq!(generator.metrics()["sequence_overflow"], 2);
}

#[test]
fn batch_at_maximum_size() {
    let (generator, _) = manual_generator(GeneratorConfig::new(0, 0), T0);
    let ids = generator.next_id_batch(MAX_BATCH_SIZE).unwrap();
    let unique: HashSet<_> = ids.into_iter().collect();
    assert_eq!(unique.len(), MAX_BATCH_SIZE);
}

#[test]
fn batch_rejects_invalid_sizes() {
    let (generator, _) = manual_generator(GeneratorConfig::new(0, 0), T0);
    for n in [0, MAX_BATCH_SIZE + 1] {
        let (ids, err) = generator.next_id_batch(n).unwrap_err().into_parts();
        assert!(ids.is_empty());
        assert_eq!(err, Error::InvalidBatchSize { size: n });
    }
    assert_eq!(generator.id_count(), 0);
}

#[test]
fn batch_returns_partial_ids_on_backward_clock() {
    let clock = ScriptedClock::new([T0, T0 - 10]);
    let generator = SnowflakeGenerator::with_time(GeneratorConfig::new(0, 0), clock).unwrap();

    let err = generator.next_id_batch(5_000).unwrap_err();
    assert_eq!(err.source, Error::ClockMovedBackwards { drift_ms: 10 });
    assert_eq!(err.generated.len(), 4096);
    assert!(err.generated.iter().all(|id| id.timestamp() == offset(T0)));
    assert_eq!(generator.id_count(), 4096);

    let err: Error = err.into();
    assert!(err.is_clock_backward());
}

#[test]
fn metrics_can_be_disabled() {
    let (generator, _) = manual_generator(GeneratorConfig::new(0, 0).with_metrics(false), T0);
    generator.next_id_batch(5_000).unwrap();

    let metrics = generator.metrics();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics["metrics_enabled"], 0);
    assert_eq!(generator.id_count(), 0);
    assert!(!generator.metrics_snapshot().enabled);
}

#[test]
fn reset_metrics_zeroes_counters() {
    let (generator, _) = manual_generator(GeneratorConfig::new(0, 0), T0);
    generator.next_id_batch(5_000).unwrap();
    assert_eq!(generator.id_count(), 5_000);

    generator.reset_metrics();
    let metrics = generator.metrics();
    assert_eq!(metrics["metrics_enabled"], 1);
    assert_eq!(metrics["id_count"], 0);
    assert_eq!(metrics["sequence_overflow"], 0);
    assert_eq!(metrics["wait_count"], 0);
    assert_eq!(metrics["avg_wait_time_ns"], 0);
}

#[test]
fn works_behind_trait_object() {
    let generator: Arc<dyn Generator> =
        Arc::new(SnowflakeGenerator::new(GeneratorConfig::new(9, 17)).unwrap());
    assert_eq!(generator.generator_type(), crate::GeneratorType::Snowflake);
    assert_eq!(generator.datacenter_id(), 9);
    assert_eq!(generator.worker_id(), 17);

    let id = generator.next_id().unwrap();
    assert_eq!(generator.parse_id(id).unwrap().worker_id, 17);
    assert_eq!(generator.next_id_batch(10).unwrap().len(), 10);
    assert_eq!(generator.id_count(), 11);
}

#[test]
fn ids_are_unique_across_threads() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 10_000;

    let generator = SnowflakeGenerator::new(GeneratorConfig::new(1, 1)).unwrap();

    let all: Vec<Vec<SnowflakeId>> = scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let generator = &generator;
                s.spawn(move || {
                    if i % 2 == 0 {
                        (0..PER_THREAD)
                            .map(|_| generator.next_id().unwrap())
                            .collect::<Vec<_>>()
                    } else {
                        generator.next_id_batch(PER_THREAD).unwrap()
                    }
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut seen = HashSet::with_capacity(THREADS * PER_THREAD);
    for ids in &all {
        // Each caller observes strictly increasing IDs.
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        for id in ids {
            assert!(seen.insert(*id), "duplicate id {id}");
        }
    }
    assert_eq!(seen.len(), THREADS * PER_THREAD);
    assert_eq!(generator.id_count(), (THREADS * PER_THREAD) as u64);
}

#[test]
fn distinct_workers_never_collide() {
    let clock = ManualClock::at(T0);
    let a = SnowflakeGenerator::with_time(GeneratorConfig::new(0, 1), clock.clone()).unwrap();
    let b = SnowflakeGenerator::with_time(GeneratorConfig::new(0, 2), clock.clone()).unwrap();

    let ids_a: HashSet<_> = a.next_id_batch(4096).unwrap().into_iter().collect();
    let ids_b: HashSet<_> = b.next_id_batch(4096).unwrap().into_iter().collect();
    assert!(ids_a.is_disjoint(&ids_b));
}

#[cfg(feature = "tracing")]
mod events {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use tracing::{Event, Level, Metadata, Subscriber, span};

    use super::{T0, manual_generator};
    use crate::{Error, GeneratorConfig};

    /// Counts `WARN` events and ignores everything else.
    struct WarnCounter(Arc<AtomicUsize>);

    impl Subscriber for WarnCounter {
        fn enabled(&self, _: &Metadata<'_>) -> bool {
            true
        }

        fn new_span(&self, _: &span::Attributes<'_>) -> span::Id {
            span::Id::from_u64(1)
        }

        fn record(&self, _: &span::Id, _: &span::Record<'_>) {}

        fn record_follows_from(&self, _: &span::Id, _: &span::Id) {}

        fn event(&self, event: &Event<'_>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        fn enter(&self, _: &span::Id) {}

        fn exit(&self, _: &span::Id) {}
    }

    #[test]
    fn backward_clock_emits_warning() {
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = WarnCounter(Arc::clone(&warnings));

        tracing::subscriber::with_default(subscriber, || {
            let (generator, clock) = manual_generator(GeneratorConfig::new(0, 0), T0);
            generator.next_id().unwrap();
            assert_eq!(warnings.load(Ordering::Relaxed), 0);

            clock.set(T0 - 10);
            assert_eq!(
                generator.next_id(),
                Err(Error::ClockMovedBackwards { drift_ms: 10 })
            );
        });

        assert_eq!(warnings.load(Ordering::Relaxed), 1);
    }
}
