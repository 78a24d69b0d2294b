use core::time::Duration;
use std::{collections::BTreeMap, time::Instant};

#[cfg(feature = "tracing")]
use tracing::{debug, instrument, warn};

use crate::{
    BatchError, ClockBackwardStrategy, DATACENTER_ID_SHIFT, EPOCH_MILLIS, Error, Generator,
    GeneratorConfig, GeneratorType, IdInfo, MAX_BATCH_SIZE, MAX_SEQUENCE, MAX_TIMESTAMP,
    Metrics, MetricsSnapshot, Result, SnowflakeId, SnowflakeParser, SnowflakeValidator,
    SystemClock, TIMESTAMP_SHIFT, TimeSource, WORKER_ID_SHIFT,
    generator::mutex::{Mutex, Padded},
};

/// How many times [`ClockBackwardStrategy::Wait`] sleeps and re-reads the
/// clock before giving up.
pub const MAX_CLOCK_BACKWARD_RETRIES: u32 = 10;

/// Pause between clock reads while waiting out an exhausted sequence.
const SEQUENCE_EXHAUSTED_BACKOFF: Duration = Duration::from_micros(100);

/// Mutable generator state, only touched while holding the lock.
#[derive(Debug, Clone, Copy)]
struct GeneratorState {
    /// Unix milliseconds of the last issued ID, `-1` before the first one.
    last_timestamp: i64,
    /// Last sequence issued under `last_timestamp`, `-1` when none has been.
    sequence: i64,
}

/// A lock-based Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// All state transitions happen inside one mutex, including any sleep done by
/// the [`ClockBackwardStrategy::Wait`] policy or while waiting out an
/// exhausted sequence. A single instance therefore tops out at 4096 IDs per
/// millisecond and a blocked caller stalls every other caller of the same
/// instance; scale out with more instances, each with its own
/// `(datacenter, worker)` pair.
///
/// # Example
///
/// ```
/// use snowgen::{Generator, GeneratorConfig, SnowflakeGenerator};
///
/// let generator = SnowflakeGenerator::new(GeneratorConfig::new(1, 1)).unwrap();
/// let a = generator.next_id().unwrap();
/// let b = generator.next_id().unwrap();
/// assert!(a < b);
/// ```
pub struct SnowflakeGenerator<T = SystemClock>
where
    T: TimeSource,
{
    state: Padded<Mutex<GeneratorState>>,
    /// Datacenter and worker bits, pre-shifted into place.
    node_bits: i64,
    config: GeneratorConfig,
    metrics: Metrics,
    time: T,
}

impl SnowflakeGenerator<SystemClock> {
    /// Creates a generator reading the system wall clock.
    ///
    /// # Errors
    ///
    /// Returns the validation error of `config`, see
    /// [`GeneratorConfig::validate`].
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        Self::with_time(config, SystemClock)
    }
}

impl<T> SnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator with a custom [`TimeSource`].
    ///
    /// # Errors
    ///
    /// Returns the validation error of `config`.
    pub fn with_time(config: GeneratorConfig, time: T) -> Result<Self> {
        Self::from_components(config, -1, -1, time)
    }

    /// Creates a generator preloaded with a last timestamp (Unix ms) and
    /// sequence, e.g. to resume from persisted state.
    ///
    /// Pass `-1` for both to start fresh, as [`Self::with_time`] does.
    ///
    /// # Errors
    ///
    /// Returns the validation error of `config`, or
    /// [`Error::InvalidConfig`] if `sequence` is outside `[-1, 4095]` or
    /// `last_timestamp` is outside `[-1, EPOCH_MILLIS + MAX_TIMESTAMP]`.
    pub fn from_components(
        config: GeneratorConfig,
        last_timestamp: i64,
        sequence: i64,
        time: T,
    ) -> Result<Self> {
        let config = config.normalized()?;
        if !(-1..=MAX_SEQUENCE).contains(&sequence) {
            return Err(Error::invalid_config(format!(
                "sequence {sequence} outside [-1, {MAX_SEQUENCE}]"
            )));
        }
        if !(-1..=EPOCH_MILLIS + MAX_TIMESTAMP).contains(&last_timestamp) {
            return Err(Error::invalid_config(format!(
                "last timestamp {last_timestamp} outside [-1, {}]",
                EPOCH_MILLIS + MAX_TIMESTAMP
            )));
        }
        let node_bits = (i64::from(config.datacenter_id) << DATACENTER_ID_SHIFT)
            | (i64::from(config.worker_id) << WORKER_ID_SHIFT);

        Ok(Self {
            state: Padded::new(Mutex::new(GeneratorState {
                last_timestamp,
                sequence,
            })),
            node_bits,
            metrics: Metrics::new(config.enable_metrics),
            config,
            time,
        })
    }

    /// The validated config this generator was built from.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// A point-in-time copy of the counters. All zero when metrics are
    /// disabled.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Generates the next ID.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockMovedBackwards`] if the strategy cannot absorb a
    ///   backward clock
    /// - [`Error::ClockOutOfRange`] if the clock is before the epoch or past
    ///   the 41-bit horizon
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        let mut state = self.state.lock();
        let offset = self.advance(&mut state)?;
        state.sequence += 1;
        self.metrics.record_ids(1);
        Ok(self.compose(offset, state.sequence))
    }

    /// Generates `n` IDs under a single acquisition of the lock.
    ///
    /// Within each millisecond the remaining sequence space is handed out in
    /// one run, so a batch costs one clock read per millisecond it spans.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidBatchSize`] with no IDs if `n` is outside
    ///   `[1, MAX_BATCH_SIZE]`
    /// - any [`Self::next_id`] error, together with the IDs produced before it
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id_batch(&self, n: usize) -> Result<Vec<SnowflakeId>, BatchError> {
        if n == 0 || n > MAX_BATCH_SIZE {
            return Err(BatchError::new(
                Vec::new(),
                Error::InvalidBatchSize { size: n },
            ));
        }

        let mut ids = Vec::with_capacity(n);
        let mut state = self.state.lock();

        while ids.len() < n {
            let offset = match self.advance(&mut state) {
                Ok(offset) => offset,
                Err(e) => {
                    self.metrics.record_ids(ids.len() as u64);
                    return Err(BatchError::new(ids, e));
                }
            };

            let available = (MAX_SEQUENCE - state.sequence) as usize;
            let take = available.min(n - ids.len());
            let base = (offset << TIMESTAMP_SHIFT) | self.node_bits;
            for _ in 0..take {
                state.sequence += 1;
                ids.push(SnowflakeId::from_raw(base | state.sequence));
            }
        }

        self.metrics.record_ids(n as u64);
        Ok(ids)
    }

    /// Moves the state onto a timestamp that has sequence room left and
    /// returns that timestamp's offset from the epoch. The caller increments
    /// the sequence.
    fn advance(&self, state: &mut GeneratorState) -> Result<i64> {
        let mut now = self.time.current_millis();
        if now < state.last_timestamp {
            now = self.cold_clock_behind(now, state.last_timestamp)?;
        }

        if now == state.last_timestamp {
            if state.sequence >= MAX_SEQUENCE {
                self.metrics.record_sequence_overflow();
                #[cfg(feature = "tracing")]
                debug!(timestamp = now, "sequence exhausted, waiting for next millisecond");
                let next = self.wait_next_millis(state.last_timestamp);
                let offset = Self::offset(next)?;
                state.last_timestamp = next;
                state.sequence = -1;
                return Ok(offset);
            }
            Self::offset(now)
        } else {
            let offset = Self::offset(now)?;
            state.last_timestamp = now;
            state.sequence = -1;
            Ok(offset)
        }
    }

    fn offset(now: i64) -> Result<i64> {
        let offset = now.saturating_sub(EPOCH_MILLIS);
        if !(0..=MAX_TIMESTAMP).contains(&offset) {
            return Err(Error::ClockOutOfRange { timestamp_ms: now });
        }
        Ok(offset)
    }

    fn compose(&self, offset: i64, sequence: i64) -> SnowflakeId {
        SnowflakeId::from_raw((offset << TIMESTAMP_SHIFT) | self.node_bits | sequence)
    }

    /// Spins (with a short sleep) until the clock passes `last`.
    fn wait_next_millis(&self, last: i64) -> i64 {
        let start = Instant::now();
        let mut now = self.time.current_millis();
        while now <= last {
            self.time.sleep(SEQUENCE_EXHAUSTED_BACKOFF);
            now = self.time.current_millis();
        }
        self.metrics.record_wait(elapsed_nanos(start));
        now
    }

    /// Applies the configured clock-backward strategy. On success returns
    /// the timestamp to continue with, which is never below `last`.
    #[cold]
    #[inline(never)]
    fn cold_clock_behind(&self, now: i64, last: i64) -> Result<i64> {
        let drift = last.saturating_sub(now);
        let strategy = self.config.clock_backward_strategy;
        self.metrics.record_clock_backward();
        #[cfg(feature = "tracing")]
        warn!(drift_ms = drift, %strategy, "clock moved backwards");

        match strategy {
            ClockBackwardStrategy::Error => Err(Error::ClockMovedBackwards { drift_ms: drift }),
            ClockBackwardStrategy::UseLastTimestamp => {
                #[cfg(feature = "tracing")]
                warn!(
                    last_timestamp = last,
                    drift_ms = drift,
                    "reusing last timestamp while clock is behind"
                );
                Ok(last)
            }
            ClockBackwardStrategy::Wait => {
                let tolerance = self.config.clock_backward_tolerance() as i64;
                let mut drift = drift;
                let mut attempts = 0;
                while drift <= tolerance && attempts < MAX_CLOCK_BACKWARD_RETRIES {
                    attempts += 1;
                    let start = Instant::now();
                    self.time.sleep(Duration::from_millis((drift + 1) as u64));
                    self.metrics.record_wait(elapsed_nanos(start));

                    let now = self.time.current_millis();
                    if now >= last {
                        #[cfg(feature = "tracing")]
                        debug!(attempts, "clock caught up after backward drift");
                        return Ok(now);
                    }
                    drift = last.saturating_sub(now);
                }
                Err(Error::ClockMovedBackwards { drift_ms: drift })
            }
        }
    }

    /// Validates `id` against this generator's clock and decodes its
    /// components.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSnowflakeId`] if `id` fails
    /// [`Self::validate_id`].
    pub fn parse_id(&self, id: SnowflakeId) -> Result<IdInfo> {
        SnowflakeParser::with_time(&self.time).parse(id)
    }

    /// Runs the [`SnowflakeValidator`] checks against this generator's clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSnowflakeId`] naming the failed check.
    pub fn validate_id(&self, id: SnowflakeId) -> Result<()> {
        SnowflakeValidator::with_time(&self.time).validate(id)
    }
}

fn elapsed_nanos(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

impl<T> Generator for SnowflakeGenerator<T>
where
    T: TimeSource + Send + Sync,
{
    fn generator_type(&self) -> GeneratorType {
        GeneratorType::Snowflake
    }

    fn next_id(&self) -> Result<SnowflakeId> {
        self.next_id()
    }

    fn next_id_batch(&self, n: usize) -> Result<Vec<SnowflakeId>, BatchError> {
        self.next_id_batch(n)
    }

    fn worker_id(&self) -> u8 {
        self.config.worker_id
    }

    fn datacenter_id(&self) -> u8 {
        self.config.datacenter_id
    }

    fn metrics(&self) -> BTreeMap<&'static str, u64> {
        self.metrics.snapshot().to_map()
    }

    fn reset_metrics(&self) {
        self.metrics.reset();
    }

    fn id_count(&self) -> u64 {
        self.metrics.id_count()
    }

    fn parse_id(&self, id: SnowflakeId) -> Result<IdInfo> {
        self.parse_id(id)
    }

    fn validate_id(&self, id: SnowflakeId) -> Result<()> {
        self.validate_id(id)
    }
}

impl<T> core::fmt::Debug for SnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SnowflakeGenerator")
            .field("datacenter_id", &self.config.datacenter_id)
            .field("worker_id", &self.config.worker_id)
            .field("strategy", &self.config.clock_backward_strategy)
            .finish_non_exhaustive()
    }
}
