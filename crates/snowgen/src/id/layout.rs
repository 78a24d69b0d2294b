//! Fixed bit layout of a Snowflake ID.
//!
//! These values are not runtime-configurable: every generator, parser and
//! validator in the crate agrees on them.

/// Width of the timestamp field (milliseconds since [`crate::EPOCH`]).
pub const TIMESTAMP_BITS: u32 = 41;

/// Width of the datacenter ID field.
pub const DATACENTER_ID_BITS: u32 = 5;

/// Width of the worker ID field.
pub const WORKER_ID_BITS: u32 = 5;

/// Width of the per-millisecond sequence field.
pub const SEQUENCE_BITS: u32 = 12;

/// Number of bits to shift the worker ID to its position (bit 12).
pub const WORKER_ID_SHIFT: u32 = SEQUENCE_BITS;

/// Number of bits to shift the datacenter ID to its position (bit 17).
pub const DATACENTER_ID_SHIFT: u32 = SEQUENCE_BITS + WORKER_ID_BITS;

/// Number of bits to shift the timestamp to its position (bit 22).
pub const TIMESTAMP_SHIFT: u32 = SEQUENCE_BITS + WORKER_ID_BITS + DATACENTER_ID_BITS;

/// Largest encodable timestamp offset; also the timestamp mask.
pub const MAX_TIMESTAMP: i64 = (1 << TIMESTAMP_BITS) - 1;

/// Largest datacenter ID; also the datacenter mask.
pub const MAX_DATACENTER_ID: i64 = (1 << DATACENTER_ID_BITS) - 1;

/// Largest worker ID; also the worker mask.
pub const MAX_WORKER_ID: i64 = (1 << WORKER_ID_BITS) - 1;

/// Largest sequence value; also the sequence mask.
pub const MAX_SEQUENCE: i64 = (1 << SEQUENCE_BITS) - 1;

/// Largest number of IDs a single batch call may request.
pub const MAX_BATCH_SIZE: usize = 100_000;

/// How far past the current time a decoded timestamp may lie and still be
/// considered valid.
pub const MAX_FUTURE_SKEW_MILLIS: i64 = 60_000;

const _: () = assert!(TIMESTAMP_SHIFT + TIMESTAMP_BITS == 63);
