use std::collections::BTreeMap;

use crate::{BatchError, GeneratorType, IdInfo, Result, SnowflakeId};

/// The contract every ID generator implementation fulfils.
///
/// Implementations are shared across threads behind an `Arc<dyn Generator>`;
/// all methods take `&self` and serialize internally.
pub trait Generator: Send + Sync {
    /// Which implementation family this generator belongs to.
    fn generator_type(&self) -> GeneratorType;

    /// Generates the next ID.
    ///
    /// # Errors
    ///
    /// Fails if the clock moved backwards beyond what the configured strategy
    /// absorbs, or if the clock is outside the encodable range.
    fn next_id(&self) -> Result<SnowflakeId>;

    /// Generates `n` IDs in one call.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::Error::InvalidBatchSize`] if `n` is outside
    /// `[1, MAX_BATCH_SIZE]`. If generation fails partway through, the IDs
    /// produced so far are returned inside the [`BatchError`].
    fn next_id_batch(&self, n: usize) -> Result<Vec<SnowflakeId>, BatchError>;

    fn worker_id(&self) -> u8;

    fn datacenter_id(&self) -> u8;

    /// Current counters keyed by exported metric name.
    fn metrics(&self) -> BTreeMap<&'static str, u64>;

    fn reset_metrics(&self);

    /// Number of IDs issued since construction or the last reset.
    fn id_count(&self) -> u64;

    /// Validates and decodes an ID.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidSnowflakeId`] for structurally invalid
    /// IDs.
    fn parse_id(&self, id: SnowflakeId) -> Result<IdInfo>;

    /// Checks that an ID is structurally valid.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidSnowflakeId`] for structurally invalid
    /// IDs.
    fn validate_id(&self, id: SnowflakeId) -> Result<()>;
}
