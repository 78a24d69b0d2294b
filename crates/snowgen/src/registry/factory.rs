use core::{any::Any, fmt};
use std::sync::Arc;

use crate::{
    Error, Generator, GeneratorConfig, GeneratorType, Result, SnowflakeGenerator, SystemClock,
    TimeSource,
};

/// Input to a [`Factory`], tagged by the family it configures.
///
/// Built-in families get a typed variant. Application-defined factories
/// receive their own config type through [`FactoryConfig::Custom`] and
/// downcast it.
#[derive(Clone)]
pub enum FactoryConfig {
    Snowflake(GeneratorConfig),
    Custom(Arc<dyn Any + Send + Sync>),
}

impl FactoryConfig {
    /// Wraps an application-defined config value.
    pub fn custom<C: Any + Send + Sync>(config: C) -> Self {
        Self::Custom(Arc::new(config))
    }

    /// Returns the custom payload if it is a `C`.
    pub fn downcast_ref<C: Any>(&self) -> Option<&C> {
        match self {
            Self::Custom(any) => any.downcast_ref::<C>(),
            Self::Snowflake(_) => None,
        }
    }
}

impl From<GeneratorConfig> for FactoryConfig {
    fn from(config: GeneratorConfig) -> Self {
        Self::Snowflake(config)
    }
}

impl fmt::Debug for FactoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snowflake(config) => f.debug_tuple("Snowflake").field(config).finish(),
            Self::Custom(_) => f.debug_tuple("Custom").finish_non_exhaustive(),
        }
    }
}

/// Builds generators of one family.
pub trait Factory: Send + Sync {
    fn generator_type(&self) -> GeneratorType;

    /// Creates a new generator from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` is not this factory's
    /// config type, or the generator's own validation error.
    fn create(&self, config: &FactoryConfig) -> Result<Arc<dyn Generator>>;
}

/// Factory for [`SnowflakeGenerator`]s sharing one [`TimeSource`].
#[derive(Clone, Debug, Default)]
pub struct SnowflakeFactory<T = SystemClock> {
    time: T,
}

impl SnowflakeFactory {
    pub const fn new() -> Self {
        Self { time: SystemClock }
    }
}

impl<T> SnowflakeFactory<T>
where
    T: TimeSource + Clone + Send + Sync + 'static,
{
    /// A factory whose generators read `time`.
    pub fn with_time(time: T) -> Self {
        Self { time }
    }
}

impl<T> Factory for SnowflakeFactory<T>
where
    T: TimeSource + Clone + Send + Sync + 'static,
{
    fn generator_type(&self) -> GeneratorType {
        GeneratorType::Snowflake
    }

    fn create(&self, config: &FactoryConfig) -> Result<Arc<dyn Generator>> {
        let config = match config {
            FactoryConfig::Snowflake(config) => config,
            FactoryConfig::Custom(any) => any.downcast_ref::<GeneratorConfig>().ok_or_else(|| {
                Error::invalid_config("snowflake factory requires a GeneratorConfig")
            })?,
        };
        let generator = SnowflakeGenerator::with_time(config.clone(), self.time.clone())?;
        Ok(Arc::new(generator))
    }
}
