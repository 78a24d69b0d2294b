use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::debug;

use crate::{
    FactoryConfig, FactoryRegistry, Generator, GeneratorConfig, GeneratorType, IdInfo,
    InstanceRegistry, ParserRegistry, Result, SnowflakeId, ValidatorRegistry,
    generator::mutex::Mutex,
};

/// Owns one set of registries and wires them together.
///
/// A `Context` replaces process-wide singletons: create one at startup, share
/// it (usually behind an `Arc`), and hand it to whatever needs generators.
/// Independent contexts never observe each other's registrations, which also
/// keeps tests isolated.
///
/// # Example
///
/// ```
/// use snowgen::{Context, Generator, GeneratorConfig, GeneratorType};
///
/// let ctx = Context::new();
/// let orders = ctx
///     .instances()
///     .get_or_create("orders", GeneratorType::Snowflake, &GeneratorConfig::new(1, 2).into())
///     .unwrap();
/// let id = orders.next_id().unwrap();
/// assert_eq!(ctx.parse(GeneratorType::Snowflake, id).unwrap().worker_id, 2);
/// ```
pub struct Context {
    factories: Arc<FactoryRegistry>,
    parsers: ParserRegistry,
    validators: ValidatorRegistry,
    instances: InstanceRegistry,
    default_generator: Mutex<Option<Arc<dyn Generator>>>,
}

impl Context {
    /// A context with the built-in Snowflake factory, parser and validator
    /// registered and an empty instance registry.
    pub fn new() -> Self {
        Self::from_registries(
            Arc::new(FactoryRegistry::new()),
            ParserRegistry::new(),
            ValidatorRegistry::new(),
        )
    }

    /// Assembles a context from prepared registries. The instance registry
    /// builds its generators with `factories`.
    pub fn from_registries(
        factories: Arc<FactoryRegistry>,
        parsers: ParserRegistry,
        validators: ValidatorRegistry,
    ) -> Self {
        Self {
            instances: InstanceRegistry::new(Arc::clone(&factories)),
            factories,
            parsers,
            validators,
            default_generator: Mutex::new(None),
        }
    }

    /// Sets the instance registry's capacity.
    ///
    /// # Errors
    ///
    /// See [`InstanceRegistry::set_max_generators`].
    pub fn with_max_generators(self, max: usize) -> Result<Self> {
        self.instances.set_max_generators(max)?;
        Ok(self)
    }

    pub fn factories(&self) -> &FactoryRegistry {
        &self.factories
    }

    pub fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    pub fn validators(&self) -> &ValidatorRegistry {
        &self.validators
    }

    pub fn instances(&self) -> &InstanceRegistry {
        &self.instances
    }

    /// The context-wide default generator, a Snowflake generator built from
    /// [`GeneratorConfig::default`] on first use.
    ///
    /// The default generator is not stored in [`Self::instances`] and does not
    /// count against its capacity.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FactoryNotFound`] if the Snowflake factory was
    /// unregistered before first use.
    pub fn default_generator(&self) -> Result<Arc<dyn Generator>> {
        let mut slot = self.default_generator.lock();
        if let Some(generator) = slot.as_ref() {
            return Ok(Arc::clone(generator));
        }
        let generator = self.create_generator(
            GeneratorType::Snowflake,
            &GeneratorConfig::default().into(),
        )?;
        #[cfg(feature = "tracing")]
        debug!("default generator created");
        *slot = Some(Arc::clone(&generator));
        Ok(generator)
    }

    /// Builds an unregistered generator through the factory for `ty`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FactoryNotFound`] or the factory's error.
    pub fn create_generator(
        &self,
        ty: GeneratorType,
        config: &FactoryConfig,
    ) -> Result<Arc<dyn Generator>> {
        self.factories.get(ty)?.create(config)
    }

    /// Decodes `id` with the parser registered for `ty`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ParserNotFound`] or the parser's error.
    pub fn parse(&self, ty: GeneratorType, id: SnowflakeId) -> Result<IdInfo> {
        self.parsers.get(ty)?.parse(id)
    }

    /// Validates `id` with the validator registered for `ty`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ValidatorNotFound`] or the validator's error.
    pub fn validate(&self, ty: GeneratorType, id: SnowflakeId) -> Result<()> {
        self.validators.get(ty)?.validate(id)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Context {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Context")
            .field("factories", &self.factories.types())
            .field("parsers", &self.parsers.types())
            .field("validators", &self.validators.types())
            .field("instances", &self.instances.list_keys())
            .finish_non_exhaustive()
    }
}
