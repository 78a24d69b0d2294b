use std::{collections::HashMap, sync::Arc};

#[cfg(feature = "tracing")]
use tracing::debug;

use crate::{
    Error, Factory, GeneratorType, Parser, Result, SnowflakeFactory, SnowflakeParser,
    SnowflakeValidator, Validator, generator::mutex::RwLock,
};

/// An implementation that can be stored in a [`TypeRegistry`].
///
/// Implemented for `dyn Factory`, `dyn Parser` and `dyn Validator`.
pub trait Registrable: Send + Sync {
    /// Human-readable name used in logs.
    const KIND: &'static str;

    /// The family the implementation declares itself as.
    fn registered_type(&self) -> GeneratorType;

    /// The lookup-miss error for this kind of registry.
    fn not_found(ty: GeneratorType) -> Error;
}

impl Registrable for dyn Factory {
    const KIND: &'static str = "factory";

    fn registered_type(&self) -> GeneratorType {
        self.generator_type()
    }

    fn not_found(ty: GeneratorType) -> Error {
        Error::FactoryNotFound(ty)
    }
}

impl Registrable for dyn Parser {
    const KIND: &'static str = "parser";

    fn registered_type(&self) -> GeneratorType {
        self.generator_type()
    }

    fn not_found(ty: GeneratorType) -> Error {
        Error::ParserNotFound(ty)
    }
}

impl Registrable for dyn Validator {
    const KIND: &'static str = "validator";

    fn registered_type(&self) -> GeneratorType {
        self.generator_type()
    }

    fn not_found(ty: GeneratorType) -> Error {
        Error::ValidatorNotFound(ty)
    }
}

/// A map from [`GeneratorType`] to one shared implementation.
///
/// Reads take a shared lock and run concurrently; registration takes the
/// exclusive lock. Registering a type that is already present replaces the
/// previous implementation.
pub struct TypeRegistry<T: ?Sized + Registrable> {
    entries: RwLock<HashMap<GeneratorType, Arc<T>>>,
}

pub type FactoryRegistry = TypeRegistry<dyn Factory>;
pub type ParserRegistry = TypeRegistry<dyn Parser>;
pub type ValidatorRegistry = TypeRegistry<dyn Validator>;

impl<T: ?Sized + Registrable> TypeRegistry<T> {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `imp` under the type it declares, returning the
    /// implementation it replaced.
    pub fn register(&self, imp: Arc<T>) -> Option<Arc<T>> {
        let ty = imp.registered_type();
        let previous = self.entries.write().insert(ty, imp);
        #[cfg(feature = "tracing")]
        debug!(
            kind = T::KIND,
            %ty,
            replaced = previous.is_some(),
            "registered implementation"
        );
        previous
    }

    /// Looks up the implementation for `ty`.
    ///
    /// # Errors
    ///
    /// Returns the registry's not-found error (e.g.
    /// [`Error::FactoryNotFound`]) if nothing is registered for `ty`.
    pub fn get(&self, ty: GeneratorType) -> Result<Arc<T>> {
        self.entries
            .read()
            .get(&ty)
            .cloned()
            .ok_or_else(|| T::not_found(ty))
    }

    pub fn has(&self, ty: GeneratorType) -> bool {
        self.entries.read().contains_key(&ty)
    }

    /// Removes the implementation for `ty`, if any.
    pub fn unregister(&self, ty: GeneratorType) -> Option<Arc<T>> {
        self.entries.write().remove(&ty)
    }

    /// Registered types in ascending order.
    pub fn types(&self) -> Vec<GeneratorType> {
        let mut types: Vec<_> = self.entries.read().keys().copied().collect();
        types.sort_unstable();
        types
    }
}

impl FactoryRegistry {
    /// A registry preloaded with [`SnowflakeFactory`].
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register(Arc::new(SnowflakeFactory::new()));
        registry
    }
}

impl ParserRegistry {
    /// A registry preloaded with [`SnowflakeParser`].
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register(Arc::new(SnowflakeParser::new()));
        registry
    }
}

impl ValidatorRegistry {
    /// A registry preloaded with [`SnowflakeValidator`].
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register(Arc::new(SnowflakeValidator::new()));
        registry
    }
}

impl Default for FactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
