use std::{collections::HashMap, sync::Arc};

#[cfg(feature = "tracing")]
use tracing::{debug, instrument};

use crate::{
    Error, Factory, FactoryConfig, FactoryRegistry, Generator, GeneratorType, Result,
    generator::mutex::RwLock,
};

/// Capacity of an [`InstanceRegistry`] unless configured otherwise.
pub const DEFAULT_MAX_GENERATORS: usize = 100;

/// Hard ceiling for [`InstanceRegistry::set_max_generators`].
pub const MAX_GENERATORS_LIMIT: usize = 100_000;

/// Longest accepted registry key, in bytes.
pub const MAX_KEY_LEN: usize = 256;

/// Checks that `key` is non-empty, at most [`MAX_KEY_LEN`] bytes, and only
/// uses `[a-zA-Z0-9_\-.]`.
///
/// # Errors
///
/// Returns [`Error::InvalidKey`] for an empty key and
/// [`Error::InvalidKeyFormat`] otherwise.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey);
    }
    let well_formed = key.len() <= MAX_KEY_LEN
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
    if !well_formed {
        return Err(Error::InvalidKeyFormat {
            key: key.to_owned(),
        });
    }
    Ok(())
}

struct Instances {
    generators: HashMap<String, Arc<dyn Generator>>,
    max_generators: usize,
}

/// Named, capacity-bounded set of live generators.
///
/// One read-write lock guards the whole map: lookups share it, and every
/// mutation (including the miss path of [`Self::get_or_create`]) is
/// serialized.
pub struct InstanceRegistry {
    factories: Arc<FactoryRegistry>,
    inner: RwLock<Instances>,
}

impl InstanceRegistry {
    /// An empty registry that builds generators with `factories` and holds up
    /// to [`DEFAULT_MAX_GENERATORS`] of them.
    pub fn new(factories: Arc<FactoryRegistry>) -> Self {
        Self {
            factories,
            inner: RwLock::new(Instances {
                generators: HashMap::new(),
                max_generators: DEFAULT_MAX_GENERATORS,
            }),
        }
    }

    /// Sets the capacity at construction.
    ///
    /// # Errors
    ///
    /// See [`Self::set_max_generators`].
    pub fn with_max_generators(self, max: usize) -> Result<Self> {
        self.set_max_generators(max)?;
        Ok(self)
    }

    pub fn max_generators(&self) -> usize {
        self.inner.read().max_generators
    }

    /// Changes the capacity. Lowering it below the current count keeps the
    /// existing generators but refuses new ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] unless `1 <= max <= MAX_GENERATORS_LIMIT`.
    pub fn set_max_generators(&self, max: usize) -> Result<()> {
        if max == 0 || max > MAX_GENERATORS_LIMIT {
            return Err(Error::invalid_config(format!(
                "max generators {max} outside [1, {MAX_GENERATORS_LIMIT}]"
            )));
        }
        self.inner.write().max_generators = max;
        Ok(())
    }

    /// Builds a generator and stores it under `key`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidKey`] / [`Error::InvalidKeyFormat`] for a bad key
    /// - [`Error::FactoryNotFound`] if no factory handles `ty`
    /// - [`Error::GeneratorAlreadyExists`] if `key` is taken
    /// - [`Error::MaxGeneratorsReached`] if the registry is full
    /// - the factory's error if the config is rejected
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, config)))]
    pub fn create(
        &self,
        key: &str,
        ty: GeneratorType,
        config: &FactoryConfig,
    ) -> Result<Arc<dyn Generator>> {
        validate_key(key)?;
        let factory = self.factories.get(ty)?;

        let mut inner = self.inner.write();
        if inner.generators.contains_key(key) {
            return Err(Error::GeneratorAlreadyExists {
                key: key.to_owned(),
            });
        }
        Self::insert(&mut inner, key, factory.as_ref(), config)
    }

    /// Returns the generator under `key`, creating it if absent.
    ///
    /// Creation happens at most once per key: concurrent first calls
    /// serialize on the write lock and all receive the same instance.
    ///
    /// # Errors
    ///
    /// As [`Self::create`], except that an existing key is not an error.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, config)))]
    pub fn get_or_create(
        &self,
        key: &str,
        ty: GeneratorType,
        config: &FactoryConfig,
    ) -> Result<Arc<dyn Generator>> {
        validate_key(key)?;
        if let Some(generator) = self.inner.read().generators.get(key) {
            return Ok(Arc::clone(generator));
        }

        let factory = self.factories.get(ty)?;
        let mut inner = self.inner.write();
        if let Some(generator) = inner.generators.get(key) {
            return Ok(Arc::clone(generator));
        }
        Self::insert(&mut inner, key, factory.as_ref(), config)
    }

    fn insert(
        inner: &mut Instances,
        key: &str,
        factory: &dyn Factory,
        config: &FactoryConfig,
    ) -> Result<Arc<dyn Generator>> {
        if inner.generators.len() >= inner.max_generators {
            return Err(Error::MaxGeneratorsReached {
                max: inner.max_generators,
            });
        }
        let generator = factory.create(config)?;
        inner
            .generators
            .insert(key.to_owned(), Arc::clone(&generator));
        #[cfg(feature = "tracing")]
        debug!(key, count = inner.generators.len(), "generator registered");
        Ok(generator)
    }

    /// # Errors
    ///
    /// Returns [`Error::GeneratorNotFound`] if `key` is not registered.
    pub fn get(&self, key: &str) -> Result<Arc<dyn Generator>> {
        self.inner
            .read()
            .generators
            .get(key)
            .cloned()
            .ok_or_else(|| Error::GeneratorNotFound {
                key: key.to_owned(),
            })
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.read().generators.contains_key(key)
    }

    /// Removes and returns the generator under `key`. Callers still holding
    /// the generator may keep using it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GeneratorNotFound`] if `key` is not registered.
    pub fn remove(&self, key: &str) -> Result<Arc<dyn Generator>> {
        let removed = self.inner.write().generators.remove(key);
        match removed {
            Some(generator) => {
                #[cfg(feature = "tracing")]
                debug!(key, "generator removed");
                Ok(generator)
            }
            None => Err(Error::GeneratorNotFound {
                key: key.to_owned(),
            }),
        }
    }

    /// Removes every generator, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.write();
        let count = inner.generators.len();
        inner.generators.clear();
        #[cfg(feature = "tracing")]
        debug!(count, "registry cleared");
        count
    }

    pub fn count(&self) -> usize {
        self.inner.read().generators.len()
    }

    /// Registered keys in ascending order.
    pub fn list_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.inner.read().generators.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }
}

impl Default for InstanceRegistry {
    fn default() -> Self {
        Self::new(Arc::new(FactoryRegistry::new()))
    }
}
