pub(crate) use parking_lot::{Mutex, RwLock};

#[cfg(feature = "cache-padded")]
pub(crate) type Padded<T> = crossbeam_utils::CachePadded<T>;

/// Identity wrapper used when the `cache-padded` feature is off.
#[cfg(not(feature = "cache-padded"))]
#[derive(Debug, Default)]
pub(crate) struct Padded<T>(T);

#[cfg(not(feature = "cache-padded"))]
impl<T> Padded<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self(value)
    }
}

#[cfg(not(feature = "cache-padded"))]
impl<T> core::ops::Deref for Padded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}
