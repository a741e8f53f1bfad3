//! Type-erased storage of registrations.
//!
//! The store maps each [`AnyKey`] to exactly one [`Registration`]. Every operation
//! runs under a single `RwLock` and returns owned snapshots, so callers never hold
//! the lock while running factories or user predicates.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::AnyKey;

/// A produced value, stored as the `Arc<T>` handed out on resolution.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// Opaque metadata attached at registration time.
pub(crate) type Metadata = Arc<dyn Any + Send + Sync>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Type-erased factory. `Ok(None)` means the parameter was not of the accepted type.
pub(crate) type Factory =
    Arc<dyn Fn(&dyn Any) -> Result<Option<Instance>, BoxError> + Send + Sync>;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Everything stored for one key: factory, cache policy, cache slot and metadata.
#[derive(Clone)]
pub struct Registration {
    factory: Factory,
    cached: bool,
    instance: Option<Instance>,
    metadata: Option<Metadata>,
    generation: u64,
}

impl Registration {
    pub(crate) fn new(factory: Factory, cached: bool, metadata: Option<Metadata>) -> Self {
        Self {
            factory,
            cached,
            instance: None,
            metadata,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Pre-populates the cache slot.
    pub(crate) fn with_instance(mut self, instance: Instance) -> Self {
        self.instance = Some(instance);
        self
    }

    pub fn is_cached(&self) -> bool {
        self.cached
    }

    pub fn has_cached_instance(&self) -> bool {
        self.instance.is_some()
    }

    pub(crate) fn cached_instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    pub(crate) fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn invoke(&self, parameter: &dyn Any) -> Result<Option<Instance>, BoxError> {
        (self.factory)(parameter)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("cached", &self.cached)
            .field("has_instance", &self.instance.is_some())
            .field("has_metadata", &self.metadata.is_some())
            .field("generation", &self.generation)
            .finish()
    }
}

/// Mapping from erased keys to registrations.
#[derive(Default)]
pub struct RegistrationStore {
    entries: RwLock<HashMap<AnyKey, Registration>>,
}

impl RegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Writes never leave the map half-updated; a poisoned lock is recovered.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<AnyKey, Registration>> {
        self.entries.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<AnyKey, Registration>> {
        self.entries.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Upserts, returning the registration that was replaced.
    pub(crate) fn put(&self, key: AnyKey, registration: Registration) -> Option<Registration> {
        self.write().insert(key, registration)
    }

    pub(crate) fn get(&self, key: &AnyKey) -> Option<Registration> {
        self.read().get(key).cloned()
    }

    /// Removes the given keys, counting only those that were present.
    pub(crate) fn remove(&self, keys: impl IntoIterator<Item = AnyKey>) -> usize {
        let mut entries = self.write();
        keys.into_iter()
            .filter(|key| entries.remove(key).is_some())
            .count()
    }

    pub(crate) fn clear(&self) -> usize {
        let mut entries = self.write();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Stores `instance` in the cache slot of the registration with `generation`.
    ///
    /// The first write wins: if the slot is already populated the existing instance is
    /// returned instead. If the registration was replaced or removed since it was read,
    /// nothing is stored and `instance` is returned as is.
    pub(crate) fn populate_cache(
        &self,
        key: &AnyKey,
        generation: u64,
        instance: Instance,
    ) -> Instance {
        let mut entries = self.write();
        match entries.get_mut(key) {
            Some(registration) if registration.generation == generation => registration
                .instance
                .get_or_insert(instance)
                .clone(),
            _ => instance,
        }
    }

    /// Snapshot of every key with its metadata, for filter scans.
    pub(crate) fn entries(&self) -> Vec<(AnyKey, Option<Metadata>)> {
        self.read()
            .iter()
            .map(|(key, registration)| (key.clone(), registration.metadata.clone()))
            .collect()
    }

    pub fn all_keys(&self) -> HashSet<AnyKey> {
        self.read().keys().cloned().collect()
    }

    pub fn contains(&self, key: &AnyKey) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl fmt::Debug for RegistrationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationStore")
            .field("len", &self.len())
            .finish()
    }
}
