//! Core trait defining registry behavior.
//!
//! This module provides the `RegistryApi` trait with default implementations for
//! registration, resolution, filtering and tracing.
//!
//! The registry is key-based: each (type, name, container) triple holds at most one
//! registration. Registering under an existing key replaces the previous
//! registration, including its cached instance.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::filter::{self, Filter};
use crate::registrar::{parameterized, Registrar};
use crate::store::{Metadata, Registration};
use crate::{
    AnyKey, Key, RegistrationStore, RegistryError, RegistryEvent, ResolveOptions, TraceSlot,
};

/// Core trait defining registry behavior.
///
/// Provides default implementations for all registry operations, requiring only
/// two accessor methods (`store` and `trace`) to be implemented by the implementor.
///
/// No method holds the store lock while running user code: factories, metafilters
/// and trace callbacks may all call back into the same registry.
pub trait RegistryApi {
    // -------------------------------------------------------------------------------------------------
    // Tracing
    // -------------------------------------------------------------------------------------------------

    /// Access the trace callback slot.
    fn trace(&self) -> &TraceSlot;

    /// Set a tracing callback for registry operations.
    ///
    /// The callback is invoked for every register, resolve, unregister and clear.
    /// It runs without any registry lock held.
    fn set_trace_callback(&self, callback: impl Fn(&RegistryEvent) + Send + Sync + 'static) {
        let mut guard = self.trace().lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some(Arc::new(callback));
    }

    /// Clear the tracing callback.
    ///
    /// Registered values are not affected.
    fn clear_trace_callback(&self) {
        let mut guard = self.trace().lock().unwrap_or_else(|p| p.into_inner());
        *guard = None;
    }

    /// Emit a registry event using the current callback, if any.
    ///
    /// # Panics
    ///
    /// If the callback itself panics, the panic will propagate to the caller.
    fn emit_event(&self, event: &RegistryEvent) {
        let callback = self
            .trace()
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }

    // -------------------------------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------------------------------

    /// Access the registration store.
    fn store(&self) -> &RegistrationStore;

    /// Start a registration under `key`.
    ///
    /// The returned [`Registrar`] stores nothing until one of its terminal methods is
    /// called. An existing registration under an equal key is replaced.
    ///
    /// ```rust
    /// use factory_registry::{Key, Registry, RegistryApi};
    ///
    /// let registry = Registry::new();
    /// let key = registry.register(Key::<u16>::named("port")).value(8080);
    /// assert_eq!(*registry.resolve(&key).unwrap().unwrap(), 8080);
    /// ```
    fn register<T>(&self, key: Key<T>) -> Registrar<'_, Self, T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Registrar::new(self, key)
    }

    /// Register one parameterized factory under several keys.
    ///
    /// Each key gets its own registration and cache slot. The registrations carry
    /// no metadata; use [`RegistryApi::register`] per key to attach some.
    fn register_keys<T, P, F>(
        &self,
        keys: impl IntoIterator<Item = Key<T>>,
        cached: bool,
        factory: F,
    ) -> HashSet<Key<T>>
    where
        T: ?Sized + Send + Sync + 'static,
        P: Any,
        F: Fn(&P) -> Arc<T> + Send + Sync + 'static,
    {
        let factory = parameterized(factory);
        keys.into_iter()
            .map(|key| {
                let registration = Registration::new(factory.clone(), cached, None);
                store_registration(self, key.erased().clone(), registration);
                key
            })
            .collect()
    }

    /// Remove the registrations stored under `keys`.
    ///
    /// Returns how many registrations existed and were removed; unknown keys are
    /// not counted.
    fn unregister<K>(&self, keys: impl IntoIterator<Item = K>) -> usize
    where
        K: Into<AnyKey>,
    {
        let keys: Vec<AnyKey> = keys.into_iter().map(Into::into).collect();
        let requested = keys.len();
        let removed = self.store().remove(keys);
        debug!(requested, removed, "unregistered");
        self.emit_event(&RegistryEvent::Unregister { requested, removed });
        removed
    }

    /// Remove every registration, returning how many there were.
    ///
    /// Already-resolved `Arc<T>` values stay valid. The tracing callback is kept.
    fn clear(&self) -> usize {
        let removed = self.store().clear();
        debug!(removed, "cleared registry");
        self.emit_event(&RegistryEvent::Clear { removed });
        removed
    }

    fn contains(&self, key: &AnyKey) -> bool {
        self.store().contains(key)
    }

    fn len(&self) -> usize {
        self.store().len()
    }

    fn is_empty(&self) -> bool {
        self.store().is_empty()
    }

    // -------------------------------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------------------------------

    /// Resolve `key` with no parameter and the registration's own cache policy.
    ///
    /// Returns `Ok(None)` if nothing is registered under `key` or the registration
    /// does not produce a `T`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Factory`] if the registered factory fails.
    fn resolve<T>(&self, key: &Key<T>) -> Result<Option<Arc<T>>, RegistryError>
    where
        T: ?Sized + 'static,
    {
        self.resolve_with(key, &ResolveOptions::new())
    }

    /// Resolve `key` with a parameter and/or a cache override.
    ///
    /// ```rust
    /// use factory_registry::{Key, Registry, RegistryApi, ResolveOptions};
    /// use std::sync::Arc;
    ///
    /// let registry = Registry::new();
    /// let key = registry
    ///     .register(Key::<String>::in_container("dogs"))
    ///     .factory_with(|name: &String| Arc::new(format!("dog {name}")));
    ///
    /// let name = "Brutus".to_string();
    /// let dog = registry
    ///     .resolve_with(&key, &ResolveOptions::new().parameter(&name))
    ///     .unwrap();
    /// assert_eq!(dog.as_deref().map(String::as_str), Some("dog Brutus"));
    /// ```
    fn resolve_with<T>(
        &self,
        key: &Key<T>,
        options: &ResolveOptions<'_>,
    ) -> Result<Option<Arc<T>>, RegistryError>
    where
        T: ?Sized + 'static,
    {
        resolve_key(self, key.erased(), options, |_| true)
    }

    /// Resolve through a type-erased key, keeping the value only if it is a `T`.
    fn resolve_any<T>(
        &self,
        key: &AnyKey,
        options: &ResolveOptions<'_>,
    ) -> Result<Option<Arc<T>>, RegistryError>
    where
        T: ?Sized + 'static,
    {
        resolve_key(self, key, options, |_| true)
    }

    /// Resolve `key` only if its metadata is an `M` equal to `expected`.
    ///
    /// Metadata that is absent, of another type, or unequal yields `Ok(None)` without
    /// invoking the factory.
    fn resolve_matching<T, M>(
        &self,
        key: &Key<T>,
        options: &ResolveOptions<'_>,
        expected: &M,
    ) -> Result<Option<Arc<T>>, RegistryError>
    where
        T: ?Sized + 'static,
        M: PartialEq + Any,
    {
        self.resolve_matching_by(key, options, expected, M::eq)
    }

    /// Like [`RegistryApi::resolve_matching`] with a caller-supplied equality.
    fn resolve_matching_by<T, M, F>(
        &self,
        key: &Key<T>,
        options: &ResolveOptions<'_>,
        expected: &M,
        eq: F,
    ) -> Result<Option<Arc<T>>, RegistryError>
    where
        T: ?Sized + 'static,
        M: Any,
        F: Fn(&M, &M) -> bool,
    {
        resolve_key(self, key.erased(), options, |metadata| {
            filter::matches(metadata.map(|metadata| metadata.as_ref()), |actual: &M| {
                eq(actual, expected)
            })
        })
    }

    /// Resolve and clone the value out of its `Arc`.
    fn resolve_cloned<T>(&self, key: &Key<T>) -> Result<Option<T>, RegistryError>
    where
        T: Clone + 'static,
    {
        Ok(self.resolve(key)?.map(|value| (*value).clone()))
    }

    /// Resolve every key, dropping keys that produce nothing.
    ///
    /// # Errors
    ///
    /// The first factory failure is returned; remaining keys are not resolved.
    fn resolve_all<'k, T>(
        &self,
        keys: impl IntoIterator<Item = &'k Key<T>>,
    ) -> Result<Vec<Arc<T>>, RegistryError>
    where
        T: ?Sized + 'static,
    {
        let mut resolved = Vec::new();
        for key in keys {
            resolved.extend(self.resolve(key)?);
        }
        Ok(resolved)
    }

    /// Resolve every erased key as a `T`, dropping keys whose value is not a `T`.
    fn resolve_all_any<'k, T>(
        &self,
        keys: impl IntoIterator<Item = &'k AnyKey>,
    ) -> Result<Vec<Arc<T>>, RegistryError>
    where
        T: ?Sized + 'static,
    {
        let options = ResolveOptions::new();
        let mut resolved = Vec::new();
        for key in keys {
            resolved.extend(self.resolve_any(key, &options)?);
        }
        Ok(resolved)
    }

    /// Resolve every key into a map from key to value, dropping keys that produce nothing.
    fn resolve_map<'k, T>(
        &self,
        keys: impl IntoIterator<Item = &'k Key<T>>,
    ) -> Result<HashMap<Key<T>, Arc<T>>, RegistryError>
    where
        T: ?Sized + 'static,
    {
        let mut resolved = HashMap::new();
        for key in keys {
            if let Some(value) = self.resolve(key)? {
                resolved.insert(key.clone(), value);
            }
        }
        Ok(resolved)
    }

    // -------------------------------------------------------------------------------------------------
    // Queries and metadata
    // -------------------------------------------------------------------------------------------------

    /// Keys of every registration matching `filter`.
    ///
    /// The metafilter runs on a snapshot, outside the store lock.
    fn filter(&self, filter: &Filter) -> HashSet<AnyKey> {
        filter.apply(self.store().entries())
    }

    /// Typed keys of every `T` registration matching `filter`.
    ///
    /// Any type set on `filter` is replaced by `T`.
    fn filter_keys<T>(&self, filter: Filter) -> HashSet<Key<T>>
    where
        T: ?Sized + 'static,
    {
        self.filter(&filter.of_type::<T>())
            .iter()
            .filter_map(AnyKey::narrow::<T>)
            .collect()
    }

    /// Every registered key.
    fn keys(&self) -> HashSet<AnyKey> {
        self.store().all_keys()
    }

    /// Metadata attached to `key`, if it is an `M`.
    fn metadata<M>(&self, key: &AnyKey) -> Option<Arc<M>>
    where
        M: Any + Send + Sync,
    {
        self.metadata_any(key)?.downcast::<M>().ok()
    }

    /// Metadata attached to `key`, untyped.
    fn metadata_any(&self, key: &AnyKey) -> Option<Arc<dyn Any + Send + Sync>> {
        self.store().get(key)?.metadata().cloned()
    }
}

/// Stores `registration`, logging and emitting the register event.
pub(crate) fn store_registration<R>(registry: &R, key: AnyKey, registration: Registration)
where
    R: RegistryApi + ?Sized,
{
    let cached = registration.is_cached();
    let replaced = registry.store().put(key.clone(), registration);
    debug!(key = %key, cached, replaced = replaced.is_some(), "registered");
    registry.emit_event(&RegistryEvent::Register { key });
}

/// The resolution algorithm shared by every `resolve*` method.
///
/// The store lock is held only while taking the registration snapshot and while
/// populating the cache slot; the factory runs in between with no lock held.
fn resolve_key<R, T>(
    registry: &R,
    key: &AnyKey,
    options: &ResolveOptions<'_>,
    gate: impl FnOnce(Option<&Metadata>) -> bool,
) -> Result<Option<Arc<T>>, RegistryError>
where
    R: RegistryApi + ?Sized,
    T: ?Sized + 'static,
{
    let Some(registration) = registry.store().get(key) else {
        trace!(key = %key, "nothing registered");
        registry.emit_event(&RegistryEvent::Resolve {
            key: key.clone(),
            found: false,
            cached: false,
        });
        return Ok(None);
    };

    if !gate(registration.metadata()) {
        trace!(key = %key, "metadata did not match");
        registry.emit_event(&RegistryEvent::Resolve {
            key: key.clone(),
            found: false,
            cached: false,
        });
        return Ok(None);
    }

    let caching = options
        .cache_override()
        .unwrap_or_else(|| registration.is_cached());

    let (instance, from_cache) = match registration.cached_instance() {
        Some(instance) if caching => (Some(instance.clone()), true),
        _ => {
            trace!(key = %key, caching, "invoking factory");
            let produced = registration
                .invoke(options.parameter_ref())
                .map_err(|source| {
                    debug!(key = %key, error = %source, "factory failed");
                    RegistryError::Factory {
                        key: key.clone(),
                        source,
                    }
                })?;
            match produced {
                Some(instance) if caching => {
                    let instance =
                        registry
                            .store()
                            .populate_cache(key, registration.generation(), instance);
                    (Some(instance), false)
                }
                Some(instance) => (Some(instance), false),
                None => {
                    trace!(key = %key, "factory did not accept the parameter");
                    (None, false)
                }
            }
        }
    };

    let resolved = instance.and_then(|instance| instance.downcast_ref::<Arc<T>>().cloned());
    if resolved.is_none() {
        trace!(key = %key, target = std::any::type_name::<T>(), "no value of the requested type");
    }

    registry.emit_event(&RegistryEvent::Resolve {
        key: key.clone(),
        found: resolved.is_some(),
        cached: from_cache,
    });

    Ok(resolved)
}
