//! Macros for creating process-wide registries.
//!
//! This module provides a simple macro-based approach to create isolated,
//! lazily-initialized registries that live for the whole process.

/// Creates a process-wide registry with a single macro invocation.
///
/// The macro generates a module containing:
/// - Storage static (hidden), created on first use
/// - Trace callback static (hidden)
/// - An `Api` struct that implements `RegistryApi`, and its `API` instance
/// - Free functions forwarding to `API`
///
/// # Examples
///
/// ```rust
/// use factory_registry::{define_registry, Key};
/// use std::sync::Arc;
///
/// define_registry!(services);
///
/// let key = services::register(Key::<String>::named("greeting")).value("Hello".to_string());
/// let greeting: Arc<String> = services::resolve(&key).unwrap().unwrap();
/// assert_eq!(greeting.as_str(), "Hello");
///
/// assert_eq!(services::clear(), 1);
/// ```
///
/// # Multiple Registries
///
/// Each invocation creates a registry isolated from all others:
///
/// ```rust
/// use factory_registry::{define_registry, Key};
///
/// define_registry!(database);
/// define_registry!(cache);
///
/// let key = database::register(Key::<String>::default()).value("postgres".to_string());
///
/// assert!(database::contains(key.erased()));
/// assert!(!cache::contains(key.erased()));
/// ```
///
/// # Trait-Based Usage
///
/// The `API` static gives access to the full [`RegistryApi`](crate::RegistryApi):
///
/// ```rust
/// use factory_registry::{define_registry, Key, RegistryApi};
///
/// define_registry!(app);
///
/// let key = app::API.register(Key::<i32>::default()).value(100);
/// assert_eq!(*app::API.resolve(&key).unwrap().unwrap(), 100);
/// ```
#[macro_export]
macro_rules! define_registry {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub mod $name {
            use std::any::Any;
            use std::collections::{HashMap, HashSet};
            use std::sync::{Arc, LazyLock, Mutex};

            use $crate::{
                AnyKey, Filter, Key, Registrar, RegistrationStore, RegistryApi, RegistryError,
                RegistryEvent, ResolveOptions, TraceSlot,
            };

            // Storage for registrations (module-private)
            static STORE: LazyLock<RegistrationStore> = LazyLock::new(RegistrationStore::new);

            // Trace callback storage (module-private)
            static TRACE: TraceSlot = Mutex::new(None);

            /// Zero-sized type that implements the registry API.
            ///
            /// All registry operations are provided by the `RegistryApi` trait's
            /// default implementations. This struct only provides access to the statics.
            pub struct Api;

            impl RegistryApi for Api {
                fn trace(&self) -> &TraceSlot {
                    &TRACE
                }

                fn store(&self) -> &RegistrationStore {
                    &STORE
                }
            }

            /// The registry instance.
            pub static API: Api = Api;

            /// Start a registration under `key`.
            pub fn register<T>(key: Key<T>) -> Registrar<'static, Api, T>
            where
                T: ?Sized + Send + Sync + 'static,
            {
                API.register(key)
            }

            /// Register one parameterized factory under several keys.
            pub fn register_keys<T, P, F>(
                keys: impl IntoIterator<Item = Key<T>>,
                cached: bool,
                factory: F,
            ) -> HashSet<Key<T>>
            where
                T: ?Sized + Send + Sync + 'static,
                P: Any,
                F: Fn(&P) -> Arc<T> + Send + Sync + 'static,
            {
                API.register_keys(keys, cached, factory)
            }

            /// Remove the registrations stored under `keys`.
            pub fn unregister<K: Into<AnyKey>>(keys: impl IntoIterator<Item = K>) -> usize {
                API.unregister(keys)
            }

            /// Remove every registration.
            pub fn clear() -> usize {
                API.clear()
            }

            /// Check whether `key` is registered.
            pub fn contains(key: &AnyKey) -> bool {
                API.contains(key)
            }

            /// Number of registrations.
            pub fn len() -> usize {
                API.len()
            }

            /// Resolve `key` with default options.
            pub fn resolve<T: ?Sized + 'static>(
                key: &Key<T>,
            ) -> Result<Option<Arc<T>>, RegistryError> {
                API.resolve(key)
            }

            /// Resolve `key` with a parameter and/or cache override.
            pub fn resolve_with<T: ?Sized + 'static>(
                key: &Key<T>,
                options: &ResolveOptions<'_>,
            ) -> Result<Option<Arc<T>>, RegistryError> {
                API.resolve_with(key, options)
            }

            /// Resolve `key` only if its metadata equals `expected`.
            pub fn resolve_matching<T, M>(
                key: &Key<T>,
                options: &ResolveOptions<'_>,
                expected: &M,
            ) -> Result<Option<Arc<T>>, RegistryError>
            where
                T: ?Sized + 'static,
                M: PartialEq + Any,
            {
                API.resolve_matching(key, options, expected)
            }

            /// Resolve every key, dropping keys that produce nothing.
            pub fn resolve_all<'k, T: ?Sized + 'static>(
                keys: impl IntoIterator<Item = &'k Key<T>>,
            ) -> Result<Vec<Arc<T>>, RegistryError> {
                API.resolve_all(keys)
            }

            /// Resolve erased keys as `T`, dropping keys whose value is not a `T`.
            pub fn resolve_all_any<'k, T: ?Sized + 'static>(
                keys: impl IntoIterator<Item = &'k AnyKey>,
            ) -> Result<Vec<Arc<T>>, RegistryError> {
                API.resolve_all_any(keys)
            }

            /// Resolve every key into a map keyed by the originating key.
            pub fn resolve_map<'k, T: ?Sized + 'static>(
                keys: impl IntoIterator<Item = &'k Key<T>>,
            ) -> Result<HashMap<Key<T>, Arc<T>>, RegistryError> {
                API.resolve_map(keys)
            }

            /// Keys of every registration matching `filter`.
            pub fn filter(filter: &Filter) -> HashSet<AnyKey> {
                API.filter(filter)
            }

            /// Typed keys of every `T` registration matching `filter`.
            pub fn filter_keys<T: ?Sized + 'static>(filter: Filter) -> HashSet<Key<T>> {
                API.filter_keys(filter)
            }

            /// Metadata attached to `key`, if it is an `M`.
            pub fn metadata<M: Any + Send + Sync>(key: &AnyKey) -> Option<Arc<M>> {
                API.metadata(key)
            }

            /// Metadata attached to `key`, untyped.
            pub fn metadata_any(key: &AnyKey) -> Option<Arc<dyn Any + Send + Sync>> {
                API.metadata_any(key)
            }

            /// Set a tracing callback for registry operations.
            pub fn set_trace_callback(callback: impl Fn(&RegistryEvent) + Send + Sync + 'static) {
                API.set_trace_callback(callback)
            }

            /// Clear the tracing callback.
            pub fn clear_trace_callback() {
                API.clear_trace_callback()
            }
        }
    };
}
