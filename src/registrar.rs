//! Builder for registrations.

use std::any::Any;
use std::sync::Arc;

use crate::registry_trait::store_registration;
use crate::store::{BoxError, Factory, Instance, Metadata, Registration};
use crate::{Key, RegistryApi};

pub(crate) fn erase<T: ?Sized + Send + Sync + 'static>(instance: Arc<T>) -> Instance {
    Arc::new(instance)
}

/// Wraps a factory taking a `&P` so that any other parameter type produces nothing.
pub(crate) fn parameterized<T, P, F>(factory: F) -> Factory
where
    T: ?Sized + Send + Sync + 'static,
    P: Any,
    F: Fn(&P) -> Arc<T> + Send + Sync + 'static,
{
    Arc::new(move |parameter: &dyn Any| {
        Ok::<_, BoxError>(parameter.downcast_ref::<P>().map(|p| erase(factory(p))))
    })
}

/// Collects the options of one registration.
///
/// Nothing is stored until a terminal method (`factory`, `factory_with`,
/// `try_factory_with`, `instance`, `value`, `default_value`) is called; each returns
/// the key to use for resolution and unregistration.
///
/// ```rust
/// use factory_registry::{Key, Registry, RegistryApi};
/// use std::sync::Arc;
///
/// let registry = Registry::new();
/// let key = registry
///     .register(Key::<String>::named("greeting"))
///     .cached(true)
///     .metadata(1u8)
///     .factory(|| Arc::new("hello".to_string()));
///
/// let greeting = registry.resolve(&key).unwrap().unwrap();
/// assert_eq!(greeting.as_str(), "hello");
/// ```
#[must_use = "a registration is stored only by a terminal method such as `factory`"]
pub struct Registrar<'r, R: ?Sized, T: ?Sized> {
    registry: &'r R,
    key: Key<T>,
    cached: bool,
    metadata: Option<Metadata>,
}

impl<'r, R, T> Registrar<'r, R, T>
where
    R: RegistryApi + ?Sized,
    T: ?Sized + Send + Sync + 'static,
{
    pub(crate) fn new(registry: &'r R, key: Key<T>) -> Self {
        Self {
            registry,
            key,
            cached: false,
            metadata: None,
        }
    }

    /// Memoize the first resolved instance. Off by default.
    pub fn cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }

    /// Attaches metadata used by filters and metadata-gated resolution.
    pub fn metadata<M: Any + Send + Sync>(mut self, metadata: M) -> Self {
        self.metadata = Some(Arc::new(metadata));
        self
    }

    /// Registers a parameterless factory. Any parameter passed at resolution is ignored.
    pub fn factory<F>(self, factory: F) -> Key<T>
    where
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.finish(Arc::new(move |_: &dyn Any| {
            Ok::<_, BoxError>(Some(erase(factory())))
        }))
    }

    /// Registers a factory taking a parameter of type `P`.
    pub fn factory_with<P, F>(self, factory: F) -> Key<T>
    where
        P: Any,
        F: Fn(&P) -> Arc<T> + Send + Sync + 'static,
    {
        self.finish(parameterized(factory))
    }

    /// Registers a fallible factory taking a parameter of type `P`.
    ///
    /// Errors surface from resolution as [`RegistryError::Factory`](crate::RegistryError::Factory).
    pub fn try_factory_with<P, E, F>(self, factory: F) -> Key<T>
    where
        P: Any,
        E: Into<BoxError>,
        F: Fn(&P) -> Result<Arc<T>, E> + Send + Sync + 'static,
    {
        self.finish(Arc::new(
            move |parameter: &dyn Any| -> Result<Option<Instance>, BoxError> {
                let Some(p) = parameter.downcast_ref::<P>() else {
                    return Ok(None);
                };
                match factory(p) {
                    Ok(instance) => Ok(Some(erase(instance))),
                    Err(err) => Err(err.into()),
                }
            },
        ))
    }

    /// Registers a pre-built instance. The registration is always cached.
    pub fn instance(self, instance: Arc<T>) -> Key<T> {
        let instance = erase(instance);
        let produced = instance.clone();
        let factory: Factory =
            Arc::new(move |_: &dyn Any| Ok::<_, BoxError>(Some(produced.clone())));
        let registration = Registration::new(factory, true, self.metadata).with_instance(instance);
        store_registration(self.registry, self.key.erased().clone(), registration);
        self.key
    }

    /// Registers an owned value, see [`Registrar::instance`].
    pub fn value(self, value: T) -> Key<T>
    where
        T: Sized,
    {
        self.instance(Arc::new(value))
    }

    /// Registers `T::default()` as the factory.
    pub fn default_value(self) -> Key<T>
    where
        T: Default,
    {
        self.factory(|| Arc::new(T::default()))
    }

    fn finish(self, factory: Factory) -> Key<T> {
        let registration = Registration::new(factory, self.cached, self.metadata);
        store_registration(self.registry, self.key.erased().clone(), registration);
        self.key
    }
}
