//! Registration keys.
//!
//! A key is the triple (registered type, name, container). [`Key<T>`] carries the
//! registered type statically; [`AnyKey`] is its type-erased form, suitable for
//! heterogeneous sets and maps. Both hash and compare on the same triple, and an
//! `AnyKey` can be narrowed back to a `Key<T>` when its registered type is `T`.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::{IntoTag, Tag};

/// Identity of a registered contract type.
///
/// Equality and hashing use the `TypeId` only; the name is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct RegisteredType {
    id: TypeId,
    name: &'static str,
}

impl RegisteredType {
    /// The registered type for `T`, which may be unsized (e.g. `dyn Trait`).
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for RegisteredType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RegisteredType {}

impl Hash for RegisteredType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for RegisteredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for RegisteredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Type-erased registration key.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct AnyKey {
    registered_type: RegisteredType,
    name: Tag,
    container: Tag,
}

impl AnyKey {
    pub fn new(
        registered_type: RegisteredType,
        name: impl IntoTag,
        container: impl IntoTag,
    ) -> Self {
        Self {
            registered_type,
            name: name.into_tag(),
            container: container.into_tag(),
        }
    }

    pub fn registered_type(&self) -> RegisteredType {
        self.registered_type
    }

    pub fn name(&self) -> &Tag {
        &self.name
    }

    pub fn container(&self) -> &Tag {
        &self.container
    }

    /// Narrows back to a typed key.
    ///
    /// Returns `None` when this key was registered for a type other than `T`.
    ///
    /// ```rust
    /// use factory_registry::{AnyKey, Key};
    ///
    /// let erased: AnyKey = Key::<String>::named("greeting").into();
    /// assert!(erased.narrow::<String>().is_some());
    /// assert!(erased.narrow::<u32>().is_none());
    /// ```
    pub fn narrow<T: ?Sized + 'static>(&self) -> Option<Key<T>> {
        self.registered_type.is::<T>().then(|| Key {
            erased: self.clone(),
            _marker: PhantomData,
        })
    }
}

impl fmt::Display for AnyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}@{}]",
            self.registered_type, self.name, self.container
        )
    }
}

/// Strongly-typed registration key for contract type `T`.
///
/// `T` is the type handed out on resolution as `Arc<T>`; it may be a trait object.
pub struct Key<T: ?Sized> {
    erased: AnyKey,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + 'static> Key<T> {
    /// Builds a key from a name and a container.
    ///
    /// Both accept any hashable value: strings, integers, UUIDs or your own enums.
    ///
    /// ```rust
    /// use factory_registry::Key;
    ///
    /// #[derive(Debug, PartialEq, Eq, Hash)]
    /// enum Container {
    ///     Dogs,
    ///     People,
    /// }
    ///
    /// let fido = Key::<String>::new("Fido", Container::Dogs);
    /// assert_eq!(fido, Key::new("Fido".to_string(), Container::Dogs));
    /// assert_ne!(fido, Key::new("Fido", Container::People));
    /// ```
    pub fn new(name: impl IntoTag, container: impl IntoTag) -> Self {
        Self {
            erased: AnyKey::new(RegisteredType::of::<T>(), name, container),
            _marker: PhantomData,
        }
    }

    /// Key with the given name in the default container.
    pub fn named(name: impl IntoTag) -> Self {
        Self::new(name, Tag::DEFAULT)
    }

    /// Key with the default name in the given container.
    pub fn in_container(container: impl IntoTag) -> Self {
        Self::new(Tag::DEFAULT, container)
    }

    pub fn with_name(mut self, name: impl IntoTag) -> Self {
        self.erased.name = name.into_tag();
        self
    }

    pub fn with_container(mut self, container: impl IntoTag) -> Self {
        self.erased.container = container.into_tag();
        self
    }

    pub fn name(&self) -> &Tag {
        self.erased.name()
    }

    pub fn container(&self) -> &Tag {
        self.erased.container()
    }

    pub fn registered_type(&self) -> RegisteredType {
        self.erased.registered_type()
    }

    pub fn erased(&self) -> &AnyKey {
        &self.erased
    }

    pub fn into_erased(self) -> AnyKey {
        self.erased
    }
}

impl<T: ?Sized + 'static> Default for Key<T> {
    fn default() -> Self {
        Self::new(Tag::DEFAULT, Tag::DEFAULT)
    }
}

impl<T: ?Sized> Clone for Key<T> {
    fn clone(&self) -> Self {
        Self {
            erased: self.erased.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.erased == other.erased
    }
}

impl<T: ?Sized> Eq for Key<T> {}

impl<T: ?Sized> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.erased.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.erased).finish()
    }
}

impl<T: ?Sized> fmt::Display for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.erased, f)
    }
}

impl<T: ?Sized> From<Key<T>> for AnyKey {
    fn from(key: Key<T>) -> Self {
        key.erased
    }
}

impl From<&AnyKey> for AnyKey {
    fn from(key: &AnyKey) -> Self {
        key.clone()
    }
}

impl<T: ?Sized> From<&Key<T>> for AnyKey {
    fn from(key: &Key<T>) -> Self {
        key.erased.clone()
    }
}
