//! Registration queries.
//!
//! A [`Filter`] combines an optional structural part (registered type, name,
//! container) with an optional metafilter, a typed predicate over the metadata
//! attached to each registration. Omitted dimensions match everything.
//!
//! Metadata of a different type than the metafilter expects, or no metadata at all,
//! simply does not match.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::store::Metadata;
use crate::{AnyKey, IntoTag, RegisteredType, Tag};

type ErasedMetafilter = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> bool + Send + Sync>;

/// Evaluates `metafilter` against optional, type-erased metadata.
///
/// Returns `true` only if the metadata is present, is an `M`, and the predicate holds.
///
/// ```rust
/// use factory_registry::filter::matches;
/// use std::any::Any;
///
/// let coolness: Box<dyn Any + Send + Sync> = Box::new(7u32);
/// assert!(matches(Some(coolness.as_ref()), |c: &u32| *c > 1));
/// assert!(!matches(Some(coolness.as_ref()), |c: &i64| *c > 1));
/// assert!(!matches(None, |c: &u32| *c > 1));
/// ```
pub fn matches<M: Any>(
    metadata: Option<&(dyn Any + Send + Sync)>,
    metafilter: impl Fn(&M) -> bool,
) -> bool {
    metadata
        .and_then(|metadata| metadata.downcast_ref::<M>())
        .is_some_and(metafilter)
}

/// Query over registrations.
#[derive(Clone, Default)]
pub struct Filter {
    registered_type: Option<RegisteredType>,
    name: Option<Tag>,
    container: Option<Tag>,
    metafilter: Option<ErasedMetafilter>,
}

impl Filter {
    /// A filter matching every registration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_type<T: ?Sized + 'static>(self) -> Self {
        self.registered_type(RegisteredType::of::<T>())
    }

    pub fn registered_type(mut self, registered_type: RegisteredType) -> Self {
        self.registered_type = Some(registered_type);
        self
    }

    pub fn named(mut self, name: impl IntoTag) -> Self {
        self.name = Some(name.into_tag());
        self
    }

    pub fn in_container(mut self, container: impl IntoTag) -> Self {
        self.container = Some(container.into_tag());
        self
    }

    /// Restricts matches to registrations whose metadata is an `M` satisfying `predicate`.
    ///
    /// A predicate that always returns `true` selects every registration carrying
    /// metadata of type `M`. Setting a metafilter replaces any previous one.
    pub fn metafilter<M, F>(mut self, predicate: F) -> Self
    where
        M: Any,
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        self.metafilter = Some(Arc::new(move |metadata: &(dyn Any + Send + Sync)| {
            matches(Some(metadata), &predicate)
        }));
        self
    }

    /// Evaluates the structural part of the filter.
    pub fn matches_key(&self, key: &AnyKey) -> bool {
        self.registered_type
            .map_or(true, |registered_type| key.registered_type() == registered_type)
            && self.name.as_ref().map_or(true, |name| key.name() == name)
            && self
                .container
                .as_ref()
                .map_or(true, |container| key.container() == container)
    }

    pub fn has_metafilter(&self) -> bool {
        self.metafilter.is_some()
    }

    pub(crate) fn matches_metadata(&self, metadata: Option<&Metadata>) -> bool {
        match &self.metafilter {
            None => true,
            Some(metafilter) => metadata.is_some_and(|metadata| metafilter(metadata.as_ref())),
        }
    }

    /// Applies the filter to a store snapshot.
    pub(crate) fn apply(&self, entries: Vec<(AnyKey, Option<Metadata>)>) -> HashSet<AnyKey> {
        entries
            .into_iter()
            .filter(|(key, metadata)| {
                self.matches_key(key) && self.matches_metadata(metadata.as_ref())
            })
            .map(|(key, _)| key)
            .collect()
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("registered_type", &self.registered_type)
            .field("name", &self.name)
            .field("container", &self.container)
            .field("metafilter", &self.metafilter.is_some())
            .finish()
    }
}
