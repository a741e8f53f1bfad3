//! An explicitly constructed registry.
//!
//! [`Registry`] owns its store and tracing slot, so several can coexist without
//! sharing anything. For process-wide registries see [`define_registry!`](crate::define_registry)
//! and [`global`](crate::global).
//!
//! # Examples
//!
//! ```
//! use factory_registry::{Filter, Key, Registry, RegistryApi};
//!
//! let registry = Registry::new();
//! registry.register(Key::<String>::new("lucy", "people")).value("Lucy".to_string());
//! registry.register(Key::<String>::new("fido", "dogs")).value("Fido".to_string());
//!
//! let people = registry.filter_keys::<String>(Filter::new().in_container("people"));
//! let names = registry.resolve_all(&people).unwrap();
//! assert_eq!(names.len(), 1);
//! assert_eq!(names[0].as_str(), "Lucy");
//! ```

use std::fmt;

use crate::{RegistrationStore, RegistryApi, TraceSlot};

/// A self-contained registry instance.
#[derive(Default)]
pub struct Registry {
    store: RegistrationStore,
    trace: TraceSlot,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistryApi for Registry {
    fn trace(&self) -> &TraceSlot {
        &self.trace
    }

    fn store(&self) -> &RegistrationStore {
        &self.store
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
