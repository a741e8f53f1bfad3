//! # Factory Registry
//!
//! A thread-safe registry of factories and instances, addressed by keys.
//!
//! A [`Key<T>`] combines the type a registration produces with a name and a container
//! tag. Each key holds one registration: a factory (optionally taking a parameter),
//! a caching policy and optional metadata. Registrations can be looked up one at a
//! time or in bulk through a [`Filter`] on type, name, container and metadata.
//!
//! ## Quick Start
//!
//! ```rust
//! use factory_registry::{global, Key, ResolveOptions};
//! use std::sync::Arc;
//!
//! let key = global::register(Key::<String>::in_container("dogs"))
//!     .cached(true)
//!     .factory_with(|name: &String| Arc::new(format!("a dog called {name}")));
//!
//! let name = "Fido".to_string();
//! let dog = global::resolve_with(&key, &ResolveOptions::new().parameter(&name))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(dog.as_str(), "a dog called Fido");
//! ```
//!
//! ## Features
//!
//! - **Thread-safe**: Registration and resolution can happen from any thread
//! - **Re-entrant**: Factories may resolve other keys from the same registry
//! - **Trait objects**: `Key<dyn Trait>` registers implementations behind a contract
//! - **Tracing support**: `tracing` spans plus an optional per-registry event callback
//!
//! ## Registries
//!
//! - [`global`] - The process-wide default registry
//! - [`define_registry!`] - Declare another process-wide registry
//! - [`Registry`] - An owned registry, e.g. one per test

#[macro_use]
mod macros;

pub mod filter;
mod key;
mod registrar;
mod registry;
mod registry_error;
mod registry_event;
mod registry_trait;
mod resolve;
mod store;
mod tag;

pub use filter::Filter;
pub use key::{AnyKey, Key, RegisteredType};
pub use registrar::Registrar;
pub use registry::Registry;
pub use registry_error::RegistryError;
pub use registry_event::{RegistryEvent, TraceCallback, TraceSlot};
pub use registry_trait::RegistryApi;
pub use resolve::ResolveOptions;
pub use store::{Registration, RegistrationStore};
pub use tag::{IntoTag, Tag};

define_registry!(
    /// The process-wide default registry.
    ///
    /// Tests touching it should run serially and `clear()` it first.
    global
);
