use std::fmt;
use std::sync::{Arc, Mutex};

use crate::AnyKey;

/// Events emitted by a registry during operations.
///
/// These events are passed to the tracing callback set via `set_trace_callback`.
/// The `Clone` derive allows callbacks to store or forward events if needed.
///
/// # Examples
///
/// ```rust
/// use factory_registry::{Key, RegistryEvent};
///
/// let event = RegistryEvent::Register { key: Key::<i32>::default().into() };
/// assert_eq!(event.to_string(), "register { key: i32[default@default] }");
/// ```
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    /// A registration was stored (possibly replacing an earlier one).
    Register {
        /// The key the registration was stored under
        key: AnyKey,
    },

    /// A key was resolved.
    Resolve {
        /// The key that was resolved
        key: AnyKey,
        /// Whether a value of the requested type came back
        found: bool,
        /// Whether the value came from the cache slot
        cached: bool,
    },

    /// Keys were unregistered.
    Unregister {
        /// Number of keys passed in
        requested: usize,
        /// Number of registrations that existed and were removed
        removed: usize,
    },

    /// The registry was cleared.
    Clear {
        /// Number of registrations removed
        removed: usize,
    },
}

impl fmt::Display for RegistryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryEvent::Register { key } => write!(f, "register {{ key: {key} }}"),
            RegistryEvent::Resolve { key, found, cached } => write!(
                f,
                "resolve {{ key: {key}, found: {found}, cached: {cached} }}"
            ),
            RegistryEvent::Unregister { requested, removed } => write!(
                f,
                "unregister {{ requested: {requested}, removed: {removed} }}"
            ),
            RegistryEvent::Clear { removed } => write!(f, "clear {{ removed: {removed} }}"),
        }
    }
}

/// User-supplied tracing callback.
///
/// It receives every event a registry emits and must be thread-safe because
/// registries are shared across threads.
pub type TraceCallback = dyn Fn(&RegistryEvent) + Send + Sync + 'static;

/// Slot holding a registry's optional tracing callback.
pub type TraceSlot = Mutex<Option<Arc<TraceCallback>>>;
