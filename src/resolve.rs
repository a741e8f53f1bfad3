//! Per-call resolution options.

use std::any::Any;

/// Options for a single resolution.
///
/// ```rust
/// use factory_registry::ResolveOptions;
///
/// let name = "Brutus".to_string();
/// let options = ResolveOptions::new().parameter(&name).cached(false);
/// assert_eq!(options.cache_override(), Some(false));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions<'p> {
    parameter: Option<&'p dyn Any>,
    cached: Option<bool>,
}

impl<'p> ResolveOptions<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value handed to the factory. Factories that take a parameter of another type
    /// produce nothing.
    pub fn parameter<P: Any>(mut self, parameter: &'p P) -> Self {
        self.parameter = Some(parameter);
        self
    }

    /// Overrides the registration's cache policy for this call only.
    ///
    /// `false` forces the factory to run but leaves an existing cached instance in
    /// place for later cached resolutions.
    pub fn cached(mut self, cached: bool) -> Self {
        self.cached = Some(cached);
        self
    }

    pub fn cache_override(&self) -> Option<bool> {
        self.cached
    }

    /// The parameter, or `()` when none was given.
    pub(crate) fn parameter_ref(&self) -> &'p dyn Any {
        self.parameter.unwrap_or(&())
    }
}
