use thiserror::Error;

use crate::AnyKey;

/// Failures surfaced by resolution.
///
/// Absence and type mismatch are not errors; they resolve to `None`. The only
/// condition reported here is a factory that failed while producing a value.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("factory for {key} failed: {source}")]
    Factory {
        key: AnyKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RegistryError {
    /// The key whose factory failed.
    pub fn key(&self) -> &AnyKey {
        match self {
            RegistryError::Factory { key, .. } => key,
        }
    }
}
