//! Integration tests for resolution: parameters, caching, trait objects and
//! factory failures.

use factory_registry::{Filter, Key, Registry, RegistryApi, RegistryError, ResolveOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait Animal: Send + Sync {
    fn name(&self) -> &str;
    fn sound(&self) -> &'static str;
}

#[derive(Debug)]
struct Dog {
    name: String,
}

impl Animal for Dog {
    fn name(&self) -> &str {
        &self.name
    }

    fn sound(&self) -> &'static str {
        "woof"
    }
}

struct Cat;

impl Animal for Cat {
    fn name(&self) -> &str {
        "Garfield"
    }

    fn sound(&self) -> &'static str {
        "meow"
    }
}

// -------------------------------------------------------------------------------------------------
// Parameters
// -------------------------------------------------------------------------------------------------

#[test]
fn test_resolve_with_parameter() {
    let registry = Registry::new();
    let key = registry
        .register(Key::<Dog>::in_container("dogs"))
        .factory_with(|name: &String| Arc::new(Dog { name: name.clone() }));

    let name = "Brutus".to_string();
    let dog = registry
        .resolve_with(&key, &ResolveOptions::new().parameter(&name))
        .unwrap()
        .unwrap();
    assert_eq!(dog.name, "Brutus");
}

#[test]
fn test_parameter_type_mismatch_is_empty() {
    let registry = Registry::new();
    let key = registry
        .register(Key::<Dog>::in_container("dogs"))
        .factory_with(|name: &String| Arc::new(Dog { name: name.clone() }));

    // No parameter at all.
    assert!(registry.resolve(&key).unwrap().is_none());

    // A parameter of another type.
    let options = ResolveOptions::new().parameter(&5u32);
    assert!(registry.resolve_with(&key, &options).unwrap().is_none());

    let options = ResolveOptions::new().parameter(&"Brutus");
    assert!(registry.resolve_with(&key, &options).unwrap().is_none());
}

#[test]
fn test_parameterless_factory_ignores_parameter() {
    let registry = Registry::new();
    let key = registry
        .register(Key::<Dog>::default())
        .factory(|| Arc::new(Dog {
            name: "Fido".to_string(),
        }));

    let options = ResolveOptions::new().parameter(&42u64);
    let dog = registry.resolve_with(&key, &options).unwrap().unwrap();
    assert_eq!(dog.name, "Fido");
}

// -------------------------------------------------------------------------------------------------
// Caching
// -------------------------------------------------------------------------------------------------

#[test]
fn test_cached_registration_returns_same_instance() {
    let registry = Registry::new();
    let key = registry
        .register(Key::<Dog>::default())
        .cached(true)
        .factory(|| Arc::new(Dog {
            name: "Rex".to_string(),
        }));

    let first = registry.resolve(&key).unwrap().unwrap();
    let second = registry.resolve(&key).unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_cache_override_false_bypasses_without_clearing() {
    let registry = Registry::new();
    let key = registry
        .register(Key::<Dog>::default())
        .cached(true)
        .factory(|| Arc::new(Dog {
            name: "Rex".to_string(),
        }));

    let cached = registry.resolve(&key).unwrap().unwrap();

    let fresh = registry
        .resolve_with(&key, &ResolveOptions::new().cached(false))
        .unwrap()
        .unwrap();
    assert!(!Arc::ptr_eq(&cached, &fresh));

    let again = registry.resolve(&key).unwrap().unwrap();
    assert!(Arc::ptr_eq(&cached, &again));
}

#[test]
fn test_uncached_registration_runs_factory_every_time() {
    let registry = Registry::new();
    let invocations = Arc::new(AtomicUsize::new(0));
    let counter = invocations.clone();

    let key = registry.register(Key::<Dog>::default()).factory(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Arc::new(Dog {
            name: "Rex".to_string(),
        })
    });

    let first = registry.resolve(&key).unwrap().unwrap();
    let second = registry.resolve(&key).unwrap().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(invocations.load(Ordering::SeqCst), 2);
}

#[test]
fn test_cache_override_true_on_uncached_registration() {
    let registry = Registry::new();
    let key = registry
        .register(Key::<Dog>::default())
        .factory(|| Arc::new(Dog {
            name: "Rex".to_string(),
        }));

    let options = ResolveOptions::new().cached(true);
    let first = registry.resolve_with(&key, &options).unwrap().unwrap();
    let second = registry.resolve_with(&key, &options).unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // Without the override the registration still builds fresh values.
    let fresh = registry.resolve(&key).unwrap().unwrap();
    assert!(!Arc::ptr_eq(&first, &fresh));
}

#[test]
fn test_cached_parameterized_factory_keeps_first_parameter() {
    let registry = Registry::new();
    let key = registry
        .register(Key::<Dog>::default())
        .cached(true)
        .factory_with(|name: &String| Arc::new(Dog { name: name.clone() }));

    let lucy = "Lucy".to_string();
    let fido = "Fido".to_string();
    let first = registry
        .resolve_with(&key, &ResolveOptions::new().parameter(&lucy))
        .unwrap()
        .unwrap();
    let second = registry
        .resolve_with(&key, &ResolveOptions::new().parameter(&fido))
        .unwrap()
        .unwrap();

    assert_eq!(first.name, "Lucy");
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_registered_instance_is_always_shared() {
    let registry = Registry::new();
    let dog = Arc::new(Dog {
        name: "Odie".to_string(),
    });
    let key = registry.register(Key::<Dog>::default()).instance(dog.clone());

    let resolved = registry.resolve(&key).unwrap().unwrap();
    assert!(Arc::ptr_eq(&dog, &resolved));

    let bypassed = registry
        .resolve_with(&key, &ResolveOptions::new().cached(false))
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&dog, &bypassed));
}

// -------------------------------------------------------------------------------------------------
// Trait objects
// -------------------------------------------------------------------------------------------------

#[test]
fn test_heterogeneous_implementations_behind_trait() {
    let registry = Registry::new();

    registry
        .register(Key::<dyn Animal>::named("dog"))
        .factory(|| -> Arc<dyn Animal> {
            Arc::new(Dog {
                name: "Brian".to_string(),
            })
        });
    registry
        .register(Key::<dyn Animal>::named("cat"))
        .instance(Arc::new(Cat));

    let keys = registry.filter_keys::<dyn Animal>(Filter::new());
    assert_eq!(keys.len(), 2);

    let mut sounds: Vec<&'static str> = registry
        .resolve_all(&keys)
        .unwrap()
        .iter()
        .map(|animal| animal.sound())
        .collect();
    sounds.sort();
    assert_eq!(sounds, ["meow", "woof"]);

    let cat = registry
        .resolve(&Key::<dyn Animal>::named("cat"))
        .unwrap()
        .unwrap();
    assert_eq!(cat.name(), "Garfield");
}

#[test]
fn test_concrete_and_trait_keys_are_distinct() {
    let registry = Registry::new();
    registry.register(Key::<Dog>::named("rex")).value(Dog {
        name: "Rex".to_string(),
    });

    let as_trait = registry.resolve(&Key::<dyn Animal>::named("rex")).unwrap();
    assert!(as_trait.is_none());
}

#[test]
fn test_resolve_cloned() {
    let registry = Registry::new();
    let key = registry
        .register(Key::<String>::named("greeting"))
        .value("hello".to_string());

    let owned: Option<String> = registry.resolve_cloned(&key).unwrap();
    assert_eq!(owned.as_deref(), Some("hello"));
}

#[test]
fn test_default_value_registration() {
    #[derive(Default)]
    struct Settings {
        retries: u32,
    }

    let registry = Registry::new();
    let key = registry.register(Key::<Settings>::default()).default_value();

    let settings = registry.resolve(&key).unwrap().unwrap();
    assert_eq!(settings.retries, 0);
}

// -------------------------------------------------------------------------------------------------
// Failures
// -------------------------------------------------------------------------------------------------

#[test]
fn test_failing_factory_reports_key() {
    let registry = Registry::new();
    let key = registry
        .register(Key::<u32>::named("broken"))
        .try_factory_with(|_: &()| -> Result<Arc<u32>, &'static str> { Err("boom") });

    let err = registry.resolve(&key).unwrap_err();
    assert_eq!(err.key(), key.erased());
    assert!(matches!(err, RegistryError::Factory { .. }));
    assert!(err.to_string().contains("boom"));
    assert!(err.to_string().contains("broken"));
}

#[test]
fn test_fallible_factory_success() {
    let registry = Registry::new();
    let key = registry
        .register(Key::<u32>::named("parsed"))
        .try_factory_with(|raw: &String| raw.parse::<u32>().map(Arc::new));

    let good = "42".to_string();
    let bad = "forty-two".to_string();

    let value = registry
        .resolve_with(&key, &ResolveOptions::new().parameter(&good))
        .unwrap();
    assert_eq!(value.as_deref(), Some(&42));

    let err = registry
        .resolve_with(&key, &ResolveOptions::new().parameter(&bad))
        .unwrap_err();
    assert_eq!(err.key(), key.erased());
}

#[test]
fn test_batch_stops_at_first_failure() {
    let registry = Registry::new();
    let broken = registry
        .register(Key::<u32>::named("broken"))
        .try_factory_with(|_: &()| -> Result<Arc<u32>, &'static str> { Err("boom") });
    let fine = registry.register(Key::<u32>::named("fine")).value(1);

    assert!(registry.resolve_all([&fine, &broken]).is_err());
    assert_eq!(registry.resolve_all([&fine]).unwrap().len(), 1);
}

#[test]
fn test_missing_key_is_empty() {
    let registry = Registry::new();
    assert!(registry.resolve(&Key::<u32>::named("nothing")).unwrap().is_none());
    assert!(registry.resolve_all(&[Key::<u32>::default()]).unwrap().is_empty());
}
