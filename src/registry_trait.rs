//! Core trait defining registry behavior.
//!
//! This module provides the `RegistryApi` trait with default implementations for
//! lazy, type-keyed singleton construction, lookup, and tracing.
//!
//! The registry is type-based: each type (`TypeId`) has at most one instance, created
//! by the first caller that supplies a factory. Instances are never replaced or
//! removed for the lifetime of the registry.

use std::any::{Any, TypeId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, LazyLock};

use parking_lot::{Mutex, RwLock};

use crate::{RegistryError, RegistryEvent};

/// Type-erased instance table keyed by `TypeId`.
pub type Instances = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Storage static backing a registry.
///
/// Note: `define_registry!` declares its statics with this alias. Keep both in sync.
pub type Storage = LazyLock<RwLock<Instances>>;

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives a reference to a `RegistryEvent` every time the registry is
/// interacted with. It must be thread-safe because registries are globally shared.
pub type TraceCallback = dyn Fn(&RegistryEvent) + Send + Sync + 'static;

/// Trace callback static backing a registry.
pub type TraceSlot = LazyLock<Mutex<Option<Arc<TraceCallback>>>>;

/// Core trait defining registry behavior.
///
/// Provides default implementations for all registry operations, requiring only
/// two accessor methods (`storage` and `trace`) to be implemented by the implementor.
///
/// # Factories
///
/// Factories run while the registry's write lock is held, so a factory must NOT call
/// any method of the same registry. Doing so deadlocks. Factories may freely use other
/// registries.
pub trait RegistryApi {
    // -------------------------------------------------------------------------------------------------
    // Tracing
    // -------------------------------------------------------------------------------------------------

    /// Access the trace callback static.
    fn trace() -> &'static TraceSlot;

    /// Set a tracing callback for registry operations.
    ///
    /// The callback is invoked after the registry locks are released, so it may read
    /// from the registry it observes.
    fn set_trace_callback(&self, callback: impl Fn(&RegistryEvent) + Send + Sync + 'static) {
        *Self::trace().lock() = Some(Arc::new(callback));
    }

    /// Clear the tracing callback.
    ///
    /// Does not affect stored instances.
    fn clear_trace_callback(&self) {
        *Self::trace().lock() = None;
    }

    /// Log an event and forward it to the current callback, if any.
    fn emit_event(&self, event: &RegistryEvent) {
        tracing::trace!(target: "creational::registry", %event, "registry event");

        let callback = Self::trace().lock().clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }

    // -------------------------------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------------------------------

    /// Access the storage static.
    fn storage() -> &'static Storage;

    /// Return the instance of `T`, constructing it with `factory` on first use.
    ///
    /// Concurrent first callers race for the write lock; exactly one runs its factory
    /// and every caller receives the same `Arc`.
    fn get_instance<T, F>(&self, factory: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        match self.try_get_instance(|| Ok::<T, Infallible>(factory())) {
            Ok(instance) => instance,
            Err(never) => match never {},
        }
    }

    /// Fallible form of [`get_instance`](RegistryApi::get_instance).
    ///
    /// # Errors
    ///
    /// Returns the factory's error unchanged. Nothing is stored on failure, so a later
    /// call runs a factory again.
    fn try_get_instance<T, E, F>(&self, factory: F) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T, E>,
    {
        let type_name = std::any::type_name::<T>();

        let existing = cached::<T>(&Self::storage().read());
        if let Some(instance) = existing {
            self.emit_event(&RegistryEvent::Get {
                type_name,
                found: true,
            });
            return Ok(instance);
        }

        let mut map = Self::storage().write();

        // Another caller may have finished construction while we waited for the lock.
        if let Some(instance) = cached::<T>(&map) {
            drop(map);
            self.emit_event(&RegistryEvent::Get {
                type_name,
                found: true,
            });
            return Ok(instance);
        }

        match factory() {
            Ok(value) => {
                let instance = Arc::new(value);
                map.insert(TypeId::of::<T>(), instance.clone());
                drop(map);
                self.emit_event(&RegistryEvent::Init { type_name });
                Ok(instance)
            }
            Err(err) => {
                drop(map);
                self.emit_event(&RegistryEvent::InitFailed { type_name });
                Err(err)
            }
        }
    }

    /// Store a value eagerly.
    ///
    /// # Errors
    ///
    /// - `AlreadyInitialized` if an instance of `T` exists. The existing instance is kept.
    fn register<T: Send + Sync + 'static>(&self, value: T) -> Result<Arc<T>, RegistryError> {
        self.register_arc(Arc::new(value))
    }

    /// Store an `Arc`-wrapped value eagerly.
    ///
    /// # Errors
    ///
    /// - `AlreadyInitialized` if an instance of `T` exists.
    fn register_arc<T: Send + Sync + 'static>(
        &self,
        value: Arc<T>,
    ) -> Result<Arc<T>, RegistryError> {
        let type_name = std::any::type_name::<T>();

        let stored = match Self::storage().write().entry(TypeId::of::<T>()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value.clone());
                true
            }
        };

        self.emit_event(&RegistryEvent::Register { type_name, stored });

        if stored {
            Ok(value)
        } else {
            Err(RegistryError::AlreadyInitialized { type_name })
        }
    }

    /// Retrieve an existing instance without constructing one.
    ///
    /// # Errors
    ///
    /// - `TypeNotFound` if no instance of `T` exists
    /// - `TypeMismatch` if the stored value is not a `T` (extremely rare)
    fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, RegistryError> {
        let type_name = std::any::type_name::<T>();
        let any_arc_opt = Self::storage().read().get(&TypeId::of::<T>()).cloned();

        let result = match any_arc_opt {
            Some(any_arc) => any_arc
                .downcast::<T>()
                .map_err(|_| RegistryError::TypeMismatch { type_name }),
            None => Err(RegistryError::TypeNotFound { type_name }),
        };

        self.emit_event(&RegistryEvent::Get {
            type_name,
            found: result.is_ok(),
        });

        result
    }

    /// Retrieve a clone of an existing instance.
    ///
    /// # Errors
    ///
    /// Same as [`get`](RegistryApi::get).
    fn get_cloned<T: Send + Sync + Clone + 'static>(&self) -> Result<T, RegistryError> {
        let arc = self.get::<T>()?;
        Ok((*arc).clone())
    }

    /// Check whether an instance of `T` exists.
    fn contains<T: Send + Sync + 'static>(&self) -> bool {
        let found = Self::storage().read().contains_key(&TypeId::of::<T>());

        self.emit_event(&RegistryEvent::Contains {
            type_name: std::any::type_name::<T>(),
            found,
        });

        found
    }

    /// Number of stored instances.
    fn len(&self) -> usize {
        Self::storage().read().len()
    }

    /// Whether no instance has been stored yet.
    fn is_empty(&self) -> bool {
        Self::storage().read().is_empty()
    }
}

fn cached<T: Send + Sync + 'static>(map: &Instances) -> Option<Arc<T>> {
    map.get(&TypeId::of::<T>())
        .cloned()
        .and_then(|any_arc| any_arc.downcast::<T>().ok())
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::RegistryError;

    use super::{RegistryApi, Storage, TraceSlot};

    use parking_lot::{Mutex, RwLock};
    use serial_test::serial;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, LazyLock};

    static STORAGE: Storage = LazyLock::new(|| RwLock::new(HashMap::new()));

    static TRACE: TraceSlot = LazyLock::new(|| Mutex::new(None));

    struct Api;

    impl RegistryApi for Api {
        fn storage() -> &'static Storage {
            &STORAGE
        }

        fn trace() -> &'static TraceSlot {
            &TRACE
        }
    }

    const API: Api = Api;

    // Instances are never removed, so every test works with its own types. All tests share
    // one trace slot, hence #[serial].

    #[test]
    #[serial]
    fn test_get_instance_runs_factory_once() {
        #[derive(Debug)]
        struct Counter(u32);

        let calls = AtomicUsize::new(0);

        let first = API.get_instance(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Counter(1)
        });
        let second = API.get_instance(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Counter(2)
        });

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.0, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[serial]
    fn test_try_get_instance_propagates_error_and_retries() {
        struct Connection {
            attempt: u32,
        }

        let err = API
            .try_get_instance::<Connection, _, _>(|| Err("refused"))
            .err();
        assert_eq!(err, Some("refused"));
        assert!(!API.contains::<Connection>());

        let conn = API
            .try_get_instance(|| Ok::<_, &str>(Connection { attempt: 2 }))
            .unwrap();
        assert_eq!(conn.attempt, 2);
        assert!(API.contains::<Connection>());
    }

    #[test]
    #[serial]
    fn test_get_nonexistent() {
        struct Missing;

        let result: Result<Arc<Missing>, RegistryError> = API.get();
        assert!(matches!(
            result,
            Err(RegistryError::TypeNotFound { type_name }) if type_name.ends_with("Missing")
        ));
    }

    #[test]
    #[serial]
    fn test_register_then_get() -> Result<(), RegistryError> {
        #[derive(Debug, PartialEq, Clone)]
        struct Settings {
            name: String,
        }

        API.register(Settings {
            name: "main".into(),
        })?;

        let retrieved: Arc<Settings> = API.get()?;
        assert_eq!(retrieved.name, "main");

        let cloned: Settings = API.get_cloned()?;
        assert_eq!(cloned, *retrieved);

        Ok(())
    }

    #[test]
    #[serial]
    fn test_register_does_not_replace() {
        struct Port(u16);

        let first = API.register(Port(80)).unwrap();
        let second = API.register(Port(8080));

        assert!(matches!(
            second,
            Err(RegistryError::AlreadyInitialized { .. })
        ));
        let current: Arc<Port> = API.get().unwrap();
        assert!(Arc::ptr_eq(&first, &current));
        assert_eq!(current.0, 80);
    }

    #[test]
    #[serial]
    fn test_get_instance_after_register_returns_registered() {
        struct Greeting(&'static str);

        API.register(Greeting("hello")).unwrap();
        let instance = API.get_instance(|| Greeting("ignored"));
        assert_eq!(instance.0, "hello");
    }

    #[test]
    #[serial]
    fn test_register_arc_directly() {
        struct Payload(i32);

        let value = Arc::new(Payload(42));
        let clone = value.clone();
        API.register_arc(value).unwrap();

        let retrieved: Arc<Payload> = API.get().unwrap();
        assert_eq!(retrieved.0, 42);
        assert_eq!(Arc::strong_count(&clone), 3); // clone + registry + retrieved
    }

    #[test]
    #[serial]
    fn test_distinct_types_get_distinct_instances() {
        struct Left(u8);
        struct Right(u8);

        let left = API.get_instance(|| Left(1));
        let right = API.get_instance(|| Right(2));

        assert_eq!(left.0, 1);
        assert_eq!(right.0, 2);
        assert!(API.len() >= 2);
        assert!(!API.is_empty());
    }

    #[test]
    #[serial]
    fn test_panicking_factory_records_nothing() {
        struct Fragile(u8);

        let outcome = std::panic::catch_unwind(|| {
            API.get_instance::<Fragile, _>(|| panic!("construction failed"));
        });
        assert!(outcome.is_err());
        assert!(!API.contains::<Fragile>());

        let fragile = API.get_instance(|| Fragile(7));
        assert_eq!(fragile.0, 7);
    }

    #[test]
    #[serial]
    fn test_trace_callback_init_and_get_events() {
        struct Traced;

        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let events_clone = events.clone();

        API.set_trace_callback(move |e| {
            events_clone.lock().unwrap().push(e.to_string());
        });

        let _ = API.get_instance(|| Traced);
        let _ = API.get_instance(|| Traced);

        API.clear_trace_callback();

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert!(captured[0].starts_with("init { type_name: "));
        assert!(captured[1].ends_with("Traced, found: true }"));
    }

    #[test]
    #[serial]
    fn test_trace_callback_failed_init_event() {
        struct NeverBuilt;

        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let events_clone = events.clone();

        API.set_trace_callback(move |e| {
            events_clone.lock().unwrap().push(e.clone());
        });

        let _ = API.try_get_instance::<NeverBuilt, _, _>(|| Err(()));

        API.clear_trace_callback();

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert!(matches!(
            captured[0],
            crate::RegistryEvent::InitFailed { .. }
        ));
    }

    #[test]
    #[serial]
    fn test_trace_callback_may_read_registry() {
        struct Observed(u8);

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();

        API.set_trace_callback(move |_| {
            if API.len() > 0 {
                seen_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        let _ = API.get_instance(|| Observed(1));

        API.clear_trace_callback();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[serial]
    fn test_clear_trace_callback_stops_events() {
        struct Quiet(u16);

        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let events_clone = events.clone();

        API.set_trace_callback(move |e| {
            events_clone.lock().unwrap().push(e.to_string());
        });

        API.register(Quiet(10)).unwrap();
        API.clear_trace_callback();

        let _ = API.register(Quiet(20));
        let _ = API.get::<Quiet>();
        let _ = API.contains::<Quiet>();

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert!(captured[0].ends_with("Quiet, stored: true }"));
    }
}
