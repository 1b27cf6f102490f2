//! Macros for declaring singleton registries and duplicable types.

/// Creates a complete singleton registry with a single macro invocation.
///
/// The macro generates a module containing:
/// - Storage static (hidden)
/// - Trace callback static (hidden)
/// - An `Api` struct that implements `RegistryApi`, and an `API` constant
/// - Free functions delegating to `API`
///
/// Attributes written before the name (doc comments included) are applied to the
/// generated module.
///
/// # Examples
///
/// ```rust
/// use creational::define_registry;
/// use std::sync::Arc;
///
/// define_registry!(services);
///
/// struct Database {
///     url: String,
/// }
///
/// let db: Arc<Database> = services::get_instance(|| Database {
///     url: "postgres://localhost".to_string(),
/// });
/// let again: Arc<Database> = services::get_instance(|| unreachable!());
///
/// assert!(Arc::ptr_eq(&db, &again));
/// assert_eq!(again.url, "postgres://localhost");
/// ```
///
/// # Multiple Registries
///
/// Each registry is completely isolated:
///
/// ```rust
/// use creational::define_registry;
///
/// define_registry!(primary);
/// define_registry!(replica);
///
/// primary::get_instance(|| "primary".to_string());
///
/// assert!(primary::contains::<String>());
/// assert!(!replica::contains::<String>());
/// ```
///
/// # Trait-Based Usage
///
/// ```rust
/// use creational::{define_registry, RegistryApi};
/// use std::sync::Arc;
///
/// define_registry!(app);
///
/// let value: Arc<i32> = app::API.get_instance(|| 100);
/// assert_eq!(*value, 100);
/// ```
#[macro_export]
macro_rules! define_registry {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        pub mod $name {
            use std::sync::{Arc, LazyLock};
            use std::collections::HashMap;

            // Storage for created instances (module-private)
            static STORAGE: $crate::Storage =
                LazyLock::new(|| $crate::__private::RwLock::new(HashMap::new()));

            // Trace callback storage (module-private)
            static TRACE: $crate::TraceSlot =
                LazyLock::new(|| $crate::__private::Mutex::new(None));

            /// Zero-sized type that implements the registry API.
            ///
            /// All registry operations are provided by the `RegistryApi` trait's
            /// default implementations. This struct only provides access to the statics.
            pub struct Api;

            impl $crate::RegistryApi for Api {
                fn storage() -> &'static $crate::Storage {
                    &STORAGE
                }

                fn trace() -> &'static $crate::TraceSlot {
                    &TRACE
                }
            }

            /// Constant for trait-based access to this registry.
            pub const API: Api = Api;

            /// Return the instance of `T`, constructing it with `factory` on first use.
            pub fn get_instance<T, F>(factory: F) -> Arc<T>
            where
                T: Send + Sync + 'static,
                F: FnOnce() -> T,
            {
                use $crate::RegistryApi;
                API.get_instance(factory)
            }

            /// Return the instance of `T`, constructing it with a fallible `factory` on first use.
            pub fn try_get_instance<T, E, F>(factory: F) -> Result<Arc<T>, E>
            where
                T: Send + Sync + 'static,
                F: FnOnce() -> Result<T, E>,
            {
                use $crate::RegistryApi;
                API.try_get_instance(factory)
            }

            /// Store a value eagerly; fails if an instance already exists.
            pub fn register<T: Send + Sync + 'static>(
                value: T,
            ) -> Result<Arc<T>, $crate::RegistryError> {
                use $crate::RegistryApi;
                API.register(value)
            }

            /// Store an Arc-wrapped value eagerly; fails if an instance already exists.
            pub fn register_arc<T: Send + Sync + 'static>(
                value: Arc<T>,
            ) -> Result<Arc<T>, $crate::RegistryError> {
                use $crate::RegistryApi;
                API.register_arc(value)
            }

            /// Retrieve an existing instance.
            pub fn get<T: Send + Sync + 'static>() -> Result<Arc<T>, $crate::RegistryError> {
                use $crate::RegistryApi;
                API.get()
            }

            /// Retrieve a clone of an existing instance.
            pub fn get_cloned<T: Send + Sync + Clone + 'static>(
            ) -> Result<T, $crate::RegistryError> {
                use $crate::RegistryApi;
                API.get_cloned()
            }

            /// Check whether an instance of `T` exists.
            pub fn contains<T: Send + Sync + 'static>() -> bool {
                use $crate::RegistryApi;
                API.contains::<T>()
            }

            /// Number of stored instances.
            pub fn len() -> usize {
                use $crate::RegistryApi;
                API.len()
            }

            /// Whether no instance has been stored yet.
            pub fn is_empty() -> bool {
                use $crate::RegistryApi;
                API.is_empty()
            }

            /// Set a tracing callback for registry operations.
            pub fn set_trace_callback(
                callback: impl Fn(&$crate::RegistryEvent) + Send + Sync + 'static,
            ) {
                use $crate::RegistryApi;
                API.set_trace_callback(callback)
            }

            /// Clear the tracing callback.
            pub fn clear_trace_callback() {
                use $crate::RegistryApi;
                API.clear_trace_callback()
            }
        }
    };
}

/// Implements [`Duplicate`](crate::Duplicate) for a plain struct, field by field.
///
/// Every field must be listed and must itself implement `Duplicate`.
///
/// ```rust
/// use creational::{duplicate, impl_duplicate, shared, CopyMode, Shared};
/// use std::rc::Rc;
///
/// struct Document {
///     title: String,
///     body: Shared<Vec<String>>,
/// }
///
/// impl_duplicate!(Document { title, body });
///
/// let doc = Document {
///     title: "draft".to_string(),
///     body: shared(vec!["intro".to_string()]),
/// };
///
/// let shallow = duplicate(&doc, CopyMode::Shallow, None);
/// let deep = duplicate(&doc, CopyMode::Deep, None);
///
/// assert!(Rc::ptr_eq(&doc.body, &shallow.body));
/// assert!(!Rc::ptr_eq(&doc.body, &deep.body));
/// ```
#[macro_export]
macro_rules! impl_duplicate {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl $crate::Duplicate for $ty {
            fn shallow_duplicate(&self) -> Self {
                Self {
                    $($field: $crate::Duplicate::shallow_duplicate(&self.$field),)*
                }
            }

            fn deep_duplicate(&self, memo: &mut $crate::Memo) -> Self {
                Self {
                    $($field: $crate::Duplicate::deep_duplicate(&self.$field, memo),)*
                }
            }

            fn mark_reachable(&self, memo: &mut $crate::Memo) {
                $($crate::Duplicate::mark_reachable(&self.$field, memo);)*
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{duplicate, shared, CopyMode, Duplicate, Shared};
    use std::rc::Rc;
    use std::sync::Arc;

    #[test]
    fn test_define_registry_macro() {
        define_registry!(test_reg);

        let value: Arc<i32> = test_reg::get_instance(|| 100);
        assert_eq!(*value, 100);

        assert!(test_reg::contains::<i32>());
        assert!(!test_reg::contains::<f64>());
        assert_eq!(test_reg::len(), 1);
    }

    #[test]
    fn test_multiple_registries() {
        define_registry!(reg_a);
        define_registry!(reg_b);

        reg_a::get_instance(|| 1i32);
        reg_b::get_instance(|| 2i32);

        let a_val: Arc<i32> = reg_a::get().unwrap();
        let b_val: Arc<i32> = reg_b::get().unwrap();

        assert_eq!(*a_val, 1);
        assert_eq!(*b_val, 2);
    }

    #[test]
    fn test_tracing() {
        define_registry!(trace_test);

        use std::sync::Mutex;
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();

        trace_test::set_trace_callback(move |event| {
            events_clone.lock().unwrap().push(format!("{}", event));
        });

        trace_test::get_instance(|| 42i32);
        let _: Arc<i32> = trace_test::get().unwrap();
        let _ = trace_test::contains::<i32>();

        let recorded = events.lock().unwrap();
        assert_eq!(recorded.len(), 3);
        assert!(recorded[0].contains("init"));
        assert!(recorded[1].contains("get"));
        assert!(recorded[2].contains("contains"));
    }

    #[test]
    fn test_documented_registry() {
        define_registry!(
            /// Registry used by this test only.
            documented
        );

        assert!(documented::is_empty());
        documented::register("value").unwrap();
        assert!(!documented::is_empty());
    }

    struct Record {
        id: u32,
        tags: Vec<String>,
        owner: Shared<String>,
    }

    impl_duplicate!(Record { id, tags, owner });

    #[test]
    fn test_impl_duplicate_shallow_shares_nodes() {
        let record = Record {
            id: 1,
            tags: vec!["a".into()],
            owner: shared("alice".to_string()),
        };

        let copy = record.shallow_duplicate();
        assert_eq!(copy.id, 1);
        assert_eq!(copy.tags, record.tags);
        assert!(Rc::ptr_eq(&copy.owner, &record.owner));
    }

    #[test]
    fn test_impl_duplicate_deep_copies_nodes() {
        let record = Record {
            id: 2,
            tags: Vec::new(),
            owner: shared("bob".to_string()),
        };

        let copy = duplicate(&record, CopyMode::Deep, None);
        copy.owner.borrow_mut().push_str("by");

        assert_eq!(*record.owner.borrow(), "bob");
        assert_eq!(*copy.owner.borrow(), "bobby");
    }
}
