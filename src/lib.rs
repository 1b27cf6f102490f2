//! # Creational
//!
//! Two independent building blocks of the creational patterns:
//!
//! - **Lazy singleton registries**: a thread-safe, type-keyed table where each type's
//!   instance is built at most once, by the first caller's factory.
//! - **Duplication**: shallow and deep copies of `Rc` object graphs, where deep copies
//!   keep shared nodes shared and close cycles on the copied nodes.
//!
//! ## Quick Start
//!
//! ```rust
//! use creational::get_instance;
//! use std::sync::Arc;
//!
//! struct Config {
//!     name: String,
//! }
//!
//! let first: Arc<Config> = get_instance(|| Config { name: "FOO".into() });
//! let second: Arc<Config> = get_instance(|| Config { name: "BAR".into() });
//!
//! assert!(Arc::ptr_eq(&first, &second));
//! assert_eq!(second.name, "FOO");
//! ```
//!
//! ## Main Items
//!
//! - [`get_instance`] / [`try_get_instance`] - Lazily create or fetch the process-wide instance
//! - [`define_registry!`] - Declare an isolated registry module
//! - [`RegistryApi`] - Trait carrying every registry operation
//! - [`duplicate`] / [`duplicate_node`] - Shallow or deep copies
//! - [`Duplicate`] / [`impl_duplicate!`] - Make a type duplicable
//! - [`Memo`] - Identity table of a deep copy

#[macro_use]
mod macros;

mod duplicate;
mod memo;
mod registry_error;
mod registry_event;
mod registry_trait;

pub use duplicate::{duplicate, duplicate_node, shared, CopyMode, Duplicate, Shared};
pub use memo::Memo;
pub use registry_error::RegistryError;
pub use registry_event::RegistryEvent;
pub use registry_trait::{Instances, RegistryApi, Storage, TraceCallback, TraceSlot};

#[doc(hidden)]
pub mod __private {
    pub use parking_lot::{Mutex, RwLock};
}

define_registry!(
    /// The process-wide registry. Its functions are re-exported at the crate root.
    global
);

pub use global::{
    clear_trace_callback, contains, get, get_cloned, get_instance, register, register_arc,
    set_trace_callback, try_get_instance,
};
