use thiserror::Error;

/// Errors returned by registry lookups.
///
/// Factory failures are never wrapped in this type: `try_get_instance` hands the
/// factory's own error back to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No instance of the requested type has been created yet.
    #[error("Type not found in registry: {type_name}")]
    TypeNotFound { type_name: &'static str },

    /// The stored value could not be downcast to the requested type.
    #[error("Type mismatch in registry for type: {type_name}")]
    TypeMismatch { type_name: &'static str },

    /// `register` was called for a type that already has an instance.
    #[error("Type already initialized in registry: {type_name}")]
    AlreadyInitialized { type_name: &'static str },
}
