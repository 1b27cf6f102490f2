/// Events emitted by a registry during operations.
///
/// These events are passed to the tracing callback set via `set_trace_callback`
/// and are also logged through `tracing` under the `creational::registry` target.
///
/// # Examples
///
/// ```rust
/// use creational::RegistryEvent;
///
/// let event = RegistryEvent::Init { type_name: "i32" };
/// assert_eq!(event.to_string(), "init { type_name: i32 }");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A factory ran and its instance was stored.
    Init {
        /// The type name of the created singleton (e.g. "alloc::string::String")
        type_name: &'static str,
    },

    /// A factory returned an error; nothing was stored.
    InitFailed {
        /// The type name whose construction failed
        type_name: &'static str,
    },

    /// A value was offered with `register`.
    Register {
        /// The type name of the offered value
        type_name: &'static str,
        /// Whether the value was stored (false when an instance already existed)
        stored: bool,
    },

    /// An existing instance was requested.
    Get {
        /// The type name that was requested
        type_name: &'static str,
        /// Whether the value was found in the registry
        found: bool,
    },

    /// A type existence check was performed.
    Contains {
        /// The type name that was checked
        type_name: &'static str,
        /// Whether the type exists in the registry
        found: bool,
    },
}

impl std::fmt::Display for RegistryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryEvent::Init { type_name } => {
                write!(f, "init {{ type_name: {} }}", type_name)
            }
            RegistryEvent::InitFailed { type_name } => {
                write!(f, "init_failed {{ type_name: {} }}", type_name)
            }
            RegistryEvent::Register { type_name, stored } => {
                write!(
                    f,
                    "register {{ type_name: {}, stored: {} }}",
                    type_name, stored
                )
            }
            RegistryEvent::Get { type_name, found } => {
                write!(f, "get {{ type_name: {}, found: {} }}", type_name, found)
            }
            RegistryEvent::Contains { type_name, found } => {
                write!(
                    f,
                    "contains {{ type_name: {}, found: {} }}",
                    type_name, found
                )
            }
        }
    }
}
