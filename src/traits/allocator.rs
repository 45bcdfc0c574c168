use crate::error::NosqlResult;

/// Opens, closes and probes the native handle of one backend.
///
/// Implementations validate their config before touching the native engine
/// and never hand back a half-built handle: intermediate native values are
/// released by `Drop` when a later step fails.
pub trait ConnectionAllocator {
    /// Immutable connection parameters.
    type Config: Clone + Send + std::fmt::Debug;
    /// The owned native handle.
    type Handle: Send;

    /// Name used in log lines.
    const NAME: &'static str;

    fn connect(config: &Self::Config) -> NosqlResult<Self::Handle>;

    /// Closes the handle, ignoring close-time errors.
    fn disconnect(handle: Self::Handle);

    /// Local liveness check; must not perform I/O.
    fn is_connected(handle: &Self::Handle) -> bool;
}
