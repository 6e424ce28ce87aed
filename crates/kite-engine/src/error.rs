//! Engine error types.

/// Errors surfaced by the engine embedding layer.
///
/// These cover construction-time failures only. Once the engine is running,
/// platform callbacks never fail gracefully: contract violations and internal
/// fatal errors abort the process instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A bundle module failed to compile
    #[error("failed to compile module `{module}`: {reason}")]
    Compile {
        /// Name of the offending module
        module: String,
        /// Human-readable compile failure description
        reason: String,
    },

    /// A module with the same name is already registered with the VM
    #[error("module `{0}` is already registered")]
    DuplicateModule(String),

    /// Operation on a VM instance that has already been disposed
    #[error("VM instance has been disposed")]
    VmDisposed,

    /// Engine globals were not initialized before constructing a VM
    #[error("engine is not initialized")]
    NotInitialized,
}
