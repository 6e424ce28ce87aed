//! Engine process-global lifecycle.
//!
//! The engine keeps a small amount of process-wide state that must be live
//! while any VM instance exists. Initialization is counted: the globals stay
//! up until every [`initialize`] call has been matched by a [`shutdown`],
//! which lets independent embedders (and parallel tests) coexist in one
//! process.

use std::sync::atomic::{AtomicUsize, Ordering};

static LIVE_EMBEDDERS: AtomicUsize = AtomicUsize::new(0);

/// Bring up the engine's process-global state.
///
/// Must be called before constructing a [`crate::VmInstance`]. Each call must
/// eventually be matched by one [`shutdown`].
pub fn initialize() {
    let prev = LIVE_EMBEDDERS.fetch_add(1, Ordering::SeqCst);
    if prev == 0 {
        tracing::debug!("engine globals initialized");
    }
}

/// Release one reference to the engine's process-global state.
pub fn shutdown() {
    let prev = LIVE_EMBEDDERS.fetch_sub(1, Ordering::SeqCst);
    debug_assert!(prev > 0, "engine shutdown without matching initialize");
    if prev == 1 {
        tracing::debug!("engine globals shut down");
    }
}

/// Whether the engine globals are currently live.
pub fn is_initialized() -> bool {
    LIVE_EMBEDDERS.load(Ordering::SeqCst) > 0
}
