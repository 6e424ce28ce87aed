//! The platform contract an embedder must satisfy.

use crate::task::{IdleTask, Task};
use crate::vm::VmInstance;
use std::sync::Arc;

/// Callbacks the engine requires from its embedder.
///
/// The engine invokes these whenever it needs work scheduled. Implementations
/// never fail gracefully: a dispatch either succeeds or aborts the process.
/// Work bound to a VM must run on the single designated script thread with
/// that VM's execution lock held.
pub trait Platform: Send + Sync {
    /// Run `task` on any available background thread. The task must not
    /// touch VM state.
    fn call_on_background_thread(&self, task: Box<dyn Task>);

    /// Run `task` on the script thread with `vm`'s execution lock held.
    fn call_on_foreground_thread(&self, vm: &Arc<VmInstance>, task: Box<dyn Task>);

    /// Like [`call_on_foreground_thread`](Self::call_on_foreground_thread),
    /// delayed by `delay_seconds` (truncated to whole milliseconds).
    fn call_delayed_on_foreground_thread(
        &self,
        vm: &Arc<VmInstance>,
        task: Box<dyn Task>,
        delay_seconds: f64,
    );

    /// Run `task` on the script thread when there is spare time. The deadline
    /// passed to the task reflects the time it actually starts running, so
    /// queueing delay counts against its budget.
    fn call_idle_on_foreground_thread(&self, vm: &Arc<VmInstance>, task: Box<dyn IdleTask>);

    /// Whether idle tasks will ever be dispatched for `vm`.
    fn idle_tasks_enabled(&self, vm: &Arc<VmInstance>) -> bool;

    /// Number of threads serving
    /// [`call_on_background_thread`](Self::call_on_background_thread).
    fn available_background_threads(&self) -> usize;

    /// Monotonically increasing time in seconds since platform construction,
    /// at millisecond resolution. Never regresses.
    fn monotonically_increasing_time(&self) -> f64;
}
