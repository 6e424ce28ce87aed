//! Single-consumption ownership wrappers around engine work units.
//!
//! A request is created when the engine hands work to the platform and is
//! consumed exactly once by its dispatch handler; it is never reused or
//! resubmitted. Idle requests carry their target VM unconditionally, so a
//! VM-less idle request cannot even be constructed.

use crate::clock::MonotonicClock;
use kite_engine::{IdleTask, Task, VmInstance};
use std::sync::Arc;

/// Soft time budget an idle task is given once it starts running.
pub(crate) const IDLE_BUDGET_SECONDS: f64 = 1.0 / 60.0;

/// Owns one plain work unit from submission until execution.
pub(crate) struct TaskRequest {
    /// Target VM; `None` means no affinity is required and the task is safe
    /// on any thread.
    pub(crate) vm: Option<Arc<VmInstance>>,
    pub(crate) task: Box<dyn Task>,
}

impl TaskRequest {
    /// Request with no VM affinity, for the background pool.
    pub(crate) fn background(task: Box<dyn Task>) -> Self {
        Self { vm: None, task }
    }

    /// Request bound to `vm`, for the script thread (plain or delayed).
    pub(crate) fn foreground(vm: Arc<VmInstance>, task: Box<dyn Task>) -> Self {
        Self { vm: Some(vm), task }
    }
}

/// Owns one idle work unit. The deadline is derived from `clock` at
/// execution time, so queueing delay counts against the idle budget.
pub(crate) struct IdleTaskRequest {
    pub(crate) vm: Arc<VmInstance>,
    pub(crate) task: Box<dyn IdleTask>,
    pub(crate) clock: MonotonicClock,
}

impl IdleTaskRequest {
    pub(crate) fn new(vm: Arc<VmInstance>, task: Box<dyn IdleTask>, clock: MonotonicClock) -> Self {
        Self { vm, task, clock }
    }
}
