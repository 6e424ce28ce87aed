//! Opaque work units the engine hands to its embedder.

/// A unit of work the engine wants executed.
///
/// Tasks are consumed by value: a task runs at most once, and the type
/// system enforces it.
pub trait Task: Send {
    /// Execute the task.
    fn run(self: Box<Self>);
}

impl<F: FnOnce() + Send> Task for F {
    fn run(self: Box<Self>) {
        (*self)()
    }
}

/// Deferred work given a soft time budget before it must yield control.
pub trait IdleTask: Send {
    /// Execute the task. `deadline` is the monotonic time, in seconds on the
    /// platform clock, by which the task should finish or yield.
    fn run(self: Box<Self>, deadline: f64);
}

impl<F: FnOnce(f64) + Send> IdleTask for F {
    fn run(self: Box<Self>, deadline: f64) {
        (*self)(deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_closure_task_runs_once() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let task: Box<dyn Task> = Box::new(move || {
            flag.store(true, Ordering::SeqCst);
        });

        task.run();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_closure_idle_task_receives_deadline() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let slot = seen.clone();
        let task: Box<dyn IdleTask> = Box::new(move |deadline: f64| {
            *slot.lock().unwrap() = Some(deadline);
        });

        task.run(1.25);
        assert_eq!(*seen.lock().unwrap(), Some(1.25));
    }
}
