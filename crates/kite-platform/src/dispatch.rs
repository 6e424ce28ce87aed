//! Dispatch handlers: unwrap a request, acquire VM affinity, run exactly once.

use crate::request::{IdleTaskRequest, TaskRequest, IDLE_BUDGET_SECONDS};
use crate::scheduler::TimerFire;

/// Plain handler, used for background and foreground requests. Takes the
/// VM's execution lock for the duration of the run iff the request carries a
/// target VM.
pub(crate) fn handle_task_request(request: TaskRequest) {
    let TaskRequest { vm, task } = request;

    match vm {
        Some(vm) => {
            let _scope = vm.lock();
            task.run();
        }
        None => task.run(),
    }
}

/// Timer-driven handler for delayed requests. The request rides in an
/// `Option` slot because timer callbacks are re-entrant by contract; the
/// slot is emptied on first fire and the source always detaches.
pub(crate) fn handle_delayed_task_request(slot: &mut Option<TaskRequest>) -> TimerFire {
    if let Some(request) = slot.take() {
        handle_task_request(request);
    }
    TimerFire::Detach
}

/// Idle handler. The deadline is computed here, at execution time, so time
/// spent queued counts against the task's budget.
pub(crate) fn handle_idle_task_request(request: IdleTaskRequest) {
    let IdleTaskRequest { vm, task, clock } = request;

    let _scope = vm.lock();
    let deadline = clock.now_seconds() + IDLE_BUDGET_SECONDS;
    task.run(deadline);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MonotonicClock;
    use crate::SystemBufferAllocator;
    use kite_engine::{engine, VmInstance, VmParams};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn create_test_vm() -> Arc<VmInstance> {
        engine::initialize();
        VmInstance::new(VmParams {
            buffer_allocator: Arc::new(SystemBufferAllocator::new()),
        })
        .unwrap()
    }

    #[test]
    fn test_plain_handler_runs_without_vm() {
        let counter = Arc::new(AtomicUsize::new(0));
        let count = counter.clone();

        handle_task_request(TaskRequest::background(Box::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
        })));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_plain_handler_locks_vm() {
        let vm = create_test_vm();
        let counter = Arc::new(AtomicUsize::new(0));
        let count = counter.clone();

        handle_task_request(TaskRequest::foreground(
            vm.clone(),
            Box::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            }),
        ));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        engine::shutdown();
    }

    #[test]
    fn test_delayed_handler_consumes_slot_and_detaches() {
        let counter = Arc::new(AtomicUsize::new(0));
        let count = counter.clone();

        let mut slot = Some(TaskRequest::background(Box::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
        })));

        assert_eq!(handle_delayed_task_request(&mut slot), TimerFire::Detach);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // A second fire finds the slot empty and still detaches.
        assert_eq!(handle_delayed_task_request(&mut slot), TimerFire::Detach);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_idle_handler_budget_starts_at_execution() {
        let vm = create_test_vm();
        let clock = MonotonicClock::start();
        let submitted = clock.now_seconds();

        std::thread::sleep(std::time::Duration::from_millis(20));

        let observed = Arc::new(parking_lot::Mutex::new(None));
        let slot = observed.clone();
        handle_idle_task_request(IdleTaskRequest::new(
            vm,
            Box::new(move |deadline: f64| {
                *slot.lock() = Some(deadline);
            }),
            clock,
        ));

        let deadline = observed.lock().unwrap();
        // Queueing delay counted: the deadline reflects execution start, not
        // submission time.
        assert!(deadline >= submitted + 0.020);
        assert!(deadline >= submitted + IDLE_BUDGET_SECONDS);
        engine::shutdown();
    }
}
