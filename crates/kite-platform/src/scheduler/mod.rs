//! Host job scheduler: background pool + designated script thread.
//!
//! Two executors. The background [`ThreadPool`] is sized to the processor
//! count and runs work with no VM affinity. The script thread's [`EventLoop`]
//! serializes all VM-affine work on one thread and also services delayed-task
//! timers. No submission blocks waiting on another job's completion.

mod event_loop;
mod pool;

pub use event_loop::{EventLoop, Priority, TimerCallback, TimerFire};
pub use pool::{Job, ThreadPool};

use std::sync::Arc;

/// Façade over the two executors the platform submits work to.
pub struct ScriptScheduler {
    pool: ThreadPool,
    event_loop: Arc<EventLoop>,
}

impl ScriptScheduler {
    /// Create and start both executors. The pool gets one worker per
    /// available processor.
    pub fn new() -> Self {
        let pool = ThreadPool::new(0);
        let event_loop = EventLoop::new();
        event_loop.start();
        Self { pool, event_loop }
    }

    /// Submit a job to the background pool. No ordering guarantee beyond
    /// "as soon as a worker is free".
    pub fn push_job_on_thread_pool(&self, job: Job) {
        self.pool.push(job);
    }

    /// Submit a job to the script thread at `priority`. Jobs at equal
    /// priority run in submission order.
    pub fn push_job_on_script_thread(&self, priority: Priority, job: Job) {
        self.event_loop.push_job(priority, job);
    }

    /// Handle to the script thread's event loop, used to attach timers.
    pub fn event_loop(&self) -> &Arc<EventLoop> {
        &self.event_loop
    }

    /// Number of background pool threads.
    pub fn pool_thread_count(&self) -> usize {
        self.pool.thread_count()
    }

    /// Stop both executors. The pool drains every job it already accepted;
    /// script-thread jobs still queued are dropped unrun.
    pub fn stop(&self) {
        self.pool.stop();
        self.event_loop.stop();
    }
}

impl Default for ScriptScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScriptScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[test]
    fn test_scheduler_runs_on_both_executors() {
        let scheduler = ScriptScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();

        let pool_counter = counter.clone();
        let pool_tx = tx.clone();
        scheduler.push_job_on_thread_pool(Box::new(move || {
            pool_counter.fetch_add(1, Ordering::SeqCst);
            pool_tx.send(()).unwrap();
        }));

        let script_counter = counter.clone();
        scheduler.push_job_on_script_thread(
            Priority::Default,
            Box::new(move || {
                script_counter.fetch_add(1, Ordering::SeqCst);
                tx.send(()).unwrap();
            }),
        );

        rx.recv().unwrap();
        rx.recv().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        scheduler.stop();
    }

    #[test]
    fn test_pool_thread_count_matches_processors() {
        let scheduler = ScriptScheduler::new();
        assert_eq!(scheduler.pool_thread_count(), num_cpus::get());
        scheduler.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let scheduler = ScriptScheduler::new();
        scheduler.stop();
        scheduler.stop();
    }
}
