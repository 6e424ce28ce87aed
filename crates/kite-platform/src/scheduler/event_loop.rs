//! Cooperative event loop driving the designated script thread.
//!
//! One thread owns a priority job queue and a timer heap. Instead of polling,
//! the loop waits on a condvar until the next timer deadline or a new
//! submission. Jobs at equal priority run in submission order; timers fire no
//! earlier than their deadline, possibly later under backlog.

use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::pool::Job;

/// Scheduling priority for script-thread jobs.
///
/// Ordered from most to least urgent; the derived order is what the queue
/// sorts by.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Runs before default-priority work
    High,
    /// Normal dispatch priority
    Default,
    /// Runs only when nothing more urgent is pending
    Low,
}

/// What a timer callback wants done with its source after firing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimerFire {
    /// Fire again one interval from the previous deadline
    Rearm,
    /// Detach the source; it never fires again
    Detach,
}

/// Callback invoked on the script thread when a timer fires.
pub type TimerCallback = Box<dyn FnMut() -> TimerFire + Send + 'static>;

struct QueuedJob {
    priority: Priority,
    seq: u64,
    job: Job,
}

// Reverse ordering: BinaryHeap is a max-heap and we pop the lowest
// (priority, seq) pair first.
impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.priority, other.seq).cmp(&(self.priority, self.seq))
    }
}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedJob {}

struct TimerEntry {
    fire_at: Instant,
    seq: u64,
    interval: Duration,
    callback: TimerCallback,
}

// Reverse ordering for a min-heap on (fire_at, seq).
impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.fire_at, other.seq).cmp(&(self.fire_at, self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

struct LoopState {
    jobs: BinaryHeap<QueuedJob>,
    timers: BinaryHeap<TimerEntry>,
}

/// The script thread's event loop.
///
/// Jobs still queued when the loop is stopped are dropped unrun: the
/// embedder contract requires script work to be quiescent before teardown.
pub struct EventLoop {
    state: Mutex<LoopState>,
    notify: Condvar,
    shutdown: AtomicBool,
    next_seq: AtomicU64,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl EventLoop {
    /// Create the event loop. It does not process anything until
    /// [`start`](Self::start) is called.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(LoopState {
                jobs: BinaryHeap::new(),
                timers: BinaryHeap::new(),
            }),
            notify: Condvar::new(),
            shutdown: AtomicBool::new(false),
            next_seq: AtomicU64::new(1),
            handle: Mutex::new(None),
        })
    }

    /// Spawn the script thread and begin processing.
    pub fn start(self: &Arc<Self>) {
        let event_loop = Arc::clone(self);

        let handle = thread::Builder::new()
            .name("kite-script".to_string())
            .spawn(move || {
                event_loop.run_loop();
            })
            .expect("failed to spawn script thread");

        *self.handle.lock() = Some(handle);
    }

    /// Queue `job` at `priority`. Equal priorities run in submission order.
    pub fn push_job(&self, priority: Priority, job: Job) {
        let seq = self.next_seq.fetch_add(1, AtomicOrdering::Relaxed);
        let mut state = self.state.lock();
        state.jobs.push(QueuedJob { priority, seq, job });
        drop(state);
        self.notify.notify_one();
    }

    /// Attach a timer firing after `delay`. The callback decides whether the
    /// source rearms at the same interval or detaches.
    pub fn add_timeout(&self, delay: Duration, callback: TimerCallback) {
        let seq = self.next_seq.fetch_add(1, AtomicOrdering::Relaxed);
        let mut state = self.state.lock();
        state.timers.push(TimerEntry {
            fire_at: Instant::now() + delay,
            seq,
            interval: delay,
            callback,
        });
        drop(state);
        self.notify.notify_one();
    }

    /// Stop the loop and join the script thread. Idempotent.
    pub fn stop(&self) {
        self.shutdown.store(true, AtomicOrdering::Release);
        self.notify.notify_one();

        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }

    /// Number of attached timer sources (for tests and stats).
    pub fn timer_count(&self) -> usize {
        self.state.lock().timers.len()
    }

    fn run_loop(&self) {
        loop {
            if self.shutdown.load(AtomicOrdering::Acquire) {
                break;
            }

            let mut state = self.state.lock();

            // Re-check after acquiring the lock: stop() may set the flag and
            // notify between the check above and the lock, losing the wakeup.
            if self.shutdown.load(AtomicOrdering::Acquire) {
                break;
            }

            // Fire due timers with the state lock released; callbacks may
            // push jobs or new timers back into this loop.
            let now = Instant::now();
            let mut due = Vec::new();
            while state.timers.peek().map_or(false, |t| t.fire_at <= now) {
                due.push(state.timers.pop().unwrap());
            }
            if !due.is_empty() {
                drop(state);
                for mut entry in due {
                    match (entry.callback)() {
                        TimerFire::Rearm => {
                            entry.fire_at += entry.interval;
                            self.state.lock().timers.push(entry);
                        }
                        TimerFire::Detach => {}
                    }
                }
                continue;
            }

            // Run one job, then loop so timers stay serviced under backlog.
            if let Some(queued) = state.jobs.pop() {
                drop(state);
                (queued.job)();
                continue;
            }

            // Idle: sleep until the next timer deadline or a new submission.
            if let Some(next) = state.timers.peek() {
                let timeout = next.fire_at.saturating_duration_since(Instant::now());
                self.notify.wait_for(&mut state, timeout);
            } else {
                self.notify.wait(&mut state);
            }
        }

        tracing::debug!("script thread event loop shutting down");
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
