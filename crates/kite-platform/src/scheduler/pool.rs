//! Background worker pool for jobs with no VM affinity.

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::thread::{self, JoinHandle};

/// A unit of work submitted to an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of background worker threads.
///
/// Workers consume jobs from a shared channel. On [`stop`](Self::stop) the
/// sender is dropped and workers drain every job already accepted before
/// exiting, so an accepted job is never lost. A push that arrives after
/// shutdown has taken the sender runs the job in place on the calling thread
/// instead — the caller-side half of the teardown race contract.
pub struct ThreadPool {
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    thread_count: usize,
}

impl ThreadPool {
    /// Create a pool with `thread_count` workers.
    /// If `thread_count` is 0, defaults to the number of CPU cores.
    pub fn new(thread_count: usize) -> Self {
        let count = if thread_count == 0 {
            num_cpus::get()
        } else {
            thread_count
        };

        let (sender, receiver) = channel::unbounded::<Job>();
        let mut workers = Vec::with_capacity(count);

        for id in 0..count {
            let receiver: Receiver<Job> = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("kite-pool-{}", id))
                .spawn(move || {
                    // Channel disconnection doubles as the shutdown signal;
                    // recv keeps yielding queued jobs until the queue is empty.
                    while let Ok(job) = receiver.recv() {
                        job();
                    }
                })
                .expect("failed to spawn pool worker thread");
            workers.push(handle);
        }

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            thread_count: count,
        }
    }

    /// Number of worker threads.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Submit a job. Falls back to running `job` on the calling thread when
    /// the pool is already shutting down.
    pub fn push(&self, job: Job) {
        let rejected = {
            let sender = self.sender.lock();
            match sender.as_ref() {
                Some(tx) => tx.send(job).err().map(|err| err.into_inner()),
                None => Some(job),
            }
        };

        if let Some(job) = rejected {
            job();
        }
    }

    /// Stop accepting jobs, drain the queue, and join all workers.
    pub fn stop(&self) {
        drop(self.sender.lock().take());

        let workers = std::mem::take(&mut *self.workers.lock());
        for handle in workers {
            let _ = handle.join();
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}
