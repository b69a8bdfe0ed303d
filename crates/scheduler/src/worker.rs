//! Synchronization core and the dedicated worker thread
//!
//! One mutex/condvar pair guards the eight worker-thread queues, and one
//! background thread is their sole consumer. The thread blocks on the
//! condition while the queues are empty, pops the highest-priority job,
//! drops the lock, and runs the job's work closure. Execution never holds
//! the scheduler lock, because work closures call into document-processing
//! code of unbounded duration. Finished jobs are handed to the completion
//! channel for deferred delivery on the origin thread.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::job::{Job, JobHandle, JobPriority};
use crate::queue::WorkerQueues;

/// State shared between the origin thread and the worker thread.
pub(crate) struct SharedState {
    queues: Mutex<WorkerQueues>,
    work_available: Condvar,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        Self {
            queues: Mutex::new(WorkerQueues::new()),
            work_available: Condvar::new(),
        }
    }

    /// Append a job under the lock and wake the worker.
    ///
    /// This broadcasts rather than signalling one waiter: a freshly
    /// submitted high-priority job must not lose a wakeup race against a
    /// waiter about to settle for lower-priority work. Only one thread ever
    /// consumes, so the extra wakeups cost nothing.
    pub(crate) fn enqueue(&self, job: JobHandle, priority: JobPriority) {
        let mut queues = self.queues.lock();
        queues.enqueue(job, priority);
        self.work_available.notify_all();
    }

    /// Move a queued job between priority tiers, atomically with respect to
    /// selection. Re-broadcasts on success for the same reason `enqueue`
    /// does.
    pub(crate) fn reprioritize(&self, job: &Job, new_priority: JobPriority) -> bool {
        let mut queues = self.queues.lock();
        let moved = queues.reprioritize(job, new_priority);
        if moved {
            self.work_available.notify_all();
        }
        moved
    }

    /// Remove a queued job, returning its handle if it was still queued.
    pub(crate) fn remove(&self, job: &Job) -> Option<JobHandle> {
        self.queues.lock().remove(job)
    }

    pub(crate) fn queued_len(&self) -> usize {
        self.queues.lock().len()
    }
}

/// Spawn the dedicated worker thread.
///
/// The thread lives for the rest of the process; there is no shutdown path
/// in normal operation, it simply parks on the condition variable whenever
/// the queues are empty.
pub(crate) fn spawn_worker(shared: Arc<SharedState>, finished: Sender<JobHandle>) {
    let handle = thread::Builder::new()
        .name("doc-job-worker".to_string())
        .spawn(move || worker_loop(&shared, &finished))
        .expect("failed to spawn the job worker thread");
    // Detached: the loop never returns and is never joined.
    drop(handle);
}

fn worker_loop(shared: &SharedState, finished: &Sender<JobHandle>) {
    loop {
        let job = {
            let mut queues = shared.queues.lock();
            while queues.no_jobs_available() {
                shared.work_available.wait(&mut queues);
            }
            queues.next_job()
        };

        // A spurious pass through the ladder can come up empty; never run
        // anything in that case, just go back to waiting.
        let Some(job) = job else { continue };

        job.mark_running();
        trace!(job = job.id(), kind = ?job.kind(), "executing job");

        if let Some(work) = job.take_work() {
            work();
        }

        debug!(job = job.id(), kind = ?job.kind(), "job executed, queueing notification");

        // The channel now owns the scheduler's reference until the origin
        // thread delivers the completion hook. A send error means the host
        // dropped the receiver; the job is done either way.
        let _ = finished.send(job);
    }
}
