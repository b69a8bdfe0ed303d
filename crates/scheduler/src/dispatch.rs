//! Origin-thread dispatcher for main-thread-only render backends
//!
//! Some render backends cannot be invoked off the main thread; their jobs
//! are queued here instead of on the worker queues and started inline on
//! the thread that submitted them, strictly one at a time. There is no lock
//! and no blocking wait: only the origin thread ever touches this state,
//! and advancing happens either at submission or when the in-flight job's
//! completion arrives.

use tracing::{debug, trace};

use crate::job::{ExecutionMode, Job, JobHandle, JobKind, JobPriority, WorkFn};
use crate::queue::JobQueue;

/// Two-tier FIFO of origin-thread render jobs plus the in-flight slot.
pub(crate) struct OriginDispatcher {
    high: JobQueue,
    low: JobQueue,
    busy: bool,
    /// The scheduler's ownership stake in the in-flight job. `busy` and
    /// `current.is_some()` move together; the flag is what submission
    /// checks, the handle is what completion is validated against.
    current: Option<JobHandle>,
}

impl OriginDispatcher {
    pub(crate) fn new() -> Self {
        Self {
            high: JobQueue::new(),
            low: JobQueue::new(),
            busy: false,
            current: None,
        }
    }

    pub(crate) fn busy(&self) -> bool {
        self.busy
    }

    pub(crate) fn queued_len(&self) -> usize {
        self.high.len() + self.low.len()
    }

    /// Append a job to the requested tier.
    ///
    /// # Panics
    ///
    /// Panics for anything that is not an origin-thread render job; a
    /// non-render job reaching this path was misclassified by its producer.
    pub(crate) fn enqueue(&mut self, job: JobHandle, priority: JobPriority) {
        assert!(
            job.kind() == JobKind::Render && job.mode() == ExecutionMode::OriginThread,
            "job {} ({:?}, {:?}) is not an origin-thread render job",
            job.id(),
            job.kind(),
            job.mode()
        );

        match priority {
            JobPriority::High => self.high.push(job),
            JobPriority::Low => self.low.push(job),
        }
    }

    /// Pop the next job (high tier first) and mark it in flight, returning
    /// its work closure for the caller to invoke.
    ///
    /// The closure is returned rather than run here so the caller can drop
    /// its borrow of the dispatcher first: the closure is expected to kick
    /// off asynchronous rendering and return immediately, but it is free to
    /// call back into the scheduler while it does.
    pub(crate) fn start_next(&mut self) -> Option<WorkFn> {
        if self.busy {
            return None;
        }

        let job = self.high.pop().or_else(|| self.low.pop())?;
        trace!(job = job.id(), "dispatching origin-thread render");

        self.busy = true;
        job.mark_running();
        let work = job.take_work();
        self.current = Some(job);
        work
    }

    /// Clear the in-flight slot once the job's own asynchronous completion
    /// has arrived, handing back the scheduler's ownership stake.
    ///
    /// # Panics
    ///
    /// Panics if `job` is not the job currently in flight; the host wired
    /// a completion to the wrong scheduler or delivered it twice.
    pub(crate) fn finish(&mut self, job: &Job) -> JobHandle {
        let current = self
            .current
            .take()
            .unwrap_or_else(|| panic!("origin completion for job {} but nothing in flight", job.id()));
        assert_eq!(
            current.id(),
            job.id(),
            "origin completion for job {} while job {} is in flight",
            job.id(),
            current.id()
        );

        debug!(job = current.id(), "origin-thread render finished");
        self.busy = false;
        current
    }

    /// Remove a queued job from either tier. Returns the handle if the job
    /// had not started yet; the in-flight job cannot be removed.
    pub(crate) fn remove(&mut self, job: &Job) -> Option<JobHandle> {
        self.high.remove(job).or_else(|| self.low.remove(job))
    }

    /// Move a queued job from the opposite tier into `new_priority`.
    /// Single-threaded, so unlike the worker side this needs no lock.
    pub(crate) fn reprioritize(&mut self, job: &Job, new_priority: JobPriority) -> bool {
        let (from, to) = match new_priority {
            JobPriority::High => (&mut self.low, &mut self.high),
            JobPriority::Low => (&mut self.high, &mut self.low),
        };
        match from.remove(job) {
            Some(handle) => {
                to.push(handle);
                true
            }
            None => false,
        }
    }
}
