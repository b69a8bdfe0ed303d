//! Scheduler facade
//!
//! The public entry points producers call: submit, reprioritize, cancel,
//! and the origin-render completion callback. One scheduler exists per
//! process, constructed once at startup; it owns the worker-thread
//! synchronization core and the origin-thread dispatcher.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::unbounded;
use tracing::debug;

use crate::completion::CompletionReceiver;
use crate::dispatch::OriginDispatcher;
use crate::job::{ExecutionMode, JobHandle, JobPriority};
use crate::worker::{spawn_worker, SharedState};

/// Snapshot of scheduler bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    /// Total jobs submitted.
    pub jobs_submitted: u64,

    /// Total jobs whose completion was delivered.
    pub jobs_completed: u64,

    /// Total jobs removed by cancellation while still queued.
    pub jobs_cancelled: u64,

    /// Jobs currently sitting in a queue.
    pub queue_size: usize,
}

impl SchedulerStats {
    /// Jobs submitted but neither delivered nor cancelled yet.
    pub fn pending_jobs(&self) -> u64 {
        self.jobs_submitted - self.jobs_completed - self.jobs_cancelled
    }
}

#[derive(Default)]
pub(crate) struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    cancelled: AtomicU64,
}

impl Counters {
    fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, queue_size: usize) -> SchedulerStats {
        SchedulerStats {
            jobs_submitted: self.submitted.load(Ordering::Relaxed),
            jobs_completed: self.completed.load(Ordering::Relaxed),
            jobs_cancelled: self.cancelled.load(Ordering::Relaxed),
            queue_size,
        }
    }
}

/// The job scheduler.
///
/// Producers submit jobs, may still move them between priority tiers or
/// cancel them while queued, and receive completion hooks back on the
/// origin thread. Worker-thread jobs are drained by one dedicated
/// background thread in strict ladder order; origin-thread render jobs are
/// dispatched inline, one at a time.
///
/// The scheduler is deliberately not `Sync`: every producer call happens on
/// the thread that created it, which is also the thread completion hooks
/// run on. Only the worker thread's shared state crosses threads.
///
/// # Example
///
/// ```
/// use pdf_viewer_scheduler::{ExecutionMode, Job, JobKind, JobPriority, Scheduler};
///
/// let (scheduler, completions) = Scheduler::new();
///
/// let job = Job::new(JobKind::Thumbnail, ExecutionMode::WorkerThread, || {
///     // build the thumbnail bitmap
/// });
/// job.on_finished(|| {
///     // update the sidebar
/// });
/// scheduler.submit(&job, JobPriority::Low);
///
/// // From the event loop, on the same thread:
/// completions.drain();
/// ```
pub struct Scheduler {
    shared: Arc<SharedState>,
    origin: RefCell<OriginDispatcher>,
    counters: Arc<Counters>,
}

impl Scheduler {
    /// Create the scheduler and spawn its worker thread.
    ///
    /// Returns the scheduler together with the [`CompletionReceiver`] the
    /// host event loop must drain on this same thread. Called once at
    /// process start; the worker thread lives for the process lifetime.
    pub fn new() -> (Self, CompletionReceiver) {
        let shared = Arc::new(SharedState::new());
        let counters = Arc::new(Counters::default());
        let (finished_tx, finished_rx) = unbounded();

        spawn_worker(shared.clone(), finished_tx);

        let scheduler = Self {
            shared,
            origin: RefCell::new(OriginDispatcher::new()),
            counters: counters.clone(),
        };
        (scheduler, CompletionReceiver::new(finished_rx, counters))
    }

    /// Submit a job at the given priority.
    ///
    /// Worker-thread jobs are appended to their bucket under the lock and
    /// the worker is woken. Origin-thread render jobs are queued without a
    /// lock and, if nothing is in flight, start executing before this call
    /// returns.
    ///
    /// # Panics
    ///
    /// Panics if the job was already submitted once; jobs are single-use.
    pub fn submit(&self, job: &JobHandle, priority: JobPriority) {
        job.mark_queued();
        self.counters.record_submitted();
        debug!(job = job.id(), kind = ?job.kind(), ?priority, "job submitted");

        match job.mode() {
            ExecutionMode::WorkerThread => self.shared.enqueue(job.clone(), priority),
            ExecutionMode::OriginThread => {
                self.origin.borrow_mut().enqueue(job.clone(), priority);
                self.advance_origin();
            }
        }
    }

    /// Move a still-queued render or thumbnail job to the other priority
    /// tier, keeping its position relative to jobs already in that tier.
    ///
    /// Returns `false` if the job was not found in the opposite tier: it is
    /// already running, finished, removed, or already where it was asked to
    /// go. Callers should check the job's own state rather than treat this
    /// as an error.
    ///
    /// # Panics
    ///
    /// Panics for kinds without priority tiers (load, links, fonts, print).
    pub fn reprioritize(&self, job: &JobHandle, new_priority: JobPriority) -> bool {
        match job.mode() {
            ExecutionMode::WorkerThread => self.shared.reprioritize(job, new_priority),
            ExecutionMode::OriginThread => self.origin.borrow_mut().reprioritize(job, new_priority),
        }
    }

    /// Remove a job that is still queued.
    ///
    /// On success the job is marked removed, its completion hook is
    /// discarded so it can never fire, and the scheduler's ownership
    /// reference is released. Returns `false` if the job was not queued
    /// anymore; it may already be running, in which case its hook will
    /// still be delivered. Cancelling twice returns `true` at most once.
    pub fn cancel(&self, job: &JobHandle) -> bool {
        let removed = match job.mode() {
            ExecutionMode::WorkerThread => self.shared.remove(job),
            ExecutionMode::OriginThread => self.origin.borrow_mut().remove(job),
        };

        match removed {
            Some(handle) => {
                handle.mark_removed();
                handle.discard_completion();
                self.counters.record_cancelled();
                debug!(job = handle.id(), "job cancelled while queued");
                true
            }
            None => false,
        }
    }

    /// Report that the in-flight origin-thread render has completed.
    ///
    /// The host's render backend calls this (on the origin thread) once its
    /// asynchronous rendering is done. The job's completion hook fires
    /// synchronously, the busy flag clears, and the next queued
    /// origin-thread job (if any) starts before this call returns.
    ///
    /// # Panics
    ///
    /// Panics if `job` is not the origin-thread job currently in flight.
    pub fn origin_render_finished(&self, job: &JobHandle) {
        let finished = self.origin.borrow_mut().finish(job);
        finished.mark_finished();
        finished.fire_completion();
        self.counters.record_completed();
        drop(finished);

        self.advance_origin();
    }

    /// Whether an origin-thread render is currently in flight.
    pub fn origin_render_busy(&self) -> bool {
        self.origin.borrow().busy()
    }

    /// Number of jobs currently queued (both execution modes).
    pub fn pending_jobs(&self) -> usize {
        self.shared.queued_len() + self.origin.borrow().queued_len()
    }

    /// Whether any job is currently queued.
    pub fn has_pending_jobs(&self) -> bool {
        self.pending_jobs() > 0
    }

    /// Current bookkeeping snapshot.
    pub fn stats(&self) -> SchedulerStats {
        self.counters.snapshot(self.pending_jobs())
    }

    /// Start the next origin-thread job if the dispatcher is idle. The
    /// dispatcher borrow is released before the work closure runs, so the
    /// closure may call back into the scheduler.
    fn advance_origin(&self) {
        let work = self.origin.borrow_mut().start_next();
        if let Some(work) = work {
            work();
        }
    }
}
