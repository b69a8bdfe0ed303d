//! Job types and lifecycle
//!
//! A [`Job`] is one pending unit of document work: rendering a page,
//! building a thumbnail, loading a file, extracting links, resolving fonts,
//! or spooling a print run. The scheduler treats the work itself as an
//! opaque closure; everything it needs to know is the job's kind, its
//! execution mode, and its lifecycle state.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Unique job identifier, allocated from a process-wide counter.
pub type JobId = u64;

/// Shared-ownership handle to a job.
///
/// The submitter keeps one clone; the scheduler holds its own clone while
/// the job is queued, and another while it is executing or awaiting
/// completion delivery. Dropping the scheduler's clones is what releases
/// its ownership stake.
pub type JobHandle = Arc<Job>;

pub(crate) type WorkFn = Box<dyn FnOnce() + Send + 'static>;
pub(crate) type CompletionHook = Box<dyn FnOnce() + Send + 'static>;

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// What kind of document work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Render a page to pixels.
    Render,

    /// Generate a page thumbnail.
    Thumbnail,

    /// Load a document from its backing store.
    Load,

    /// Extract the link map of a page.
    Links,

    /// Resolve the document's font information.
    Fonts,

    /// Prepare a page for printing.
    Print,
}

/// Priority tier within a kind.
///
/// Only [`JobKind::Render`] and [`JobKind::Thumbnail`] have two tiers; for
/// the other kinds the submitted priority is ignored and a single queue is
/// used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobPriority {
    /// Off-screen or speculative work.
    Low,

    /// Work the user is waiting on right now.
    High,
}

/// Which thread executes the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Executed synchronously on the dedicated worker thread.
    WorkerThread,

    /// Dispatched inline on the origin thread, one at a time. Reserved for
    /// render backends that cannot be invoked off the main thread.
    OriginThread,
}

/// Job lifecycle state.
///
/// `Finished` and `Removed` are terminal. A job is a member of exactly one
/// queue while `Queued` and of no queue otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Constructed but not yet submitted.
    Created,

    /// Sitting in a scheduler queue.
    Queued,

    /// Popped from its queue and executing.
    Running,

    /// Execution and completion delivery are done.
    Finished,

    /// Cancelled while still queued; its completion hook will never fire.
    Removed,
}

impl JobState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => JobState::Created,
            1 => JobState::Queued,
            2 => JobState::Running,
            3 => JobState::Finished,
            4 => JobState::Removed,
            other => unreachable!("invalid job state {other}"),
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            JobState::Created => 0,
            JobState::Queued => 1,
            JobState::Running => 2,
            JobState::Finished => 3,
            JobState::Removed => 4,
        }
    }
}

/// A schedulable unit of document work.
///
/// The work closure runs exactly once, on the thread selected by the job's
/// [`ExecutionMode`]. The optional completion hook runs at most once, always
/// on the origin thread, and never for a job that was cancelled while
/// queued.
pub struct Job {
    id: JobId,
    kind: JobKind,
    mode: ExecutionMode,
    state: AtomicU8,
    work: Mutex<Option<WorkFn>>,
    on_finished: Mutex<Option<CompletionHook>>,
}

impl Job {
    /// Create a new job.
    ///
    /// # Panics
    ///
    /// Panics if `mode` is [`ExecutionMode::OriginThread`] and `kind` is not
    /// [`JobKind::Render`]: only render backends have a main-thread-only
    /// execution path, and anything else reaching it is a misclassified job.
    pub fn new(kind: JobKind, mode: ExecutionMode, work: impl FnOnce() + Send + 'static) -> JobHandle {
        assert!(
            mode == ExecutionMode::WorkerThread || kind == JobKind::Render,
            "only render jobs may use origin-thread execution, got {kind:?}"
        );

        Arc::new(Self {
            id: NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            mode,
            state: AtomicU8::new(JobState::Created.as_u8()),
            work: Mutex::new(Some(Box::new(work))),
            on_finished: Mutex::new(None),
        })
    }

    /// Unique identifier of this job.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Kind of work this job performs.
    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Thread this job executes on.
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Current lifecycle state.
    pub fn state(&self) -> JobState {
        JobState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether the job has reached a terminal state.
    pub fn is_done(&self) -> bool {
        matches!(self.state(), JobState::Finished | JobState::Removed)
    }

    /// Install the completion hook.
    ///
    /// The hook runs on the origin thread once execution (and, for
    /// worker-thread jobs, deferred delivery) completes. Installing a hook
    /// after the job finished or was removed is a no-op waiting to be
    /// dropped; install it before submitting.
    pub fn on_finished(&self, hook: impl FnOnce() + Send + 'static) {
        *self.on_finished.lock() = Some(Box::new(hook));
    }

    /// Transition to `Queued` at submission.
    ///
    /// # Panics
    ///
    /// Panics if the job was already submitted; jobs are single-use.
    pub(crate) fn mark_queued(&self) {
        let prev = self.state.swap(JobState::Queued.as_u8(), Ordering::AcqRel);
        assert_eq!(
            JobState::from_u8(prev),
            JobState::Created,
            "job {} submitted twice",
            self.id
        );
    }

    pub(crate) fn mark_running(&self) {
        self.state.store(JobState::Running.as_u8(), Ordering::Release);
    }

    pub(crate) fn mark_finished(&self) {
        self.state.store(JobState::Finished.as_u8(), Ordering::Release);
    }

    pub(crate) fn mark_removed(&self) {
        self.state.store(JobState::Removed.as_u8(), Ordering::Release);
    }

    /// Take the work closure for execution. Returns `None` on the second
    /// call; the closure runs exactly once.
    pub(crate) fn take_work(&self) -> Option<WorkFn> {
        self.work.lock().take()
    }

    /// Invoke the completion hook, if one is installed and has not fired.
    pub(crate) fn fire_completion(&self) {
        if let Some(hook) = self.on_finished.lock().take() {
            hook();
        }
    }

    /// Drop the completion hook without invoking it. Called on removal so
    /// the hook of a cancelled job can never fire.
    pub(crate) fn discard_completion(&self) {
        self.on_finished.lock().take();
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("mode", &self.mode)
            .field("state", &self.state())
            .finish()
    }
}
