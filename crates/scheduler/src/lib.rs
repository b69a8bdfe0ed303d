//! PDF Viewer Scheduler Library
//!
//! Prioritized multi-queue job scheduler for the viewer's document
//! pipeline. Producers on the UI thread submit jobs (render, thumbnail,
//! load, links, fonts, print); one dedicated worker thread executes them in
//! a strict priority order across eight FIFO queues, and a separate
//! origin-thread dispatch path serializes render backends that cannot run
//! off the main thread. Queued jobs can still be moved between priority
//! tiers or cancelled; completion hooks are always delivered on the
//! submitting thread.
//!
//! The worker selects jobs in this fixed order:
//! render-high, thumbnail-high, render-low, links, load, thumbnail-low,
//! fonts, print. The ladder is strict on purpose: under sustained render
//! load the lower rungs wait.
//!
//! # Example
//!
//! ```
//! use pdf_viewer_scheduler::{ExecutionMode, Job, JobKind, JobPriority, Scheduler};
//!
//! let (scheduler, completions) = Scheduler::new();
//!
//! let job = Job::new(JobKind::Render, ExecutionMode::WorkerThread, || {
//!     // rasterize the page
//! });
//! job.on_finished(|| {
//!     // repaint the view
//! });
//! scheduler.submit(&job, JobPriority::High);
//!
//! // From the event loop, on the submitting thread:
//! completions.drain();
//! ```

mod completion;
mod dispatch;
mod job;
mod queue;
mod scheduler;
mod worker;

// Re-export public API
pub use completion::CompletionReceiver;
pub use job::{ExecutionMode, Job, JobHandle, JobId, JobKind, JobPriority, JobState};
pub use scheduler::{Scheduler, SchedulerStats};
