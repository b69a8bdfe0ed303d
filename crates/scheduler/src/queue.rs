//! FIFO job queues and the fixed priority ladder
//!
//! The worker-thread side of the scheduler keeps eight queues, one per
//! (kind, tier) bucket. Selection walks them in a strict, non-adaptive
//! order; within a queue, jobs come out in submission order.

use std::collections::VecDeque;

use crate::job::{ExecutionMode, Job, JobHandle, JobKind, JobPriority};

/// An ordered FIFO sequence of jobs in one (kind, tier) bucket.
///
/// A job is a member of at most one queue at a time; the queue's clone of
/// the handle is the scheduler's ownership stake while the job is queued.
#[derive(Default)]
pub(crate) struct JobQueue {
    items: VecDeque<JobHandle>,
}

impl JobQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, job: JobHandle) {
        self.items.push_back(job);
    }

    pub(crate) fn pop(&mut self) -> Option<JobHandle> {
        self.items.pop_front()
    }

    /// Remove a job by identity, returning its handle if it was queued.
    pub(crate) fn remove(&mut self, job: &Job) -> Option<JobHandle> {
        let index = self.items.iter().position(|queued| queued.id() == job.id())?;
        self.items.remove(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The eight worker-thread queues, with priority selection.
///
/// The selection order is a strict ladder: a queued high-priority render
/// always goes first, and links/load/fonts/print never preempt render or
/// thumbnail traffic. Under sustained render load the bottom rungs can
/// starve indefinitely; that is the intended behavior, not a defect.
pub(crate) struct WorkerQueues {
    render_high: JobQueue,
    render_low: JobQueue,
    thumbnail_high: JobQueue,
    thumbnail_low: JobQueue,
    links: JobQueue,
    load: JobQueue,
    fonts: JobQueue,
    print: JobQueue,
}

impl WorkerQueues {
    pub(crate) fn new() -> Self {
        Self {
            render_high: JobQueue::new(),
            render_low: JobQueue::new(),
            thumbnail_high: JobQueue::new(),
            thumbnail_low: JobQueue::new(),
            links: JobQueue::new(),
            load: JobQueue::new(),
            fonts: JobQueue::new(),
            print: JobQueue::new(),
        }
    }

    /// Select the queue a worker-thread job belongs to.
    ///
    /// Priority only distinguishes render and thumbnail queues; the other
    /// kinds have a single tier regardless of the submitted priority.
    ///
    /// # Panics
    ///
    /// Panics if handed an origin-thread job; those never touch the locked
    /// queues.
    fn queue_for(&mut self, kind: JobKind, priority: JobPriority) -> &mut JobQueue {
        match (kind, priority) {
            (JobKind::Render, JobPriority::High) => &mut self.render_high,
            (JobKind::Render, JobPriority::Low) => &mut self.render_low,
            (JobKind::Thumbnail, JobPriority::High) => &mut self.thumbnail_high,
            (JobKind::Thumbnail, JobPriority::Low) => &mut self.thumbnail_low,
            (JobKind::Links, _) => &mut self.links,
            (JobKind::Load, _) => &mut self.load,
            (JobKind::Fonts, _) => &mut self.fonts,
            (JobKind::Print, _) => &mut self.print,
        }
    }

    /// Append a job to its bucket.
    pub(crate) fn enqueue(&mut self, job: JobHandle, priority: JobPriority) {
        assert_eq!(
            job.mode(),
            ExecutionMode::WorkerThread,
            "origin-thread job {} routed to the worker queues",
            job.id()
        );
        self.queue_for(job.kind(), priority).push(job);
    }

    /// Pop the head of the first non-empty queue in ladder order:
    ///
    /// render-high → thumbnail-high → render-low → links → load →
    /// thumbnail-low → fonts → print.
    pub(crate) fn next_job(&mut self) -> Option<JobHandle> {
        self.render_high
            .pop()
            .or_else(|| self.thumbnail_high.pop())
            .or_else(|| self.render_low.pop())
            .or_else(|| self.links.pop())
            .or_else(|| self.load.pop())
            .or_else(|| self.thumbnail_low.pop())
            .or_else(|| self.fonts.pop())
            .or_else(|| self.print.pop())
    }

    pub(crate) fn no_jobs_available(&self) -> bool {
        self.render_high.is_empty()
            && self.render_low.is_empty()
            && self.thumbnail_high.is_empty()
            && self.thumbnail_low.is_empty()
            && self.links.is_empty()
            && self.load.is_empty()
            && self.fonts.is_empty()
            && self.print.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.render_high.len()
            + self.render_low.len()
            + self.thumbnail_high.len()
            + self.thumbnail_low.len()
            + self.links.len()
            + self.load.len()
            + self.fonts.len()
            + self.print.len()
    }

    /// Remove a queued job from whichever bucket its kind can occupy.
    /// Returns the removed handle, or `None` if the job was not queued.
    pub(crate) fn remove(&mut self, job: &Job) -> Option<JobHandle> {
        match job.kind() {
            JobKind::Render => self
                .render_high
                .remove(job)
                .or_else(|| self.render_low.remove(job)),
            JobKind::Thumbnail => self
                .thumbnail_high
                .remove(job)
                .or_else(|| self.thumbnail_low.remove(job)),
            JobKind::Links => self.links.remove(job),
            JobKind::Load => self.load.remove(job),
            JobKind::Fonts => self.fonts.remove(job),
            JobKind::Print => self.print.remove(job),
        }
    }

    /// Move a queued render or thumbnail job from the opposite tier into
    /// the `new_priority` tier. Returns `false` if the job was not sitting
    /// in the opposite tier (already running, finished, removed, or already
    /// at the requested tier).
    ///
    /// # Panics
    ///
    /// Panics for kinds without priority tiers; reprioritizing those is a
    /// producer bug.
    pub(crate) fn reprioritize(&mut self, job: &Job, new_priority: JobPriority) -> bool {
        let (from, to) = match (job.kind(), new_priority) {
            (JobKind::Render, JobPriority::High) => (&mut self.render_low, &mut self.render_high),
            (JobKind::Render, JobPriority::Low) => (&mut self.render_high, &mut self.render_low),
            (JobKind::Thumbnail, JobPriority::High) => {
                (&mut self.thumbnail_low, &mut self.thumbnail_high)
            }
            (JobKind::Thumbnail, JobPriority::Low) => {
                (&mut self.thumbnail_high, &mut self.thumbnail_low)
            }
            (kind, _) => panic!("cannot reprioritize a {kind:?} job"),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Job;

    fn worker_job(kind: JobKind) -> JobHandle {
        Job::new(kind, ExecutionMode::WorkerThread, || {})
    }

    #[test]
    fn test_fifo_within_queue() {
        let mut queue = JobQueue::new();
        let a = worker_job(JobKind::Links);
        let b = worker_job(JobKind::Links);
        let c = worker_job(JobKind::Links);

        queue.push(a.clone());
        queue.push(b.clone());
        queue.push(c.clone());

        assert_eq!(queue.pop().unwrap().id(), a.id());
        assert_eq!(queue.pop().unwrap().id(), b.id());
        assert_eq!(queue.pop().unwrap().id(), c.id());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_remove_by_identity() {
        let mut queue = JobQueue::new();
        let a = worker_job(JobKind::Fonts);
        let b = worker_job(JobKind::Fonts);

        queue.push(a.clone());
        queue.push(b.clone());

        let removed = queue.remove(&a).unwrap();
        assert_eq!(removed.id(), a.id());
        assert_eq!(queue.len(), 1);
        assert!(queue.remove(&a).is_none());
    }

    #[test]
    fn test_ladder_order() {
        let mut queues = WorkerQueues::new();

        // Submit in reverse ladder order; pops must follow the ladder.
        let print = worker_job(JobKind::Print);
        let fonts = worker_job(JobKind::Fonts);
        let thumb_low = worker_job(JobKind::Thumbnail);
        let load = worker_job(JobKind::Load);
        let links = worker_job(JobKind::Links);
        let render_low = worker_job(JobKind::Render);
        let thumb_high = worker_job(JobKind::Thumbnail);
        let render_high = worker_job(JobKind::Render);

        queues.enqueue(print.clone(), JobPriority::Low);
        queues.enqueue(fonts.clone(), JobPriority::Low);
        queues.enqueue(thumb_low.clone(), JobPriority::Low);
        queues.enqueue(load.clone(), JobPriority::Low);
        queues.enqueue(links.clone(), JobPriority::Low);
        queues.enqueue(render_low.clone(), JobPriority::Low);
        queues.enqueue(thumb_high.clone(), JobPriority::High);
        queues.enqueue(render_high.clone(), JobPriority::High);

        let expected = [
            render_high.id(),
            thumb_high.id(),
            render_low.id(),
            links.id(),
            load.id(),
            thumb_low.id(),
            fonts.id(),
            print.id(),
        ];
        for id in expected {
            assert_eq!(queues.next_job().unwrap().id(), id);
        }
        assert!(queues.next_job().is_none());
        assert!(queues.no_jobs_available());
    }

    #[test]
    fn test_priority_ignored_for_single_tier_kinds() {
        let mut queues = WorkerQueues::new();
        let first = worker_job(JobKind::Load);
        let second = worker_job(JobKind::Load);

        // A "high" load does not jump ahead of an earlier "low" one.
        queues.enqueue(first.clone(), JobPriority::Low);
        queues.enqueue(second.clone(), JobPriority::High);

        assert_eq!(queues.next_job().unwrap().id(), first.id());
        assert_eq!(queues.next_job().unwrap().id(), second.id());
    }

    #[test]
    fn test_remove_searches_both_tiers() {
        let mut queues = WorkerQueues::new();
        let low = worker_job(JobKind::Render);
        let high = worker_job(JobKind::Render);

        queues.enqueue(low.clone(), JobPriority::Low);
        queues.enqueue(high.clone(), JobPriority::High);

        assert!(queues.remove(&low).is_some());
        assert!(queues.remove(&high).is_some());
        assert!(queues.remove(&high).is_none());
        assert!(queues.no_jobs_available());
    }

    #[test]
    fn test_reprioritize_moves_between_tiers() {
        let mut queues = WorkerQueues::new();
        let job = worker_job(JobKind::Render);
        queues.enqueue(job.clone(), JobPriority::Low);

        assert!(queues.reprioritize(&job, JobPriority::High));
        // Now at the head of render-high.
        assert_eq!(queues.next_job().unwrap().id(), job.id());
    }

    #[test]
    fn test_reprioritize_appends_after_existing_tier_members() {
        let mut queues = WorkerQueues::new();
        let resident = worker_job(JobKind::Render);
        let promoted = worker_job(JobKind::Render);

        queues.enqueue(resident.clone(), JobPriority::High);
        queues.enqueue(promoted.clone(), JobPriority::Low);

        assert!(queues.reprioritize(&promoted, JobPriority::High));

        // Tier-level FIFO: the promoted job lands behind the job that was
        // already in render-high, but ahead of anything in render-low.
        assert_eq!(queues.next_job().unwrap().id(), resident.id());
        assert_eq!(queues.next_job().unwrap().id(), promoted.id());
    }

    #[test]
    fn test_reprioritize_not_found() {
        let mut queues = WorkerQueues::new();
        let job = worker_job(JobKind::Thumbnail);
        queues.enqueue(job.clone(), JobPriority::High);

        // Already in the high tier; there is nothing in low to move.
        assert!(!queues.reprioritize(&job, JobPriority::High));
    }

    #[test]
    #[should_panic(expected = "cannot reprioritize")]
    fn test_reprioritize_single_tier_kind_panics() {
        let mut queues = WorkerQueues::new();
        let job = worker_job(JobKind::Print);
        queues.enqueue(job.clone(), JobPriority::Low);
        queues.reprioritize(&job, JobPriority::High);
    }

    #[test]
    #[should_panic(expected = "routed to the worker queues")]
    fn test_enqueue_rejects_origin_jobs() {
        let mut queues = WorkerQueues::new();
        let job = Job::new(JobKind::Render, ExecutionMode::OriginThread, || {});
        queues.enqueue(job, JobPriority::High);
    }
}
