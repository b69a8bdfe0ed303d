//! Deferred completion delivery
//!
//! Worker-thread jobs must not invoke their completion hooks from the
//! worker thread: all caller-visible state changes happen on the origin
//! thread. The worker instead pushes each finished job onto a channel, and
//! the host's event loop drains it from the origin thread: FIFO per
//! scheduler, exactly once per job. This is the "run this on the origin
//! thread soon" primitive the scheduler requires from its host.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use tracing::trace;

use crate::job::JobHandle;
use crate::scheduler::Counters;

/// Origin-thread receiving end for finished worker-thread jobs.
///
/// Returned by [`Scheduler::new`](crate::Scheduler::new); the host keeps it
/// on the origin thread and calls [`drain`](Self::drain) from its event
/// loop. Each delivered job is marked finished and has its completion hook
/// invoked, after which the scheduler's ownership reference is released.
pub struct CompletionReceiver {
    finished: Receiver<JobHandle>,
    counters: Arc<Counters>,
}

impl CompletionReceiver {
    pub(crate) fn new(finished: Receiver<JobHandle>, counters: Arc<Counters>) -> Self {
        Self { finished, counters }
    }

    /// Deliver every pending completion, returning how many were delivered.
    ///
    /// Non-blocking; call from the origin thread's event loop.
    pub fn drain(&self) -> usize {
        let mut delivered = 0;
        while let Ok(job) = self.finished.try_recv() {
            self.deliver(job);
            delivered += 1;
        }
        delivered
    }

    /// Block up to `timeout` for one completion and deliver it.
    ///
    /// Returns `false` if no job finished within the timeout. Mostly useful
    /// to hosts (and tests) that want to park until background work lands
    /// instead of polling [`drain`](Self::drain).
    pub fn deliver_next(&self, timeout: Duration) -> bool {
        match self.finished.recv_timeout(timeout) {
            Ok(job) => {
                self.deliver(job);
                true
            }
            Err(_) => false,
        }
    }

    fn deliver(&self, job: JobHandle) {
        trace!(job = job.id(), kind = ?job.kind(), "delivering completion");
        job.mark_finished();
        job.fire_completion();
        self.counters.record_completed();
        // Dropping `job` here releases the scheduler's last reference.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{ExecutionMode, Job, JobKind, JobState};
    use crossbeam_channel::unbounded;
    use parking_lot::Mutex;

    /// Route `tracing` output through the test harness so `--nocapture`
    /// shows the delivery log lines.
    fn init_logging() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn receiver_pair() -> (crossbeam_channel::Sender<JobHandle>, CompletionReceiver) {
        let (tx, rx) = unbounded();
        (tx, CompletionReceiver::new(rx, Arc::new(Counters::default())))
    }

    #[test]
    fn test_drain_empty() {
        init_logging();
        let (_tx, receiver) = receiver_pair();
        assert_eq!(receiver.drain(), 0);
    }

    #[test]
    fn test_drain_delivers_in_fifo_order() {
        init_logging();
        let (tx, receiver) = receiver_pair();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut ids = Vec::new();
        for _ in 0..3 {
            let job = Job::new(JobKind::Thumbnail, ExecutionMode::WorkerThread, || {});
            let order = order.clone();
            let id = job.id();
            job.on_finished(move || order.lock().push(id));
            ids.push(id);
            tx.send(job).unwrap();
        }

        assert_eq!(receiver.drain(), 3);
        assert_eq!(*order.lock(), ids);
    }

    #[test]
    fn test_delivery_marks_finished_exactly_once() {
        init_logging();
        use std::sync::atomic::{AtomicUsize, Ordering};

        let (tx, receiver) = receiver_pair();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();

        let job = Job::new(JobKind::Links, ExecutionMode::WorkerThread, || {});
        job.on_finished(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });
        tx.send(job.clone()).unwrap();

        assert_eq!(receiver.drain(), 1);
        assert_eq!(receiver.drain(), 0);
        assert_eq!(job.state(), JobState::Finished);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deliver_next_times_out() {
        init_logging();
        let (_tx, receiver) = receiver_pair();
        assert!(!receiver.deliver_next(Duration::from_millis(50)));
    }
}
