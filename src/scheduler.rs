use crate::ports::{Deferred, Scheduler};
use std::time::{Duration, Instant};

struct Pending {
    due: Instant,
    seq: u64,
    task: Deferred,
}

/// Delayed tasks for the frame loop. Nothing runs on its own; the loop calls
/// `drain_due` every frame and executes what comes back.
#[derive(Default)]
pub(crate) struct TimerQueue {
    pending: Vec<Pending>,
    next_seq: u64,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn schedule_from(&mut self, now: Instant, delay: Duration, task: Deferred) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            due: now + delay,
            seq,
            task,
        });
    }

    /// Removes and returns every task due at `now`, earliest first. Ties keep
    /// scheduling order.
    pub(crate) fn drain_due(&mut self, now: Instant) -> Vec<Deferred> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due <= now {
                due.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|p| (p.due, p.seq));
        due.into_iter().map(|p| p.task).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

impl Scheduler for TimerQueue {
    fn after(&mut self, delay: Duration, task: Deferred) {
        self.schedule_from(Instant::now(), delay, task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn nothing_fires_early() {
        let t0 = Instant::now();
        let mut q = TimerQueue::new();
        q.schedule_from(t0, 200 * MS, Deferred::ResetBackground);

        assert!(q.drain_due(t0).is_empty());
        assert!(q.drain_due(t0 + 199 * MS).is_empty());
        assert_eq!(q.len(), 1);

        assert_eq!(q.drain_due(t0 + 200 * MS), vec![Deferred::ResetBackground]);
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn fires_once_only() {
        let t0 = Instant::now();
        let mut q = TimerQueue::new();
        q.schedule_from(t0, 10 * MS, Deferred::ResetBackground);

        assert_eq!(q.drain_due(t0 + 50 * MS).len(), 1);
        assert!(q.drain_due(t0 + 500 * MS).is_empty());
    }

    #[test]
    fn overlapping_resets_all_fire() {
        let t0 = Instant::now();
        let mut q = TimerQueue::new();
        q.schedule_from(t0, 200 * MS, Deferred::ResetBackground);
        q.schedule_from(t0 + 50 * MS, 200 * MS, Deferred::ResetBackground);

        assert_eq!(q.drain_due(t0 + 220 * MS).len(), 1);
        assert_eq!(q.len(), 1);
        assert_eq!(q.drain_due(t0 + 250 * MS).len(), 1);
    }
}
