//! The idle registry: parked workers ordered by park time.

use std::collections::VecDeque;
use std::time::Instant;

use crossbeam_channel::Sender;

use crate::task::Mail;

/// A parked worker: the sending half of its mailbox plus the instant it
/// went idle.
pub(crate) struct Parked {
    pub(crate) slot: Sender<Mail>,
    pub(crate) parked_at: Instant,
}

/// Ordered collection of parked workers.
///
/// Workers are always appended at the back and claimed from the front, so
/// position order equals park-time order: the front is the oldest parked
/// worker and therefore both the next one to hand out (FIFO reuse) and
/// the next one to expire. The reaper relies on this to stop its sweep at
/// the first entry still inside the survival window.
///
/// Removal is deliberately front-only. Both consumers — claim and reap —
/// take the oldest entry, so the registry narrows to a queue instead of
/// carrying a linked list for mid-queue removal nothing performs.
#[derive(Default)]
pub(crate) struct IdleQueue {
    entries: VecDeque<Parked>,
}

impl IdleQueue {
    /// Park a worker, stamping the current time.
    pub(crate) fn push_back(&mut self, slot: Sender<Mail>) {
        self.entries.push_back(Parked {
            slot,
            parked_at: Instant::now(),
        });
    }

    /// Claim the oldest parked worker.
    pub(crate) fn pop_front(&mut self) -> Option<Parked> {
        self.entries.pop_front()
    }

    /// Peek the oldest parked worker without removing it.
    pub(crate) fn front(&self) -> Option<&Parked> {
        self.entries.front()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Remove every parked worker, oldest first.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Parked> + '_ {
        self.entries.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn slot() -> Sender<Mail> {
        let (tx, rx) = bounded(1);
        // keep the receiver alive for the test's duration
        std::mem::forget(rx);
        tx
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = IdleQueue::default();
        let (a, b) = (slot(), slot());
        queue.push_back(a.clone());
        queue.push_back(b.clone());
        assert_eq!(queue.len(), 2);

        let first = queue.pop_front().unwrap();
        assert!(first.slot.same_channel(&a));
        let second = queue.pop_front().unwrap();
        assert!(second.slot.same_channel(&b));
        assert!(queue.pop_front().is_none());
    }

    #[test]
    fn test_front_is_oldest() {
        let mut queue = IdleQueue::default();
        queue.push_back(slot());
        let oldest = queue.front().unwrap().parked_at;
        queue.push_back(slot());
        assert_eq!(queue.front().unwrap().parked_at, oldest);
    }

    #[test]
    fn test_drain_empties() {
        let mut queue = IdleQueue::default();
        queue.push_back(slot());
        queue.push_back(slot());
        assert_eq!(queue.drain().count(), 2);
        assert_eq!(queue.len(), 0);
    }
}
