/// Cooperative timer scheduling on a virtual millisecond clock.
///
/// Nothing here sleeps. The owner moves the clock forward and drains due
/// timers one at a time, in deadline order (ties in scheduling order).

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A single-threaded timer queue carrying a payload per timer.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_seq: u64,
    queue: BTreeMap<(u64, u64), T>,
    deadlines: FxHashMap<TimerId, u64>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
            deadlines: FxHashMap::default(),
        }
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `payload` to become due `delay_ms` from now.
    pub fn schedule(&mut self, delay_ms: u64, payload: T) -> TimerId {
        let deadline = self.now_ms.saturating_add(delay_ms);
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = TimerId(seq);
        self.queue.insert((deadline, seq), payload);
        self.deadlines.insert(id, deadline);
        id
    }

    /// Cancel a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.queue.remove(&(deadline, id.0)).is_some(),
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        self.queue.clear();
        self.deadlines.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its deadline. Returns `None` once nothing else is due.
    pub fn pop_due(&mut self, until: u64) -> Option<(TimerId, T)> {
        let (&(deadline, seq), _) = self.queue.iter().next()?;
        if deadline > until {
            return None;
        }
        let payload = self.queue.remove(&(deadline, seq))?;
        let id = TimerId(seq);
        self.deadlines.remove(&id);
        self.now_ms = self.now_ms.max(deadline);
        Some((id, payload))
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

/// An owned slot holding at most one pending timer.
///
/// Arming the slot cancels whatever it held before; releasing it cancels
/// the pending timer. Each text block or transition owns one slot so a
/// stale timer can never outlive the thing it was scheduled for.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimerSlot {
    pending: Option<TimerId>,
}

impl TimerSlot {
    pub fn arm<T>(&mut self, scheduler: &mut Scheduler<T>, delay_ms: u64, payload: T) {
        self.release(scheduler);
        self.pending = Some(scheduler.schedule(delay_ms, payload));
    }

    pub fn release<T>(&mut self, scheduler: &mut Scheduler<T>) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel(id);
        }
    }

    /// Forget the held timer after it fired.
    pub fn clear_fired(&mut self, fired: TimerId) {
        if self.pending == Some(fired) {
            self.pending = None;
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn id(&self) -> Option<TimerId> {
        self.pending
    }
}
