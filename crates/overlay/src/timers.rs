//! Cancelable scheduled callbacks.
//!
//! Nothing runs on its own: the host asks for [`Timers::next_deadline`],
//! sleeps, then drains due actions with [`Timers::pop_due`].

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<T> {
    id: TimerId,
    deadline: Instant,
    action: T,
}

#[derive(Debug)]
pub struct Timers<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Timers<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn schedule(&mut self, deadline: Instant, action: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            deadline,
            action,
        });
        id
    }

    /// Returns false if the timer already fired or was canceled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Cancel every pending action matching `pred`. Returns how many were dropped.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !pred(&e.action));
        before - self.entries.len()
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Remove and return the earliest action due at `now`. Ties fire in
    /// scheduling order.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerId, T)> {
        self.pop_earliest(|deadline| deadline <= now)
    }

    /// Like [`Timers::pop_due`], but a deadline equal to `now` has not
    /// expired yet.
    pub fn pop_expired(&mut self, now: Instant) -> Option<(TimerId, T)> {
        self.pop_earliest(|deadline| deadline < now)
    }

    fn pop_earliest(&mut self, due: impl Fn(Instant) -> bool) -> Option<(TimerId, T)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| due(e.deadline))
            .min_by_key(|(_, e)| (e.deadline, e.id))
            .map(|(i, _)| i)?;
        let entry = self.entries.remove(idx);
        Some((entry.id, entry.action))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_pop_due_in_deadline_order() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.schedule(t0 + Duration::from_millis(300), "close");
        timers.schedule(t0 + Duration::from_millis(10), "show");
        timers.schedule(t0 + Duration::from_millis(200), "swap");

        assert_eq!(timers.next_deadline(), Some(t0 + Duration::from_millis(10)));
        assert!(timers.pop_due(t0).is_none());

        let now = t0 + Duration::from_millis(250);
        assert_eq!(timers.pop_due(now).map(|(_, a)| a), Some("show"));
        assert_eq!(timers.pop_due(now).map(|(_, a)| a), Some("swap"));
        assert!(timers.pop_due(now).is_none());
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_pop_expired_is_strict() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.schedule(t0 + Duration::from_millis(800), "reset");

        assert!(timers.pop_expired(t0 + Duration::from_millis(800)).is_none());
        assert_eq!(timers.len(), 1);
        let fired = timers.pop_expired(t0 + Duration::from_millis(801));
        assert_eq!(fired.map(|(_, a)| a), Some("reset"));
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let id = timers.schedule(t0, 1);
        assert!(timers.contains(id));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.pop_due(t0).is_none());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_cancel_where() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.schedule(t0, (1, "a"));
        timers.schedule(t0, (2, "b"));
        timers.schedule(t0, (1, "c"));

        assert_eq!(timers.cancel_where(|(session, _)| *session == 1), 2);
        assert_eq!(timers.pop_due(t0).map(|(_, a)| a), Some((2, "b")));
    }
}
