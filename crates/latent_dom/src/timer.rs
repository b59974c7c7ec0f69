//! Timer queue on a virtual clock
//!
//! Stands in for the host's `setInterval`/`setTimeout`. Time only moves when
//! the owner asks it to, which keeps event-loop behavior deterministic:
//!
//! ```rust
//! use std::time::Duration;
//! use latent_dom::TimerQueue;
//!
//! let mut timers = TimerQueue::new();
//! let poll = timers.set_interval(Duration::from_millis(250));
//!
//! let target = Duration::from_millis(600);
//! let mut fired = Vec::new();
//! while let Some(id) = timers.pop_due(target) {
//!     fired.push((id, timers.now()));
//! }
//! timers.advance_to(target);
//!
//! assert_eq!(fired.len(), 2);
//! assert!(fired.iter().all(|(id, _)| *id == poll));
//! ```

use std::time::Duration;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a scheduled timer
    pub struct TimerId;
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    due: Duration,
    interval: Option<Duration>,
    /// Creation order, used to break ties between timers due at the same time
    seq: u64,
}

/// Pending timers plus the current virtual time
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    timers: SlotMap<TimerId, Timer>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule a recurring timer firing every `period`
    ///
    /// A zero period is bumped to one millisecond so an interval can never
    /// fire forever at a single instant.
    pub fn set_interval(&mut self, period: Duration) -> TimerId {
        let period = period.max(Duration::from_millis(1));
        self.insert(period, Some(period))
    }

    /// Schedule a one-shot timer firing after `delay`
    pub fn set_timeout(&mut self, delay: Duration) -> TimerId {
        self.insert(delay, None)
    }

    fn insert(&mut self, delay: Duration, interval: Option<Duration>) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.insert(Timer {
            due: self.now + delay,
            interval,
            seq,
        })
    }

    /// Cancel a timer, returning whether it was pending
    pub fn clear(&mut self, id: TimerId) -> bool {
        self.timers.remove(id).is_some()
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&self) -> Option<Duration> {
        self.timers.values().map(|t| t.due).min()
    }

    /// Fire the earliest timer due at or before `until`
    ///
    /// Moves the clock to the timer's due time, re-arms intervals and drops
    /// one-shot timers. Returns `None` once nothing is due before `until`.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerId> {
        let (id, timer) = self
            .timers
            .iter()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(id, t)| (id, *t))?;

        self.now = self.now.max(timer.due);

        match timer.interval {
            Some(period) => {
                if let Some(t) = self.timers.get_mut(id) {
                    t.due = timer.due + period;
                }
            }
            None => {
                self.timers.remove(id);
            }
        }

        Some(id)
    }

    /// Move the clock forward to `until` (never backwards)
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_interval_rearms() {
        let mut timers = TimerQueue::new();
        let id = timers.set_interval(ms(100));

        assert_eq!(timers.pop_due(ms(99)), None);
        assert_eq!(timers.pop_due(ms(250)), Some(id));
        assert_eq!(timers.now(), ms(100));
        assert_eq!(timers.pop_due(ms(250)), Some(id));
        assert_eq!(timers.now(), ms(200));
        assert_eq!(timers.pop_due(ms(250)), None);
        assert!(timers.is_active(id));
    }

    #[test]
    fn test_timeout_fires_once() {
        let mut timers = TimerQueue::new();
        let id = timers.set_timeout(ms(50));

        assert_eq!(timers.pop_due(ms(1000)), Some(id));
        assert_eq!(timers.pop_due(ms(1000)), None);
        assert!(!timers.is_active(id));
    }

    #[test]
    fn test_clear_prevents_firing() {
        let mut timers = TimerQueue::new();
        let id = timers.set_interval(ms(10));
        assert!(timers.clear(id));
        assert!(!timers.clear(id));
        assert_eq!(timers.pop_due(ms(1000)), None);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_ties_fire_in_creation_order() {
        let mut timers = TimerQueue::new();
        let a = timers.set_timeout(ms(20));
        let b = timers.set_timeout(ms(20));

        assert_eq!(timers.pop_due(ms(20)), Some(a));
        assert_eq!(timers.pop_due(ms(20)), Some(b));
    }

    #[test]
    fn test_advance_never_goes_back() {
        let mut timers = TimerQueue::new();
        timers.advance_to(ms(500));
        timers.advance_to(ms(100));
        assert_eq!(timers.now(), ms(500));

        // New timers are scheduled relative to the current time
        let id = timers.set_timeout(ms(10));
        assert_eq!(timers.next_due(), Some(ms(510)));
        assert_eq!(timers.pop_due(ms(510)), Some(id));
    }
}
