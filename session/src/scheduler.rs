//! Deterministic one-shot and periodic timers driven by explicit ticks.

use std::time::Duration;

/// Clock a timer measures its delay against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClockSource {
    /// Game time that stops while the session is paused.
    Scaled,
    /// Wall-clock time that keeps running through pauses.
    Realtime,
}

/// Handle used to cancel a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Debug)]
struct TimerEntry<A> {
    id: TimerId,
    action: A,
    clock: ClockSource,
    remaining: Duration,
    period: Option<Duration>,
    finished: bool,
}

/// Timer wheel that fires actions as scaled and realtime clocks advance.
///
/// Nothing fires on its own: the owner calls [`Scheduler::advance`] and then
/// processes the returned actions, re-checking its own state for each one.
#[derive(Clone, Debug)]
pub struct Scheduler<A> {
    entries: Vec<TimerEntry<A>>,
    next_timer_id: u64,
}

impl<A: Copy + PartialEq> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Copy + PartialEq> Scheduler<A> {
    /// Creates a scheduler with no pending timers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_timer_id: 0,
        }
    }

    /// Fires `action` once after `delay` has elapsed on `clock`.
    pub fn schedule_once(&mut self, action: A, clock: ClockSource, delay: Duration) -> TimerId {
        self.push(action, clock, delay, None)
    }

    /// Fires `action` after `initial` and then every `period` on `clock`.
    pub fn schedule_periodic(
        &mut self,
        action: A,
        clock: ClockSource,
        initial: Duration,
        period: Duration,
    ) -> TimerId {
        self.push(action, clock, initial, Some(period))
    }

    /// Cancels a pending timer, returning whether it was still scheduled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Cancels every pending timer carrying `action`, returning how many were removed.
    pub fn cancel_action(&mut self, action: A) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.action != action);
        before - self.entries.len()
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no timers are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advances both clocks and appends the actions that came due to `fired`.
    ///
    /// Actions are ordered by how far into this advance they came due, with
    /// ties broken by scheduling order. A periodic timer that is overdue by
    /// several periods fires once per elapsed period.
    pub fn advance(&mut self, scaled: Duration, realtime: Duration, fired: &mut Vec<A>) {
        let mut due: Vec<(Duration, TimerId, A)> = Vec::new();

        for entry in &mut self.entries {
            let mut budget = match entry.clock {
                ClockSource::Scaled => scaled,
                ClockSource::Realtime => realtime,
            };
            let mut offset = Duration::ZERO;

            while entry.remaining <= budget {
                budget -= entry.remaining;
                offset += entry.remaining;
                due.push((offset, entry.id, entry.action));

                match entry.period {
                    Some(period) if !period.is_zero() => entry.remaining = period,
                    Some(_) => {
                        entry.remaining = Duration::ZERO;
                        break;
                    }
                    None => {
                        entry.finished = true;
                        break;
                    }
                }
            }

            if !entry.finished && entry.remaining > budget {
                entry.remaining -= budget;
            }
        }

        self.entries.retain(|entry| !entry.finished);
        due.sort_by_key(|(offset, id, _)| (*offset, *id));
        fired.extend(due.into_iter().map(|(_, _, action)| action));
    }

    fn push(
        &mut self,
        action: A,
        clock: ClockSource,
        delay: Duration,
        period: Option<Duration>,
    ) -> TimerId {
        let id = TimerId(self.next_timer_id);
        self.next_timer_id += 1;
        self.entries.push(TimerEntry {
            id,
            action,
            clock,
            remaining: delay,
            period,
            finished: false,
        });
        id
    }
}
