// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::LifecycleEvent;
use std::time::{Duration, Instant, SystemTime};

/// Idle tick timer. Deadlines stay aligned to the first one, so a late wake-up does not
/// push later ticks back.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    interval: Option<Duration>,
    next_deadline: Option<Instant>,
    sequence: u64,
}

impl TickSchedule {
    #[must_use]
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            next_deadline: None,
            sequence: 0,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Option<Duration> { self.interval }

    /// Time left until the next deadline, arming the timer on first use. [`None`] when
    /// ticks are disabled.
    pub fn timeout(&mut self, now: Instant) -> Option<Duration> {
        let interval = self.interval?;
        let deadline = *self.next_deadline.get_or_insert(now + interval);
        Some(deadline.saturating_duration_since(now))
    }

    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.next_deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Move the deadline past `now`, skipping missed intervals. Returns the tick event
    /// when `emit` is set.
    pub fn advance(&mut self, now: Instant, emit: bool) -> Option<LifecycleEvent> {
        let (Some(interval), Some(deadline)) = (self.interval, self.next_deadline.as_mut())
        else {
            return None;
        };
        while *deadline <= now {
            *deadline += interval;
        }
        if !emit {
            return None;
        }
        self.sequence += 1;
        Some(LifecycleEvent::Tick {
            sequence: self.sequence,
            at: SystemTime::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn disabled_schedule_never_times_out() {
        let mut ticks = TickSchedule::new(None);
        let now = Instant::now();
        assert_eq!(ticks.timeout(now), None);
        assert!(!ticks.is_due(now));
        assert!(ticks.advance(now, true).is_none());
    }

    #[test]
    fn deadlines_stay_aligned_after_a_late_wake() {
        let interval = Duration::from_millis(100);
        let mut ticks = TickSchedule::new(Some(interval));
        let start = Instant::now();
        assert_eq!(ticks.timeout(start), Some(interval));
        assert!(!ticks.is_due(start));

        // Woke 250ms late: two intervals missed, next deadline is start + 300ms.
        let late = start + Duration::from_millis(250);
        assert!(ticks.is_due(late));
        let Some(LifecycleEvent::Tick { sequence, .. }) = ticks.advance(late, true) else {
            panic!("expected a tick");
        };
        assert_eq!(sequence, 1);
        assert_eq!(ticks.timeout(late), Some(Duration::from_millis(50)));
    }

    #[test]
    fn skipped_tick_does_not_consume_a_sequence_number() {
        let interval = Duration::from_millis(10);
        let mut ticks = TickSchedule::new(Some(interval));
        let start = Instant::now();
        ticks.timeout(start);
        assert!(ticks.advance(start + interval, false).is_none());
        let Some(LifecycleEvent::Tick { sequence, .. }) =
            ticks.advance(start + interval * 2, true)
        else {
            panic!("expected a tick");
        };
        assert_eq!(sequence, 1);
    }
}
