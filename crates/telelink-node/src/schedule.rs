use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Periods of the cooperative tick handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickIntervals {
    /// Fast tier refresh.
    pub fast: Duration,
    /// Medium tier refresh.
    pub medium: Duration,
    /// Slow tier refresh.
    pub slow: Duration,
    /// Frame transmission.
    pub send: Duration,
}

impl Default for TickIntervals {
    fn default() -> Self {
        Self {
            fast: Duration::from_millis(10),
            medium: Duration::from_millis(100),
            slow: Duration::from_millis(1000),
            send: Duration::from_millis(10),
        }
    }
}

/// Which handlers are due on this turn of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Due {
    pub fast: bool,
    pub medium: bool,
    pub slow: bool,
    pub send: bool,
}

impl Due {
    pub fn any(&self) -> bool {
        self.fast || self.medium || self.slow || self.send
    }
}

/// Single-threaded timer group for the transmit loop.
///
/// Handlers run to completion in the caller's thread; this only tracks
/// deadlines. A handler that falls behind fires once and is rescheduled from
/// `now`, so missed periods are skipped rather than replayed in a burst.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    intervals: TickIntervals,
    next: [Instant; 4],
}

impl TickSchedule {
    /// Start a schedule whose first deadlines are one period after `start`.
    pub fn new(intervals: TickIntervals, start: Instant) -> Self {
        Self {
            intervals,
            next: [
                start + intervals.fast,
                start + intervals.medium,
                start + intervals.slow,
                start + intervals.send,
            ],
        }
    }

    pub fn intervals(&self) -> &TickIntervals {
        &self.intervals
    }

    /// Report and reschedule every handler whose deadline has passed.
    pub fn due(&mut self, now: Instant) -> Due {
        let periods = [
            self.intervals.fast,
            self.intervals.medium,
            self.intervals.slow,
            self.intervals.send,
        ];
        let mut fired = [false; 4];
        for ((next, period), hit) in self.next.iter_mut().zip(periods).zip(&mut fired) {
            if now >= *next {
                *hit = true;
                *next += period;
                if *next <= now {
                    *next = now + period;
                }
            }
        }
        Due {
            fast: fired[0],
            medium: fired[1],
            slow: fired[2],
            send: fired[3],
        }
    }

    /// Earliest pending deadline; sleep until then between turns.
    pub fn next_deadline(&self) -> Instant {
        self.next.iter().copied().min().unwrap_or_else(Instant::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_board_timers() {
        let intervals = TickIntervals::default();
        assert_eq!(intervals.fast, Duration::from_millis(10));
        assert_eq!(intervals.medium, Duration::from_millis(100));
        assert_eq!(intervals.slow, Duration::from_secs(1));
        assert_eq!(intervals.send, Duration::from_millis(10));
    }

    #[test]
    fn handlers_fire_at_their_own_rates() {
        let start = Instant::now();
        let mut schedule = TickSchedule::new(TickIntervals::default(), start);

        assert!(!schedule.due(start).any());

        let due = schedule.due(start + Duration::from_millis(10));
        assert!(due.fast && due.send);
        assert!(!due.medium && !due.slow);

        let due = schedule.due(start + Duration::from_millis(100));
        assert!(due.fast && due.medium && due.send);
        assert!(!due.slow);

        let due = schedule.due(start + Duration::from_millis(1000));
        assert!(due.fast && due.medium && due.slow && due.send);
    }

    #[test]
    fn missed_periods_are_not_replayed() {
        let start = Instant::now();
        let mut schedule = TickSchedule::new(TickIntervals::default(), start);
        let late = start + Duration::from_millis(55);

        assert!(schedule.due(late).fast);
        assert!(!schedule.due(late).fast);
        assert_eq!(schedule.next_deadline(), late + Duration::from_millis(10));
    }
}
