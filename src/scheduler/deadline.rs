//! Cooperative deadline polling.
//!
//! A generation run never gets cancelled from outside. Instead each phase
//! (and the per-exam and per-block loops inside the allocators) polls a
//! [`Deadline`] and stops producing more work once it reports the budget
//! exceeded. No timers or background threads are involved.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Capability checked between units of work.
pub trait Deadline {
    /// Whether the budget is used up. May be called many times.
    fn is_exceeded(&self) -> bool;

    /// Time elapsed since the run started.
    fn elapsed(&self) -> Duration;
}

/// Wall-clock budget starting at construction time.
#[derive(Debug, Clone, Copy)]
pub struct WallClockDeadline {
    started: Instant,
    budget: Duration,
}

impl WallClockDeadline {
    /// Starts the clock now.
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    /// Time left before the budget runs out.
    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started.elapsed())
    }
}

impl Deadline for WallClockDeadline {
    fn is_exceeded(&self) -> bool {
        self.started.elapsed() > self.budget
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Deadline that expires after a fixed number of polls.
///
/// The first `allowed` calls to [`Deadline::is_exceeded`] return `false`,
/// every later call returns `true`. Makes timeout behavior reproducible.
#[derive(Debug)]
pub struct PollBudget {
    allowed: usize,
    polls: Cell<usize>,
    started: Instant,
}

impl PollBudget {
    pub fn new(allowed: usize) -> Self {
        Self {
            allowed,
            polls: Cell::new(0),
            started: Instant::now(),
        }
    }

    /// Number of polls observed so far.
    pub fn polls(&self) -> usize {
        self.polls.get()
    }
}

impl Deadline for PollBudget {
    fn is_exceeded(&self) -> bool {
        let polls = self.polls.get() + 1;
        self.polls.set(polls);
        polls > self.allowed
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_clock_generous_budget() {
        let deadline = WallClockDeadline::start(Duration::from_secs(3600));
        assert!(!deadline.is_exceeded());
        assert!(deadline.remaining() > Duration::from_secs(3500));
    }

    #[test]
    fn test_wall_clock_zero_budget() {
        let deadline = WallClockDeadline::start(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        assert!(deadline.is_exceeded());
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_poll_budget() {
        let budget = PollBudget::new(2);
        assert!(!budget.is_exceeded());
        assert!(!budget.is_exceeded());
        assert!(budget.is_exceeded());
        assert!(budget.is_exceeded());
        assert_eq!(budget.polls(), 4);
    }

    #[test]
    fn test_poll_budget_zero() {
        let budget = PollBudget::new(0);
        assert!(budget.is_exceeded());
    }
}
