//! Deadlines
//!
//! A [`Deadline`] tells the work loop when to hand control back to the
//! host. The loop asks after every unit of work; once it says yield, the
//! loop stops and resumes from the same fiber on the next slice.

use std::time::{Duration, Instant};

/// Host-provided budget for one idle slice.
pub trait Deadline {
    /// Whether the work loop should stop after the unit it just finished.
    fn should_yield(&mut self) -> bool;

    /// Time left in the slice, if the deadline is time based.
    fn time_remaining(&self) -> Option<Duration> {
        None
    }
}

/// Wall-clock deadline: yields once the slice budget has elapsed.
#[derive(Debug, Clone, Copy)]
pub struct IdleDeadline {
    end: Instant,
}

impl IdleDeadline {
    /// A slice that ends `budget` from now.
    pub fn new(budget: Duration) -> Self {
        Self {
            end: Instant::now() + budget,
        }
    }
}

impl Deadline for IdleDeadline {
    fn should_yield(&mut self) -> bool {
        Instant::now() >= self.end
    }

    fn time_remaining(&self) -> Option<Duration> {
        Some(self.end.saturating_duration_since(Instant::now()))
    }
}

/// Deterministic deadline: permits a fixed number of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitBudget {
    remaining: usize,
}

impl UnitBudget {
    /// Allow `units` units of work before yielding. A budget of zero still
    /// performs one unit per slice so the loop always makes progress.
    pub fn new(units: usize) -> Self {
        Self { remaining: units }
    }

    /// Units left.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl Deadline for UnitBudget {
    fn should_yield(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

/// Never yields. Used by `flush`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn should_yield(&mut self) -> bool {
        false
    }
}
