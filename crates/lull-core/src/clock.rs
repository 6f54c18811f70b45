#![forbid(unsafe_code)]

//! Time source abstraction for deterministic testing.
//!
//! A [`Clock`] reads either real wall-clock time or a [`ManualClock`] that
//! only moves when the owner advances it. All clones of a `Clock` over the
//! same `ManualClock` observe the same time, so a test can arm timers, move
//! time forward, and pump the queue with no sleeping and no flakiness.
//!
//! # Invariants
//!
//! 1. `ManualClock` time is monotonically non-decreasing; `advance` only adds.
//! 2. Clones share the underlying offset — advancing through one handle is
//!    visible through every other.
//! 3. `Clock::real()` delegates to `web_time::Instant::now()` and never goes
//!    backwards.

use std::cell::Cell;
use std::rc::Rc;

use web_time::{Duration, Instant};

/// A manually-advanceable clock for deterministic tests and host-driven
/// loops.
///
/// Cheaply cloneable; all clones see the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    epoch: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Create a manual clock starting at `Instant::now()`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.offset.set(self.offset.get().saturating_add(delta));
    }

    /// Current manual time.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.epoch + self.offset.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
enum Source {
    /// Real wall-clock time.
    Real,
    /// Manually advanced time for deterministic runs.
    Manual(ManualClock),
}

/// Cheaply cloneable time source handle.
#[derive(Debug, Clone)]
pub struct Clock {
    source: Source,
}

impl Clock {
    /// A clock reading real wall-clock time.
    #[must_use]
    pub fn real() -> Self {
        Self {
            source: Source::Real,
        }
    }

    /// A clock reading the supplied [`ManualClock`].
    #[must_use]
    pub fn manual(clock: &ManualClock) -> Self {
        Self {
            source: Source::Manual(clock.clone()),
        }
    }

    /// Current time according to this clock's source.
    #[must_use]
    pub fn now(&self) -> Instant {
        match &self.source {
            Source::Real => Instant::now(),
            Source::Manual(c) => c.now(),
        }
    }

    /// Whether this clock is manually driven.
    #[inline]
    #[must_use]
    pub fn is_manual(&self) -> bool {
        matches!(self.source, Source::Manual(_))
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::real()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
