#![forbid(unsafe_code)]

//! Cancellable single-threaded timer queue.
//!
//! [`Timers`] is the delayed-callback primitive consumed by the debounce
//! controller: `schedule(delay, callback) -> handle`, `cancel(handle)`, and
//! a host-driven [`pump()`](Timers::pump) that runs every due callback. The
//! queue never spawns threads and never sleeps; the host loop (or a test
//! driving a [`ManualClock`](crate::clock::ManualClock)) decides when time
//! passes and when due work runs.
//!
//! # Invariants
//!
//! 1. Due callbacks fire in deadline order; equal deadlines fire in arming
//!    order.
//! 2. A cancelled entry never fires.
//! 3. `cancel` is idempotent — cancelling a fired or unknown handle is a
//!    no-op, never an error.
//! 4. Callbacks may re-enter the queue: scheduling and cancelling from
//!    inside a firing callback is supported. Entries armed during a pump do
//!    not fire until the next pump, even if already due.
//!
//! # Failure Modes
//!
//! - A panicking callback propagates to the `pump` caller. The panicking
//!   entry has already been removed; the remaining due entries stay armed
//!   and fire on the next pump.

use std::cell::RefCell;
use std::rc::Rc;

use web_time::{Duration, Instant};

#[cfg(feature = "tracing")]
use crate::logging::trace;
#[cfg(not(feature = "tracing"))]
use crate::trace;

use crate::clock::Clock;

/// Opaque identifier for one armed timer entry.
///
/// Handles are never reused for a different entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

struct Entry {
    id: u64,
    deadline: Instant,
    callback: Box<dyn FnOnce()>,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[derive(Debug)]
struct Queue {
    entries: Vec<Entry>,
    next_id: u64,
}

/// Single-threaded timer queue handle.
///
/// Cloning shares the queue. All operations run on the owning thread; the
/// only suspension point is a callback executing inside [`pump()`](Self::pump).
#[derive(Clone)]
pub struct Timers {
    queue: Rc<RefCell<Queue>>,
    clock: Clock,
}

impl std::fmt::Debug for Timers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timers")
            .field("armed", &self.armed_len())
            .field("manual_clock", &self.clock.is_manual())
            .finish()
    }
}

impl Timers {
    /// Create a queue over real wall-clock time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Clock::real())
    }

    /// Create a queue over the supplied clock.
    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            queue: Rc::new(RefCell::new(Queue {
                entries: Vec::new(),
                next_id: 1,
            })),
            clock,
        }
    }

    /// The clock this queue reads.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Arm a callback to run once `delay` has elapsed.
    ///
    /// The callback runs during a future [`pump()`](Self::pump) call, never
    /// synchronously inside `schedule`.
    pub fn schedule(&self, delay: Duration, callback: impl FnOnce() + 'static) -> TimerHandle {
        let deadline = self.clock.now() + delay;
        let mut queue = self.queue.borrow_mut();
        let id = queue.next_id;
        queue.next_id += 1;
        queue.entries.push(Entry {
            id,
            deadline,
            callback: Box::new(callback),
        });
        trace!(timer_id = id, delay_ms = delay.as_millis() as u64, "timer armed");
        TimerHandle(id)
    }

    /// Cancel an armed entry. Returns `true` if it was still armed.
    ///
    /// Idempotent: cancelling a fired or already-cancelled handle is a
    /// no-op returning `false`.
    pub fn cancel(&self, handle: TimerHandle) -> bool {
        let mut queue = self.queue.borrow_mut();
        let len_before = queue.entries.len();
        queue.entries.retain(|entry| entry.id != handle.0);
        let removed = queue.entries.len() < len_before;
        if removed {
            trace!(timer_id = handle.0, "timer cancelled");
        }
        removed
    }

    /// Run every entry whose deadline has passed, in (deadline, arming)
    /// order. Returns the number of callbacks that ran.
    ///
    /// The queue borrow is released around each callback, so callbacks may
    /// schedule or cancel freely. Entries armed during this pump wait for
    /// the next one, even if their deadline is already due.
    pub fn pump(&self) -> usize {
        let now = self.clock.now();
        let armed_before = self.queue.borrow().next_id;
        let mut fired = 0usize;
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                let due = queue
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.id < armed_before && e.deadline <= now)
                    .min_by(|(_, a), (_, b)| a.deadline.cmp(&b.deadline).then(a.id.cmp(&b.id)))
                    .map(|(idx, _)| idx);
                due.map(|idx| queue.entries.remove(idx))
            };
            let Some(entry) = next else {
                break;
            };
            trace!(timer_id = entry.id, "timer fired");
            (entry.callback)();
            fired += 1;
        }
        fired
    }

    /// Number of currently armed entries.
    #[must_use]
    pub fn armed_len(&self) -> usize {
        self.queue.borrow().entries.len()
    }

    /// Whether no entries are armed.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.armed_len() == 0
    }

    /// Earliest armed deadline, if any. Lets a host loop sleep until the
    /// next timer instead of polling.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue
            .borrow()
            .entries
            .iter()
            .map(|entry| entry.deadline)
            .min()
    }
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
