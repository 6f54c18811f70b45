#![forbid(unsafe_code)]

//! Core: time source seam and the cancellable delayed-callback primitive.
//!
//! Everything in this crate is single-threaded and cooperative: a host loop
//! owns the [`Timers`](timer::Timers) queue, arms entries, and decides when
//! due callbacks run by calling [`pump()`](timer::Timers::pump). Tests drive
//! the same code deterministically through [`ManualClock`](clock::ManualClock).

pub mod clock;
pub mod timer;

#[cfg(feature = "tracing")]
pub mod logging;

pub use clock::{Clock, ManualClock};
pub use timer::{TimerHandle, Timers};

// No-op logging macros used when the `tracing` feature is disabled.
// Always defined (feature unification may enable this crate's `tracing`
// without a dependent's); call sites pick the implementation by cfg-ing the
// import: `use lull_core::trace;` vs `use lull_core::logging::trace;`.

#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {};
}
