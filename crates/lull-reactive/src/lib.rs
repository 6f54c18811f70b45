#![forbid(unsafe_code)]

//! Debounced values for reactive UI state.
//!
//! This crate provides change-absorbing primitives for reactive UI updates:
//!
//! - [`Observable`]: a shared, version-tracked value wrapper with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`Debounced`]: a value recomputed from a factory whose visible updates
//!   settle only after a quiet period following the most recent dependency
//!   change.
//!
//! # Architecture
//!
//! Everything is `Rc<RefCell<..>>` single-threaded shared ownership; the
//! host loop owns a [`Timers`](lull_core::Timers) queue and pumps it to run
//! due commits. A [`Debounced`] controller reacts to [`notify`] calls — one
//! per host update cycle — and never observes the host in any other way.
//!
//! [`notify`]: Debounced::notify
//!
//! # Invariants
//!
//! 1. At most one timer is armed per controller at any instant; arming
//!    cancels the previous timer first.
//! 2. Only the most recently armed timer may commit.
//! 3. A lazy commit always invokes the factory supplied by the most recent
//!    `notify`, never one captured at arming time.
//! 4. The committed value changes only at construction and at timer commits.

pub mod debounced;
pub mod observable;
pub mod snapshot;

pub use debounced::{ComputePolicy, DebounceError, DebounceOptions, Debounced};
pub use observable::{Observable, Subscription};
pub use snapshot::{Deps, Token};
