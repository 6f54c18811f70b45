#![forbid(unsafe_code)]

//! Debounced value controller: commit only after a quiet period.
//!
//! # Design
//!
//! [`Debounced<D, T>`] owns one committed value (an [`Observable<T>`]), the
//! most recently supplied factory, the last dependency snapshot, and at most
//! one pending timer in the host's [`Timers`] queue. The host calls
//! [`notify`](Debounced::notify) once per update cycle with the current
//! snapshot, factory, and options; the controller decides whether anything
//! changed, recomputes eagerly or defers per policy, and (re-)arms the
//! debounce window. When the window elapses uncancelled, the timer commit
//! overwrites the committed value and subscribers re-evaluate.
//!
//! Two mechanisms keep commits honest:
//!
//! - **Cancel-before-rearm**: any change cancels the pending timer before a
//!   new one is armed, so at most one timer is ever live per controller.
//! - **Arm epoch**: each armed window carries an epoch; the fire callback
//!   commits only while its epoch is still current, re-checked after a lazy
//!   computation in case the factory re-entered `notify`.
//!
//! The factory slot is refreshed on *every* `notify`, including no-ops, so a
//! lazy commit always runs the logically-current factory rather than one
//! closed over at arming time.
//!
//! # Invariants
//!
//! 1. The committed value is written only at construction and at
//!    uncancelled window elapses with a pending snapshot change.
//! 2. Only the most recently armed window may commit.
//! 3. Eager recomputation happens only on snapshot changes; delay or policy
//!    edits restart the window without touching the staged value's origin.
//! 4. After [`dispose`](Debounced::dispose), no commit ever occurs.
//!
//! # Failure Modes
//!
//! - **Factory panics**: the panic propagates to whichever call site
//!   triggered the computation (construction, an eager `notify`, or the
//!   host's pump). The committed value is untouched; no timer remains
//!   armed, so the next snapshot or config change restarts the cycle.
//! - **Misuse**: a zero-width window or a `notify` after `dispose` fails
//!   fast with [`DebounceError`]; nothing is coerced or swallowed.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use web_time::Duration;

use lull_core::{TimerHandle, Timers};

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
use lull_core::{debug, trace};

use crate::observable::{Observable, Subscription};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// When the factory runs relative to the debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputePolicy {
    /// Recompute immediately on every change; only the visible update waits
    /// for the quiet period.
    Eager,
    /// Defer both the recomputation and the visible update to the end of
    /// the quiet period, so intermediate snapshots cost nothing.
    Lazy,
}

/// Per-call debounce configuration.
///
/// A bare `Duration` or millisecond count converts to eager options:
/// `controller.notify(deps, factory, 300u64)` is shorthand for a 300ms
/// eager window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceOptions {
    /// Quiet period that must elapse after the most recent change before
    /// the commit becomes visible.
    pub delay: Duration,
    /// Select [`ComputePolicy::Lazy`] instead of the default eager policy.
    pub lazy: bool,
}

impl DebounceOptions {
    /// Eager options with the given quiet period.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay, lazy: false }
    }

    /// Switch to the lazy policy (builder form).
    #[must_use]
    pub const fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    fn policy(self) -> ComputePolicy {
        if self.lazy {
            ComputePolicy::Lazy
        } else {
            ComputePolicy::Eager
        }
    }

    fn validate(self) -> Result<(), DebounceError> {
        if self.delay.is_zero() {
            return Err(DebounceError::ZeroDelay);
        }
        Ok(())
    }
}

impl From<Duration> for DebounceOptions {
    fn from(delay: Duration) -> Self {
        Self::new(delay)
    }
}

impl From<u64> for DebounceOptions {
    /// Milliseconds, eager policy — the bare-number shorthand.
    fn from(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }
}

/// Error returned for invalid configuration or misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceError {
    /// A zero-width debounce window was requested.
    ZeroDelay,
    /// `notify` was called after `dispose`.
    Disposed,
}

impl std::fmt::Display for DebounceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDelay => write!(f, "debounce delay must be non-zero"),
            Self::Disposed => write!(f, "controller has been disposed"),
        }
    }
}

impl std::error::Error for DebounceError {}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

struct Inner<D, T> {
    /// Most recently supplied factory. Refreshed on every `notify`.
    factory: Rc<dyn Fn() -> T>,
    /// Last observed dependency snapshot.
    deps: D,
    delay: Duration,
    policy: ComputePolicy,
    /// Eagerly precomputed value awaiting commit. Overwritten, never
    /// merged, on each snapshot change.
    staged: Option<T>,
    /// A snapshot change has not yet been committed.
    dirty: bool,
    pending: Option<TimerHandle>,
    /// Bumped once per armed window; a fire whose epoch is stale must not
    /// commit.
    epoch: u64,
    disposed: bool,
}

/// What a firing window should do, decided under the state borrow and
/// executed outside it.
enum FireAction<T> {
    Commit(T),
    Compute(Rc<dyn Fn() -> T>),
}

/// A debounced value: recomputed from a factory, visible only after a quiet
/// period following the most recent dependency change.
///
/// The controller is single-owner; dropping it disposes it (any pending
/// window is cancelled and never commits).
pub struct Debounced<D, T> {
    inner: Rc<RefCell<Inner<D, T>>>,
    timers: Timers,
    committed: Observable<T>,
}

impl<D, T> std::fmt::Debug for Debounced<D, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Debounced")
            .field("policy", &inner.policy)
            .field("delay", &inner.delay)
            .field("pending", &inner.pending.is_some())
            .field("dirty", &inner.dirty)
            .field("disposed", &inner.disposed)
            .finish()
    }
}

impl<D: PartialEq + 'static, T: Clone + 'static> Debounced<D, T> {
    /// Create a controller and compute the initial value.
    ///
    /// `factory()` is invoked exactly once, synchronously — the very first
    /// value is never debounced, since there is no prior value to show. No
    /// timer is armed. A factory panic propagates and no partial state is
    /// retained.
    pub fn new(
        timers: &Timers,
        deps: D,
        factory: impl Fn() -> T + 'static,
        options: impl Into<DebounceOptions>,
    ) -> Result<Self, DebounceError> {
        let options = options.into();
        options.validate()?;
        let factory: Rc<dyn Fn() -> T> = Rc::new(factory);
        let initial = factory();
        Ok(Self {
            inner: Rc::new(RefCell::new(Inner {
                factory,
                deps,
                delay: options.delay,
                policy: options.policy(),
                staged: None,
                dirty: false,
                pending: None,
                epoch: 0,
                disposed: false,
            })),
            timers: timers.clone(),
            committed: Observable::new(initial),
        })
    }

    /// React to one host update cycle.
    ///
    /// Always refreshes the stored factory. If the snapshot, delay, and
    /// policy are all unchanged this is an idempotent no-op; otherwise the
    /// pending window (if any) is cancelled and a new one is armed. Under
    /// the eager policy a snapshot change recomputes immediately and stages
    /// the result; a delay or policy change alone never does.
    pub fn notify(
        &self,
        deps: D,
        factory: impl Fn() -> T + 'static,
        options: impl Into<DebounceOptions>,
    ) -> Result<(), DebounceError> {
        let options = options.into();
        options.validate()?;
        let policy = options.policy();

        let (previous, deps_changed) = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                return Err(DebounceError::Disposed);
            }
            // Refreshed even on the no-op path: a pending lazy commit must
            // run the newest factory, not the one in effect at arming time.
            inner.factory = Rc::new(factory);

            let deps_changed = inner.deps != deps;
            let config_changed = inner.delay != options.delay || inner.policy != policy;
            if !deps_changed && !config_changed {
                return Ok(());
            }

            if deps_changed {
                inner.deps = deps;
                inner.dirty = true;
            }
            if inner.policy != policy {
                // Switching policy mid-window discards the in-flight
                // eager value.
                inner.staged = None;
            }
            inner.delay = options.delay;
            inner.policy = policy;
            (inner.pending.take(), deps_changed)
        };

        // Cancel before rearming: at most one live window, ever.
        if let Some(handle) = previous {
            self.timers.cancel(handle);
        }

        if deps_changed && policy == ComputePolicy::Eager {
            let factory = Rc::clone(&self.inner.borrow().factory);
            let value = factory();
            self.inner.borrow_mut().staged = Some(value);
        }

        self.arm(options.delay);
        Ok(())
    }

    fn arm(&self, delay: Duration) {
        let epoch = {
            let mut inner = self.inner.borrow_mut();
            inner.epoch += 1;
            inner.epoch
        };
        let weak = Rc::downgrade(&self.inner);
        let committed = self.committed.clone();
        let handle = self.timers.schedule(delay, move || {
            Self::fire(&weak, &committed, epoch);
        });
        self.inner.borrow_mut().pending = Some(handle);
        trace!(epoch, delay_ms = delay.as_millis() as u64, "debounce window armed");
    }

    /// Run one uncancelled window elapse.
    fn fire(weak: &Weak<RefCell<Inner<D, T>>>, committed: &Observable<T>, armed_epoch: u64) {
        let Some(inner) = weak.upgrade() else {
            return;
        };

        let action = {
            let mut guard = inner.borrow_mut();
            if guard.disposed || guard.epoch != armed_epoch {
                // A newer window owns the pending slot; this fire is stale.
                return;
            }
            guard.pending = None;
            if !guard.dirty {
                // The window restarted without a snapshot change (delay or
                // policy edit); there is nothing newer to show.
                return;
            }
            match guard.policy {
                ComputePolicy::Eager => match guard.staged.take() {
                    Some(value) => FireAction::Commit(value),
                    // Reachable only after a lazy-to-eager switch
                    // mid-window; fall back to the current factory.
                    None => FireAction::Compute(Rc::clone(&guard.factory)),
                },
                ComputePolicy::Lazy => FireAction::Compute(Rc::clone(&guard.factory)),
            }
        };

        // Compute outside the borrow: the factory may re-enter `notify`.
        let value = match action {
            FireAction::Commit(value) => value,
            FireAction::Compute(factory) => factory(),
        };

        {
            let mut guard = inner.borrow_mut();
            if guard.disposed || guard.epoch != armed_epoch {
                // Superseded while computing; the newer window commits.
                return;
            }
            guard.dirty = false;
        }
        debug!(epoch = armed_epoch, "debounce commit");
        committed.replace(value);
    }

    /// The current committed value (cloned). Pure; never recomputes.
    #[must_use]
    pub fn get(&self) -> T {
        self.committed.get()
    }

    /// Access the committed value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.committed.with(f)
    }

    /// Register a callback invoked after every commit.
    #[must_use]
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        self.committed.subscribe(callback)
    }

    /// Commit counter: increments by 1 per committed value.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.committed.version()
    }
}

impl<D, T> Debounced<D, T> {
    /// Whether a debounce window is currently armed.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.borrow().pending.is_some()
    }

    /// Whether the controller has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }

    /// The quiet period currently in effect.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.inner.borrow().delay
    }

    /// The computation policy currently in effect.
    #[must_use]
    pub fn policy(&self) -> ComputePolicy {
        self.inner.borrow().policy
    }

    /// Cancel any pending window and retire the controller.
    ///
    /// Idempotent. After disposal no commit ever occurs; the committed
    /// value remains readable. Dropping the controller calls this.
    pub fn dispose(&self) {
        let handle = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                return;
            }
            inner.disposed = true;
            inner.staged = None;
            inner.dirty = false;
            inner.pending.take()
        };
        if let Some(handle) = handle {
            self.timers.cancel(handle);
        }
        debug!("debounce controller disposed");
    }
}

impl<D, T> Drop for Debounced<D, T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
