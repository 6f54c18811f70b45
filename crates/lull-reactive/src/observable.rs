#![forbid(unsafe_code)]

//! Shared, version-tracked values with change notification.
//!
//! [`Observable<T>`] is the state-holding half of the debounce story: the
//! controller commits into one, and the host re-evaluates whatever it
//! derives from it. Subscribers are stored as `Weak` callbacks and cleaned
//! up lazily during notification; a [`Subscription`] keeps its callback
//! alive and unregisters on drop.
//!
//! # Invariants
//!
//! 1. The version increments exactly once per mutation that changes the
//!    value.
//! 2. Subscribers are notified in registration order.
//! 3. [`set`](Observable::set) of a value equal to the current one is a
//!    no-op (no version bump, no notifications);
//!    [`replace`](Observable::replace) never is.
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//!
//! # Failure Modes
//!
//! - **Subscriber panics**: the value and version are already updated; the
//!   panic propagates to the mutating call site and remaining subscribers
//!   are not notified for this cycle.
//! - **Re-entrant mutation from a subscriber**: supported — the inner borrow
//!   is released before callbacks run. Subscribers registered during a
//!   notification cycle are not called for that cycle.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<Weak<RefCell<dyn FnMut(&T)>>>,
}

/// A shared, version-tracked value wrapper with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** inner state.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the guard drops the callback's only strong reference, so the
/// observable's weak entry goes dead and is cleaned up on the next
/// notification cycle.
pub struct Subscription {
    _keep_alive: Box<dyn Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Create an observable holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Get the current value (cloned).
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if the closure mutates this observable (re-entrant borrow).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Current version number. Increments by 1 on each value change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Register a callback invoked after every value change.
    ///
    /// The callback stays registered as long as the returned
    /// [`Subscription`] is alive.
    #[must_use]
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let callback: Callback<T> = Rc::new(RefCell::new(callback));
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&callback));
        Subscription {
            _keep_alive: Box::new(callback),
        }
    }

    /// Overwrite the value unconditionally, bump the version, and notify
    /// every subscriber.
    pub fn replace(&self, value: T) {
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            inner.value = value;
            inner.version += 1;
            // Upgrade live subscribers in registration order, dropping dead
            // entries as we go.
            let mut live = Vec::with_capacity(inner.subscribers.len());
            inner.subscribers.retain(|weak| {
                weak.upgrade().is_some_and(|strong| {
                    live.push(strong);
                    true
                })
            });
            live
        };
        // Borrow released: subscribers may read or mutate freely.
        let current = self.inner.borrow().value.clone();
        for callback in callbacks {
            (callback.borrow_mut())(&current);
        }
    }

    /// Set the value, notifying subscribers only if it differs from the
    /// current value.
    pub fn set(&self, value: T)
    where
        T: PartialEq,
    {
        if self.inner.borrow().value == value {
            return;
        }
        self.replace(value);
    }

    /// Number of live subscribers (dead entries are not counted).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
