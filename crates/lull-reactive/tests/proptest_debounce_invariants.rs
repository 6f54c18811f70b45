#![forbid(unsafe_code)]

//! Property tests for the debounce controller against a reference model.
//!
//! For arbitrary interleavings of snapshot changes and time advances, both
//! policies must agree with a straightforward model of "commit the last
//! change once a full quiet period passes with no further change":
//!
//! 1. The committed value always equals the model's (initial value until the
//!    first commit).
//! 2. The commit count (`version()`) matches the model exactly — rapid
//!    changes collapse, quiet gaps commit.
//! 3. Factory invocations: eager computes once per snapshot change (plus
//!    construction); lazy computes once per commit (plus construction).
//! 4. At most one timer is armed per controller, and `is_pending()` tracks
//!    the model's open-window state.

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use web_time::Duration;

use lull_core::{Clock, ManualClock, Timers};
use lull_reactive::{DebounceOptions, Debounced};

const DELAY_MS: u64 = 300;

#[derive(Debug, Clone)]
enum Op {
    /// Host update cycle with (possibly unchanged) snapshot `deps`.
    Notify { deps: u8 },
    /// Advance the clock and pump due timers.
    Advance { delta_ms: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6).prop_map(|deps| Op::Notify { deps }),
        (1u64..450).prop_map(|delta_ms| Op::Advance { delta_ms }),
    ]
}

fn value_of(deps: u8) -> i64 {
    i64::from(deps) * 7 + 1
}

#[derive(Debug)]
struct Model {
    now_ms: u64,
    deps: u8,
    committed: i64,
    commits: u64,
    window_deadline: Option<u64>,
    eager_computes: u64,
    lazy_computes: u64,
}

impl Model {
    fn new(deps: u8) -> Self {
        Self {
            now_ms: 0,
            deps,
            committed: value_of(deps),
            commits: 0,
            window_deadline: None,
            eager_computes: 0,
            lazy_computes: 0,
        }
    }

    fn notify(&mut self, deps: u8) {
        if deps != self.deps {
            self.deps = deps;
            self.window_deadline = Some(self.now_ms + DELAY_MS);
            self.eager_computes += 1;
        }
    }

    fn advance(&mut self, delta_ms: u64) {
        self.now_ms += delta_ms;
        if let Some(deadline) = self.window_deadline {
            if deadline <= self.now_ms {
                self.committed = value_of(self.deps);
                self.commits += 1;
                self.lazy_computes += 1;
                self.window_deadline = None;
            }
        }
    }

    fn pending(&self) -> bool {
        self.window_deadline.is_some()
    }
}

fn run(ops: &[Op], lazy: bool) -> Result<(), TestCaseError> {
    let clock = ManualClock::new();
    let timers = Timers::with_clock(Clock::manual(&clock));

    let options = if lazy {
        DebounceOptions::new(Duration::from_millis(DELAY_MS)).lazy()
    } else {
        DebounceOptions::new(Duration::from_millis(DELAY_MS))
    };

    let computes = Rc::new(Cell::new(0u64));
    let factory_for = |deps: u8| {
        let computes = Rc::clone(&computes);
        move || {
            computes.set(computes.get() + 1);
            value_of(deps)
        }
    };

    let initial_deps = 0u8;
    let controller =
        Debounced::new(&timers, initial_deps, factory_for(initial_deps), options).expect("options");
    let mut model = Model::new(initial_deps);
    let construction_computes = 1u64;

    for op in ops {
        match *op {
            Op::Notify { deps } => {
                controller
                    .notify(deps, factory_for(deps), options)
                    .expect("notify");
                model.notify(deps);
            }
            Op::Advance { delta_ms } => {
                clock.advance(Duration::from_millis(delta_ms));
                timers.pump();
                model.advance(delta_ms);
            }
        }

        prop_assert_eq!(controller.get(), model.committed);
        prop_assert_eq!(controller.version(), model.commits);
        prop_assert_eq!(controller.is_pending(), model.pending());
        prop_assert!(timers.armed_len() <= 1);

        let expected_computes = construction_computes
            + if lazy {
                model.lazy_computes
            } else {
                model.eager_computes
            };
        prop_assert_eq!(computes.get(), expected_computes);
    }
    Ok(())
}

proptest! {
    #[test]
    fn eager_controller_matches_model(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        run(&ops, false)?;
    }

    #[test]
    fn lazy_controller_matches_model(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        run(&ops, true)?;
    }
}
