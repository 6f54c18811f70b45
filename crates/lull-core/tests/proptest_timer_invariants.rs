#![forbid(unsafe_code)]

//! Property tests for the timer queue against a simple reference model.
//!
//! Invariants checked across arbitrary schedule/cancel/advance interleavings:
//! 1. `cancel` returns true exactly when the model says the entry is armed.
//! 2. Nothing fires before its deadline.
//! 3. Every due entry fires during the pump that reaches its deadline.
//! 4. Fires within one pump happen in (deadline, arming) order.
//! 5. Draining far past every deadline fires all uncancelled entries.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use web_time::Duration;

use lull_core::{Clock, ManualClock, Timers};

#[derive(Debug, Clone)]
enum Op {
    Schedule { delay_ms: u64 },
    Cancel { pick: usize },
    Advance { delta_ms: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..500).prop_map(|delay_ms| Op::Schedule { delay_ms }),
        any::<usize>().prop_map(|pick| Op::Cancel { pick }),
        (1u64..300).prop_map(|delta_ms| Op::Advance { delta_ms }),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelState {
    Armed,
    Cancelled,
    Fired,
}

struct ModelEntry {
    deadline_ms: u64,
    state: ModelState,
}

proptest! {
    #[test]
    fn queue_matches_reference_model(ops in proptest::collection::vec(op_strategy(), 1..50)) {
        let clock = ManualClock::new();
        let timers = Timers::with_clock(Clock::manual(&clock));

        let fired: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
        let mut model: Vec<ModelEntry> = Vec::new();
        let mut handles = Vec::new();
        let mut now_ms = 0u64;

        let run_pump = |timers: &Timers,
                            model: &mut Vec<ModelEntry>,
                            fired: &Rc<RefCell<Vec<usize>>>,
                            now_ms: u64| {
            let before = fired.borrow().len();
            timers.pump();
            let log = fired.borrow();
            let this_pump = &log[before..];

            // Nothing fires early; fires are in (deadline, arming) order.
            let mut last_key = None;
            for &idx in this_pump {
                prop_assert!(model[idx].deadline_ms <= now_ms);
                prop_assert_eq!(model[idx].state, ModelState::Armed);
                let key = (model[idx].deadline_ms, idx);
                if let Some(prev) = last_key {
                    prop_assert!(prev < key);
                }
                last_key = Some(key);
            }
            drop(log);
            for &idx in &fired.borrow()[before..] {
                model[idx].state = ModelState::Fired;
            }

            // Completeness: every armed entry that was due has fired.
            for entry in model.iter() {
                if entry.state == ModelState::Armed {
                    prop_assert!(entry.deadline_ms > now_ms);
                }
            }
            Ok(())
        };

        for op in ops {
            match op {
                Op::Schedule { delay_ms } => {
                    let idx = model.len();
                    model.push(ModelEntry {
                        deadline_ms: now_ms + delay_ms,
                        state: ModelState::Armed,
                    });
                    let fired_clone = Rc::clone(&fired);
                    handles.push(timers.schedule(Duration::from_millis(delay_ms), move || {
                        fired_clone.borrow_mut().push(idx);
                    }));
                }
                Op::Cancel { pick } => {
                    if handles.is_empty() {
                        continue;
                    }
                    let idx = pick % handles.len();
                    let removed = timers.cancel(handles[idx]);
                    prop_assert_eq!(removed, model[idx].state == ModelState::Armed);
                    if removed {
                        model[idx].state = ModelState::Cancelled;
                    }
                }
                Op::Advance { delta_ms } => {
                    clock.advance(Duration::from_millis(delta_ms));
                    now_ms += delta_ms;
                    run_pump(&timers, &mut model, &fired, now_ms)?;
                }
            }
        }

        // Drain far past every deadline: all uncancelled entries fire.
        clock.advance(Duration::from_millis(1_000_000));
        now_ms += 1_000_000;
        run_pump(&timers, &mut model, &fired, now_ms)?;
        prop_assert!(timers.is_idle());
        for entry in &model {
            prop_assert!(entry.state != ModelState::Armed);
        }
    }
}
