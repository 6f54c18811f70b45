//! Simulated typing burst against a lazily debounced query.
//!
//! Run with: cargo run -p lull-reactive --example search_debounce

use lull_core::{Clock, ManualClock, Timers};
use lull_reactive::{DebounceOptions, Debounced};
use web_time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let clock = ManualClock::new();
    let timers = Timers::with_clock(Clock::manual(&clock));
    let options = DebounceOptions::new(Duration::from_millis(250)).lazy();

    let query = Debounced::new(
        &timers,
        String::new(),
        || String::from("results for \"\""),
        options,
    )?;
    let _sub = query.subscribe(|results| println!("render: {results}"));

    // Four keystrokes, 60ms apart: no query runs, nothing renders.
    for text in ["r", "ru", "rus", "rust"] {
        let owned = text.to_string();
        query.notify(
            owned.clone(),
            move || format!("results for {owned:?}"),
            options,
        )?;
        clock.advance(Duration::from_millis(60));
        timers.pump();
    }

    // 250ms of quiet: one query, one render.
    clock.advance(Duration::from_millis(250));
    timers.pump();
    println!("settled on: {}", query.get());
    Ok(())
}
