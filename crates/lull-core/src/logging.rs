#![forbid(unsafe_code)]

//! Tracing-backed logging, active only with the `tracing` feature.
//!
//! Re-exports the `tracing` macros under the same names as the no-op
//! fallbacks in the crate root, so call sites switch implementations with a
//! `#[cfg(feature = "tracing")]` on the import alone.

pub use tracing::{debug, trace, warn};
