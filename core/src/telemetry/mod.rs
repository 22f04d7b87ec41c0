//! telemetry/mod.rs
//! Counters, stage timers, and immutable snapshots for engine runs.
//!
//! Workers and adapters count privately; snapshots are taken once at the end
//! and are safe to serialize or hand across threads.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
