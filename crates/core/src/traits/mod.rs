//! Platform abstractions injected into the land detector.
//!
//! Runtime-specific implementations (tokio, embedded timers) live outside
//! the core crate.

pub mod time;

pub use time::{MockTime, TimeSource};
