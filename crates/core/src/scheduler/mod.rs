//! Task timing types for the land detector cycle
//!
//! The async loop driving the task lives in the sitl crate; this module only
//! holds the runtime-independent parts.
//!
//! # Example
//!
//! ```rust
//! use land_detector_core::scheduler::{TaskStats, LAND_DETECTOR_TASK};
//!
//! let mut stats = TaskStats::default();
//! stats.record_cycle(0, 120, &LAND_DETECTOR_TASK);
//! assert_eq!(stats.cycle_count, 1);
//! ```

pub mod types;

pub use types::*;
