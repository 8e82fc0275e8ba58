//! land_detector_core - no_std land detection logic
//!
//! Debounces per-airframe land predicates into a published land state and
//! keeps the accumulated flight time across arm/disarm cycles. Platform
//! services (time, output transport, predicate physics) are injected.
//!
//! # Modules
//!
//! - [`hysteresis`]: Minimum-dwell-time debouncer
//! - [`flight_time`]: 64-bit flight time accumulator split into two halves
//! - [`detector`]: Land state evaluator, its inputs, predicates and task
//! - [`parameters`]: Parameter store with change notification
//! - [`scheduler`]: Task timing metadata and cycle statistics
//! - [`traits`]: Platform-agnostic trait abstractions (TimeSource)

#![no_std]

pub mod detector;
pub mod flight_time;
pub mod hysteresis;
pub mod parameters;
pub mod scheduler;
pub mod traits;
