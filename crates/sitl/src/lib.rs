//! Host runtime for the land detector.
//!
//! Drives a [`LandDetectorTask`](land_detector_core::detector::LandDetectorTask)
//! on tokio: a backup timer plus an early wake on each position estimate,
//! a copy-on-read sensor bus for producers, and a watch channel carrying the
//! published land state.

pub mod bus;
pub mod error;
pub mod runner;
pub mod sink;
pub mod time;
pub mod vehicle;

pub use bus::SensorBus;
pub use error::RunnerError;
pub use runner::{LandDetectorRunner, RunnerConfig, RunnerHandle, WakeCounts};
pub use sink::WatchSink;
pub use time::TokioTime;
pub use vehicle::{FlightProfile, ProfileSample, ScriptedPredicates, Thresholds};
