//! Tokio-backed time source.
//!
//! Follows the tokio clock, so paused-time tests drive the detector
//! deterministically.

use land_detector_core::traits::TimeSource;
use tokio::time::Instant;

/// Microseconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct TokioTime {
    boot: Instant,
}

impl TokioTime {
    pub fn new() -> Self {
        Self {
            boot: Instant::now(),
        }
    }
}

impl Default for TokioTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for TokioTime {
    fn now_us(&self) -> u64 {
        u64::try_from(self.boot.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}
