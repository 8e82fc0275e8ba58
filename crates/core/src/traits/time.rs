//! Monotonic time source used by the land detector task.

use core::cell::Cell;

/// Monotonic microsecond clock
///
/// # Example
///
/// ```
/// use land_detector_core::traits::{MockTime, TimeSource};
///
/// let time = MockTime::with_initial(2_000);
/// time.advance(500);
/// assert_eq!(time.elapsed_since(2_000), 500);
/// ```
pub trait TimeSource {
    /// Microseconds since system start.
    fn now_us(&self) -> u64;

    /// Microseconds elapsed since `reference_us`, saturating at zero.
    fn elapsed_since(&self, reference_us: u64) -> u64 {
        self.now_us().saturating_sub(reference_us)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// Manually driven clock for tests and offline replay.
#[derive(Debug, Clone, Default)]
pub struct MockTime {
    current_us: Cell<u64>,
}

impl MockTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(us: u64) -> Self {
        Self {
            current_us: Cell::new(us),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, us: u64) {
        self.current_us.set(us);
    }

    pub fn advance(&self, us: u64) {
        self.current_us.set(self.current_us.get().saturating_add(us));
    }
}

impl TimeSource for MockTime {
    fn now_us(&self) -> u64 {
        self.current_us.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_time_starts_at_zero() {
        assert_eq!(MockTime::new().now_us(), 0);
    }

    #[test]
    fn mock_time_set_and_advance() {
        let time = MockTime::with_initial(5_000_000);
        time.advance(50_000);
        assert_eq!(time.now_us(), 5_050_000);
        time.set(10);
        assert_eq!(time.now_us(), 10);
    }

    #[test]
    fn mock_time_elapsed_since_saturates() {
        let time = MockTime::with_initial(1_000);
        assert_eq!(time.elapsed_since(400), 600);
        assert_eq!(time.elapsed_since(5_000), 0);
    }

    #[test]
    fn time_source_by_reference() {
        fn read<T: TimeSource>(time: T) -> u64 {
            time.now_us()
        }
        let time = MockTime::with_initial(42);
        assert_eq!(read(&time), 42);
    }
}
