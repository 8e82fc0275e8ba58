//! Cumulative flight time accounting
//!
//! Total armed flight time is kept as a 64-bit microsecond counter. Parameter
//! storage only holds 32-bit values, so the counter is persisted as two
//! halves (`hi`, `lo`) and reassembled on load.
//!
//! The counter is updated exactly once per disarm edge, and only if a
//! take-off was latched during the armed session. A 64-bit microsecond
//! counter wraps after roughly 584 000 years of flight; the addition wraps
//! and overflow is not otherwise handled.

/// Halves of the flight time counter to persist after a disarm edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlightTimeCommit {
    /// Upper 32 bits of the total
    pub hi: u32,
    /// Lower 32 bits of the total
    pub lo: u32,
    /// Flight duration added by this commit (microseconds)
    pub added_us: u64,
}

impl FlightTimeCommit {
    /// Reassembled total carried by this commit.
    pub fn total_us(&self) -> u64 {
        join_flight_time(self.hi, self.lo)
    }
}

/// Split a 64-bit total into its persisted `(hi, lo)` halves.
#[inline]
pub const fn split_flight_time(total_us: u64) -> (u32, u32) {
    (
        ((total_us >> 32) & 0xffff_ffff) as u32,
        (total_us & 0xffff_ffff) as u32,
    )
}

/// Reassemble a 64-bit total from persisted halves.
#[inline]
pub const fn join_flight_time(hi: u32, lo: u32) -> u64 {
    ((hi as u64) << 32) | lo as u64
}

/// Armed flight time accumulator
///
/// `takeoff_time_us == 0` means no take-off is pending. A take-off latched at
/// exactly time zero is therefore indistinguishable from none; monotonic
/// boot clocks never report zero after the first tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlightTimeAccumulator {
    total_us: u64,
    takeoff_time_us: u64,
}

impl FlightTimeAccumulator {
    /// Create an empty accumulator.
    pub const fn new() -> Self {
        Self {
            total_us: 0,
            takeoff_time_us: 0,
        }
    }

    /// Replace the total with the value reassembled from persisted halves.
    ///
    /// A pending take-off is kept so a reload mid-flight does not lose it.
    pub fn load(&mut self, hi: u32, lo: u32) {
        self.total_us = join_flight_time(hi, lo);
    }

    /// Total accumulated flight time in microseconds.
    pub fn total_us(&self) -> u64 {
        self.total_us
    }

    /// Persisted representation of the current total.
    pub fn split(&self) -> (u32, u32) {
        split_flight_time(self.total_us)
    }

    /// Pending take-off timestamp (0 = none).
    pub fn takeoff_time_us(&self) -> u64 {
        self.takeoff_time_us
    }

    /// Whether a take-off has been latched and not yet committed.
    pub fn is_takeoff_pending(&self) -> bool {
        self.takeoff_time_us != 0
    }

    /// Latch a take-off at `now_us` unless one is already pending.
    ///
    /// Returns `true` if the timestamp was latched.
    pub fn on_takeoff(&mut self, now_us: u64) -> bool {
        if self.is_takeoff_pending() {
            return false;
        }
        self.takeoff_time_us = now_us;
        self.is_takeoff_pending()
    }

    /// Add the time since take-off to the total and clear the take-off.
    ///
    /// Returns the halves to persist, or `None` if no take-off was pending.
    pub fn commit(&mut self, now_us: u64) -> Option<FlightTimeCommit> {
        if !self.is_takeoff_pending() {
            return None;
        }

        let added_us = now_us.saturating_sub(self.takeoff_time_us);
        self.total_us = self.total_us.wrapping_add(added_us);
        self.takeoff_time_us = 0;

        let (hi, lo) = self.split();
        Some(FlightTimeCommit { hi, lo, added_us })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_round_trip() {
        let total = 0x1_0000_0005;
        let (hi, lo) = split_flight_time(total);
        assert_eq!(hi, 1);
        assert_eq!(lo, 5);
        assert_eq!(join_flight_time(hi, lo), total);
    }

    #[test]
    fn test_split_extremes() {
        assert_eq!(split_flight_time(0), (0, 0));
        assert_eq!(split_flight_time(u64::MAX), (u32::MAX, u32::MAX));
        assert_eq!(join_flight_time(u32::MAX, 0), 0xffff_ffff_0000_0000);
    }

    #[test]
    fn test_load_reassembles() {
        let mut acc = FlightTimeAccumulator::new();
        acc.load(1, 5);
        assert_eq!(acc.total_us(), 0x1_0000_0005);
        assert_eq!(acc.split(), (1, 5));
    }

    #[test]
    fn test_commit_adds_elapsed_once() {
        let mut acc = FlightTimeAccumulator::new();
        let t0 = 10_000_000;
        let t1 = t0 + 5_000_000;
        let t2 = t1 + 120_000_000;

        assert!(acc.on_takeoff(t1));
        let commit = acc.commit(t2).unwrap();
        assert_eq!(commit.added_us, 120_000_000);
        assert_eq!(acc.total_us(), 120_000_000);
        assert_eq!(commit.total_us(), 120_000_000);

        // Second disarm without a take-off adds nothing
        assert!(acc.commit(t2 + 1_000_000).is_none());
        assert_eq!(acc.total_us(), 120_000_000);
    }

    #[test]
    fn test_takeoff_latched_once() {
        let mut acc = FlightTimeAccumulator::new();
        assert!(acc.on_takeoff(1_000));
        assert!(!acc.on_takeoff(2_000));
        assert_eq!(acc.takeoff_time_us(), 1_000);
    }

    #[test]
    fn test_commit_carries_into_high_half() {
        let mut acc = FlightTimeAccumulator::new();
        acc.load(0, u32::MAX);
        acc.on_takeoff(1_000);
        let commit = acc.commit(1_006).unwrap();
        assert_eq!((commit.hi, commit.lo), (1, 5));
    }

    #[test]
    fn test_load_keeps_pending_takeoff() {
        let mut acc = FlightTimeAccumulator::new();
        acc.on_takeoff(1_000);
        acc.load(0, 42);
        assert!(acc.is_takeoff_pending());
        assert_eq!(acc.commit(2_000).unwrap().total_us(), 1_042);
    }
}
