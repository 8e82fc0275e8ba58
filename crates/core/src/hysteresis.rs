//! Time-based boolean hysteresis
//!
//! Turns a flapping boolean observation into a stable one. The stable state
//! only follows the raw input after the input has disagreed with it for a
//! minimum dwell time. The dwell time is configured separately for each
//! transition direction and scaled by a runtime factor.
//!
//! # Example
//!
//! ```
//! use land_detector_core::hysteresis::Hysteresis;
//!
//! let mut landed = Hysteresis::new(true);
//! landed.set_hysteresis_time_from(true, 300_000); // 300 ms to leave `true`
//!
//! assert!(landed.set_state_and_update(false, 1_000_000));
//! assert!(landed.set_state_and_update(false, 1_200_000));
//! assert!(!landed.set_state_and_update(false, 1_300_000));
//! ```

/// Debounced boolean signal with direction-dependent dwell times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hysteresis {
    /// Stable output
    state: bool,
    /// Time the raw input started disagreeing with `state`
    change_started_us: Option<u64>,
    /// Time of the last stable transition (0 if none yet)
    last_change_time_us: u64,
    /// Timestamp of the last accepted sample
    last_sample_us: Option<u64>,
    /// Dwell time before leaving `true` (fall hold)
    time_from_true_us: u64,
    /// Dwell time before leaving `false` (rise hold)
    time_from_false_us: u64,
    /// Multiplier applied to both dwell times
    factor: u32,
}

impl Hysteresis {
    /// Create a channel with the given initial stable state and zero dwell times.
    pub const fn new(initial_state: bool) -> Self {
        Self {
            state: initial_state,
            change_started_us: None,
            last_change_time_us: 0,
            last_sample_us: None,
            time_from_true_us: 0,
            time_from_false_us: 0,
            factor: 1,
        }
    }

    /// Current stable output.
    #[inline]
    pub fn state(&self) -> bool {
        self.state
    }

    /// Time of the last stable transition in microseconds.
    pub fn last_change_time_us(&self) -> u64 {
        self.last_change_time_us
    }

    /// Whether the raw input currently disagrees with the stable output.
    pub fn is_change_pending(&self) -> bool {
        self.change_started_us.is_some()
    }

    /// Set the dwell time required to leave `from_state`.
    pub fn set_hysteresis_time_from(&mut self, from_state: bool, time_us: u64) {
        if from_state {
            self.time_from_true_us = time_us;
        } else {
            self.time_from_false_us = time_us;
        }
    }

    /// Unscaled dwell time required to leave `from_state`.
    pub fn hysteresis_time_from(&self, from_state: bool) -> u64 {
        if from_state {
            self.time_from_true_us
        } else {
            self.time_from_false_us
        }
    }

    /// Scale both dwell times by `factor` (values below 1 are treated as 1).
    ///
    /// An open disagreement window keeps its start time; only the duration
    /// needed to complete it changes.
    pub fn set_factor(&mut self, factor: u32) {
        self.factor = factor.max(1);
    }

    /// Current dwell time multiplier.
    pub fn factor(&self) -> u32 {
        self.factor
    }

    /// Effective dwell time to leave `from_state`, including the factor.
    pub fn required_dwell_us(&self, from_state: bool) -> u64 {
        self.hysteresis_time_from(from_state)
            .saturating_mul(u64::from(self.factor))
    }

    /// Force the stable state and drop any pending change.
    pub fn reset(&mut self, state: bool) {
        self.state = state;
        self.change_started_us = None;
    }

    /// Feed one raw observation and return the stable output.
    ///
    /// Samples whose timestamp does not advance past the previous accepted
    /// sample are ignored, so a stalled or rewound clock can never flip the
    /// output.
    pub fn set_state_and_update(&mut self, new_state: bool, now_us: u64) -> bool {
        if let Some(last) = self.last_sample_us {
            if now_us <= last {
                return self.state;
            }
        }
        self.last_sample_us = Some(now_us);

        if new_state == self.state {
            self.change_started_us = None;
            return self.state;
        }

        let started = *self.change_started_us.get_or_insert(now_us);

        if now_us - started >= self.required_dwell_us(self.state) {
            self.state = new_state;
            self.change_started_us = None;
            self.last_change_time_us = now_us;
        }

        self.state
    }
}

impl Default for Hysteresis {
    fn default() -> Self {
        Self::new(false)
    }
}
