//! Land detector evaluator
//!
//! Runs five debounced predicates every tick, decides whether the composite
//! [`LandDetected`] record must be published, and accounts armed flight time.
//!
//! # Tick order
//!
//! 1. Distance sensor latch and hysteresis factor update
//!    ([`LandDetector::update_latch`], before the predicates are evaluated)
//! 2. Debounce freefall, ground contact, maybe landed, landed, ground effect
//! 3. Altitude ceiling
//! 4. Publish decision (changed field, stale record, or first evaluation),
//!    take-off latch on the landed → airborne edge while armed
//! 5. Flight time commit on the disarm edge
//!
//! [`LandDetector::tick`] is a pure function of its input and internal state;
//! scheduling, snapshot handling and persistence live in [`task`].

pub mod inputs;
pub mod predicates;
pub mod record;
pub mod task;

use nalgebra::Vector3;

use crate::flight_time::{FlightTimeAccumulator, FlightTimeCommit};
use crate::hysteresis::Hysteresis;

pub use inputs::{
    ActuatorArmed, DistBottomSensor, LocalPosition, SnapshotUpdate, Snapshots,
    VehicleAcceleration, VehicleStatus,
};
pub use predicates::{FixedPredicates, LandPredicates, PredicateContext, PredicateSample};
pub use record::{LandDetected, LandDetectedSink, PUBLISH_INTERVAL_US};
pub use task::LandDetectorTask;

#[cfg(feature = "defmt")]
use defmt::{debug, info};

#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($($arg:tt)*) => {{}};
}

/// Dwell time multiplier while the range sensor is observable but invalid
pub const HIGH_HYSTERESIS_FACTOR: u32 = 3;

/// Rise/fall dwell times of one channel (microseconds)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelTimes {
    /// Dwell before switching false → true
    pub rise_us: u64,
    /// Dwell before switching true → false
    pub fall_us: u64,
}

impl ChannelTimes {
    pub const fn rise(rise_us: u64) -> Self {
        Self {
            rise_us,
            fall_us: 0,
        }
    }

    fn apply(&self, channel: &mut Hysteresis) {
        channel.set_hysteresis_time_from(false, self.rise_us);
        channel.set_hysteresis_time_from(true, self.fall_us);
    }
}

/// Dwell times for all five channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HysteresisTimes {
    pub freefall: ChannelTimes,
    pub ground_contact: ChannelTimes,
    pub maybe_landed: ChannelTimes,
    pub landed: ChannelTimes,
    pub ground_effect: ChannelTimes,
}

/// Position fields the evaluator itself looks at
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionEstimate {
    /// Altitude above the estimator reference (m)
    pub altitude: f32,
    pub dist_bottom_valid: bool,
    /// A range finder currently feeds the distance estimate
    pub dist_bottom_sensor_active: bool,
}

impl From<&LocalPosition> for PositionEstimate {
    fn from(position: &LocalPosition) -> Self {
        Self {
            altitude: position.altitude(),
            dist_bottom_valid: position.dist_bottom_valid,
            dist_bottom_sensor_active: position.has_range_sensor(),
        }
    }
}

/// Everything one evaluator tick consumes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInput {
    pub now_us: u64,
    pub armed: bool,
    pub acceleration: Vector3<f32>,
    pub predicates: PredicateSample,
    /// Altitude ceiling in metres; values ≤ 0 mean unbounded
    pub max_altitude: f32,
}

/// Side effects requested by one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickOutput {
    /// Record to hand to the transport
    pub published: Option<LandDetected>,
    /// Flight time halves to persist
    pub flight_time: Option<FlightTimeCommit>,
}

/// One-way latch tracking whether distance-to-ground is observable
///
/// Once a range sensor has been seen the latch stays set. While set, losing
/// a valid distance estimate stretches all dwell times; regaining it
/// restores them. Both changes fire on the edge only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DistBottomLatch {
    observable: bool,
    high_hysteresis_active: bool,
}

impl DistBottomLatch {
    pub fn is_observable(&self) -> bool {
        self.observable
    }

    pub fn high_hysteresis_active(&self) -> bool {
        self.high_hysteresis_active
    }

    /// Update from the latest position; returns a new factor on an edge.
    pub fn update(&mut self, position: &PositionEstimate) -> Option<u32> {
        if !self.observable {
            self.observable = position.dist_bottom_sensor_active;
            return None;
        }

        if !self.high_hysteresis_active && !position.dist_bottom_valid {
            self.high_hysteresis_active = true;
            Some(HIGH_HYSTERESIS_FACTOR)
        } else if self.high_hysteresis_active && position.dist_bottom_valid {
            self.high_hysteresis_active = false;
            Some(1)
        } else {
            None
        }
    }
}

/// Land state evaluator
///
/// Owns the five debouncers, the distance latch, the last published record
/// and the flight time accumulator. Instances are independent; any number can
/// run side by side.
#[derive(Debug, Clone)]
pub struct LandDetector {
    freefall: Hysteresis,
    ground_contact: Hysteresis,
    maybe_landed: Hysteresis,
    landed: Hysteresis,
    ground_effect: Hysteresis,
    latch: DistBottomLatch,
    factor: u32,
    record: LandDetected,
    flight_time: FlightTimeAccumulator,
    previous_armed: bool,
}

impl LandDetector {
    pub fn new(times: &HysteresisTimes) -> Self {
        let initial = LandDetected::default();
        let mut detector = Self {
            freefall: Hysteresis::new(initial.freefall),
            ground_contact: Hysteresis::new(initial.ground_contact),
            maybe_landed: Hysteresis::new(initial.maybe_landed),
            landed: Hysteresis::new(initial.landed),
            ground_effect: Hysteresis::new(initial.in_ground_effect),
            latch: DistBottomLatch::default(),
            factor: 1,
            record: initial,
            flight_time: FlightTimeAccumulator::new(),
            previous_armed: false,
        };
        detector.set_hysteresis_times(times);
        detector
    }

    /// Replace the dwell times of all channels, keeping the current factor.
    pub fn set_hysteresis_times(&mut self, times: &HysteresisTimes) {
        times.freefall.apply(&mut self.freefall);
        times.ground_contact.apply(&mut self.ground_contact);
        times.maybe_landed.apply(&mut self.maybe_landed);
        times.landed.apply(&mut self.landed);
        times.ground_effect.apply(&mut self.ground_effect);
    }

    /// Scale the dwell times of all channels.
    pub fn set_hysteresis_factor(&mut self, factor: u32) {
        self.factor = factor.max(1);
        for channel in self.channels_mut() {
            channel.set_factor(factor);
        }
    }

    pub fn hysteresis_factor(&self) -> u32 {
        self.factor
    }

    pub fn dist_bottom_latch(&self) -> &DistBottomLatch {
        &self.latch
    }

    /// Last published record (initial state before the first publish).
    pub fn record(&self) -> &LandDetected {
        &self.record
    }

    pub fn flight_time(&self) -> &FlightTimeAccumulator {
        &self.flight_time
    }

    /// Restore the flight time total from persisted halves.
    pub fn load_flight_time(&mut self, hi: u32, lo: u32) {
        self.flight_time.load(hi, lo);
    }

    /// Update the distance latch from the latest position and rescale the
    /// dwell times on a factor edge.
    ///
    /// Runs first in a cycle so predicates see the current
    /// [`DistBottomLatch::high_hysteresis_active`].
    pub fn update_latch(&mut self, position: &PositionEstimate) {
        if let Some(factor) = self.latch.update(position) {
            debug!("land detector: hysteresis factor {}", factor);
            self.set_hysteresis_factor(factor);
        }
    }

    /// Run one evaluation tick on predicates sampled after
    /// [`update_latch`](Self::update_latch).
    pub fn tick(&mut self, input: &TickInput) -> TickOutput {
        let now_us = input.now_us;

        let sample = &input.predicates;
        let candidate = LandDetected {
            timestamp_us: now_us,
            alt_max: if input.max_altitude > 0.0 {
                input.max_altitude
            } else {
                f32::INFINITY
            },
            freefall: self.freefall.set_state_and_update(sample.freefall, now_us),
            ground_contact: self
                .ground_contact
                .set_state_and_update(sample.ground_contact, now_us),
            maybe_landed: self
                .maybe_landed
                .set_state_and_update(sample.maybe_landed, now_us),
            landed: self.landed.set_state_and_update(sample.landed, now_us),
            in_ground_effect: self
                .ground_effect
                .set_state_and_update(sample.ground_effect, now_us),
        };

        let mut output = TickOutput::default();

        if self.should_publish(&candidate, now_us) {
            if !candidate.landed
                && self.record.landed
                && input.armed
                && self.flight_time.on_takeoff(now_us)
            {
                info!("land detector: takeoff at {} us", now_us);
            }

            self.record = candidate;
            output.published = Some(candidate);
        }

        if !input.armed && self.previous_armed {
            output.flight_time = self.flight_time.commit(now_us);
        }
        self.previous_armed = input.armed;

        output
    }

    fn should_publish(&self, candidate: &LandDetected, now_us: u64) -> bool {
        self.record.is_unpublished()
            || self.record.is_stale(now_us)
            || self.record.differs_from(candidate)
    }

    fn channels_mut(&mut self) -> [&mut Hysteresis; 5] {
        [
            &mut self.freefall,
            &mut self.ground_contact,
            &mut self.maybe_landed,
            &mut self.landed,
            &mut self.ground_effect,
        ]
    }
}

impl Default for LandDetector {
    fn default() -> Self {
        Self::new(&HysteresisTimes::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 10_000_000;
    const TICK_US: u64 = 50_000;

    fn on_ground() -> PredicateSample {
        PredicateSample {
            freefall: false,
            ground_contact: true,
            maybe_landed: true,
            landed: true,
            ground_effect: true,
        }
    }

    fn airborne() -> PredicateSample {
        PredicateSample {
            freefall: false,
            ground_contact: false,
            maybe_landed: false,
            landed: false,
            ground_effect: false,
        }
    }

    fn input(now_us: u64, armed: bool, predicates: PredicateSample) -> TickInput {
        TickInput {
            now_us,
            armed,
            acceleration: Vector3::zeros(),
            predicates,
            max_altitude: -1.0,
        }
    }

    #[test]
    fn test_first_tick_publishes() {
        let mut detector = LandDetector::default();
        let out = detector.tick(&input(T0, false, on_ground()));
        let record = out.published.unwrap();
        assert_eq!(record.timestamp_us, T0);
        assert!(record.landed);
        assert_eq!(record.alt_max, f32::INFINITY);
    }

    #[test]
    fn test_publish_gating_staleness() {
        let mut detector = LandDetector::default();
        detector.tick(&input(T0, false, on_ground()));

        assert!(detector
            .tick(&input(T0 + 200_000, false, on_ground()))
            .published
            .is_none());
        assert!(detector
            .tick(&input(T0 + 999_999, false, on_ground()))
            .published
            .is_none());
        let out = detector.tick(&input(T0 + 1_000_000, false, on_ground()));
        assert_eq!(out.published.unwrap().timestamp_us, T0 + 1_000_000);
    }

    #[test]
    fn test_publish_on_field_change() {
        let mut detector = LandDetector::default();
        detector.tick(&input(T0, true, on_ground()));

        let mut sample = on_ground();
        sample.ground_effect = false;
        let out = detector.tick(&input(T0 + TICK_US, true, sample));
        assert!(!out.published.unwrap().in_ground_effect);
    }

    #[test]
    fn test_publish_on_alt_max_change() {
        let mut detector = LandDetector::default();
        detector.tick(&input(T0, false, on_ground()));

        let mut tick = input(T0 + TICK_US, false, on_ground());
        tick.max_altitude = 120.0;
        assert_eq!(detector.tick(&tick).published.unwrap().alt_max, 120.0);

        tick.now_us += TICK_US;
        assert!(detector.tick(&tick).published.is_none());
    }

    #[test]
    fn test_debounced_landed_publishes_after_hold() {
        let times = HysteresisTimes {
            landed: ChannelTimes {
                rise_us: 0,
                fall_us: 300_000,
            },
            ..Default::default()
        };
        let mut detector = LandDetector::new(&times);
        detector.tick(&input(T0, true, on_ground()));

        let mut sample = on_ground();
        sample.landed = false;
        let mut now = T0;
        let mut flipped_at = None;
        for _ in 0..10 {
            now += TICK_US;
            if let Some(record) = detector.tick(&input(now, true, sample)).published {
                if !record.landed {
                    flipped_at = Some(now);
                    break;
                }
            }
        }
        assert_eq!(flipped_at, Some(T0 + TICK_US + 300_000));
    }

    #[test]
    fn test_relaunch_while_armed_keeps_first_takeoff() {
        let mut detector = LandDetector::default();
        let mut now = T0;
        detector.tick(&input(now, true, on_ground()));

        let mut latched = 0;
        let mut last = detector.flight_time().takeoff_time_us();
        let phases = [airborne(), airborne(), on_ground(), airborne()];
        for phase in phases {
            for _ in 0..5 {
                now += TICK_US;
                detector.tick(&input(now, true, phase));
                let takeoff = detector.flight_time().takeoff_time_us();
                if takeoff != last {
                    latched += 1;
                    last = takeoff;
                }
            }
        }
        // Two landed -> airborne edges but one latch: the take-off stays
        // pending until disarm, so the relaunch does not restart the flight
        assert_eq!(latched, 1);
        assert_eq!(last, T0 + TICK_US);
    }

    #[test]
    fn test_takeoff_latched_again_after_disarm() {
        let mut detector = LandDetector::default();
        let mut now = T0;
        let mut takeoffs = 0;

        for _ in 0..2 {
            detector.tick(&input(now, true, on_ground()));
            now += TICK_US;
            detector.tick(&input(now, true, airborne()));
            if detector.flight_time().is_takeoff_pending() {
                takeoffs += 1;
            }
            now += TICK_US;
            detector.tick(&input(now, true, airborne()));
            now += TICK_US;
            detector.tick(&input(now, true, on_ground()));
            now += TICK_US;
            detector.tick(&input(now, false, on_ground()));
            now += TICK_US;
        }
        assert_eq!(takeoffs, 2);
    }

    #[test]
    fn test_no_takeoff_while_disarmed() {
        let mut detector = LandDetector::default();
        detector.tick(&input(T0, false, on_ground()));
        detector.tick(&input(T0 + TICK_US, false, airborne()));
        assert!(!detector.flight_time().is_takeoff_pending());
    }

    #[test]
    fn test_flight_time_accounting() {
        let mut detector = LandDetector::default();
        let t0 = T0;
        let t1 = t0 + 5_000_000;
        let t2 = t1 + 120_000_000;

        detector.tick(&input(t0, true, on_ground()));
        detector.tick(&input(t1, true, airborne()));
        detector.tick(&input(t2 - TICK_US, true, on_ground()));
        let out = detector.tick(&input(t2, false, on_ground()));

        let commit = out.flight_time.unwrap();
        assert_eq!(commit.added_us, 120_000_000);
        assert_eq!(detector.flight_time().total_us(), 120_000_000);
        assert_eq!((commit.hi, commit.lo), (0, 120_000_000));

        // Re-arm and disarm without flying
        detector.tick(&input(t2 + TICK_US, true, on_ground()));
        let out = detector.tick(&input(t2 + 2 * TICK_US, false, on_ground()));
        assert!(out.flight_time.is_none());
        assert_eq!(detector.flight_time().total_us(), 120_000_000);
    }

    #[test]
    fn test_disarm_commit_fires_on_edge_only() {
        let mut detector = LandDetector::default();
        detector.tick(&input(T0, true, on_ground()));
        detector.tick(&input(T0 + TICK_US, true, airborne()));

        let first = detector.tick(&input(T0 + 2 * TICK_US, false, airborne()));
        let second = detector.tick(&input(T0 + 3 * TICK_US, false, airborne()));
        assert!(first.flight_time.is_some());
        assert!(second.flight_time.is_none());
    }

    #[test]
    fn test_flight_time_adds_to_loaded_total() {
        let mut detector = LandDetector::default();
        detector.load_flight_time(1, 5);
        detector.tick(&input(T0, true, on_ground()));
        detector.tick(&input(T0 + TICK_US, true, airborne()));
        let out = detector.tick(&input(T0 + 2 * TICK_US, false, airborne()));
        assert_eq!(
            out.flight_time.unwrap().total_us(),
            0x1_0000_0005 + TICK_US
        );
    }

    fn position(sensor_active: bool, valid: bool) -> PositionEstimate {
        PositionEstimate {
            altitude: 1.0,
            dist_bottom_valid: valid,
            dist_bottom_sensor_active: sensor_active,
        }
    }

    #[test]
    fn test_latch_is_monotonic() {
        let mut latch = DistBottomLatch::default();
        assert_eq!(latch.update(&position(false, false)), None);
        assert!(!latch.is_observable());

        // Latching tick does not toggle the factor
        assert_eq!(latch.update(&position(true, false)), None);
        assert!(latch.is_observable());

        latch.update(&position(false, true));
        assert!(latch.is_observable());
    }

    #[test]
    fn test_latch_factor_edges() {
        let mut latch = DistBottomLatch::default();
        latch.update(&position(true, true));

        assert_eq!(latch.update(&position(true, true)), None);
        assert_eq!(
            latch.update(&position(true, false)),
            Some(HIGH_HYSTERESIS_FACTOR)
        );
        assert!(latch.high_hysteresis_active());
        assert_eq!(latch.update(&position(true, false)), None);
        assert_eq!(latch.update(&position(false, true)), Some(1));
        assert!(!latch.high_hysteresis_active());
        assert_eq!(latch.update(&position(false, true)), None);
    }

    #[test]
    fn test_invalid_distance_stretches_all_channels() {
        let times = HysteresisTimes {
            ground_contact: ChannelTimes::rise(100_000),
            ..Default::default()
        };
        let mut detector = LandDetector::new(&times);

        let mut tick = input(T0, true, airborne());
        detector.update_latch(&position(true, true));
        detector.tick(&tick);
        assert_eq!(detector.hysteresis_factor(), 1);

        tick.now_us += TICK_US;
        detector.update_latch(&position(true, false));
        detector.tick(&tick);
        assert_eq!(detector.hysteresis_factor(), HIGH_HYSTERESIS_FACTOR);

        // Ground contact now needs 300 ms instead of 100 ms
        let mut sample = airborne();
        sample.ground_contact = true;
        tick.predicates = sample;
        let start = tick.now_us + TICK_US;
        for step in 0..6 {
            tick.now_us = start + step * TICK_US;
            detector.tick(&tick);
            assert!(!detector.record().ground_contact);
        }
        tick.now_us = start + 300_000;
        detector.tick(&tick);
        assert!(detector.record().ground_contact);
    }
}
