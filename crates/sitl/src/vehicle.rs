//! Simulated multicopter: threshold land predicates and a scripted flight.

use std::time::Duration;

use land_detector_core::detector::{
    ActuatorArmed, DistBottomSensor, LandPredicates, LocalPosition, PredicateContext,
    VehicleAcceleration,
};
use nalgebra::Vector3;

const GRAVITY: f32 = 9.81;

/// Thresholds of the simulated land predicates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Specific force below which the vehicle is considered falling (m/s²)
    pub freefall_acc: f32,
    /// Altitude below which the vehicle may touch the ground (m)
    pub ground_altitude: f32,
    /// Vertical speed below which the vehicle is considered settled (m/s)
    pub max_climb_rate: f32,
    /// Altitude below which ground effect disturbs the estimate (m)
    pub ground_effect_altitude: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            freefall_acc: 2.0,
            ground_altitude: 0.3,
            max_climb_rate: 0.5,
            ground_effect_altitude: 1.0,
        }
    }
}

/// Land predicates for a multicopter judged by altitude, vertical speed and
/// specific force.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPredicates {
    pub thresholds: Thresholds,
}

impl ScriptedPredicates {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    fn near_ground(&self, ctx: &PredicateContext<'_>) -> bool {
        let position = ctx.local_position;
        !position.z_valid || position.altitude() < self.thresholds.ground_altitude
    }

    fn settled(&self, ctx: &PredicateContext<'_>) -> bool {
        let position = ctx.local_position;
        !position.v_z_valid || position.vz.abs() < self.thresholds.max_climb_rate
    }
}

impl LandPredicates for ScriptedPredicates {
    fn freefall(&mut self, ctx: &PredicateContext<'_>) -> bool {
        // No acceleration sample received yet
        if ctx.acceleration.norm() == 0.0 {
            return false;
        }
        ctx.armed && ctx.acceleration.norm() < self.thresholds.freefall_acc
    }

    fn ground_contact(&mut self, ctx: &PredicateContext<'_>) -> bool {
        !ctx.armed || (self.near_ground(ctx) && self.settled(ctx))
    }

    fn maybe_landed(&mut self, ctx: &PredicateContext<'_>) -> bool {
        let strict = self.thresholds.max_climb_rate / 2.0;
        let position = ctx.local_position;
        let still = !position.v_z_valid || position.vz.abs() < strict;
        !ctx.armed || (self.near_ground(ctx) && still)
    }

    fn landed(&mut self, ctx: &PredicateContext<'_>) -> bool {
        self.maybe_landed(ctx)
    }

    fn ground_effect(&mut self, ctx: &PredicateContext<'_>) -> bool {
        ctx.armed && ctx.local_position.altitude() < self.thresholds.ground_effect_altitude
    }
}

/// Durations and altitude of a take-off, hover and landing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightProfile {
    /// Armed on the ground before take-off
    pub idle: Duration,
    /// Hover altitude (m)
    pub altitude: f32,
    /// Climb and descent speed (m/s)
    pub climb_rate: f32,
    pub hover: Duration,
    /// Armed on the ground after touchdown
    pub settle: Duration,
}

/// Vehicle state at one point of a [`FlightProfile`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSample {
    pub armed: ActuatorArmed,
    pub acceleration: VehicleAcceleration,
    pub local_position: LocalPosition,
}

impl Default for FlightProfile {
    fn default() -> Self {
        Self {
            idle: Duration::from_secs(2),
            altitude: 5.0,
            climb_rate: 1.5,
            hover: Duration::from_secs(5),
            settle: Duration::from_secs(2),
        }
    }
}

impl FlightProfile {
    fn climb(&self) -> Duration {
        Duration::try_from_secs_f32(self.altitude / self.climb_rate).unwrap_or(Duration::ZERO)
    }

    /// Time from arming to disarming.
    pub fn duration(&self) -> Duration {
        self.idle + self.climb() + self.hover + self.climb() + self.settle
    }

    /// Time from take-off to disarm, the span counted as flight time.
    pub fn flight_time(&self) -> Duration {
        self.climb() + self.hover + self.climb() + self.settle
    }

    /// Vehicle state `elapsed` after the start, stamped with `timestamp_us`.
    pub fn sample(&self, elapsed: Duration, timestamp_us: u64) -> ProfileSample {
        let t = elapsed.as_secs_f32();
        let climb_end = (self.idle + self.climb()).as_secs_f32();
        let descent_start = climb_end + self.hover.as_secs_f32();
        let touchdown = descent_start + self.climb().as_secs_f32();

        let (altitude, climb) = if t < self.idle.as_secs_f32() {
            (0.0, 0.0)
        } else if t < climb_end {
            let rising = t - self.idle.as_secs_f32();
            (rising * self.climb_rate, self.climb_rate)
        } else if t < descent_start {
            (self.altitude, 0.0)
        } else if t < touchdown {
            let falling = t - descent_start;
            (self.altitude - falling * self.climb_rate, -self.climb_rate)
        } else {
            (0.0, 0.0)
        };

        ProfileSample {
            armed: ActuatorArmed {
                timestamp_us,
                armed: elapsed < self.duration(),
            },
            acceleration: VehicleAcceleration {
                timestamp_us,
                xyz: Vector3::new(0.0, 0.0, -GRAVITY),
            },
            local_position: LocalPosition {
                timestamp_us,
                z: -altitude.max(0.0),
                z_valid: true,
                vz: -climb,
                v_z_valid: true,
                dist_bottom: altitude.max(0.0),
                dist_bottom_valid: true,
                dist_bottom_sensor_bitfield: DistBottomSensor::RANGE,
            },
        }
    }
}
