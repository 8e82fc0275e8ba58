//! Vehicle-specific land predicates
//!
//! The detector does not know what "freefall" or "ground contact" means for a
//! given airframe. Those decisions are injected through [`LandPredicates`],
//! evaluated once per tick on the tick's private snapshot copies, and then
//! debounced by the detector.

use nalgebra::Vector3;

use super::inputs::{LocalPosition, VehicleStatus};
use crate::parameters::LandDetectorParams;

/// Raw (undebounced) predicate values for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PredicateSample {
    pub freefall: bool,
    pub ground_contact: bool,
    pub maybe_landed: bool,
    pub landed: bool,
    pub ground_effect: bool,
}

/// Inputs visible to predicates during one tick
#[derive(Debug, Clone, Copy)]
pub struct PredicateContext<'a> {
    /// Tick time (microseconds since boot)
    pub now_us: u64,
    pub armed: bool,
    /// Latest body-frame acceleration (m/s²)
    pub acceleration: &'a Vector3<f32>,
    pub local_position: &'a LocalPosition,
    pub vehicle_status: &'a VehicleStatus,
    /// Dwell times are currently stretched because the distance sensor dropped out
    pub high_hysteresis_active: bool,
}

/// Per-airframe land predicate capability
///
/// Implementations may keep state between ticks (filters, timers). The
/// predicates are called in a fixed order every tick: freefall, ground
/// contact, maybe landed, landed, ground effect.
///
/// # Example
///
/// ```
/// use land_detector_core::detector::{LandPredicates, PredicateContext};
///
/// struct AltitudeOnly;
///
/// impl LandPredicates for AltitudeOnly {
///     fn freefall(&mut self, _ctx: &PredicateContext<'_>) -> bool {
///         false
///     }
///     fn ground_contact(&mut self, ctx: &PredicateContext<'_>) -> bool {
///         ctx.local_position.altitude() < 0.5
///     }
///     fn maybe_landed(&mut self, ctx: &PredicateContext<'_>) -> bool {
///         ctx.local_position.altitude() < 0.3
///     }
///     fn landed(&mut self, ctx: &PredicateContext<'_>) -> bool {
///         !ctx.armed || ctx.local_position.altitude() < 0.1
///     }
/// }
/// ```
pub trait LandPredicates {
    fn freefall(&mut self, ctx: &PredicateContext<'_>) -> bool;

    fn ground_contact(&mut self, ctx: &PredicateContext<'_>) -> bool;

    fn maybe_landed(&mut self, ctx: &PredicateContext<'_>) -> bool;

    fn landed(&mut self, ctx: &PredicateContext<'_>) -> bool;

    /// Airframes without a ground effect model never report it.
    fn ground_effect(&mut self, _ctx: &PredicateContext<'_>) -> bool {
        false
    }

    /// Altitude ceiling in metres; values ≤ 0 mean unbounded.
    fn max_altitude(&self, params: &LandDetectorParams) -> f32 {
        params.alt_max
    }

    /// Called after parameters were (re)loaded.
    fn update_params(&mut self, _params: &LandDetectorParams) {}

    /// Evaluate all predicates in their fixed order.
    fn evaluate(&mut self, ctx: &PredicateContext<'_>) -> PredicateSample {
        let freefall = self.freefall(ctx);
        let ground_contact = self.ground_contact(ctx);
        let maybe_landed = self.maybe_landed(ctx);
        let landed = self.landed(ctx);
        let ground_effect = self.ground_effect(ctx);

        PredicateSample {
            freefall,
            ground_contact,
            maybe_landed,
            landed,
            ground_effect,
        }
    }
}

/// Predicates returning a preset sample, for simulation and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedPredicates {
    pub sample: PredicateSample,
}

impl LandPredicates for FixedPredicates {
    fn freefall(&mut self, _ctx: &PredicateContext<'_>) -> bool {
        self.sample.freefall
    }

    fn ground_contact(&mut self, _ctx: &PredicateContext<'_>) -> bool {
        self.sample.ground_contact
    }

    fn maybe_landed(&mut self, _ctx: &PredicateContext<'_>) -> bool {
        self.sample.maybe_landed
    }

    fn landed(&mut self, _ctx: &PredicateContext<'_>) -> bool {
        self.sample.landed
    }

    fn ground_effect(&mut self, _ctx: &PredicateContext<'_>) -> bool {
        self.sample.ground_effect
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;

    struct Recording {
        calls: Vec<&'static str>,
    }

    impl LandPredicates for Recording {
        fn freefall(&mut self, _ctx: &PredicateContext<'_>) -> bool {
            self.calls.push("freefall");
            false
        }
        fn ground_contact(&mut self, _ctx: &PredicateContext<'_>) -> bool {
            self.calls.push("ground_contact");
            true
        }
        fn maybe_landed(&mut self, _ctx: &PredicateContext<'_>) -> bool {
            self.calls.push("maybe_landed");
            true
        }
        fn landed(&mut self, _ctx: &PredicateContext<'_>) -> bool {
            self.calls.push("landed");
            false
        }
    }

    #[test]
    fn test_evaluate_order_and_defaults() {
        let acceleration = Vector3::zeros();
        let position = LocalPosition::default();
        let status = VehicleStatus::default();
        let ctx = PredicateContext {
            now_us: 1,
            armed: true,
            acceleration: &acceleration,
            local_position: &position,
            vehicle_status: &status,
            high_hysteresis_active: false,
        };

        let mut predicates = Recording { calls: Vec::new() };
        let sample = predicates.evaluate(&ctx);

        assert_eq!(
            predicates.calls,
            ["freefall", "ground_contact", "maybe_landed", "landed"]
        );
        assert!(sample.ground_contact);
        assert!(sample.maybe_landed);
        assert!(!sample.landed);
        assert!(!sample.ground_effect);
    }

    #[test]
    fn test_default_max_altitude_from_params() {
        let params = LandDetectorParams {
            alt_max: 120.0,
            ..Default::default()
        };
        let predicates = FixedPredicates::default();
        assert_eq!(predicates.max_altitude(&params), 120.0);
    }
}
