//! Land Detector Parameter Definitions
//!
//! # Parameters
//!
//! - `LND_FLIGHT_T_HI` / `LND_FLIGHT_T_LO` - Accumulated flight time (µs), split
//!   into the bit patterns of two 32-bit halves
//! - `LND_ALT_MAX` - Maximum altitude (m), non-positive disables the ceiling
//! - `LND_FFALL_TTRI` - Freefall trigger time (s)
//! - `LND_GC_TTRI` - Ground contact trigger time (s)
//! - `LND_ML_TTRI` - Maybe landed trigger time (s)
//! - `LND_LAND_TTRI` - Landed trigger time (s)
//! - `LND_GE_TTRI` - Ground effect trigger time (s)
//! - `LND_TKOF_TTRI` - Take-off trigger time (s), hold before leaving landed

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};
use crate::detector::{ChannelTimes, HysteresisTimes};
use crate::flight_time::join_flight_time;

pub const FLIGHT_TIME_HI: &str = "LND_FLIGHT_T_HI";
pub const FLIGHT_TIME_LO: &str = "LND_FLIGHT_T_LO";
pub const ALT_MAX: &str = "LND_ALT_MAX";
pub const FREEFALL_TRIGGER: &str = "LND_FFALL_TTRI";
pub const GROUND_CONTACT_TRIGGER: &str = "LND_GC_TTRI";
pub const MAYBE_LANDED_TRIGGER: &str = "LND_ML_TTRI";
pub const LANDED_TRIGGER: &str = "LND_LAND_TTRI";
pub const GROUND_EFFECT_TRIGGER: &str = "LND_GE_TTRI";
pub const TAKEOFF_TRIGGER: &str = "LND_TKOF_TTRI";

const DEFAULT_FREEFALL_S: f32 = 0.3;
const DEFAULT_GROUND_CONTACT_S: f32 = 0.35;
const DEFAULT_MAYBE_LANDED_S: f32 = 0.25;
const DEFAULT_LANDED_S: f32 = 0.3;
const DEFAULT_GROUND_EFFECT_S: f32 = 0.2;

/// Land detector parameters loaded from the parameter store
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LandDetectorParams {
    /// High half of the persisted flight time
    pub flight_time_hi: u32,
    /// Low half of the persisted flight time
    pub flight_time_lo: u32,
    /// Altitude ceiling (m), ≤ 0 disables
    pub alt_max: f32,
    pub freefall_trigger_s: f32,
    pub ground_contact_trigger_s: f32,
    pub maybe_landed_trigger_s: f32,
    pub landed_trigger_s: f32,
    pub ground_effect_trigger_s: f32,
    pub takeoff_trigger_s: f32,
}

impl Default for LandDetectorParams {
    fn default() -> Self {
        Self {
            flight_time_hi: 0,
            flight_time_lo: 0,
            alt_max: -1.0,
            freefall_trigger_s: DEFAULT_FREEFALL_S,
            ground_contact_trigger_s: DEFAULT_GROUND_CONTACT_S,
            maybe_landed_trigger_s: DEFAULT_MAYBE_LANDED_S,
            landed_trigger_s: DEFAULT_LANDED_S,
            ground_effect_trigger_s: DEFAULT_GROUND_EFFECT_S,
            takeoff_trigger_s: 0.0,
        }
    }
}

impl LandDetectorParams {
    /// Register land detector parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        let defaults = Self::default();

        store.register(FLIGHT_TIME_HI, ParamValue::Int(0), ParamFlags::empty())?;
        store.register(FLIGHT_TIME_LO, ParamValue::Int(0), ParamFlags::empty())?;
        store.register(
            ALT_MAX,
            ParamValue::Float(defaults.alt_max),
            ParamFlags::empty(),
        )?;

        let triggers = [
            (FREEFALL_TRIGGER, defaults.freefall_trigger_s),
            (GROUND_CONTACT_TRIGGER, defaults.ground_contact_trigger_s),
            (MAYBE_LANDED_TRIGGER, defaults.maybe_landed_trigger_s),
            (LANDED_TRIGGER, defaults.landed_trigger_s),
            (GROUND_EFFECT_TRIGGER, defaults.ground_effect_trigger_s),
            (TAKEOFF_TRIGGER, defaults.takeoff_trigger_s),
        ];
        for (name, seconds) in triggers {
            store.register(name, ParamValue::Float(seconds), ParamFlags::empty())?;
        }

        Ok(())
    }

    /// Load land detector parameters from the store
    ///
    /// Missing or mistyped entries fall back to their defaults. Trigger times
    /// are clamped to be non-negative.
    pub fn from_store(store: &ParameterStore) -> Self {
        let defaults = Self::default();

        Self {
            flight_time_hi: load_u32(store, FLIGHT_TIME_HI),
            flight_time_lo: load_u32(store, FLIGHT_TIME_LO),
            alt_max: load_float(store, ALT_MAX, defaults.alt_max),
            freefall_trigger_s: load_trigger(store, FREEFALL_TRIGGER, defaults.freefall_trigger_s),
            ground_contact_trigger_s: load_trigger(
                store,
                GROUND_CONTACT_TRIGGER,
                defaults.ground_contact_trigger_s,
            ),
            maybe_landed_trigger_s: load_trigger(
                store,
                MAYBE_LANDED_TRIGGER,
                defaults.maybe_landed_trigger_s,
            ),
            landed_trigger_s: load_trigger(store, LANDED_TRIGGER, defaults.landed_trigger_s),
            ground_effect_trigger_s: load_trigger(
                store,
                GROUND_EFFECT_TRIGGER,
                defaults.ground_effect_trigger_s,
            ),
            takeoff_trigger_s: load_trigger(store, TAKEOFF_TRIGGER, defaults.takeoff_trigger_s),
        }
    }

    /// Persisted flight time total (µs)
    pub fn total_flight_time_us(&self) -> u64 {
        join_flight_time(self.flight_time_hi, self.flight_time_lo)
    }

    /// Dwell times for the detector channels
    pub fn hysteresis_times(&self) -> HysteresisTimes {
        HysteresisTimes {
            freefall: ChannelTimes::rise(seconds_to_us(self.freefall_trigger_s)),
            ground_contact: ChannelTimes::rise(seconds_to_us(self.ground_contact_trigger_s)),
            maybe_landed: ChannelTimes::rise(seconds_to_us(self.maybe_landed_trigger_s)),
            landed: ChannelTimes {
                rise_us: seconds_to_us(self.landed_trigger_s),
                fall_us: seconds_to_us(self.takeoff_trigger_s),
            },
            ground_effect: ChannelTimes::rise(seconds_to_us(self.ground_effect_trigger_s)),
        }
    }
}

fn load_float(store: &ParameterStore, name: &str, default: f32) -> f32 {
    match store.get(name) {
        Some(ParamValue::Float(v)) if v.is_finite() => v,
        Some(ParamValue::Int(v)) => v as f32,
        _ => default,
    }
}

fn load_trigger(store: &ParameterStore, name: &str, default: f32) -> f32 {
    load_float(store, name, default).max(0.0)
}

fn load_u32(store: &ParameterStore, name: &str) -> u32 {
    match store.get(name) {
        Some(ParamValue::Int(v)) => v as u32,
        _ => 0,
    }
}

fn seconds_to_us(seconds: f32) -> u64 {
    if seconds <= 0.0 {
        return 0;
    }
    libm::roundf(seconds * 1_000_000.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_defaults() {
        let mut store = ParameterStore::new();
        LandDetectorParams::register_defaults(&mut store).unwrap();

        assert_eq!(store.len(), 9);
        assert_eq!(store.get(FLIGHT_TIME_HI), Some(ParamValue::Int(0)));
        assert_eq!(store.get(ALT_MAX), Some(ParamValue::Float(-1.0)));
        assert_eq!(store.update_count(), 0);
    }

    #[test]
    fn test_from_store_defaults() {
        let mut store = ParameterStore::new();
        LandDetectorParams::register_defaults(&mut store).unwrap();

        assert_eq!(
            LandDetectorParams::from_store(&store),
            LandDetectorParams::default()
        );
    }

    #[test]
    fn test_from_empty_store_uses_defaults() {
        let store = ParameterStore::new();
        assert_eq!(
            LandDetectorParams::from_store(&store),
            LandDetectorParams::default()
        );
    }

    #[test]
    fn test_flight_time_halves_keep_bit_pattern() {
        let mut store = ParameterStore::new();
        LandDetectorParams::register_defaults(&mut store).unwrap();
        store.set(FLIGHT_TIME_HI, ParamValue::Int(1)).unwrap();
        store
            .set(FLIGHT_TIME_LO, ParamValue::Int(0xFFFF_FFFFu32 as i32))
            .unwrap();

        let params = LandDetectorParams::from_store(&store);
        assert_eq!(params.flight_time_lo, 0xFFFF_FFFF);
        assert_eq!(params.total_flight_time_us(), 0x1_FFFF_FFFF);
    }

    #[test]
    fn test_negative_trigger_clamped() {
        let mut store = ParameterStore::new();
        LandDetectorParams::register_defaults(&mut store).unwrap();
        store.set(LANDED_TRIGGER, ParamValue::Float(-2.0)).unwrap();

        let params = LandDetectorParams::from_store(&store);
        assert_eq!(params.landed_trigger_s, 0.0);
        assert_eq!(params.hysteresis_times().landed.rise_us, 0);
    }

    #[test]
    fn test_hysteresis_times() {
        let params = LandDetectorParams {
            landed_trigger_s: 1.5,
            takeoff_trigger_s: 0.1,
            ..Default::default()
        };
        let times = params.hysteresis_times();

        assert_eq!(times.landed.rise_us, 1_500_000);
        assert_eq!(times.landed.fall_us, 100_000);
        assert_eq!(times.freefall.rise_us, 300_000);
        assert_eq!(times.freefall.fall_us, 0);
        assert_eq!(times.ground_contact.rise_us, 350_000);
        assert_eq!(times.ground_effect.rise_us, 200_000);
    }
}
