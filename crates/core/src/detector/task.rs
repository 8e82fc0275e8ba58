//! Land detector task
//!
//! Binds one [`LandDetector`] to its collaborators: the snapshot copies it
//! reads, the vehicle's predicate provider, the output sink and the parameter
//! store holding tunables and the persisted flight time.
//!
//! A cycle runs in this order:
//!
//! 1. Reload parameters on a notification or before the first publish
//! 2. Apply the pending snapshot update to the private copies
//! 3. Update the distance latch, evaluate predicates and run the detector tick
//! 4. Hand a published record to the sink
//! 5. Persist committed flight time without notifying
//! 6. Record cycle statistics

use super::inputs::{SnapshotUpdate, Snapshots};
use super::predicates::{LandPredicates, PredicateContext};
use super::record::LandDetectedSink;
use super::{LandDetector, PositionEstimate, TickInput, TickOutput};
use crate::flight_time::FlightTimeCommit;
use crate::parameters::land_detector::{FLIGHT_TIME_HI, FLIGHT_TIME_LO};
use crate::parameters::{LandDetectorParams, ParamValue, ParameterError, ParameterStore};
use crate::scheduler::{TaskStats, LAND_DETECTOR_TASK};
use crate::traits::TimeSource;

#[cfg(feature = "defmt")]
use defmt::{debug, info, warn};

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($($arg:tt)*) => {{}};
}

/// Land detector with its inputs, predicates, output and parameters
pub struct LandDetectorTask<P, S> {
    detector: LandDetector,
    predicates: P,
    sink: S,
    store: ParameterStore,
    params: LandDetectorParams,
    snapshots: Snapshots,
    /// Notification counter value of the last reload
    seen_update_count: Option<u32>,
    stats: TaskStats,
}

impl<P: LandPredicates, S: LandDetectedSink> LandDetectorTask<P, S> {
    /// Create a task, registering the land detector parameters in `store`.
    ///
    /// Values already present in `store` (e.g. loaded from flash) are kept.
    pub fn new(predicates: P, sink: S, mut store: ParameterStore) -> Result<Self, ParameterError> {
        LandDetectorParams::register_defaults(&mut store)?;
        let params = LandDetectorParams::from_store(&store);

        Ok(Self {
            detector: LandDetector::new(&params.hysteresis_times()),
            predicates,
            sink,
            store,
            params,
            snapshots: Snapshots::default(),
            seen_update_count: None,
            stats: TaskStats::default(),
        })
    }

    /// Run one cycle with the snapshots that arrived since the last one.
    pub fn run<T: TimeSource>(&mut self, update: &SnapshotUpdate, time: &T) -> TickOutput {
        let now_us = time.now_us();

        if self.params_changed() {
            self.reload_params();
        }

        self.snapshots.apply(update);

        let snapshots = &self.snapshots;
        self.detector
            .update_latch(&PositionEstimate::from(&snapshots.local_position));

        let armed = snapshots.armed.armed;
        let ctx = PredicateContext {
            now_us,
            armed,
            acceleration: &snapshots.acceleration.xyz,
            local_position: &snapshots.local_position,
            vehicle_status: &snapshots.vehicle_status,
            high_hysteresis_active: self.detector.dist_bottom_latch().high_hysteresis_active(),
        };
        let predicates = self.predicates.evaluate(&ctx);

        let input = TickInput {
            now_us,
            armed,
            acceleration: snapshots.acceleration.xyz,
            predicates,
            max_altitude: self.predicates.max_altitude(&self.params),
        };
        let output = self.detector.tick(&input);

        if let Some(record) = &output.published {
            self.sink.publish(record);
        }

        if let Some(commit) = &output.flight_time {
            info!(
                "land detector: flight time +{} us, total {} us",
                commit.added_us,
                commit.total_us()
            );
            self.persist_flight_time(commit);
        }

        self.stats
            .record_cycle(now_us, time.now_us(), &LAND_DETECTOR_TASK);
        output
    }

    fn params_changed(&self) -> bool {
        self.seen_update_count != Some(self.store.update_count())
            || self.detector.record().is_unpublished()
    }

    fn reload_params(&mut self) {
        self.seen_update_count = Some(self.store.update_count());
        self.params = LandDetectorParams::from_store(&self.store);
        debug!("land detector: parameters reloaded");

        self.detector
            .set_hysteresis_times(&self.params.hysteresis_times());
        self.detector
            .load_flight_time(self.params.flight_time_hi, self.params.flight_time_lo);
        self.predicates.update_params(&self.params);
    }

    /// Store both halves; a failed half is logged and left for the next commit.
    fn persist_flight_time(&mut self, commit: &FlightTimeCommit) {
        let halves = [(FLIGHT_TIME_HI, commit.hi), (FLIGHT_TIME_LO, commit.lo)];
        for (name, half) in halves {
            if let Err(_e) = self
                .store
                .commit_no_notification(name, ParamValue::Int(half as i32))
            {
                warn!("land detector: failed to persist {}: {}", name, _e);
            }
        }
        self.params.flight_time_hi = commit.hi;
        self.params.flight_time_lo = commit.lo;
    }

    pub fn detector(&self) -> &LandDetector {
        &self.detector
    }

    /// Parameters as of the last reload
    pub fn params(&self) -> &LandDetectorParams {
        &self.params
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    /// Mutable store access; notifying writes are picked up next cycle.
    pub fn store_mut(&mut self) -> &mut ParameterStore {
        &mut self.store
    }

    pub fn snapshots(&self) -> &Snapshots {
        &self.snapshots
    }

    pub fn stats(&self) -> &TaskStats {
        &self.stats
    }

    pub fn predicates_mut(&mut self) -> &mut P {
        &mut self.predicates
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
