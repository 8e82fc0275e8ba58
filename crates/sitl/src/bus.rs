//! Copy-on-read sensor bus.
//!
//! Producers overwrite the pending sample of their topic; the runner takes
//! the whole pending set at the top of a tick. Samples published between two
//! ticks coalesce to the latest one.

use std::sync::{Arc, Mutex, MutexGuard};

use land_detector_core::detector::{
    ActuatorArmed, LocalPosition, SnapshotUpdate, VehicleAcceleration, VehicleStatus,
};
use tokio::sync::Notify;

use crate::error::RunnerError;

/// Shared input topics of one land detector.
///
/// Clones share the same pending set.
#[derive(Debug, Clone, Default)]
pub struct SensorBus {
    pending: Arc<Mutex<SnapshotUpdate>>,
    position_updated: Arc<Notify>,
}

impl SensorBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish_armed(&self, armed: ActuatorArmed) -> Result<(), RunnerError> {
        self.lock()?.armed = Some(armed);
        Ok(())
    }

    pub fn publish_acceleration(&self, acceleration: VehicleAcceleration) -> Result<(), RunnerError> {
        self.lock()?.acceleration = Some(acceleration);
        Ok(())
    }

    /// Publish a position estimate and wake the runner early.
    pub fn publish_local_position(&self, position: LocalPosition) -> Result<(), RunnerError> {
        self.lock()?.local_position = Some(position);
        self.position_updated.notify_one();
        Ok(())
    }

    pub fn publish_vehicle_status(&self, status: VehicleStatus) -> Result<(), RunnerError> {
        self.lock()?.vehicle_status = Some(status);
        Ok(())
    }

    /// Take every sample published since the last call.
    pub fn take(&self) -> Result<SnapshotUpdate, RunnerError> {
        Ok(std::mem::take(&mut *self.lock()?))
    }

    /// Edge signal raised on each position update.
    pub fn position_updated(&self) -> Arc<Notify> {
        Arc::clone(&self.position_updated)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SnapshotUpdate>, RunnerError> {
        self.pending.lock().map_err(|_| RunnerError::BusPoisoned)
    }
}
