//! Sensor and vehicle snapshots consumed by the land detector
//!
//! Every tick works on private copies of the latest snapshots. Producers hand
//! over a [`SnapshotUpdate`] holding only the topics that changed; absent
//! topics keep their previous value rather than being zeroed.

use bitflags::bitflags;
use nalgebra::Vector3;

bitflags! {
    /// Sensors currently contributing to the distance-to-ground estimate
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DistBottomSensor: u8 {
        /// Range finder (lidar, sonar, radar altimeter)
        const RANGE = 0b0000_0001;
        /// Optical flow derived terrain distance
        const FLOW = 0b0000_0010;
    }
}

/// Actuator arming state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorArmed {
    /// Sample time (microseconds since boot)
    pub timestamp_us: u64,
    /// Actuators enabled
    pub armed: bool,
}

/// Filtered body-frame acceleration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleAcceleration {
    /// Sample time (microseconds since boot)
    pub timestamp_us: u64,
    /// Acceleration in m/s² (FRD body frame, gravity included)
    pub xyz: Vector3<f32>,
}

impl Default for VehicleAcceleration {
    fn default() -> Self {
        Self {
            timestamp_us: 0,
            xyz: Vector3::zeros(),
        }
    }
}

/// Local position estimate (NED, origin at the estimator reference)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPosition {
    /// Sample time (microseconds since boot)
    pub timestamp_us: u64,
    /// Down position (m); altitude above the reference is `-z`
    pub z: f32,
    /// `z` is usable
    pub z_valid: bool,
    /// Down velocity (m/s)
    pub vz: f32,
    /// `vz` is usable
    pub v_z_valid: bool,
    /// Distance to the ground (m)
    pub dist_bottom: f32,
    /// `dist_bottom` is usable
    pub dist_bottom_valid: bool,
    /// Sensors feeding `dist_bottom`
    pub dist_bottom_sensor_bitfield: DistBottomSensor,
}

impl LocalPosition {
    /// Altitude above the estimator reference (m).
    pub fn altitude(&self) -> f32 {
        -self.z
    }

    /// Whether a range finder feeds the distance-to-ground estimate.
    pub fn has_range_sensor(&self) -> bool {
        self.dist_bottom_sensor_bitfield
            .contains(DistBottomSensor::RANGE)
    }
}

impl Default for LocalPosition {
    fn default() -> Self {
        Self {
            timestamp_us: 0,
            z: 0.0,
            z_valid: false,
            vz: 0.0,
            v_z_valid: false,
            dist_bottom: 0.0,
            dist_bottom_valid: false,
            dist_bottom_sensor_bitfield: DistBottomSensor::empty(),
        }
    }
}

/// Vehicle status, forwarded to predicates without interpretation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VehicleStatus {
    /// Sample time (microseconds since boot)
    pub timestamp_us: u64,
    /// Active navigation state (vehicle specific numbering)
    pub nav_state: u8,
    /// Vehicle is a VTOL airframe
    pub is_vtol: bool,
    /// VTOL transition in progress
    pub in_transition_mode: bool,
}

/// New samples delivered since the previous tick
///
/// `None` means "no new data" for that topic.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnapshotUpdate {
    pub armed: Option<ActuatorArmed>,
    pub acceleration: Option<VehicleAcceleration>,
    pub local_position: Option<LocalPosition>,
    pub vehicle_status: Option<VehicleStatus>,
}

impl SnapshotUpdate {
    /// Whether the update carries no new sample at all.
    pub fn is_empty(&self) -> bool {
        self.armed.is_none()
            && self.acceleration.is_none()
            && self.local_position.is_none()
            && self.vehicle_status.is_none()
    }
}

/// Latest known value of every input topic
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snapshots {
    pub armed: ActuatorArmed,
    pub acceleration: VehicleAcceleration,
    pub local_position: LocalPosition,
    pub vehicle_status: VehicleStatus,
}

impl Snapshots {
    /// Copy in the topics present in `update`, keeping the rest.
    pub fn apply(&mut self, update: &SnapshotUpdate) {
        if let Some(armed) = update.armed {
            self.armed = armed;
        }
        if let Some(acceleration) = update.acceleration {
            self.acceleration = acceleration;
        }
        if let Some(local_position) = update.local_position {
            self.local_position = local_position;
        }
        if let Some(vehicle_status) = update.vehicle_status {
            self.vehicle_status = vehicle_status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_retains_absent_topics() {
        let mut snapshots = Snapshots::default();
        snapshots.apply(&SnapshotUpdate {
            armed: Some(ActuatorArmed {
                timestamp_us: 10,
                armed: true,
            }),
            acceleration: Some(VehicleAcceleration {
                timestamp_us: 10,
                xyz: Vector3::new(0.0, 0.0, -9.81),
            }),
            ..Default::default()
        });

        // Only the position changes
        snapshots.apply(&SnapshotUpdate {
            local_position: Some(LocalPosition {
                z: -2.0,
                ..Default::default()
            }),
            ..Default::default()
        });

        assert!(snapshots.armed.armed);
        assert_eq!(snapshots.acceleration.xyz.z, -9.81);
        assert_eq!(snapshots.local_position.altitude(), 2.0);
    }

    #[test]
    fn test_empty_update() {
        assert!(SnapshotUpdate::default().is_empty());
        let update = SnapshotUpdate {
            vehicle_status: Some(VehicleStatus::default()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_range_sensor_bit() {
        let mut position = LocalPosition::default();
        assert!(!position.has_range_sensor());
        position.dist_bottom_sensor_bitfield = DistBottomSensor::FLOW;
        assert!(!position.has_range_sensor());
        position.dist_bottom_sensor_bitfield |= DistBottomSensor::RANGE;
        assert!(position.has_range_sensor());
    }
}
