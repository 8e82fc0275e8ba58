//! Published land detection record and its output sink

/// Minimum publish rate: an unchanged record is re-sent after this interval.
pub const PUBLISH_INTERVAL_US: u64 = 1_000_000;

/// Composite land detection state
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LandDetected {
    /// Publish time (microseconds since boot, 0 = never published)
    pub timestamp_us: u64,
    /// Altitude ceiling (m), `f32::INFINITY` when unbounded
    pub alt_max: f32,
    pub freefall: bool,
    pub ground_contact: bool,
    pub maybe_landed: bool,
    pub landed: bool,
    pub in_ground_effect: bool,
}

impl Default for LandDetected {
    /// State assumed before the first evaluation: on the ground.
    fn default() -> Self {
        Self {
            timestamp_us: 0,
            alt_max: -1.0,
            freefall: false,
            ground_contact: true,
            maybe_landed: true,
            landed: true,
            in_ground_effect: true,
        }
    }
}

impl LandDetected {
    /// Whether any published field other than the timestamp differs.
    pub fn differs_from(&self, other: &LandDetected) -> bool {
        self.landed != other.landed
            || self.freefall != other.freefall
            || self.maybe_landed != other.maybe_landed
            || self.ground_contact != other.ground_contact
            || self.in_ground_effect != other.in_ground_effect
            || alt_max_changed(self.alt_max, other.alt_max)
    }

    /// Whether this record has never been published.
    pub fn is_unpublished(&self) -> bool {
        self.timestamp_us == 0
    }

    /// Whether the record is older than the publish interval at `now_us`.
    pub fn is_stale(&self, now_us: u64) -> bool {
        now_us.saturating_sub(self.timestamp_us) >= PUBLISH_INTERVAL_US
    }
}

fn alt_max_changed(a: f32, b: f32) -> bool {
    if a.is_infinite() || b.is_infinite() {
        return a != b;
    }
    libm::fabsf(a - b) > f32::EPSILON
}

/// Destination for published records (uORB topic, channel, log, ...).
pub trait LandDetectedSink {
    /// Hand over a copy of a freshly published record.
    fn publish(&mut self, record: &LandDetected);
}
