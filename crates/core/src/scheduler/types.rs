//! Task timing configuration and cycle statistics

/// Backup schedule interval of the land detector (µs)
pub const SCHEDULE_INTERVAL_US: u64 = 50_000;

/// Land detector task: 20 Hz backup timer, most cycles driven by position updates
pub const LAND_DETECTOR_TASK: TaskMetadata = TaskMetadata {
    name: "land_detector",
    rate_hz: (1_000_000 / SCHEDULE_INTERVAL_US) as u32,
    budget_us: 1_000,
};

/// Static timing configuration of a periodic task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskMetadata {
    /// Human-readable task name for logging
    pub name: &'static str,

    /// Backup execution rate in Hz
    pub rate_hz: u32,

    /// Execution time budget in microseconds
    ///
    /// A cycle running longer than this counts as an overrun.
    pub budget_us: u32,
}

impl TaskMetadata {
    /// Task period in microseconds
    #[inline]
    pub const fn period_us(&self) -> u32 {
        1_000_000 / self.rate_hz
    }

    #[inline]
    pub const fn is_within_budget(&self, execution_us: u32) -> bool {
        execution_us <= self.budget_us
    }
}

/// Runtime statistics of one task
///
/// Updated once per cycle. Wake-ups triggered by new data arrive earlier than
/// the backup period, so jitter here measures how far the data rate sits from
/// the timer rate rather than scheduling quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskStats {
    /// Last execution time in microseconds
    pub last_execution_us: u32,

    /// Average execution time (exponential moving average, alpha = 0.1)
    pub avg_execution_us: u32,

    /// Maximum execution time observed in microseconds
    pub max_execution_us: u32,

    /// Cycles exceeding the execution budget
    pub overruns: u32,

    /// Time between the last two cycles in microseconds
    pub last_period_us: u32,

    /// Average deviation from the target period (EMA)
    pub avg_jitter_us: u32,

    /// Total number of cycles
    pub cycle_count: u64,

    /// Start time of the previous cycle
    last_start_us: Option<u64>,
}

impl TaskStats {
    /// Record one cycle that started at `start_us` and ended at `end_us`.
    pub fn record_cycle(&mut self, start_us: u64, end_us: u64, metadata: &TaskMetadata) {
        let execution_us = saturate_u32(end_us.saturating_sub(start_us));
        self.last_execution_us = execution_us;
        self.cycle_count = self.cycle_count.saturating_add(1);

        // avg_new = (value + 9 * avg_old) / 10
        self.avg_execution_us = ema(self.avg_execution_us, execution_us);
        self.max_execution_us = self.max_execution_us.max(execution_us);

        if !metadata.is_within_budget(execution_us) {
            self.overruns = self.overruns.saturating_add(1);
        }

        if let Some(previous) = self.last_start_us {
            let period_us = saturate_u32(start_us.saturating_sub(previous));
            self.last_period_us = period_us;
            let jitter = period_us.abs_diff(metadata.period_us());
            self.avg_jitter_us = ema(self.avg_jitter_us, jitter);
        }
        self.last_start_us = Some(start_us);
    }

    /// Reset all statistics to initial state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn ema(average: u32, value: u32) -> u32 {
    if average == 0 {
        value
    } else {
        ((value as u64 + 9 * average as u64) / 10) as u32
    }
}

fn saturate_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
