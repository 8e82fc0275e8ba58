//! Periodic runner for a land detector task.
//!
//! Runs the task on a backup timer and wakes it early whenever a position
//! estimate arrives on the sensor bus. The backup deadline is re-armed at the
//! start of every cycle, so the task keeps running when the estimator stalls.
//!
//! Stopping is cooperative: [`RunnerHandle::stop`] raises a flag and wakes the
//! runner, which completes one full cycle, sees the flag and returns the task.
//! Dropping the handle stops the runner the same way.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use land_detector_core::detector::{LandDetectedSink, LandDetectorTask, LandPredicates};
use land_detector_core::scheduler::SCHEDULE_INTERVAL_US;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info};

use crate::bus::SensorBus;
use crate::error::RunnerError;
use crate::time::TokioTime;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Backup timer period
    pub period: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_micros(SCHEDULE_INTERVAL_US),
        }
    }
}

/// What woke the runner, counted per source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WakeCounts {
    pub timer: u64,
    pub position: u64,
    pub shutdown: u64,
}

#[derive(Debug, Default)]
struct WakeCounters {
    timer: AtomicU64,
    position: AtomicU64,
    shutdown: AtomicU64,
}

impl WakeCounters {
    fn snapshot(&self) -> WakeCounts {
        WakeCounts {
            timer: self.timer.load(Ordering::Relaxed),
            position: self.position.load(Ordering::Relaxed),
            shutdown: self.shutdown.load(Ordering::Relaxed),
        }
    }
}

/// A land detector task bound to its sensor bus, not yet running.
pub struct LandDetectorRunner<P, S> {
    task: LandDetectorTask<P, S>,
    bus: SensorBus,
    time: TokioTime,
    config: RunnerConfig,
}

impl<P, S> LandDetectorRunner<P, S>
where
    P: LandPredicates + Send + 'static,
    S: LandDetectedSink + Send + 'static,
{
    pub fn new(task: LandDetectorTask<P, S>, bus: SensorBus, config: RunnerConfig) -> Self {
        Self {
            task,
            bus,
            time: TokioTime::new(),
            config,
        }
    }

    /// Use `time` instead of a clock starting now.
    pub fn with_time(mut self, time: TokioTime) -> Self {
        self.time = time;
        self
    }

    /// Spawn the runner on the current tokio runtime.
    pub fn start(self) -> RunnerHandle<P, S> {
        let stop = StopSignal {
            flag: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        };
        let wakes = Arc::new(WakeCounters::default());

        info!(
            period_ms = self.config.period.as_millis() as u64,
            "land detector runner started"
        );
        let join = tokio::spawn(self.run(
            Arc::clone(&stop.flag),
            Arc::clone(&stop.wake),
            Arc::clone(&wakes),
        ));

        RunnerHandle { stop, wakes, join }
    }

    async fn run(
        mut self,
        stop: Arc<AtomicBool>,
        shutdown: Arc<Notify>,
        wakes: Arc<WakeCounters>,
    ) -> Result<LandDetectorTask<P, S>, RunnerError> {
        let position_updated = self.bus.position_updated();
        let mut deadline = Instant::now() + self.config.period;

        loop {
            tokio::select! {
                _ = sleep_until(deadline) => {
                    wakes.timer.fetch_add(1, Ordering::Relaxed);
                }
                _ = position_updated.notified() => {
                    wakes.position.fetch_add(1, Ordering::Relaxed);
                }
                _ = shutdown.notified() => {
                    wakes.shutdown.fetch_add(1, Ordering::Relaxed);
                }
            }

            deadline = Instant::now() + self.config.period;

            let update = match self.bus.take() {
                Ok(update) => update,
                Err(e) => {
                    error!(error = %e, "land detector runner aborted");
                    return Err(e);
                }
            };
            let output = self.task.run(&update, &self.time);

            if let Some(record) = output.published {
                debug!(
                    timestamp_us = record.timestamp_us,
                    landed = record.landed,
                    maybe_landed = record.maybe_landed,
                    ground_contact = record.ground_contact,
                    freefall = record.freefall,
                    "land detected published"
                );
            }
            if let Some(commit) = output.flight_time {
                info!(
                    added_us = commit.added_us,
                    total_us = commit.total_us(),
                    "flight time committed"
                );
            }

            if stop.load(Ordering::Acquire) {
                break;
            }
        }

        info!(
            cycles = self.task.stats().cycle_count,
            "land detector runner stopped"
        );
        Ok(self.task)
    }
}

/// Stop flag and wake-up shared with the runner; raised when dropped.
struct StopSignal {
    flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl StopSignal {
    fn raise(&self) {
        self.flag.store(true, Ordering::Release);
        self.wake.notify_one();
    }
}

impl Drop for StopSignal {
    fn drop(&mut self) {
        if !self.flag.load(Ordering::Acquire) {
            self.raise();
        }
    }
}

/// Control handle of a running land detector.
///
/// Dropping the handle without [`join`](Self::join) stops the runner.
pub struct RunnerHandle<P, S> {
    stop: StopSignal,
    wakes: Arc<WakeCounters>,
    join: JoinHandle<Result<LandDetectorTask<P, S>, RunnerError>>,
}

impl<P, S> RunnerHandle<P, S> {
    /// Request a stop; the runner exits after completing one more cycle.
    pub fn stop(&self) {
        self.stop.raise();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub fn wake_counts(&self) -> WakeCounts {
        self.wakes.snapshot()
    }

    /// Wait for the runner to exit and get the task back.
    pub async fn join(self) -> Result<LandDetectorTask<P, S>, RunnerError> {
        let Self {
            stop: _stop, join, ..
        } = self;
        join.await?
    }

    /// Stop and wait for the runner.
    pub async fn shutdown(self) -> Result<LandDetectorTask<P, S>, RunnerError> {
        self.stop();
        self.join().await
    }
}
