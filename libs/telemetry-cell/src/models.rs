use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use shared_config::AppConfig;
use vitals_cell::VitalReading;

/// Scheduler settings. With `honor_sampling_intervals` the driver ticks at the smallest
/// allowed device interval and only emits for devices whose own interval has elapsed.
/// `queue_capacity` bounds each worker's lane.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub tick: Duration,
    pub honor_sampling_intervals: bool,
    pub queue_capacity: usize,
    pub ingest_workers: usize,
}

impl DriverConfig {
    pub const FINEST_TICK: Duration = Duration::from_secs(1);

    pub fn from_app_config(config: &AppConfig) -> Self {
        let tick = if config.honor_sampling_intervals {
            Self::FINEST_TICK
        } else {
            config.tick_interval()
        };

        Self {
            tick,
            honor_sampling_intervals: config.honor_sampling_intervals,
            queue_capacity: config.ingest_queue_capacity.max(1),
            ..Self::default()
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick: Self::FINEST_TICK,
            honor_sampling_intervals: true,
            queue_capacity: 256,
            ingest_workers: 4,
        }
    }
}

/// Readings produced for one device on one tick. Queued as a unit on the device's lane,
/// so its readings are applied in order by the lane's single worker.
#[derive(Debug, Clone)]
pub struct DeviceBatch {
    pub device_id: String,
    pub readings: Vec<VitalReading>,
}

#[derive(Debug, Default)]
pub struct DriverStats {
    ticks: AtomicU64,
    enqueued: AtomicU64,
    rejected: AtomicU64,
    ingested: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStatsSnapshot {
    pub ticks: u64,
    pub enqueued: u64,
    pub rejected: u64,
    pub ingested: u64,
    pub failed: u64,
}

impl DriverStats {
    pub(crate) fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ingested(&self) {
        self.ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DriverStatsSnapshot {
        DriverStatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            ingested: self.ingested.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn honoring_intervals_ticks_every_second() {
        let config = DriverConfig::from_app_config(&AppConfig::default());
        assert_eq!(config.tick, Duration::from_secs(1));

        let fixed = DriverConfig::from_app_config(&AppConfig {
            honor_sampling_intervals: false,
            tick_interval_seconds: 5,
            ..AppConfig::default()
        });
        assert_eq!(fixed.tick, Duration::from_secs(5));
        assert!(!fixed.honor_sampling_intervals);
    }
}
