// =====================================================================================
// TELEMETRY DRIVER
// =====================================================================================
//
// One scheduler task asks the source for readings from every due device and hands them
// to a pool of ingestion workers. Each worker owns a bounded lane, and a device always
// maps to the same lane, so one device's batches are applied in the order they were
// produced. A full lane rejects the new batch; nothing upstream ever waits on ingestion.
//
// =====================================================================================

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use monitoring_cell::WardMonitor;

use crate::error::TelemetryError;
use crate::models::{DeviceBatch, DriverConfig, DriverStats, DriverStatsSnapshot};
use crate::services::schedule::DueSchedule;
use crate::services::source::VitalReadingSource;

pub struct TelemetryDriver {
    monitor: WardMonitor,
    source: Arc<dyn VitalReadingSource>,
    config: DriverConfig,
    stats: Arc<DriverStats>,
}

/// Running driver. Dropping it without calling [`shutdown`](Self::shutdown) leaves the
/// tasks running until the runtime stops.
pub struct DriverHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    stats: Arc<DriverStats>,
}

impl TelemetryDriver {
    pub fn new(
        monitor: WardMonitor,
        source: Arc<dyn VitalReadingSource>,
        config: DriverConfig,
    ) -> Self {
        Self {
            monitor,
            source,
            config,
            stats: Arc::new(DriverStats::default()),
        }
    }

    pub fn start(self) -> DriverHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut lanes = Vec::new();
        let mut tasks = Vec::new();

        for i in 0..self.config.ingest_workers.max(1) {
            let (lane_tx, lane_rx) = mpsc::channel(self.config.queue_capacity.max(1));
            lanes.push(lane_tx);

            let worker_name = format!("ingest-{}", i);
            let monitor = self.monitor.clone();
            let stats = self.stats.clone();

            tasks.push(tokio::spawn(async move {
                ingest_loop(worker_name, monitor, lane_rx, stats).await
            }));
        }

        let scheduler_tick = self.config.tick;
        let honor_intervals = self.config.honor_sampling_intervals;
        let scheduler = Scheduler {
            monitor: self.monitor,
            source: self.source,
            config: self.config,
            stats: self.stats.clone(),
            lanes,
        };
        tasks.push(tokio::spawn(scheduler.run(shutdown_rx)));

        info!(
            workers = tasks.len() - 1,
            tick_ms = scheduler_tick.as_millis() as u64,
            honor_intervals = honor_intervals,
            "Telemetry driver started"
        );

        DriverHandle {
            shutdown: shutdown_tx,
            tasks,
            stats: self.stats,
        }
    }
}

impl DriverHandle {
    pub fn stats(&self) -> DriverStatsSnapshot {
        self.stats.snapshot()
    }

    /// Stops the scheduler, lets the workers drain what is already queued, then waits
    /// for every task to finish.
    pub async fn shutdown(self) -> DriverStatsSnapshot {
        info!("Initiating telemetry driver shutdown");
        let _ = self.shutdown.send(true);

        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Telemetry task ended abnormally: {}", e);
            }
        }

        let stats = self.stats.snapshot();
        info!(
            ticks = stats.ticks,
            ingested = stats.ingested,
            rejected = stats.rejected,
            "Telemetry driver stopped"
        );
        stats
    }
}

struct Scheduler {
    monitor: WardMonitor,
    source: Arc<dyn VitalReadingSource>,
    config: DriverConfig,
    stats: Arc<DriverStats>,
    lanes: Vec<mpsc::Sender<DeviceBatch>>,
}

impl Scheduler {
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut schedule = DueSchedule::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => {
                    debug!("Scheduler received shutdown signal");
                    break;
                }
            }

            self.stats.record_tick();
            self.tick(&mut schedule).await;
        }
        // Dropping the lane senders closes each lane once its worker has drained it.
    }

    async fn tick(&self, schedule: &mut DueSchedule) {
        // Re-listed every tick so devices registered after start are picked up.
        let devices = self.monitor.devices().list().await;
        let due = schedule.due(&devices, Instant::now(), self.config.honor_sampling_intervals);
        let at = Utc::now();

        for device in due {
            let readings = self.source.sample(device, at).await;
            if readings.is_empty() {
                continue;
            }
            let batch = DeviceBatch {
                device_id: device.id.clone(),
                readings,
            };
            let lane = &self.lanes[lane_for(&batch.device_id, self.lanes.len())];
            if let Err(e) = enqueue(lane, batch, &self.stats) {
                warn!("{}", e);
            }
        }
    }
}

/// Lane that owns a device. Stable for the life of the driver.
pub fn lane_for(device_id: &str, lanes: usize) -> usize {
    if lanes <= 1 {
        return 0;
    }
    let mut hasher = DefaultHasher::new();
    device_id.hash(&mut hasher);
    (hasher.finish() % lanes as u64) as usize
}

/// Offers a batch to a lane without waiting. A full queue rejects the new batch.
pub fn enqueue(
    queue: &mpsc::Sender<DeviceBatch>,
    batch: DeviceBatch,
    stats: &DriverStats,
) -> Result<(), TelemetryError> {
    match queue.try_send(batch) {
        Ok(()) => {
            stats.record_enqueued();
            Ok(())
        }
        Err(mpsc::error::TrySendError::Full(batch)) => {
            stats.record_rejected();
            Err(TelemetryError::QueueFull(batch.device_id))
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(TelemetryError::QueueClosed),
    }
}

async fn ingest_loop(
    worker_name: String,
    monitor: WardMonitor,
    mut lane: mpsc::Receiver<DeviceBatch>,
    stats: Arc<DriverStats>,
) {
    debug!("Ingest loop started: {}", worker_name);

    while let Some(batch) = lane.recv().await {
        for reading in &batch.readings {
            match monitor.ingest(reading).await {
                Ok(_) => stats.record_ingested(),
                Err(e) => {
                    stats.record_failed();
                    warn!(
                        worker = %worker_name,
                        device_id = %batch.device_id,
                        metric = %reading.metric,
                        "Reading not ingested: {}", e
                    );
                }
            }
        }
    }

    debug!("Ingest loop ended: {}", worker_name);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_keeps_its_lane() {
        let first = lane_for("dev-001", 4);
        for _ in 0..10 {
            assert_eq!(lane_for("dev-001", 4), first);
        }
        assert!(first < 4);
        assert_eq!(lane_for("dev-001", 1), 0);
        assert_eq!(lane_for("dev-001", 0), 0);
    }
}
