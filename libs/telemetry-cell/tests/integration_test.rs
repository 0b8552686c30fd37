// =====================================================================================
// TELEMETRY CELL INTEGRATION TESTS
// =====================================================================================

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast::error::TryRecvError, mpsc};

use device_cell::{DeviceSnapshot, DeviceStatus, DeviceType, RegisterDeviceRequest};
use monitoring_cell::{AggregateCounters, MonitorEvent, WardMonitor};
use telemetry_cell::{
    enqueue, seed_demo_ward, DeviceBatch, DriverConfig, DriverStats, SimulatedVitalSource,
    TelemetryDriver, TelemetryError, VitalReadingSource,
};
use vitals_cell::{AlertStatus, EcgRhythm, Metric, VitalReading};

/// Always reports the same heart rate so assertions can be exact.
struct FixedHeartRate(f64);

#[async_trait]
impl VitalReadingSource for FixedHeartRate {
    async fn sample(&self, device: &DeviceSnapshot, at: DateTime<Utc>) -> Vec<VitalReading> {
        vec![VitalReading::new(device.id.clone(), Metric::HeartRate, self.0, at)]
    }
}

/// Emits a burst of heart-rate readings per device per tick, each one microsecond
/// after the previous, so the backlog across workers stays deep.
struct HeartRateBurst {
    per_tick: usize,
    base: DateTime<Utc>,
    offset_us: AtomicI64,
}

impl HeartRateBurst {
    fn new(per_tick: usize) -> Self {
        Self {
            per_tick,
            base: Utc::now(),
            offset_us: AtomicI64::new(0),
        }
    }
}

#[async_trait]
impl VitalReadingSource for HeartRateBurst {
    async fn sample(&self, device: &DeviceSnapshot, _at: DateTime<Utc>) -> Vec<VitalReading> {
        (0..self.per_tick)
            .map(|i| {
                let offset = self.offset_us.fetch_add(1, Ordering::Relaxed);
                VitalReading::new(
                    device.id.clone(),
                    Metric::HeartRate,
                    60.0 + (i % 40) as f64,
                    self.base + chrono::Duration::microseconds(offset),
                )
            })
            .collect()
    }
}

fn fast_config() -> DriverConfig {
    DriverConfig {
        tick: Duration::from_millis(20),
        honor_sampling_intervals: false,
        queue_capacity: 64,
        ingest_workers: 2,
    }
}

fn bedside(id: &str, status: DeviceStatus) -> RegisterDeviceRequest {
    RegisterDeviceRequest {
        id: Some(id.to_string()),
        name: format!("Bed {}", id),
        device_type: DeviceType::HeartRateMonitor,
        serial_number: String::new(),
        sampling_interval_seconds: 1,
        patient_id: None,
        status: Some(status),
    }
}

// =====================================================================================
// DEMO WARD
// =====================================================================================

#[tokio::test]
async fn test_demo_ward_seed() {
    let ward = WardMonitor::default();
    seed_demo_ward(&ward).await.unwrap();
    let dispatch = ward.dispatch();

    assert_eq!(
        dispatch.get_counters().await,
        AggregateCounters {
            online_devices: 2,
            total_patients: 3,
            active_alerts: 1,
        }
    );

    let dev_001 = dispatch.get_device("dev-001").await.unwrap();
    assert_eq!(dev_001.vitals.heart_rate, Some(72.0));
    assert_eq!(dev_001.vitals.pain_level, Some(3.0));
    assert_eq!(dev_001.patient_name.as_deref(), Some("John Smith"));
    assert!(dispatch.vital_alerts("dev-001").await.unwrap().is_empty());

    let dev_002 = dispatch.get_device("dev-002").await.unwrap();
    assert_eq!(dev_002.vitals.ecg_rhythm, Some(EcgRhythm::Arrhythmia));
    let alerts = dispatch.vital_alerts("dev-002").await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].metric, Metric::EcgRhythm);
    assert_eq!(alerts[0].status, AlertStatus::High);

    let dev_003 = dispatch.get_device("dev-003").await.unwrap();
    assert_eq!(dev_003.status, DeviceStatus::Maintenance);
    assert!(dev_003.vitals.is_empty());
    assert!(dev_003.last_update.is_none());
}

#[tokio::test]
async fn test_demo_ward_seed_is_idempotent() {
    let ward = WardMonitor::default();
    seed_demo_ward(&ward).await.unwrap();
    seed_demo_ward(&ward).await.unwrap();

    assert_eq!(ward.dispatch().list_devices().await.len(), 3);
    assert_eq!(ward.dispatch().list_patients().await.len(), 3);
}

// =====================================================================================
// QUEUE BACKPRESSURE
// =====================================================================================

#[tokio::test]
async fn test_full_queue_rejects_new_batch() {
    let (tx, mut rx) = mpsc::channel(1);
    let stats = DriverStats::default();
    let batch = |id: &str| DeviceBatch {
        device_id: id.to_string(),
        readings: Vec::new(),
    };

    enqueue(&tx, batch("dev-001"), &stats).unwrap();
    assert_matches!(
        enqueue(&tx, batch("dev-002"), &stats),
        Err(TelemetryError::QueueFull(id)) if id == "dev-002"
    );

    // The batch already queued is the one delivered.
    assert_eq!(rx.recv().await.unwrap().device_id, "dev-001");

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.enqueued, 1);
    assert_eq!(snapshot.rejected, 1);

    drop(rx);
    assert_matches!(enqueue(&tx, batch("dev-003"), &stats), Err(TelemetryError::QueueClosed));
}

// =====================================================================================
// DRIVER
// =====================================================================================

#[tokio::test]
async fn test_driver_feeds_online_devices_only() {
    let ward = WardMonitor::default();
    ward.register_device(bedside("dev-on", DeviceStatus::Online)).await.unwrap();
    ward.register_device(bedside("dev-svc", DeviceStatus::Maintenance)).await.unwrap();

    let handle = TelemetryDriver::new(ward.clone(), Arc::new(FixedHeartRate(77.0)), fast_config())
        .start();
    tokio::time::sleep(Duration::from_millis(150)).await;
    let stats = handle.shutdown().await;

    assert!(stats.ticks > 1);
    assert!(stats.ingested > 1);
    assert_eq!(stats.failed, 0);

    let dispatch = ward.dispatch();
    let online = dispatch.get_device("dev-on").await.unwrap();
    assert_eq!(online.vitals.heart_rate, Some(77.0));
    assert!(!dispatch.get_time_series("dev-on", Metric::HeartRate).await.is_empty());

    let maintenance = dispatch.get_device("dev-svc").await.unwrap();
    assert!(maintenance.vitals.is_empty());
    assert!(dispatch.get_time_series("dev-svc", Metric::HeartRate).await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_driver_applies_each_device_in_order_under_backlog() {
    let ward = WardMonitor::default();
    let devices = ["dev-a", "dev-b", "dev-c"];
    for id in devices {
        ward.register_device(bedside(id, DeviceStatus::Online)).await.unwrap();
    }
    let dispatch = ward.dispatch();
    let mut events = dispatch.subscribe_device("dev-a").await.unwrap();

    let config = DriverConfig {
        tick: Duration::from_millis(2),
        honor_sampling_intervals: false,
        queue_capacity: 1024,
        ingest_workers: 4,
    };
    let handle = TelemetryDriver::new(ward.clone(), Arc::new(HeartRateBurst::new(200)), config)
        .start();

    let mut last_seen = vec![None; devices.len()];
    for _ in 0..300 {
        for (i, id) in devices.iter().enumerate() {
            let series = dispatch.get_time_series(id, Metric::HeartRate).await;
            assert!(
                series.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp),
                "{} series out of order",
                id
            );

            let last_update = dispatch.get_device(id).await.unwrap().last_update;
            assert!(last_update >= last_seen[i], "{} lastUpdate moved backwards", id);
            last_seen[i] = last_update;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let stats = handle.shutdown().await;
    assert!(stats.ingested > 0);
    assert_eq!(stats.failed, 0);

    let mut previous = None;
    let mut updates = 0;
    loop {
        match events.try_recv() {
            Ok(MonitorEvent::VitalsUpdated(device)) => {
                assert!(device.last_update >= previous, "vitals events out of order");
                previous = device.last_update;
                updates += 1;
            }
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    assert!(updates > 0);
}

#[tokio::test]
async fn test_driver_picks_up_devices_registered_later() {
    let ward = WardMonitor::default();
    let handle = TelemetryDriver::new(ward.clone(), Arc::new(FixedHeartRate(66.0)), fast_config())
        .start();

    tokio::time::sleep(Duration::from_millis(50)).await;
    ward.register_device(bedside("dev-late", DeviceStatus::Online)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    handle.shutdown().await;

    let device = ward.dispatch().get_device("dev-late").await.unwrap();
    assert_eq!(device.vitals.heart_rate, Some(66.0));
    assert!(device.last_update.is_some());
}

#[tokio::test]
async fn test_driver_stops_after_shutdown() {
    let ward = WardMonitor::default();
    ward.register_device(bedside("dev-001", DeviceStatus::Online)).await.unwrap();

    let handle = TelemetryDriver::new(ward.clone(), Arc::new(FixedHeartRate(70.0)), fast_config())
        .start();
    tokio::time::sleep(Duration::from_millis(60)).await;
    handle.shutdown().await;

    let before = ward.dispatch().get_device("dev-001").await.unwrap().last_update;
    tokio::time::sleep(Duration::from_millis(80)).await;
    let after = ward.dispatch().get_device("dev-001").await.unwrap().last_update;
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_simulated_source_covers_device_metrics() {
    let ward = WardMonitor::default();
    let request = RegisterDeviceRequest {
        device_type: DeviceType::MultiparameterMonitor,
        ..bedside("dev-mpm", DeviceStatus::Online)
    };
    let device = ward.register_device(request).await.unwrap();

    let source = SimulatedVitalSource::with_seed(42);
    let readings = source.sample(&device, Utc::now()).await;
    let metrics: Vec<Metric> = readings.iter().map(|r| r.metric).collect();

    assert_eq!(metrics, DeviceType::MultiparameterMonitor.metrics().to_vec());
    for reading in &readings {
        assert!(reading.validate().is_ok());
        ward.ingest(reading).await.unwrap();
    }

    let vitals = ward.dispatch().get_device("dev-mpm").await.unwrap().vitals;
    assert!(vitals.heart_rate.is_some());
    assert!(vitals.blood_pressure.is_some());
    assert!(vitals.pain_level.is_none());
}

#[tokio::test]
async fn test_simulated_ecg_monitor_keeps_its_rhythm() {
    let ward = WardMonitor::default();
    let request = RegisterDeviceRequest {
        device_type: DeviceType::EcgMonitor,
        ..bedside("dev-ecg", DeviceStatus::Online)
    };
    let device = ward.register_device(request).await.unwrap();
    ward.ingest(&VitalReading::new("dev-ecg", Metric::EcgRhythm, EcgRhythm::Normal, Utc::now()))
        .await
        .unwrap();

    let source = SimulatedVitalSource::with_seed(3);
    for _ in 0..100 {
        let readings = source.sample(&device, Utc::now()).await;
        assert!(readings.iter().all(|r| r.metric != Metric::EcgRhythm));
        for reading in &readings {
            ward.ingest(reading).await.unwrap();
        }
    }

    let dispatch = ward.dispatch();
    let device = dispatch.get_device("dev-ecg").await.unwrap();
    assert_eq!(device.vitals.ecg_rhythm, Some(EcgRhythm::Normal));
    assert!(dispatch
        .vital_alerts("dev-ecg")
        .await
        .unwrap()
        .iter()
        .all(|alert| alert.metric != Metric::EcgRhythm));
}
