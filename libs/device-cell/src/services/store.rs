// =====================================================================================
// DEVICE STATE STORE
// =====================================================================================
//
// Every device lives behind its own mutex. Ingestion for one device holds that mutex
// across the snapshot update and the history append, so a device's vitals and its
// trend series never move independently. Different devices ingest in parallel.
//
// =====================================================================================

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use vitals_cell::{Metric, Sample, TimeSeriesStore, VitalReading};

use crate::error::DeviceError;
use crate::models::{DeviceSnapshot, DeviceStatus, RegisterDeviceRequest, SamplingInterval};

#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub snapshot: DeviceSnapshot,
    /// False when the device was not online and the reading was discarded.
    pub accepted: bool,
}

#[derive(Debug, Default)]
struct DeviceTable {
    order: Vec<String>,
    entries: HashMap<String, Arc<Mutex<DeviceSnapshot>>>,
}

#[derive(Debug, Clone)]
pub struct DeviceStateStore {
    devices: Arc<RwLock<DeviceTable>>,
    history: TimeSeriesStore,
}

impl DeviceStateStore {
    pub fn new(history: TimeSeriesStore) -> Self {
        Self {
            devices: Arc::new(RwLock::new(DeviceTable::default())),
            history,
        }
    }

    pub fn history(&self) -> &TimeSeriesStore {
        &self.history
    }

    /// Registers a device. `patient_name` is resolved by the caller from the patient
    /// registry; the store only keeps the reference.
    #[instrument(skip(self, request), fields(name = %request.name, device_type = %request.device_type))]
    pub async fn register_device(
        &self,
        request: RegisterDeviceRequest,
        patient_name: Option<String>,
    ) -> Result<DeviceSnapshot, DeviceError> {
        if request.name.trim().is_empty() {
            return Err(DeviceError::ValidationError("Device name is required".to_string()));
        }
        let sampling_interval = SamplingInterval::try_from(request.sampling_interval_seconds)?;

        let id = match request.id {
            Some(id) if id.trim().is_empty() => {
                return Err(DeviceError::ValidationError("Device id must not be blank".to_string()));
            }
            Some(id) => id,
            None => format!("dev-{}", &Uuid::new_v4().simple().to_string()[..12]),
        };

        let snapshot = DeviceSnapshot {
            id: id.clone(),
            name: request.name,
            device_type: request.device_type,
            serial_number: request.serial_number,
            sampling_interval,
            status: request.status.unwrap_or(DeviceStatus::Online),
            last_update: None,
            patient_id: request.patient_id,
            patient_name,
            vitals: Default::default(),
            registered_at: Utc::now(),
        };

        let mut devices = self.devices.write().await;
        if devices.entries.contains_key(&id) {
            return Err(DeviceError::AlreadyRegistered(id));
        }
        devices.order.push(id.clone());
        devices
            .entries
            .insert(id.clone(), Arc::new(Mutex::new(snapshot.clone())));

        info!(
            device_id = %id,
            status = %snapshot.status,
            interval_seconds = snapshot.sampling_interval.seconds(),
            "Device registered"
        );
        Ok(snapshot)
    }

    /// Applies one reading. Only the reading's metric changes; an offline or
    /// maintenance device keeps its snapshot untouched.
    pub async fn ingest(&self, reading: &VitalReading) -> Result<IngestOutcome, DeviceError> {
        self.ingest_and_then(reading, |outcome| async move { outcome }).await
    }

    /// Like [`ingest`](Self::ingest), but runs `then` before the device's lock is
    /// released. Anything `then` does for a device happens in ingestion order.
    #[instrument(skip(self, reading, then), fields(device_id = %reading.device_id, metric = %reading.metric))]
    pub async fn ingest_and_then<F, Fut, T>(
        &self,
        reading: &VitalReading,
        then: F,
    ) -> Result<T, DeviceError>
    where
        F: FnOnce(IngestOutcome) -> Fut,
        Fut: Future<Output = T>,
    {
        let entry = self.entry(&reading.device_id).await.ok_or_else(|| {
            debug!("Reading for unregistered device rejected");
            DeviceError::UnknownDevice(reading.device_id.clone())
        })?;

        reading.validate()?;

        let mut device = entry.lock().await;
        if !device.status.is_online() {
            debug!(status = %device.status, "Reading discarded for device that is not online");
            let outcome = IngestOutcome {
                snapshot: device.clone(),
                accepted: false,
            };
            return Ok(then(outcome).await);
        }

        device.vitals.set(reading.metric, reading.value)?;
        device.last_update = Some(reading.timestamp);
        self.history
            .append(&reading.device_id, reading.metric, reading.sample())
            .await;

        let outcome = IngestOutcome {
            snapshot: device.clone(),
            accepted: true,
        };
        Ok(then(outcome).await)
    }

    /// Externally driven status transition. Vitals are left as they were.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        device_id: &str,
        status: DeviceStatus,
    ) -> Result<DeviceSnapshot, DeviceError> {
        let entry = self
            .entry(device_id)
            .await
            .ok_or_else(|| DeviceError::UnknownDevice(device_id.to_string()))?;

        let mut device = entry.lock().await;
        let previous = device.status;
        device.status = status;

        if previous != status {
            info!(device_id = %device_id, from = %previous, to = %status, "Device status changed");
        }
        Ok(device.clone())
    }

    pub async fn get(&self, device_id: &str) -> Result<DeviceSnapshot, DeviceError> {
        let entry = self
            .entry(device_id)
            .await
            .ok_or_else(|| DeviceError::NotFound(device_id.to_string()))?;
        let device = entry.lock().await;
        Ok(device.clone())
    }

    /// All devices in registration order.
    pub async fn list(&self) -> Vec<DeviceSnapshot> {
        let entries: Vec<Arc<Mutex<DeviceSnapshot>>> = {
            let devices = self.devices.read().await;
            devices
                .order
                .iter()
                .filter_map(|id| devices.entries.get(id).cloned())
                .collect()
        };

        let mut snapshots = Vec::with_capacity(entries.len());
        for entry in entries {
            snapshots.push(entry.lock().await.clone());
        }
        snapshots
    }

    pub async fn contains(&self, device_id: &str) -> bool {
        self.devices.read().await.entries.contains_key(device_id)
    }

    pub async fn len(&self) -> usize {
        self.devices.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Trend series for one device metric. Unknown keys give an empty series.
    pub async fn time_series(&self, device_id: &str, metric: Metric) -> Vec<Sample> {
        self.history.snapshot(device_id, metric).await
    }

    async fn entry(&self, device_id: &str) -> Option<Arc<Mutex<DeviceSnapshot>>> {
        self.devices.read().await.entries.get(device_id).cloned()
    }
}

impl Default for DeviceStateStore {
    fn default() -> Self {
        Self::new(TimeSeriesStore::default())
    }
}
