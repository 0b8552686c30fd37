// =====================================================================================
// MONITORING DISPATCH - READ-ONLY BOUNDARY
// =====================================================================================

use chrono::Utc;

use device_cell::{DeviceSnapshot, DeviceStateStore};
use patient_cell::{PatientSearchQuery, PatientService};
use vitals_cell::{Metric, Sample};

use crate::models::{
    AggregateCounters, MonitoringError, PatientView, VitalAlert, WardOverview,
};
use crate::services::aggregator::{
    compute_counters, device_alerts, patient_view, patient_views, vital_alerts,
};
use crate::services::notifications::{EventReceiver, NotificationService};

/// What the presentation layer may see. Every method returns a copy; nothing here can
/// mutate ward state.
#[derive(Clone)]
pub struct MonitoringDispatch {
    devices: DeviceStateStore,
    patients: PatientService,
    notifications: NotificationService,
}

impl MonitoringDispatch {
    pub(crate) fn new(
        devices: DeviceStateStore,
        patients: PatientService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            devices,
            patients,
            notifications,
        }
    }

    pub async fn list_devices(&self) -> Vec<DeviceSnapshot> {
        self.devices.list().await
    }

    pub async fn get_device(&self, device_id: &str) -> Result<DeviceSnapshot, MonitoringError> {
        Ok(self.devices.get(device_id).await?)
    }

    pub async fn list_patients(&self) -> Vec<PatientView> {
        let patients = self.patients.list_patients().await;
        let devices = self.devices.list().await;
        patient_views(&patients, &devices)
    }

    /// Filtered patient list; an empty query returns every patient.
    pub async fn search_patients(&self, query: PatientSearchQuery) -> Vec<PatientView> {
        if query.is_unfiltered() {
            return self.list_patients().await;
        }
        let patients = self.patients.search_patients(query).await;
        let devices = self.devices.list().await;
        patient_views(&patients, &devices)
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<PatientView, MonitoringError> {
        let patient = self.patients.get_patient(patient_id).await?;
        let devices = self.devices.list().await;
        Ok(patient_view(&patient, &devices))
    }

    /// Trend series, oldest first. A device or metric with no history gives an
    /// empty series.
    pub async fn get_time_series(&self, device_id: &str, metric: Metric) -> Vec<Sample> {
        self.devices.time_series(device_id, metric).await
    }

    /// Same as [`get_time_series`](Self::get_time_series) but takes a wire metric key.
    pub async fn get_time_series_by_key(
        &self,
        device_id: &str,
        metric_key: &str,
    ) -> Result<(Metric, Vec<Sample>), MonitoringError> {
        let metric: Metric = metric_key.parse()?;
        Ok((metric, self.get_time_series(device_id, metric).await))
    }

    pub fn history_capacity(&self) -> usize {
        self.devices.history().capacity()
    }

    pub async fn get_counters(&self) -> AggregateCounters {
        let devices = self.devices.list().await;
        let patients = self.patients.list_patients().await;
        compute_counters(&devices, &patients)
    }

    pub async fn vital_alerts(&self, device_id: &str) -> Result<Vec<VitalAlert>, MonitoringError> {
        let device = self.get_device(device_id).await?;
        Ok(vital_alerts(&device.vitals))
    }

    pub async fn overview(&self) -> WardOverview {
        let devices = self.devices.list().await;
        let patients = self.patients.list_patients().await;
        WardOverview {
            counters: compute_counters(&devices, &patients),
            device_alerts: device_alerts(&devices),
            generated_at: Utc::now(),
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.notifications.subscribe()
    }

    pub async fn subscribe_device(&self, device_id: &str) -> Result<EventReceiver, MonitoringError> {
        if !self.devices.contains(device_id).await {
            return Err(MonitoringError::NotFound(format!("Device {}", device_id)));
        }
        Ok(self.notifications.subscribe_device(device_id).await)
    }

    pub fn subscriber_count(&self) -> usize {
        self.notifications.subscriber_count()
    }

    pub async fn device_channel_count(&self) -> usize {
        self.notifications.get_active_channels().await.len()
    }

    pub async fn device_count(&self) -> usize {
        self.devices.len().await
    }

    pub async fn patient_count(&self) -> usize {
        self.patients.count().await
    }
}
