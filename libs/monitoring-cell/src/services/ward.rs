// =====================================================================================
// WARD MONITOR
// =====================================================================================
//
// Owns the mutable ward state: device store, patient registry and the event hub.
// Ingestion and registration go through here; readers get a `MonitoringDispatch`.
//
// =====================================================================================

use chrono::Utc;
use tracing::{info, instrument, warn};

use device_cell::{
    DeviceSnapshot, DeviceStateStore, DeviceStatus, IngestOutcome, RegisterDeviceRequest,
};
use patient_cell::{Patient, PatientError, PatientService, RegisterPatientRequest, Severity};
use shared_config::AppConfig;
use vitals_cell::{TimeSeriesStore, VitalReading};

use crate::models::{MonitorEvent, MonitoringError};
use crate::services::aggregator::alert_for_reading;
use crate::services::dispatch::MonitoringDispatch;
use crate::services::notifications::NotificationService;

#[derive(Clone)]
pub struct WardMonitor {
    devices: DeviceStateStore,
    patients: PatientService,
    notifications: NotificationService,
}

impl WardMonitor {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_parts(
            DeviceStateStore::new(TimeSeriesStore::new(config.history_capacity)),
            PatientService::new(),
            NotificationService::new(config.notification_channel_capacity),
        )
    }

    pub fn with_parts(
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

    /// Read-only view for the presentation layer.
    pub fn dispatch(&self) -> MonitoringDispatch {
        MonitoringDispatch::new(
            self.devices.clone(),
            self.patients.clone(),
            self.notifications.clone(),
        )
    }

    pub fn devices(&self) -> &DeviceStateStore {
        &self.devices
    }

    pub async fn register_patient(
        &self,
        request: RegisterPatientRequest,
    ) -> Result<Patient, MonitoringError> {
        Ok(self.patients.register_patient(request).await?)
    }

    pub async fn update_patient_severity(
        &self,
        patient_id: &str,
        severity: Severity,
    ) -> Result<Patient, MonitoringError> {
        Ok(self.patients.update_severity(patient_id, severity).await?)
    }

    /// Registers a device and links it to its patient. A patient id the registry does
    /// not know is still accepted and shown under a placeholder name.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn register_device(
        &self,
        request: RegisterDeviceRequest,
    ) -> Result<DeviceSnapshot, MonitoringError> {
        let patient_name = match request.patient_id.as_deref() {
            None => None,
            Some(patient_id) => match self.patients.get_patient(patient_id).await {
                Ok(patient) => Some(patient.name),
                Err(PatientError::NotFound(_)) => {
                    warn!(patient_id = %patient_id, "Device linked to unregistered patient");
                    Some(format!("Patient {}", patient_id))
                }
                Err(e) => return Err(e.into()),
            },
        };

        let device = self.devices.register_device(request, patient_name).await?;
        self.notifications
            .publish(MonitorEvent::DeviceRegistered(device.clone()))
            .await;
        Ok(device)
    }

    pub async fn set_device_status(
        &self,
        device_id: &str,
        status: DeviceStatus,
    ) -> Result<DeviceSnapshot, MonitoringError> {
        let device = self.devices.set_status(device_id, status).await?;
        self.notifications
            .publish(MonitorEvent::DeviceStatusChanged(device.clone()))
            .await;
        Ok(device)
    }

    /// Applies a reading and notifies subscribers. Out-of-range values additionally
    /// raise an alert event. Discarded readings publish nothing. Events for one device
    /// are published while its state is still locked, so subscribers see them in
    /// ingestion order.
    #[instrument(skip(self, reading), fields(device_id = %reading.device_id, metric = %reading.metric))]
    pub async fn ingest(&self, reading: &VitalReading) -> Result<IngestOutcome, MonitoringError> {
        let notifications = &self.notifications;
        let outcome = self
            .devices
            .ingest_and_then(reading, |outcome| async move {
                if outcome.accepted {
                    publish_reading_events(notifications, reading, &outcome).await;
                }
                outcome
            })
            .await?;
        Ok(outcome)
    }

    /// Loads a fixed set of patients and devices, skipping any already present.
    pub async fn seed(
        &self,
        patients: Vec<RegisterPatientRequest>,
        devices: Vec<(RegisterDeviceRequest, Vec<VitalReading>)>,
    ) -> Result<(), MonitoringError> {
        for patient in patients {
            match self.register_patient(patient).await {
                Ok(_) | Err(MonitoringError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }

        for (request, readings) in devices {
            // Stored vitals are only accepted while online, so seed first, then apply
            // the requested status.
            let initial_status = request.status.unwrap_or(DeviceStatus::Online);
            let seeding_status = if readings.is_empty() {
                initial_status
            } else {
                DeviceStatus::Online
            };
            let device = match self.register_device(RegisterDeviceRequest {
                status: Some(seeding_status),
                ..request
            })
            .await
            {
                Ok(device) => device,
                Err(MonitoringError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            };

            for reading in readings {
                self.devices.ingest(&reading).await?;
            }
            if device.status != initial_status {
                self.devices.set_status(&device.id, initial_status).await?;
            }
        }

        info!(
            devices = self.devices.len().await,
            patients = self.patients.count().await,
            "Ward seeded"
        );
        Ok(())
    }
}

async fn publish_reading_events(
    notifications: &NotificationService,
    reading: &VitalReading,
    outcome: &IngestOutcome,
) {
    notifications
        .publish(MonitorEvent::VitalsUpdated(outcome.snapshot.clone()))
        .await;

    if let Some(alert) =
        alert_for_reading(reading, outcome.snapshot.patient_id.as_deref(), Utc::now())
    {
        warn!(
            alert_id = %alert.alert_id,
            patient_id = ?alert.patient_id,
            status = ?alert.status,
            value = ?alert.value,
            "VITAL OUT OF RANGE: {}", alert.metric.label()
        );
        notifications.publish(MonitorEvent::Alert(alert)).await;
    }
}

impl Default for WardMonitor {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}
