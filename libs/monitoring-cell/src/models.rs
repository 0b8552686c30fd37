// =====================================================================================
// MONITORING CELL MODELS
// =====================================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use device_cell::{DeviceError, DeviceSnapshot};
use patient_cell::{Patient, PatientError};
use vitals_cell::{AlertStatus, Metric, Sample, VitalSnapshot, VitalValue, VitalsError};

/// Ward dashboard counters, recomputed from the current collections on every query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateCounters {
    pub online_devices: usize,
    pub total_patients: usize,
    /// Patients whose assigned severity is high or critical.
    pub active_alerts: usize,
}

/// One out-of-range badge for a device's current vitals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalAlert {
    pub metric: Metric,
    pub status: AlertStatus,
    pub value: VitalValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAlerts {
    pub device_id: String,
    pub device_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    pub alerts: Vec<VitalAlert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardOverview {
    pub counters: AggregateCounters,
    /// Devices with at least one out-of-range vital, in registration order.
    pub device_alerts: Vec<DeviceAlerts>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestVitals {
    #[serde(flatten)]
    pub vitals: VitalSnapshot,
    pub timestamp: DateTime<Utc>,
}

/// Patient as presented on the dashboard. Device linkage is looked up on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientView {
    #[serde(flatten)]
    pub patient: Patient,
    pub connected_devices: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_vitals: Option<LatestVitals>,
}

/// Raised for every accepted reading that classifies outside its normal band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub alert_id: Uuid,
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    pub metric: Metric,
    pub status: AlertStatus,
    pub value: VitalValue,
    pub timestamp: DateTime<Utc>,
}

/// Pushed to subscribers after state changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MonitorEvent {
    DeviceRegistered(DeviceSnapshot),
    DeviceStatusChanged(DeviceSnapshot),
    VitalsUpdated(DeviceSnapshot),
    Alert(AlertEvent),
}

impl MonitorEvent {
    pub fn device_id(&self) -> &str {
        match self {
            MonitorEvent::DeviceRegistered(device)
            | MonitorEvent::DeviceStatusChanged(device)
            | MonitorEvent::VitalsUpdated(device) => &device.id,
            MonitorEvent::Alert(alert) => &alert.device_id,
        }
    }
}

// Request/Response models

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingRequest {
    /// Metric key as sent by the device gateway, e.g. `heartRate`.
    pub metric: String,
    pub value: VitalValue,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AlertStatus>,
    pub device: DeviceSnapshot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesResponse {
    pub device_id: String,
    pub metric: Metric,
    pub unit: &'static str,
    pub capacity: usize,
    pub points: Vec<Sample>,
}

#[derive(Debug, Deserialize)]
pub struct EventFilter {
    pub device_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub devices: usize,
    pub patients: usize,
    pub subscribers: usize,
    pub device_channels: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MonitoringError {
    #[error("Unknown device: {0}")]
    UnknownDevice(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Unsupported metric: {0}")]
    UnsupportedMetric(String),
    #[error("{0}")]
    InvalidReading(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
}

impl From<VitalsError> for MonitoringError {
    fn from(error: VitalsError) -> Self {
        match error {
            VitalsError::UnsupportedMetric(key) => MonitoringError::UnsupportedMetric(key),
            invalid @ VitalsError::InvalidReading { .. } => {
                MonitoringError::InvalidReading(invalid.to_string())
            }
        }
    }
}

impl From<DeviceError> for MonitoringError {
    fn from(error: DeviceError) -> Self {
        match error {
            DeviceError::UnknownDevice(id) => MonitoringError::UnknownDevice(id),
            DeviceError::NotFound(id) => MonitoringError::NotFound(format!("Device {}", id)),
            DeviceError::AlreadyRegistered(_) => MonitoringError::Conflict(error.to_string()),
            DeviceError::Vitals(vitals) => vitals.into(),
            DeviceError::InvalidDeviceType(_)
            | DeviceError::InvalidSamplingInterval(_)
            | DeviceError::ValidationError(_) => MonitoringError::Validation(error.to_string()),
        }
    }
}

impl From<PatientError> for MonitoringError {
    fn from(error: PatientError) -> Self {
        match error {
            PatientError::NotFound(id) => MonitoringError::NotFound(format!("Patient {}", id)),
            PatientError::AlreadyExists { .. } => MonitoringError::Conflict(error.to_string()),
            PatientError::ValidationError(_) => MonitoringError::Validation(error.to_string()),
        }
    }
}
