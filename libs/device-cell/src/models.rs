use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitals_cell::{Metric, VitalSnapshot};

use crate::error::DeviceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    Maintenance,
}

impl DeviceStatus {
    pub fn is_online(self) -> bool {
        matches!(self, DeviceStatus::Online)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
            DeviceStatus::Maintenance => "maintenance",
        };
        f.write_str(label)
    }
}

/// Closed set of device kinds the setup flow may register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    #[serde(rename = "Blood Pressure Monitor")]
    BloodPressureMonitor,
    #[serde(rename = "Heart Rate Monitor")]
    HeartRateMonitor,
    #[serde(rename = "Pulse Oximeter")]
    PulseOximeter,
    #[serde(rename = "Thermometer")]
    Thermometer,
    #[serde(rename = "ECG Monitor")]
    EcgMonitor,
    #[serde(rename = "Glucose Meter")]
    GlucoseMeter,
    #[serde(rename = "Multiparameter Monitor")]
    MultiparameterMonitor,
}

impl DeviceType {
    pub const ALL: [DeviceType; 7] = [
        DeviceType::BloodPressureMonitor,
        DeviceType::HeartRateMonitor,
        DeviceType::PulseOximeter,
        DeviceType::Thermometer,
        DeviceType::EcgMonitor,
        DeviceType::GlucoseMeter,
        DeviceType::MultiparameterMonitor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::BloodPressureMonitor => "Blood Pressure Monitor",
            DeviceType::HeartRateMonitor => "Heart Rate Monitor",
            DeviceType::PulseOximeter => "Pulse Oximeter",
            DeviceType::Thermometer => "Thermometer",
            DeviceType::EcgMonitor => "ECG Monitor",
            DeviceType::GlucoseMeter => "Glucose Meter",
            DeviceType::MultiparameterMonitor => "Multiparameter Monitor",
        }
    }

    /// Metrics this kind of device reports on every tick.
    pub fn metrics(self) -> &'static [Metric] {
        match self {
            DeviceType::BloodPressureMonitor => &[Metric::BloodPressure],
            DeviceType::HeartRateMonitor => &[Metric::HeartRate],
            DeviceType::PulseOximeter => &[
                Metric::OxygenSaturation,
                Metric::HeartRate,
                Metric::PerfusionIndex,
            ],
            DeviceType::Thermometer => &[Metric::Temperature],
            DeviceType::EcgMonitor => &[
                Metric::HeartRate,
                Metric::EcgRhythm,
                Metric::PulseVariability,
            ],
            DeviceType::GlucoseMeter => &[Metric::BloodGlucose],
            DeviceType::MultiparameterMonitor => &[
                Metric::HeartRate,
                Metric::BloodPressure,
                Metric::Temperature,
                Metric::OxygenSaturation,
                Metric::RespiratoryRate,
                Metric::BloodGlucose,
                Metric::Capnography,
                Metric::PerfusionIndex,
                Metric::PulseVariability,
            ],
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = DeviceError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        DeviceType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| DeviceError::InvalidDeviceType(name.to_string()))
    }
}

/// How often a device is polled. Only the intervals the setup flow offers are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SamplingInterval(u32);

impl SamplingInterval {
    pub const ALLOWED_SECONDS: [u32; 5] = [1, 5, 10, 30, 60];

    pub fn seconds(self) -> u32 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl Default for SamplingInterval {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u32> for SamplingInterval {
    type Error = DeviceError;

    fn try_from(seconds: u32) -> Result<Self, Self::Error> {
        if Self::ALLOWED_SECONDS.contains(&seconds) {
            Ok(Self(seconds))
        } else {
            Err(DeviceError::InvalidSamplingInterval(seconds))
        }
    }
}

impl From<SamplingInterval> for u32 {
    fn from(interval: SamplingInterval) -> Self {
        interval.0
    }
}

/// Latest known state of one device, as handed to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub serial_number: String,
    pub sampling_interval: SamplingInterval,
    pub status: DeviceStatus,
    /// Timestamp of the last accepted reading; `None` until the first one.
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    pub vitals: VitalSnapshot,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    /// Fixed identifier such as `dev-001`. Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    #[serde(default)]
    pub serial_number: String,
    pub sampling_interval_seconds: u32,
    #[serde(default)]
    pub patient_id: Option<String>,
    /// Initial status; new devices come up online.
    #[serde(default)]
    pub status: Option<DeviceStatus>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: DeviceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_accepts_wizard_labels() {
        assert_eq!("Pulse Oximeter".parse::<DeviceType>().unwrap(), DeviceType::PulseOximeter);
        assert_eq!("ecg monitor".parse::<DeviceType>().unwrap(), DeviceType::EcgMonitor);
        assert!("Ventilator".parse::<DeviceType>().is_err());
    }

    #[test]
    fn sampling_interval_is_closed_set() {
        assert_eq!(SamplingInterval::try_from(30).unwrap().seconds(), 30);
        assert_eq!(
            SamplingInterval::try_from(2),
            Err(DeviceError::InvalidSamplingInterval(2))
        );
        let parsed: Result<SamplingInterval, _> = serde_json::from_str("7");
        assert!(parsed.is_err());
    }
}
