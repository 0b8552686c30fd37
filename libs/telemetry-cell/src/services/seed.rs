use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use device_cell::{DeviceStatus, DeviceType, RegisterDeviceRequest};
use monitoring_cell::WardMonitor;
use patient_cell::{RegisterPatientRequest, Severity};
use vitals_cell::{BloodPressure, EcgRhythm, Metric, VitalReading, VitalValue};

use crate::error::TelemetryError;

/// Loads the three-bed demo ward. Safe to call on a ward that already holds it.
pub async fn seed_demo_ward(monitor: &WardMonitor) -> Result<(), TelemetryError> {
    let now = Utc::now();
    monitor.seed(demo_patients(), demo_devices(now)).await?;
    info!("Demo ward loaded");
    Ok(())
}

pub fn demo_patients() -> Vec<RegisterPatientRequest> {
    let admitted = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap_or_default();

    vec![
        RegisterPatientRequest {
            id: Some("PAT-001".to_string()),
            name: "John Smith".to_string(),
            age: 65,
            gender: "Male".to_string(),
            condition: "Hypertension".to_string(),
            severity: Severity::Medium,
            admission_date: admitted(15),
        },
        RegisterPatientRequest {
            id: Some("PAT-002".to_string()),
            name: "Sarah Johnson".to_string(),
            age: 42,
            gender: "Female".to_string(),
            condition: "Cardiac Arrhythmia".to_string(),
            severity: Severity::High,
            admission_date: admitted(14),
        },
        RegisterPatientRequest {
            id: Some("PAT-003".to_string()),
            name: "Mike Wilson".to_string(),
            age: 58,
            gender: "Male".to_string(),
            condition: "Post-Surgery Recovery".to_string(),
            severity: Severity::Low,
            admission_date: admitted(16),
        },
    ]
}

pub fn demo_devices(at: DateTime<Utc>) -> Vec<(RegisterDeviceRequest, Vec<VitalReading>)> {
    let monitor = |id: &str, name: &str, serial: &str, patient: &str, status| RegisterDeviceRequest {
        id: Some(id.to_string()),
        name: name.to_string(),
        device_type: DeviceType::MultiparameterMonitor,
        serial_number: serial.to_string(),
        sampling_interval_seconds: 5,
        patient_id: Some(patient.to_string()),
        status: Some(status),
    };

    let readings = |id: &str, values: Vec<(Metric, VitalValue)>| {
        values
            .into_iter()
            .map(|(metric, value)| VitalReading::new(id, metric, value, at))
            .collect::<Vec<_>>()
    };

    vec![
        (
            monitor(
                "dev-001",
                "Ward A - Multiparameter Monitor",
                "MPM-2024-001",
                "PAT-001",
                DeviceStatus::Online,
            ),
            readings(
                "dev-001",
                vec![
                    (Metric::HeartRate, 72.0.into()),
                    (Metric::BloodPressure, BloodPressure::new(120.0, 80.0).with_mean(93.0).into()),
                    (Metric::Temperature, 98.6.into()),
                    (Metric::OxygenSaturation, 98.0.into()),
                    (Metric::RespiratoryRate, 16.0.into()),
                    (Metric::BloodGlucose, 95.0.into()),
                    (Metric::PainLevel, 3.0.into()),
                    (Metric::ConsciousnessLevel, 15.0.into()),
                    (Metric::Capnography, 35.0.into()),
                    (Metric::PerfusionIndex, 1.2.into()),
                    (Metric::PulseVariability, 8.0.into()),
                    (Metric::EcgRhythm, EcgRhythm::Normal.into()),
                ],
            ),
        ),
        (
            monitor(
                "dev-002",
                "ICU - Critical Care Monitor",
                "MPM-2024-002",
                "PAT-002",
                DeviceStatus::Online,
            ),
            readings(
                "dev-002",
                vec![
                    (Metric::HeartRate, 84.0.into()),
                    (Metric::BloodPressure, BloodPressure::new(130.0, 85.0).with_mean(100.0).into()),
                    (Metric::Temperature, 99.1.into()),
                    (Metric::OxygenSaturation, 97.0.into()),
                    (Metric::RespiratoryRate, 18.0.into()),
                    (Metric::BloodGlucose, 110.0.into()),
                    (Metric::PainLevel, 5.0.into()),
                    (Metric::ConsciousnessLevel, 14.0.into()),
                    (Metric::Capnography, 38.0.into()),
                    (Metric::PerfusionIndex, 0.9.into()),
                    (Metric::PulseVariability, 12.0.into()),
                    (Metric::EcgRhythm, EcgRhythm::Arrhythmia.into()),
                ],
            ),
        ),
        (
            monitor(
                "dev-003",
                "Emergency - Portable Monitor",
                "MPM-2024-003",
                "PAT-003",
                DeviceStatus::Maintenance,
            ),
            Vec::new(),
        ),
    ]
}
