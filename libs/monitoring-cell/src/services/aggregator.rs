// =====================================================================================
// ALERT AGGREGATOR
// =====================================================================================
//
// Pure derivations over the current device and patient collections. Nothing here is
// cached; every query recomputes from what the caller hands in.
//
// =====================================================================================

use chrono::{DateTime, Utc};
use uuid::Uuid;

use device_cell::DeviceSnapshot;
use patient_cell::Patient;
use vitals_cell::{classify, AlertStatus, VitalReading, VitalSnapshot};

use crate::models::{
    AggregateCounters, AlertEvent, DeviceAlerts, LatestVitals, PatientView, VitalAlert,
};

pub fn compute_counters(devices: &[DeviceSnapshot], patients: &[Patient]) -> AggregateCounters {
    AggregateCounters {
        online_devices: devices.iter().filter(|d| d.status.is_online()).count(),
        total_patients: patients.len(),
        active_alerts: patients.iter().filter(|p| p.severity.is_alerting()).count(),
    }
}

/// Out-of-range badges for one snapshot, in metric order. Blood pressure is judged
/// on its systolic component.
pub fn vital_alerts(vitals: &VitalSnapshot) -> Vec<VitalAlert> {
    vitals
        .entries()
        .into_iter()
        .filter_map(|(metric, value)| match classify(metric, &value) {
            Ok(status) if status.is_alert() => Some(VitalAlert { metric, status, value }),
            _ => None,
        })
        .collect()
}

pub fn device_alerts(devices: &[DeviceSnapshot]) -> Vec<DeviceAlerts> {
    devices
        .iter()
        .filter_map(|device| {
            let alerts = vital_alerts(&device.vitals);
            if alerts.is_empty() {
                return None;
            }
            Some(DeviceAlerts {
                device_id: device.id.clone(),
                device_name: device.name.clone(),
                patient_id: device.patient_id.clone(),
                alerts,
            })
        })
        .collect()
}

/// Joins each patient with the devices linked to it. Latest vitals overlay the linked
/// devices from oldest to newest update, so the most recent reading of each metric wins.
pub fn patient_views(patients: &[Patient], devices: &[DeviceSnapshot]) -> Vec<PatientView> {
    patients
        .iter()
        .map(|patient| patient_view(patient, devices))
        .collect()
}

pub fn patient_view(patient: &Patient, devices: &[DeviceSnapshot]) -> PatientView {
    let mut linked: Vec<&DeviceSnapshot> = devices
        .iter()
        .filter(|d| d.patient_id.as_deref() == Some(patient.id.as_str()))
        .collect();
    let connected_devices = linked.len();

    linked.retain(|d| d.last_update.is_some());
    linked.sort_by_key(|d| d.last_update);

    let latest_vitals = linked.last().and_then(|newest| newest.last_update).map(|timestamp| {
        let mut vitals = VitalSnapshot::default();
        for device in &linked {
            vitals.overlay(&device.vitals);
        }
        LatestVitals { vitals, timestamp }
    });

    PatientView {
        patient: patient.clone(),
        connected_devices,
        latest_vitals,
    }
}

/// Builds the alert event for an accepted reading, or `None` when it is in range.
pub fn alert_for_reading(
    reading: &VitalReading,
    patient_id: Option<&str>,
    raised_at: DateTime<Utc>,
) -> Option<AlertEvent> {
    let status = classify(reading.metric, &reading.value).ok()?;
    if status == AlertStatus::Normal {
        return None;
    }
    Some(AlertEvent {
        alert_id: Uuid::new_v4(),
        device_id: reading.device_id.clone(),
        patient_id: patient_id.map(str::to_string),
        metric: reading.metric,
        status,
        value: reading.value,
        timestamp: raised_at,
    })
}
