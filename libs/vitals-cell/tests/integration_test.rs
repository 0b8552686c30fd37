// =====================================================================================
// VITALS CELL INTEGRATION TESTS
// =====================================================================================

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};

use vitals_cell::{
    services::{classify_key, classify_rhythm, reference_range},
    AlertStatus, BloodPressure, EcgRhythm, Metric, Sample, TimeSeriesStore, VitalReading,
    VitalValue, VitalsError,
};
use vitals_cell::{classify, classify_numeric};

fn t(minutes: i64) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap() + Duration::minutes(minutes)
}

// =====================================================================================
// CLASSIFIER
// =====================================================================================

#[test]
fn test_heart_rate_boundaries() {
    assert_eq!(classify_numeric(Metric::HeartRate, 59.0).unwrap(), AlertStatus::Low);
    assert_eq!(classify_numeric(Metric::HeartRate, 60.0).unwrap(), AlertStatus::Normal);
    assert_eq!(classify_numeric(Metric::HeartRate, 72.0).unwrap(), AlertStatus::Normal);
    assert_eq!(classify_numeric(Metric::HeartRate, 100.0).unwrap(), AlertStatus::Normal);
    assert_eq!(classify_numeric(Metric::HeartRate, 101.0).unwrap(), AlertStatus::High);
}

#[test]
fn test_reference_table_cutoffs() {
    let cases = [
        (Metric::BloodPressure, 89.0, AlertStatus::Low),
        (Metric::BloodPressure, 90.0, AlertStatus::Normal),
        (Metric::BloodPressure, 140.0, AlertStatus::Normal),
        (Metric::BloodPressure, 141.0, AlertStatus::High),
        (Metric::Temperature, 96.9, AlertStatus::Low),
        (Metric::Temperature, 97.0, AlertStatus::Normal),
        (Metric::Temperature, 99.5, AlertStatus::Normal),
        (Metric::Temperature, 99.6, AlertStatus::High),
        (Metric::OxygenSaturation, 94.0, AlertStatus::Low),
        (Metric::OxygenSaturation, 95.0, AlertStatus::Normal),
        (Metric::OxygenSaturation, 100.0, AlertStatus::Normal),
        (Metric::RespiratoryRate, 11.0, AlertStatus::Low),
        (Metric::RespiratoryRate, 12.0, AlertStatus::Normal),
        (Metric::RespiratoryRate, 20.0, AlertStatus::Normal),
        (Metric::RespiratoryRate, 21.0, AlertStatus::High),
        (Metric::BloodGlucose, 69.0, AlertStatus::Low),
        (Metric::BloodGlucose, 70.0, AlertStatus::Normal),
        (Metric::BloodGlucose, 140.0, AlertStatus::Normal),
        (Metric::BloodGlucose, 141.0, AlertStatus::High),
    ];

    for (metric, value, expected) in cases {
        assert_eq!(
            classify_numeric(metric, value).unwrap(),
            expected,
            "{} = {}",
            metric,
            value
        );
    }
}

#[test]
fn test_unranged_metrics_are_always_normal() {
    for metric in [
        Metric::PainLevel,
        Metric::ConsciousnessLevel,
        Metric::Capnography,
        Metric::PerfusionIndex,
        Metric::PulseVariability,
    ] {
        assert!(reference_range(metric).is_none());
        assert_eq!(classify_numeric(metric, 0.0).unwrap(), AlertStatus::Normal);
        assert_eq!(classify_numeric(metric, 9999.0).unwrap(), AlertStatus::Normal);
    }
}

#[test]
fn test_blood_pressure_uses_systolic_only() {
    // Diastolic far out of any sane range must not change the status.
    let value = VitalValue::BloodPressure(BloodPressure::new(120.0, 30.0).with_mean(60.0));
    assert_eq!(classify(Metric::BloodPressure, &value).unwrap(), AlertStatus::Normal);

    let hypertensive = VitalValue::BloodPressure(BloodPressure::new(150.0, 80.0));
    assert_eq!(classify(Metric::BloodPressure, &hypertensive).unwrap(), AlertStatus::High);
}

#[test]
fn test_ecg_rhythm_is_categorical() {
    assert_eq!(classify_rhythm(EcgRhythm::Normal), AlertStatus::Normal);
    assert_eq!(
        classify(Metric::EcgRhythm, &VitalValue::Rhythm(EcgRhythm::Arrhythmia)).unwrap(),
        AlertStatus::High
    );
    assert_matches!(
        classify_numeric(Metric::EcgRhythm, 1.0),
        Err(VitalsError::InvalidReading { metric: Metric::EcgRhythm, .. })
    );
}

#[test]
fn test_unknown_metric_key_is_rejected() {
    let result = classify_key("intracranialPressure", &VitalValue::Numeric(12.0));
    assert_matches!(result, Err(VitalsError::UnsupportedMetric(key)) if key == "intracranialPressure");

    assert_eq!(
        classify_key("heartRate", &VitalValue::Numeric(45.0)).unwrap(),
        AlertStatus::Low
    );
}

#[test]
fn test_mismatched_value_shape_is_rejected() {
    let result = classify(Metric::HeartRate, &VitalValue::Rhythm(EcgRhythm::Normal));
    assert_matches!(result, Err(VitalsError::InvalidReading { metric: Metric::HeartRate, .. }));

    let reading = VitalReading::new("dev-001", Metric::Temperature, f64::NAN, t(0));
    assert_matches!(reading.validate(), Err(VitalsError::InvalidReading { .. }));
}

// =====================================================================================
// HISTORY
// =====================================================================================

#[tokio::test]
async fn test_history_keeps_last_n_in_order() {
    let store = TimeSeriesStore::new(6);

    for minute in 0..7 {
        store
            .append("dev-001", Metric::HeartRate, Sample::new(t(minute), 70.0 + minute as f64))
            .await;
    }

    let series = store.snapshot("dev-001", Metric::HeartRate).await;
    assert_eq!(series.len(), 6);
    assert_eq!(series.first().unwrap().timestamp, t(1));
    assert_eq!(series.last().unwrap().timestamp, t(6));
    assert!(series.iter().all(|sample| sample.timestamp != t(0)));
    assert!(series.windows(2).all(|pair| pair[0].timestamp < pair[1].timestamp));
}

#[tokio::test]
async fn test_history_grows_until_capacity() {
    let store = TimeSeriesStore::new(6);
    store.append("dev-001", Metric::Temperature, Sample::new(t(0), 98.6)).await;
    store.append("dev-001", Metric::Temperature, Sample::new(t(5), 98.7)).await;

    let series = store.snapshot("dev-001", Metric::Temperature).await;
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].value, VitalValue::Numeric(98.6));
}

#[tokio::test]
async fn test_history_unknown_key_is_empty() {
    let store = TimeSeriesStore::default();
    store.append("dev-001", Metric::HeartRate, Sample::new(t(0), 72.0)).await;

    assert!(store.snapshot("dev-002", Metric::HeartRate).await.is_empty());
    assert!(store.snapshot("dev-001", Metric::BloodGlucose).await.is_empty());
    assert_eq!(store.tracked_series().await, 1);
}

#[tokio::test]
async fn test_history_snapshot_is_a_copy() {
    let store = TimeSeriesStore::new(3);
    store.append("dev-001", Metric::HeartRate, Sample::new(t(0), 72.0)).await;

    let before = store.snapshot("dev-001", Metric::HeartRate).await;
    store.append("dev-001", Metric::HeartRate, Sample::new(t(1), 74.0)).await;

    assert_eq!(before.len(), 1);
    assert_eq!(store.snapshot("dev-001", Metric::HeartRate).await.len(), 2);
}
