// =====================================================================================
// VITALS CELL MODELS
// =====================================================================================

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VitalsError;

/// One clinical vital-sign type reported by a bedside device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    HeartRate,
    BloodPressure,
    Temperature,
    OxygenSaturation,
    RespiratoryRate,
    BloodGlucose,
    PainLevel,
    ConsciousnessLevel,
    Capnography,
    PerfusionIndex,
    PulseVariability,
    EcgRhythm,
}

impl Metric {
    pub const ALL: [Metric; 12] = [
        Metric::HeartRate,
        Metric::BloodPressure,
        Metric::Temperature,
        Metric::OxygenSaturation,
        Metric::RespiratoryRate,
        Metric::BloodGlucose,
        Metric::PainLevel,
        Metric::ConsciousnessLevel,
        Metric::Capnography,
        Metric::PerfusionIndex,
        Metric::PulseVariability,
        Metric::EcgRhythm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::HeartRate => "heartRate",
            Metric::BloodPressure => "bloodPressure",
            Metric::Temperature => "temperature",
            Metric::OxygenSaturation => "oxygenSaturation",
            Metric::RespiratoryRate => "respiratoryRate",
            Metric::BloodGlucose => "bloodGlucose",
            Metric::PainLevel => "painLevel",
            Metric::ConsciousnessLevel => "consciousnessLevel",
            Metric::Capnography => "capnography",
            Metric::PerfusionIndex => "perfusionIndex",
            Metric::PulseVariability => "pulseVariability",
            Metric::EcgRhythm => "ecgRhythm",
        }
    }

    /// Snake-case spelling of the wire key, also accepted on input.
    pub fn snake_key(self) -> &'static str {
        match self {
            Metric::HeartRate => "heart_rate",
            Metric::BloodPressure => "blood_pressure",
            Metric::Temperature => "temperature",
            Metric::OxygenSaturation => "oxygen_saturation",
            Metric::RespiratoryRate => "respiratory_rate",
            Metric::BloodGlucose => "blood_glucose",
            Metric::PainLevel => "pain_level",
            Metric::ConsciousnessLevel => "consciousness_level",
            Metric::Capnography => "capnography",
            Metric::PerfusionIndex => "perfusion_index",
            Metric::PulseVariability => "pulse_variability",
            Metric::EcgRhythm => "ecg_rhythm",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::HeartRate => "Heart Rate",
            Metric::BloodPressure => "Blood Pressure",
            Metric::Temperature => "Temperature",
            Metric::OxygenSaturation => "SpO2",
            Metric::RespiratoryRate => "Respiratory Rate",
            Metric::BloodGlucose => "Blood Glucose",
            Metric::PainLevel => "Pain Level",
            Metric::ConsciousnessLevel => "GCS",
            Metric::Capnography => "EtCO2",
            Metric::PerfusionIndex => "Perfusion Index",
            Metric::PulseVariability => "Pulse Variability",
            Metric::EcgRhythm => "ECG Rhythm",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::HeartRate => "bpm",
            Metric::BloodPressure => "mmHg",
            Metric::Temperature => "°F",
            Metric::OxygenSaturation => "%",
            Metric::RespiratoryRate => "/min",
            Metric::BloodGlucose => "mg/dL",
            Metric::PainLevel => "/10",
            Metric::ConsciousnessLevel => "GCS",
            Metric::Capnography => "mmHg",
            Metric::PerfusionIndex => "%",
            Metric::PulseVariability => "ms",
            Metric::EcgRhythm => "rhythm",
        }
    }

    /// Shape of value a reading for this metric must carry.
    pub fn value_kind(self) -> ValueKind {
        match self {
            Metric::BloodPressure => ValueKind::BloodPressure,
            Metric::EcgRhythm => ValueKind::Rhythm,
            _ => ValueKind::Numeric,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = VitalsError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.as_str() == key || metric.snake_key() == key)
            .ok_or_else(|| VitalsError::UnsupportedMetric(key.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    BloodPressure,
    Rhythm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EcgRhythm {
    Normal,
    Arrhythmia,
    Tachycardia,
    Bradycardia,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
}

impl BloodPressure {
    pub fn new(systolic: f64, diastolic: f64) -> Self {
        Self { systolic, diastolic, mean: None }
    }

    pub fn with_mean(mut self, mean: f64) -> Self {
        self.mean = Some(mean);
        self
    }
}

/// Value carried by a reading. Serialized untagged so the wire shape is a bare number,
/// a `{systolic, diastolic, mean}` object, or a rhythm string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VitalValue {
    Numeric(f64),
    BloodPressure(BloodPressure),
    Rhythm(EcgRhythm),
}

impl VitalValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            VitalValue::Numeric(_) => ValueKind::Numeric,
            VitalValue::BloodPressure(_) => ValueKind::BloodPressure,
            VitalValue::Rhythm(_) => ValueKind::Rhythm,
        }
    }

    /// The number alerting looks at: the value itself, or systolic for blood pressure.
    pub fn primary(&self) -> Option<f64> {
        match self {
            VitalValue::Numeric(value) => Some(*value),
            VitalValue::BloodPressure(bp) => Some(bp.systolic),
            VitalValue::Rhythm(_) => None,
        }
    }

    fn is_finite(&self) -> bool {
        match self {
            VitalValue::Numeric(value) => value.is_finite(),
            VitalValue::BloodPressure(bp) => {
                bp.systolic.is_finite()
                    && bp.diastolic.is_finite()
                    && bp.mean.map_or(true, f64::is_finite)
            }
            VitalValue::Rhythm(_) => true,
        }
    }

    /// Checks the value has the shape `metric` expects and carries no NaN/inf.
    pub fn validate_for(&self, metric: Metric) -> Result<(), VitalsError> {
        if self.kind() != metric.value_kind() {
            return Err(VitalsError::InvalidReading {
                metric,
                reason: format!("expected {:?} value, got {:?}", metric.value_kind(), self.kind()),
            });
        }
        if !self.is_finite() {
            return Err(VitalsError::InvalidReading {
                metric,
                reason: "value is not a finite number".to_string(),
            });
        }
        Ok(())
    }
}

impl From<f64> for VitalValue {
    fn from(value: f64) -> Self {
        VitalValue::Numeric(value)
    }
}

impl From<BloodPressure> for VitalValue {
    fn from(value: BloodPressure) -> Self {
        VitalValue::BloodPressure(value)
    }
}

impl From<EcgRhythm> for VitalValue {
    fn from(value: EcgRhythm) -> Self {
        VitalValue::Rhythm(value)
    }
}

/// One timestamped observation from a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalReading {
    pub device_id: String,
    pub metric: Metric,
    pub value: VitalValue,
    pub timestamp: DateTime<Utc>,
}

impl VitalReading {
    pub fn new(
        device_id: impl Into<String>,
        metric: Metric,
        value: impl Into<VitalValue>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            metric,
            value: value.into(),
            timestamp,
        }
    }

    pub fn validate(&self) -> Result<(), VitalsError> {
        self.value.validate_for(self.metric)
    }

    pub fn sample(&self) -> Sample {
        Sample {
            timestamp: self.timestamp,
            value: self.value,
        }
    }
}

/// Latest known value per metric. A `None` field means the metric was never reported,
/// which is distinct from a reported zero (pain level 0 is a real reading).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<BloodPressure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_glucose: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pain_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consciousness_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capnography: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perfusion_index: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_variability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecg_rhythm: Option<EcgRhythm>,
}

impl VitalSnapshot {
    pub fn get(&self, metric: Metric) -> Option<VitalValue> {
        match metric {
            Metric::BloodPressure => self.blood_pressure.map(VitalValue::BloodPressure),
            Metric::EcgRhythm => self.ecg_rhythm.map(VitalValue::Rhythm),
            numeric => self.numeric_slot(numeric).map(VitalValue::Numeric),
        }
    }

    /// Replaces the single field for `metric`; every other field is left untouched.
    pub fn set(&mut self, metric: Metric, value: VitalValue) -> Result<(), VitalsError> {
        value.validate_for(metric)?;

        match value {
            VitalValue::BloodPressure(bp) => self.blood_pressure = Some(bp),
            VitalValue::Rhythm(rhythm) => self.ecg_rhythm = Some(rhythm),
            VitalValue::Numeric(number) => {
                if let Some(slot) = self.numeric_slot_mut(metric) {
                    *slot = Some(number);
                }
            }
        }
        Ok(())
    }

    /// Present metrics in `Metric::ALL` order.
    pub fn entries(&self) -> Vec<(Metric, VitalValue)> {
        Metric::ALL
            .into_iter()
            .filter_map(|metric| self.get(metric).map(|value| (metric, value)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Overlays every metric present in `newer` onto `self`.
    pub fn overlay(&mut self, newer: &VitalSnapshot) {
        for (metric, value) in newer.entries() {
            // Values inside a snapshot were validated when stored.
            let _ = self.set(metric, value);
        }
    }

    fn numeric_slot(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::HeartRate => self.heart_rate,
            Metric::Temperature => self.temperature,
            Metric::OxygenSaturation => self.oxygen_saturation,
            Metric::RespiratoryRate => self.respiratory_rate,
            Metric::BloodGlucose => self.blood_glucose,
            Metric::PainLevel => self.pain_level,
            Metric::ConsciousnessLevel => self.consciousness_level,
            Metric::Capnography => self.capnography,
            Metric::PerfusionIndex => self.perfusion_index,
            Metric::PulseVariability => self.pulse_variability,
            Metric::BloodPressure | Metric::EcgRhythm => None,
        }
    }

    fn numeric_slot_mut(&mut self, metric: Metric) -> Option<&mut Option<f64>> {
        match metric {
            Metric::HeartRate => Some(&mut self.heart_rate),
            Metric::Temperature => Some(&mut self.temperature),
            Metric::OxygenSaturation => Some(&mut self.oxygen_saturation),
            Metric::RespiratoryRate => Some(&mut self.respiratory_rate),
            Metric::BloodGlucose => Some(&mut self.blood_glucose),
            Metric::PainLevel => Some(&mut self.pain_level),
            Metric::ConsciousnessLevel => Some(&mut self.consciousness_level),
            Metric::Capnography => Some(&mut self.capnography),
            Metric::PerfusionIndex => Some(&mut self.perfusion_index),
            Metric::PulseVariability => Some(&mut self.pulse_variability),
            Metric::BloodPressure | Metric::EcgRhythm => None,
        }
    }
}

/// Clinical status of a single value. Derived on read, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Low,
    Normal,
    High,
}

impl AlertStatus {
    pub fn is_alert(self) -> bool {
        !matches!(self, AlertStatus::Normal)
    }
}

/// One point of a trend series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: VitalValue,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: impl Into<VitalValue>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn metric_keys_parse_in_both_spellings() {
        assert_eq!("heartRate".parse::<Metric>().unwrap(), Metric::HeartRate);
        assert_eq!("blood_glucose".parse::<Metric>().unwrap(), Metric::BloodGlucose);
        assert!("weight".parse::<Metric>().is_err());
    }

    #[test]
    fn metric_keys_must_match_exactly() {
        assert_matches!("HEARTRATE".parse::<Metric>(), Err(VitalsError::UnsupportedMetric(_)));
        assert_matches!("he_art_rate".parse::<Metric>(), Err(VitalsError::UnsupportedMetric(_)));
        assert_matches!("Heart_Rate".parse::<Metric>(), Err(VitalsError::UnsupportedMetric(_)));

        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
            assert_eq!(metric.snake_key().parse::<Metric>().unwrap(), metric);
        }
    }

    #[test]
    fn vital_value_wire_shapes() {
        let numeric: VitalValue = serde_json::from_str("72").unwrap();
        assert_eq!(numeric, VitalValue::Numeric(72.0));

        let bp: VitalValue = serde_json::from_str(r#"{"systolic":120,"diastolic":80}"#).unwrap();
        assert_eq!(bp, VitalValue::BloodPressure(BloodPressure::new(120.0, 80.0)));

        let rhythm: VitalValue = serde_json::from_str(r#""arrhythmia""#).unwrap();
        assert_eq!(rhythm, VitalValue::Rhythm(EcgRhythm::Arrhythmia));
    }

    #[test]
    fn zero_is_present_not_absent() {
        let mut snapshot = VitalSnapshot::default();
        snapshot.set(Metric::PainLevel, VitalValue::Numeric(0.0)).unwrap();

        assert_eq!(snapshot.get(Metric::PainLevel), Some(VitalValue::Numeric(0.0)));
        assert_eq!(snapshot.entries().len(), 1);
    }
}
