// =====================================================================================
// THRESHOLD CLASSIFIER
// =====================================================================================
//
// Maps a vital value to low / normal / high against adult reference ranges. Values
// sitting exactly on a cutoff are normal: heart rate 60 and 100 are both in range.
//
// =====================================================================================

use crate::error::VitalsError;
use crate::models::{AlertStatus, EcgRhythm, Metric, VitalValue};

/// Inclusive normal band: `low..=high`. `high` is `None` when the metric has no upper
/// alarm (oxygen saturation cannot be too high for alerting purposes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRange {
    pub low: f64,
    pub high: Option<f64>,
}

impl ReferenceRange {
    const fn new(low: f64, high: Option<f64>) -> Self {
        Self { low, high }
    }

    pub fn classify(&self, value: f64) -> AlertStatus {
        if value < self.low {
            return AlertStatus::Low;
        }
        match self.high {
            Some(high) if value > high => AlertStatus::High,
            _ => AlertStatus::Normal,
        }
    }
}

const HEART_RATE: ReferenceRange = ReferenceRange::new(60.0, Some(100.0));
const SYSTOLIC: ReferenceRange = ReferenceRange::new(90.0, Some(140.0));
const TEMPERATURE_F: ReferenceRange = ReferenceRange::new(97.0, Some(99.5));
const OXYGEN_SATURATION: ReferenceRange = ReferenceRange::new(95.0, None);
const RESPIRATORY_RATE: ReferenceRange = ReferenceRange::new(12.0, Some(20.0));
const BLOOD_GLUCOSE: ReferenceRange = ReferenceRange::new(70.0, Some(140.0));

/// Numeric reference range for `metric`, if it has one. Blood pressure is ranged on
/// systolic only.
pub fn reference_range(metric: Metric) -> Option<ReferenceRange> {
    match metric {
        Metric::HeartRate => Some(HEART_RATE),
        Metric::BloodPressure => Some(SYSTOLIC),
        Metric::Temperature => Some(TEMPERATURE_F),
        Metric::OxygenSaturation => Some(OXYGEN_SATURATION),
        Metric::RespiratoryRate => Some(RESPIRATORY_RATE),
        Metric::BloodGlucose => Some(BLOOD_GLUCOSE),
        Metric::PainLevel
        | Metric::ConsciousnessLevel
        | Metric::Capnography
        | Metric::PerfusionIndex
        | Metric::PulseVariability
        | Metric::EcgRhythm => None,
    }
}

/// Classifies a value of the shape the metric carries.
///
/// Blood pressure looks at systolic only; diastolic and mean are displayed but never
/// drive status. ECG rhythm is categorical: anything other than `normal` is flagged
/// high, since it is never a "too low" condition on the monitor.
pub fn classify(metric: Metric, value: &VitalValue) -> Result<AlertStatus, VitalsError> {
    value.validate_for(metric)?;

    match value {
        VitalValue::Rhythm(rhythm) => Ok(classify_rhythm(*rhythm)),
        VitalValue::Numeric(number) => classify_numeric(metric, *number),
        VitalValue::BloodPressure(bp) => classify_numeric(metric, bp.systolic),
    }
}

/// Classifies a bare number. For blood pressure the number is taken as systolic.
/// Metrics without a numeric range are normal; ECG rhythm has no numeric form.
pub fn classify_numeric(metric: Metric, value: f64) -> Result<AlertStatus, VitalsError> {
    if metric == Metric::EcgRhythm {
        return Err(VitalsError::InvalidReading {
            metric,
            reason: "rhythm is categorical and has no numeric form".to_string(),
        });
    }
    if !value.is_finite() {
        return Err(VitalsError::InvalidReading {
            metric,
            reason: "value is not a finite number".to_string(),
        });
    }

    Ok(reference_range(metric).map_or(AlertStatus::Normal, |range| range.classify(value)))
}

/// Classifies by metric key as it arrives from outside the crate. Unknown keys are an
/// error rather than defaulting to normal.
pub fn classify_key(key: &str, value: &VitalValue) -> Result<AlertStatus, VitalsError> {
    let metric: Metric = key.parse()?;
    classify(metric, value)
}

pub fn classify_rhythm(rhythm: EcgRhythm) -> AlertStatus {
    if rhythm == EcgRhythm::Normal {
        AlertStatus::Normal
    } else {
        AlertStatus::High
    }
}
