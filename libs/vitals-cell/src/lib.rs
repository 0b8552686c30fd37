// =====================================================================================
// VITALS CELL - METRIC VOCABULARY, CLASSIFICATION & TREND HISTORY
// =====================================================================================
//
// This cell owns everything that is about a single vital value:
// - The metric vocabulary and the value shapes each metric carries
// - Threshold classification against clinical reference ranges
// - Bounded per-(device, metric) trend history
//
// =====================================================================================

pub mod error;
pub mod models;
pub mod services;

pub use error::VitalsError;
pub use models::{
    AlertStatus, BloodPressure, EcgRhythm, Metric, Sample, ValueKind, VitalReading,
    VitalSnapshot, VitalValue,
};
pub use services::{classify, classify_numeric, TimeSeriesStore};
