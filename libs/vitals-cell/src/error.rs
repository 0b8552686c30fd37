use thiserror::Error;

use crate::models::Metric;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VitalsError {
    #[error("Unsupported metric: {0}")]
    UnsupportedMetric(String),

    #[error("Invalid {metric} reading: {reason}")]
    InvalidReading { metric: Metric, reason: String },
}
