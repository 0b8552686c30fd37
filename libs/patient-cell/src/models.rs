use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Clinically assigned acuity. Set by staff, never derived from vitals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// High and critical patients count towards the ward's active alerts.
    pub fn is_alerting(self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub condition: String,
    pub severity: Severity,
    pub admission_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPatientRequest {
    /// Ward identifier such as `PAT-001`. Generated when absent.
    pub id: Option<String>,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub condition: String,
    pub severity: Severity,
    pub admission_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateSeverityRequest {
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientSearchQuery {
    pub name: Option<String>,
    pub condition: Option<String>,
    pub severity: Option<Severity>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl PatientSearchQuery {
    pub fn is_unfiltered(&self) -> bool {
        self.name.is_none()
            && self.condition.is_none()
            && self.severity.is_none()
            && self.limit.is_none()
            && self.offset.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("Patient with id {id} already exists")]
    AlreadyExists { id: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}
