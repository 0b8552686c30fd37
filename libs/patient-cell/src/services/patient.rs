use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::models::{Patient, PatientError, PatientSearchQuery, RegisterPatientRequest, Severity};

/// In-memory patient registry. Patients are kept in admission (registration) order and
/// are never removed at runtime.
#[derive(Debug, Clone, Default)]
pub struct PatientService {
    patients: Arc<RwLock<Vec<Patient>>>,
}

impl PatientService {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn register_patient(
        &self,
        request: RegisterPatientRequest,
    ) -> Result<Patient, PatientError> {
        if request.name.trim().is_empty() {
            return Err(PatientError::ValidationError("Patient name is required".to_string()));
        }

        let id = match request.id {
            Some(id) if id.trim().is_empty() => {
                return Err(PatientError::ValidationError("Patient id must not be blank".to_string()));
            }
            Some(id) => id,
            None => format!("PAT-{}", &Uuid::new_v4().simple().to_string()[..8].to_uppercase()),
        };

        let mut patients = self.patients.write().await;
        if patients.iter().any(|p| p.id == id) {
            return Err(PatientError::AlreadyExists { id });
        }

        let patient = Patient {
            id,
            name: request.name,
            age: request.age,
            gender: request.gender,
            condition: request.condition,
            severity: request.severity,
            admission_date: request.admission_date,
        };
        patients.push(patient.clone());

        info!(patient_id = %patient.id, severity = %patient.severity, "Patient registered");
        Ok(patient)
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<Patient, PatientError> {
        let patients = self.patients.read().await;
        patients
            .iter()
            .find(|p| p.id == patient_id)
            .cloned()
            .ok_or_else(|| PatientError::NotFound(patient_id.to_string()))
    }

    pub async fn list_patients(&self) -> Vec<Patient> {
        self.patients.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.patients.read().await.len()
    }

    #[instrument(skip(self))]
    pub async fn update_severity(
        &self,
        patient_id: &str,
        severity: Severity,
    ) -> Result<Patient, PatientError> {
        let mut patients = self.patients.write().await;
        let patient = patients
            .iter_mut()
            .find(|p| p.id == patient_id)
            .ok_or_else(|| PatientError::NotFound(patient_id.to_string()))?;

        let previous = patient.severity;
        patient.severity = severity;

        info!(
            patient_id = %patient_id,
            from = %previous,
            to = %severity,
            "Patient severity updated"
        );
        Ok(patient.clone())
    }

    pub async fn search_patients(&self, query: PatientSearchQuery) -> Vec<Patient> {
        debug!("Searching patients with query: {:?}", query);

        let name = query.name.map(|n| n.to_lowercase());
        let condition = query.condition.map(|c| c.to_lowercase());
        let limit = query.limit.unwrap_or(50);
        let offset = query.offset.unwrap_or(0);

        let patients = self.patients.read().await;
        patients
            .iter()
            .filter(|p| name.as_ref().map_or(true, |n| p.name.to_lowercase().contains(n)))
            .filter(|p| {
                condition
                    .as_ref()
                    .map_or(true, |c| p.condition.to_lowercase().contains(c))
            })
            .filter(|p| query.severity.map_or(true, |s| p.severity == s))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }
}
