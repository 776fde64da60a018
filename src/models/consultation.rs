use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub consultation_date: NaiveDateTime,
    pub notes: Option<String>,
}

/// Input for recording a consultation. `consultation_date` defaults to now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConsultation {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub consultation_date: Option<NaiveDateTime>,
    pub notes: Option<String>,
}
