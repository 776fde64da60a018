use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub symptom_id: Uuid,
    pub complaint_date: NaiveDateTime,
    pub severity: String,
    pub description: Option<String>,
}

/// Input for recording a complaint. `complaint_date` defaults to now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComplaint {
    pub patient_id: Uuid,
    pub symptom_id: Uuid,
    pub complaint_date: Option<NaiveDateTime>,
    pub severity: String,
    pub description: Option<String>,
}
