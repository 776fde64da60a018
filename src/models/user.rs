use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Role;

/// Account row linking a login identity to a patient or doctor record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
}
