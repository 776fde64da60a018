use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub surname: String,
    pub name: String,
    pub patronim: Option<String>,
    pub specialization_id: Uuid,
    pub department_id: Uuid,
    pub email: Option<String>,
    pub phone: Option<String>,
}
