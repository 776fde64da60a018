use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Gender;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub surname: String,
    pub name: String,
    pub patronim: Option<String>,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub city: Option<String>,
    pub street: Option<String>,
    pub building: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}
