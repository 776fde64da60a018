use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::PrescriptionStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub medication_name: String,
    /// Dosage amount, expressed in `dose_unit`.
    pub quantity: f64,
    pub dose_unit: String,
    pub frequency: String,
    pub duration_days: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub status: PrescriptionStatus,
}

/// Input for issuing a prescription. `status` defaults to active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPrescription {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub medication_name: String,
    pub quantity: f64,
    pub dose_unit: String,
    pub frequency: String,
    pub duration_days: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub status: Option<PrescriptionStatus>,
}

/// Field-level changes to an existing prescription. `None` leaves a field
/// untouched; for the nullable columns `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionPatch {
    pub medication_name: Option<String>,
    pub quantity: Option<f64>,
    pub dose_unit: Option<String>,
    pub frequency: Option<String>,
    pub duration_days: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub instructions: Option<Option<String>>,
    pub status: Option<PrescriptionStatus>,
}

impl PrescriptionPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn status(status: PrescriptionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Snapshot of a prescription as it was immediately before one update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionHistory {
    pub id: Uuid,
    pub prescription_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub medication_name: String,
    pub quantity: f64,
    pub dose_unit: String,
    pub frequency: String,
    pub duration_days: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub status: PrescriptionStatus,
    pub changed_at: NaiveDateTime,
}

impl PrescriptionHistory {
    /// The prescription fields captured by this snapshot.
    pub fn as_prescription(&self) -> Prescription {
        Prescription {
            id: self.prescription_id,
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            medication_name: self.medication_name.clone(),
            quantity: self.quantity,
            dose_unit: self.dose_unit.clone(),
            frequency: self.frequency.clone(),
            duration_days: self.duration_days,
            start_date: self.start_date,
            end_date: self.end_date,
            instructions: self.instructions.clone(),
            status: self.status,
        }
    }
}
