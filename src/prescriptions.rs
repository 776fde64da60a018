//! Prescription lifecycle with an append-only audit trail.
//!
//! Every successful `update` archives the row as it was immediately before
//! the change, in the same unit of work as the change itself. Creation
//! writes no history; there is no delete path here.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{self, UnitOfWork};
use crate::error::{ClinicError, ValidationError, Violation};
use crate::models::{
    NewPrescription, Prescription, PrescriptionHistory, PrescriptionPatch, PrescriptionStatus,
};

/// Issue a new prescription. Status defaults to active.
pub fn create(uow: &UnitOfWork<'_>, input: NewPrescription) -> Result<Prescription, ClinicError> {
    let prescription = Prescription {
        id: Uuid::new_v4(),
        patient_id: input.patient_id,
        doctor_id: input.doctor_id,
        medication_name: input.medication_name,
        quantity: input.quantity,
        dose_unit: input.dose_unit,
        frequency: input.frequency,
        duration_days: input.duration_days,
        start_date: input.start_date,
        end_date: input.end_date,
        instructions: input.instructions,
        status: input.status.unwrap_or(PrescriptionStatus::Active),
    };

    let mut violations = field_violations(&prescription);
    if !db::patient_exists(uow, &prescription.patient_id)? {
        violations.push(Violation::new("patient_id", "no such patient"));
    }
    if !db::doctor_exists(uow, &prescription.doctor_id)? {
        violations.push(Violation::new("doctor_id", "no such doctor"));
    }
    ValidationError::check(violations)?;

    db::insert_prescription(uow, &prescription)?;
    tracing::info!(
        prescription_id = %prescription.id,
        patient_id = %prescription.patient_id,
        doctor_id = %prescription.doctor_id,
        "Prescription created"
    );
    Ok(prescription)
}

/// Apply `patch`, archiving the previous state first.
pub fn update(
    uow: &UnitOfWork<'_>,
    id: &Uuid,
    patch: PrescriptionPatch,
) -> Result<Prescription, ClinicError> {
    let previous = db::get_prescription(uow, id)?
        .ok_or_else(|| ClinicError::not_found("prescription", id))?;

    if patch.is_empty() {
        return Err(ValidationError::single("patch", "no fields to change").into());
    }

    let updated = apply_patch(&previous, patch);
    ValidationError::check(field_violations(&updated))?;

    let snapshot = db::insert_history_snapshot(uow, &previous, db::now())?;
    db::write_prescription_row(uow, &updated)?;

    tracing::info!(
        prescription_id = %id,
        history_id = %snapshot.id,
        from_status = %previous.status,
        to_status = %updated.status,
        "Prescription updated"
    );
    Ok(updated)
}

/// Mark a prescription completed.
pub fn complete(uow: &UnitOfWork<'_>, id: &Uuid) -> Result<Prescription, ClinicError> {
    update(uow, id, PrescriptionPatch::status(PrescriptionStatus::Completed))
}

pub fn get(conn: &Connection, id: &Uuid) -> Result<Prescription, ClinicError> {
    db::get_prescription(conn, id)?.ok_or_else(|| ClinicError::not_found("prescription", id))
}

pub fn list_for_patient(conn: &Connection, patient_id: &Uuid) -> Result<Vec<Prescription>, ClinicError> {
    Ok(db::get_patient_prescriptions(conn, patient_id)?)
}

pub fn list_active_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Prescription>, ClinicError> {
    Ok(db::get_active_prescriptions(conn, patient_id)?)
}

/// Snapshots of one prescription, oldest first.
pub fn history(conn: &Connection, id: &Uuid) -> Result<Vec<PrescriptionHistory>, ClinicError> {
    if db::get_prescription(conn, id)?.is_none() && db::count_prescription_history(conn, id)? == 0 {
        return Err(ClinicError::not_found("prescription", id));
    }
    Ok(db::get_prescription_history(conn, id)?)
}

/// Percentage of the patient's prescriptions that are still active.
/// A patient with no prescriptions has a rate of 0.
pub fn compliance_rate(conn: &Connection, patient_id: &Uuid) -> Result<f64, ClinicError> {
    if !db::patient_exists(conn, patient_id)? {
        return Err(ClinicError::not_found("patient", patient_id));
    }
    let (active, total) = db::count_prescriptions_by_status(conn, patient_id)?;
    if total == 0 {
        return Ok(0.0);
    }
    Ok(100.0 * f64::from(active) / f64::from(total))
}

fn apply_patch(current: &Prescription, patch: PrescriptionPatch) -> Prescription {
    Prescription {
        id: current.id,
        patient_id: current.patient_id,
        doctor_id: current.doctor_id,
        medication_name: patch
            .medication_name
            .unwrap_or_else(|| current.medication_name.clone()),
        quantity: patch.quantity.unwrap_or(current.quantity),
        dose_unit: patch.dose_unit.unwrap_or_else(|| current.dose_unit.clone()),
        frequency: patch.frequency.unwrap_or_else(|| current.frequency.clone()),
        duration_days: patch.duration_days.unwrap_or(current.duration_days),
        start_date: patch.start_date.unwrap_or(current.start_date),
        end_date: patch.end_date.unwrap_or(current.end_date),
        instructions: patch
            .instructions
            .unwrap_or_else(|| current.instructions.clone()),
        status: patch.status.unwrap_or(current.status),
    }
}

fn field_violations(p: &Prescription) -> Vec<Violation> {
    let mut violations = Vec::new();
    if p.medication_name.trim().is_empty() {
        violations.push(Violation::new("medication_name", "must not be empty"));
    }
    if !p.quantity.is_finite() {
        violations.push(Violation::new("quantity", "must be a finite number"));
    } else if p.quantity < 0.0 {
        violations.push(Violation::new("quantity", "must not be negative"));
    }
    if p.dose_unit.trim().is_empty() {
        violations.push(Violation::new("dose_unit", "must not be empty"));
    }
    if p.frequency.trim().is_empty() {
        violations.push(Violation::new("frequency", "must not be empty"));
    }
    if p.duration_days < 0 {
        violations.push(Violation::new("duration_days", "must not be negative"));
    }
    if let Some(end) = p.end_date {
        if end < p.start_date {
            violations.push(Violation::new("end_date", "is before start_date"));
        }
    }
    violations
}
