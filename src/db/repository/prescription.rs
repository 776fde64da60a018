use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::{format_date, parse_date, parse_uuid, DatabaseError};
use crate::models::*;

pub(crate) const PRESCRIPTION_COLUMNS: &str = "id, patient_id, doctor_id, medication_name, quantity,
     dose_unit, frequency, duration_days, start_date, end_date, instructions, status";

/// Raw INSERT. Lifecycle rules live in `crate::prescriptions`.
pub fn insert_prescription(conn: &Connection, p: &Prescription) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO prescriptions (id, patient_id, doctor_id, medication_name, quantity, dose_unit,
         frequency, duration_days, start_date, end_date, instructions, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            p.id.to_string(),
            p.patient_id.to_string(),
            p.doctor_id.to_string(),
            p.medication_name,
            p.quantity,
            p.dose_unit,
            p.frequency,
            p.duration_days,
            format_date(&p.start_date),
            p.end_date.as_ref().map(format_date),
            p.instructions,
            p.status.as_str(),
        ],
    )?;
    Ok(())
}

/// Raw row rewrite. Only the prescription state machine calls this, after it
/// has archived the previous row inside the same unit of work.
pub(crate) fn write_prescription_row(conn: &Connection, p: &Prescription) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE prescriptions SET medication_name = ?2, quantity = ?3, dose_unit = ?4, frequency = ?5,
         duration_days = ?6, start_date = ?7, end_date = ?8, instructions = ?9, status = ?10
         WHERE id = ?1",
        params![
            p.id.to_string(),
            p.medication_name,
            p.quantity,
            p.dose_unit,
            p.frequency,
            p.duration_days,
            format_date(&p.start_date),
            p.end_date.as_ref().map(format_date),
            p.instructions,
            p.status.as_str(),
        ],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "prescription".into(),
            id: p.id.to_string(),
        });
    }
    Ok(())
}

pub fn get_prescription(conn: &Connection, id: &Uuid) -> Result<Option<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE id = ?1"
    ))?;
    let mut rows = stmt.query_map(params![id.to_string()], prescription_row_from_rusqlite)?;
    match rows.next() {
        Some(row) => Ok(Some(prescription_from_row(row?)?)),
        None => Ok(None),
    }
}

/// Every prescription issued to the patient, newest start date first.
pub fn get_patient_prescriptions(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Prescription>, DatabaseError> {
    query_prescriptions(
        conn,
        "WHERE patient_id = ?1 ORDER BY start_date DESC",
        &patient_id.to_string(),
    )
}

pub fn get_active_prescriptions(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Prescription>, DatabaseError> {
    query_prescriptions(
        conn,
        "WHERE patient_id = ?1 AND status = 'active' ORDER BY start_date DESC",
        &patient_id.to_string(),
    )
}

/// (active, total) prescription counts for a patient.
pub fn count_prescriptions_by_status(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<(u32, u32), DatabaseError> {
    let counts = conn.query_row(
        "SELECT COUNT(CASE WHEN status = 'active' THEN 1 END), COUNT(*)
         FROM prescriptions WHERE patient_id = ?1",
        params![patient_id.to_string()],
        |row| Ok((row.get::<_, u32>(0)?, row.get::<_, u32>(1)?)),
    )?;
    Ok(counts)
}

fn query_prescriptions(
    conn: &Connection,
    clause: &str,
    value: &str,
) -> Result<Vec<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions {clause}"
    ))?;
    let rows = stmt.query_map(params![value], prescription_row_from_rusqlite)?;

    let mut prescriptions = Vec::new();
    for row in rows {
        prescriptions.push(prescription_from_row(row?)?);
    }
    Ok(prescriptions)
}

// Internal row type for Prescription mapping
struct PrescriptionRow {
    id: String,
    patient_id: String,
    doctor_id: String,
    medication_name: String,
    quantity: f64,
    dose_unit: String,
    frequency: String,
    duration_days: i32,
    start_date: String,
    end_date: Option<String>,
    instructions: Option<String>,
    status: String,
}

fn prescription_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PrescriptionRow, rusqlite::Error> {
    Ok(PrescriptionRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        medication_name: row.get(3)?,
        quantity: row.get(4)?,
        dose_unit: row.get(5)?,
        frequency: row.get(6)?,
        duration_days: row.get(7)?,
        start_date: row.get(8)?,
        end_date: row.get(9)?,
        instructions: row.get(10)?,
        status: row.get(11)?,
    })
}

fn prescription_from_row(row: PrescriptionRow) -> Result<Prescription, DatabaseError> {
    Ok(Prescription {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        doctor_id: parse_uuid(&row.doctor_id)?,
        medication_name: row.medication_name,
        quantity: row.quantity,
        dose_unit: row.dose_unit,
        frequency: row.frequency,
        duration_days: row.duration_days,
        start_date: parse_date(&row.start_date)?,
        end_date: row.end_date.as_deref().map(parse_date).transpose()?,
        instructions: row.instructions,
        status: PrescriptionStatus::from_str(&row.status)?,
    })
}
