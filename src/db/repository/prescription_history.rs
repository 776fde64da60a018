//! Append-only prescription audit log. Rows are written by the prescription
//! state machine only; there is no update or delete path.

use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::{format_date, format_datetime, parse_date, parse_datetime, parse_uuid, DatabaseError};
use crate::models::*;

/// Archive `previous` as the next history entry for its prescription.
pub(crate) fn insert_history_snapshot(
    conn: &Connection,
    previous: &Prescription,
    changed_at: NaiveDateTime,
) -> Result<PrescriptionHistory, DatabaseError> {
    let entry = PrescriptionHistory {
        id: Uuid::new_v4(),
        prescription_id: previous.id,
        patient_id: previous.patient_id,
        doctor_id: previous.doctor_id,
        medication_name: previous.medication_name.clone(),
        quantity: previous.quantity,
        dose_unit: previous.dose_unit.clone(),
        frequency: previous.frequency.clone(),
        duration_days: previous.duration_days,
        start_date: previous.start_date,
        end_date: previous.end_date,
        instructions: previous.instructions.clone(),
        status: previous.status,
        changed_at,
    };

    conn.execute(
        "INSERT INTO prescription_history (id, prescription_id, patient_id, doctor_id, medication_name,
         quantity, dose_unit, frequency, duration_days, start_date, end_date, instructions, status,
         changed_at, seq)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                 (SELECT COALESCE(MAX(seq), 0) + 1 FROM prescription_history WHERE prescription_id = ?2))",
        params![
            entry.id.to_string(),
            entry.prescription_id.to_string(),
            entry.patient_id.to_string(),
            entry.doctor_id.to_string(),
            entry.medication_name,
            entry.quantity,
            entry.dose_unit,
            entry.frequency,
            entry.duration_days,
            format_date(&entry.start_date),
            entry.end_date.as_ref().map(format_date),
            entry.instructions,
            entry.status.as_str(),
            format_datetime(&entry.changed_at),
        ],
    )?;
    Ok(entry)
}

/// History of one prescription, oldest snapshot first.
pub fn get_prescription_history(
    conn: &Connection,
    prescription_id: &Uuid,
) -> Result<Vec<PrescriptionHistory>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, prescription_id, patient_id, doctor_id, medication_name, quantity, dose_unit,
         frequency, duration_days, start_date, end_date, instructions, status, changed_at
         FROM prescription_history
         WHERE prescription_id = ?1
         ORDER BY seq ASC",
    )?;
    let rows = stmt.query_map(params![prescription_id.to_string()], |row| {
        Ok(HistoryRow {
            id: row.get(0)?,
            prescription_id: row.get(1)?,
            patient_id: row.get(2)?,
            doctor_id: row.get(3)?,
            medication_name: row.get(4)?,
            quantity: row.get(5)?,
            dose_unit: row.get(6)?,
            frequency: row.get(7)?,
            duration_days: row.get(8)?,
            start_date: row.get(9)?,
            end_date: row.get(10)?,
            instructions: row.get(11)?,
            status: row.get(12)?,
            changed_at: row.get(13)?,
        })
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(history_from_row(row?)?);
    }
    Ok(entries)
}

pub fn count_prescription_history(
    conn: &Connection,
    prescription_id: &Uuid,
) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM prescription_history WHERE prescription_id = ?1",
        params![prescription_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

struct HistoryRow {
    id: String,
    prescription_id: String,
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
    changed_at: String,
}

fn history_from_row(row: HistoryRow) -> Result<PrescriptionHistory, DatabaseError> {
    Ok(PrescriptionHistory {
        id: parse_uuid(&row.id)?,
        prescription_id: parse_uuid(&row.prescription_id)?,
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
        changed_at: parse_datetime(&row.changed_at)?,
    })
}
