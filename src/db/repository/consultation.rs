use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::{format_datetime, parse_datetime, parse_uuid, DatabaseError};
use crate::models::Consultation;

pub fn insert_consultation(conn: &Connection, c: &Consultation) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO consultations (id, patient_id, doctor_id, consultation_date, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            c.id.to_string(),
            c.patient_id.to_string(),
            c.doctor_id.to_string(),
            format_datetime(&c.consultation_date),
            c.notes,
        ],
    )?;
    Ok(())
}

pub fn get_patient_consultations(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Consultation>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, doctor_id, consultation_date, notes
         FROM consultations
         WHERE patient_id = ?1
         ORDER BY consultation_date DESC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    })?;

    let mut consultations = Vec::new();
    for row in rows {
        let (id, patient_id, doctor_id, date, notes) = row?;
        consultations.push(Consultation {
            id: parse_uuid(&id)?,
            patient_id: parse_uuid(&patient_id)?,
            doctor_id: parse_uuid(&doctor_id)?,
            consultation_date: parse_datetime(&date)?,
            notes,
        });
    }
    Ok(consultations)
}

/// Whether the doctor has ever seen the patient.
pub fn has_consultation(
    conn: &Connection,
    doctor_id: &Uuid,
    patient_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM consultations WHERE doctor_id = ?1 AND patient_id = ?2)",
        params![doctor_id.to_string(), patient_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}
