use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::{format_datetime, parse_datetime, parse_uuid, DatabaseError};
use crate::models::Complaint;

pub fn insert_complaint(conn: &Connection, c: &Complaint) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO complaints (id, patient_id, symptom_id, complaint_date, severity, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            c.id.to_string(),
            c.patient_id.to_string(),
            c.symptom_id.to_string(),
            format_datetime(&c.complaint_date),
            c.severity,
            c.description,
        ],
    )?;
    Ok(())
}

/// All complaints for a patient, newest first.
pub fn get_patient_complaints(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Complaint>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, symptom_id, complaint_date, severity, description
         FROM complaints
         WHERE patient_id = ?1
         ORDER BY complaint_date DESC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
        ))
    })?;

    let mut complaints = Vec::new();
    for row in rows {
        let (id, patient_id, symptom_id, complaint_date, severity, description) = row?;
        complaints.push(Complaint {
            id: parse_uuid(&id)?,
            patient_id: parse_uuid(&patient_id)?,
            symptom_id: parse_uuid(&symptom_id)?,
            complaint_date: parse_datetime(&complaint_date)?,
            severity,
            description,
        });
    }
    Ok(complaints)
}

pub fn count_complaints(conn: &Connection, patient_id: &Uuid) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM complaints WHERE patient_id = ?1",
        params![patient_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}
