use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::{format_date, parse_date, parse_uuid, DatabaseError};
use crate::models::*;

const PATIENT_COLUMNS: &str = "id, surname, name, patronim, gender, birth_date, city, street,
     building, email, phone, height, weight";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, surname, name, patronim, gender, birth_date, city, street,
         building, email, phone, height, weight)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            patient.id.to_string(),
            patient.surname,
            patient.name,
            patient.patronim,
            patient.gender.as_str(),
            format_date(&patient.birth_date),
            patient.city,
            patient.street,
            patient.building,
            patient.email,
            patient.phone,
            patient.height,
            patient.weight,
        ],
    )?;
    Ok(())
}

/// Replace every mutable attribute of an existing patient.
pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE patients SET surname = ?2, name = ?3, patronim = ?4, gender = ?5, birth_date = ?6,
         city = ?7, street = ?8, building = ?9, email = ?10, phone = ?11, height = ?12, weight = ?13
         WHERE id = ?1",
        params![
            patient.id.to_string(),
            patient.surname,
            patient.name,
            patient.patronim,
            patient.gender.as_str(),
            format_date(&patient.birth_date),
            patient.city,
            patient.street,
            patient.building,
            patient.email,
            patient.phone,
            patient.height,
            patient.weight,
        ],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: patient.id.to_string(),
        });
    }
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
            params![id.to_string()],
            patient_row_from_rusqlite,
        )
        .optional()?;
    row.map(patient_from_row).transpose()
}

pub fn patient_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM patients WHERE id = ?1)",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY surname, name"
    ))?;
    let rows = stmt.query_map([], patient_row_from_rusqlite)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

/// Distinct patients that have at least one consultation with the doctor.
pub fn list_patients_for_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT p.id, p.surname, p.name, p.patronim, p.gender, p.birth_date, p.city,
         p.street, p.building, p.email, p.phone, p.height, p.weight
         FROM patients p
         JOIN consultations c ON c.patient_id = p.id
         WHERE c.doctor_id = ?1
         ORDER BY p.surname, p.name",
    )?;
    let rows = stmt.query_map(params![doctor_id.to_string()], patient_row_from_rusqlite)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

/// Delete a patient. Measurements, prescriptions, complaints, consultations,
/// diagnoses and the linked user account go with it (FK cascade).
pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute("DELETE FROM patients WHERE id = ?1", params![id.to_string()])?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: id.to_string(),
        });
    }
    tracing::info!(patient_id = %id, "Deleted patient and owned records");
    Ok(())
}

// Internal row type for Patient mapping
struct PatientRow {
    id: String,
    surname: String,
    name: String,
    patronim: Option<String>,
    gender: String,
    birth_date: String,
    city: Option<String>,
    street: Option<String>,
    building: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    height: Option<f64>,
    weight: Option<f64>,
}

fn patient_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        surname: row.get(1)?,
        name: row.get(2)?,
        patronim: row.get(3)?,
        gender: row.get(4)?,
        birth_date: row.get(5)?,
        city: row.get(6)?,
        street: row.get(7)?,
        building: row.get(8)?,
        email: row.get(9)?,
        phone: row.get(10)?,
        height: row.get(11)?,
        weight: row.get(12)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: parse_uuid(&row.id)?,
        surname: row.surname,
        name: row.name,
        patronim: row.patronim,
        gender: Gender::from_str(&row.gender)?,
        birth_date: parse_date(&row.birth_date)?,
        city: row.city,
        street: row.street,
        building: row.building,
        email: row.email,
        phone: row.phone,
        height: row.height,
        weight: row.weight,
    })
}
