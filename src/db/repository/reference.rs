//! Reference data: specializations, departments, symptom catalogue, MKB-10 diagnoses.

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::{format_datetime, parse_datetime, parse_uuid, DatabaseError};
use crate::models::*;

pub fn insert_specialization(conn: &Connection, spec: &Specialization) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO specializations (id, name) VALUES (?1, ?2)",
        params![spec.id.to_string(), spec.name],
    )?;
    Ok(())
}

pub fn insert_department(conn: &Connection, dept: &Department) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO departments (id, name) VALUES (?1, ?2)",
        params![dept.id.to_string(), dept.name],
    )?;
    Ok(())
}

pub fn insert_symptom_category(
    conn: &Connection,
    category: &SymptomCategory,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO symptom_categories (id, name) VALUES (?1, ?2)",
        params![category.id.to_string(), category.name],
    )?;
    Ok(())
}

pub fn insert_symptom(conn: &Connection, symptom: &Symptom) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO symptoms (id, category_id, name, description) VALUES (?1, ?2, ?3, ?4)",
        params![
            symptom.id.to_string(),
            symptom.category_id.to_string(),
            symptom.name,
            symptom.description,
        ],
    )?;
    Ok(())
}

pub fn get_symptom(conn: &Connection, id: &Uuid) -> Result<Option<Symptom>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, category_id, name, description FROM symptoms WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, category_id, name, description)) => Ok(Some(Symptom {
            id: parse_uuid(&id)?,
            category_id: parse_uuid(&category_id)?,
            name,
            description,
        })),
        None => Ok(None),
    }
}

pub fn list_symptoms_by_category(
    conn: &Connection,
    category_id: &Uuid,
) -> Result<Vec<Symptom>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, category_id, name, description FROM symptoms
         WHERE category_id = ?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![category_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    let mut symptoms = Vec::new();
    for row in rows {
        let (id, category_id, name, description) = row?;
        symptoms.push(Symptom {
            id: parse_uuid(&id)?,
            category_id: parse_uuid(&category_id)?,
            name,
            description,
        });
    }
    Ok(symptoms)
}

pub fn insert_diagnosis(conn: &Connection, diagnosis: &Diagnosis) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO diagnoses (id, mkb_code, name) VALUES (?1, ?2, ?3)",
        params![diagnosis.id.to_string(), diagnosis.mkb_code, diagnosis.name],
    )?;
    Ok(())
}

pub fn get_diagnosis_by_code(
    conn: &Connection,
    mkb_code: &str,
) -> Result<Option<Diagnosis>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, mkb_code, name FROM diagnoses WHERE mkb_code = ?1",
            params![mkb_code],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, mkb_code, name)) => Ok(Some(Diagnosis {
            id: parse_uuid(&id)?,
            mkb_code,
            name,
        })),
        None => Ok(None),
    }
}

pub fn insert_patient_diagnosis(
    conn: &Connection,
    pd: &PatientDiagnosis,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patient_diagnoses (id, patient_id, diagnosis_id, diagnosed_at, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            pd.id.to_string(),
            pd.patient_id.to_string(),
            pd.diagnosis_id.to_string(),
            format_datetime(&pd.diagnosed_at),
            pd.notes,
        ],
    )?;
    Ok(())
}

pub fn get_patient_diagnoses(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<PatientDiagnosis>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, diagnosis_id, diagnosed_at, notes FROM patient_diagnoses
         WHERE patient_id = ?1 ORDER BY diagnosed_at DESC",
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

    let mut diagnoses = Vec::new();
    for row in rows {
        let (id, patient_id, diagnosis_id, diagnosed_at, notes) = row?;
        diagnoses.push(PatientDiagnosis {
            id: parse_uuid(&id)?,
            patient_id: parse_uuid(&patient_id)?,
            diagnosis_id: parse_uuid(&diagnosis_id)?,
            diagnosed_at: parse_datetime(&diagnosed_at)?,
            notes,
        });
    }
    Ok(diagnoses)
}
