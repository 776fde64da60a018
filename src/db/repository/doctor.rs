use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::{parse_uuid, DatabaseError};
use crate::models::*;

pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (id, surname, name, patronim, specialization_id, department_id, email, phone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            doctor.id.to_string(),
            doctor.surname,
            doctor.name,
            doctor.patronim,
            doctor.specialization_id.to_string(),
            doctor.department_id.to_string(),
            doctor.email,
            doctor.phone,
        ],
    )?;
    Ok(())
}

pub fn update_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE doctors SET surname = ?2, name = ?3, patronim = ?4, specialization_id = ?5,
         department_id = ?6, email = ?7, phone = ?8
         WHERE id = ?1",
        params![
            doctor.id.to_string(),
            doctor.surname,
            doctor.name,
            doctor.patronim,
            doctor.specialization_id.to_string(),
            doctor.department_id.to_string(),
            doctor.email,
            doctor.phone,
        ],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "doctor".into(),
            id: doctor.id.to_string(),
        });
    }
    Ok(())
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Option<Doctor>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, surname, name, patronim, specialization_id, department_id, email, phone
             FROM doctors WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, surname, name, patronim, spec_id, dept_id, email, phone)) => Ok(Some(Doctor {
            id: parse_uuid(&id)?,
            surname,
            name,
            patronim,
            specialization_id: parse_uuid(&spec_id)?,
            department_id: parse_uuid(&dept_id)?,
            email,
            phone,
        })),
        None => Ok(None),
    }
}

pub fn doctor_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM doctors WHERE id = ?1)",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Delete a doctor. Their consultations and prescriptions go with them.
pub fn delete_doctor(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute("DELETE FROM doctors WHERE id = ?1", params![id.to_string()])?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "doctor".into(),
            id: id.to_string(),
        });
    }
    tracing::info!(doctor_id = %id, "Deleted doctor and owned records");
    Ok(())
}
