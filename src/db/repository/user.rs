use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::{parse_uuid, DatabaseError};
use crate::models::*;

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, email, role, is_active, is_verified, patient_id, doctor_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id.to_string(),
            user.email,
            user.role.as_str(),
            user.is_active as i32,
            user.is_verified as i32,
            user.patient_id.map(|id| id.to_string()),
            user.doctor_id.map(|id| id.to_string()),
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    query_single_user(conn, "id = ?1", &id.to_string())
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    query_single_user(conn, "email = ?1", email)
}

/// The account linked to a patient record, if one exists.
pub fn get_user_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Option<User>, DatabaseError> {
    query_single_user(conn, "patient_id = ?1", &patient_id.to_string())
}

/// Account of the doctor who saw the patient most recently.
pub fn get_attending_doctor_user(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT u.id, u.email, u.role, u.is_active, u.is_verified, u.patient_id, u.doctor_id
             FROM users u
             JOIN consultations c ON c.doctor_id = u.doctor_id
             WHERE c.patient_id = ?1
             ORDER BY c.consultation_date DESC, u.email
             LIMIT 1",
            params![patient_id.to_string()],
            user_row_from_rusqlite,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

/// First active administrator account, by email.
pub fn get_first_active_admin(conn: &Connection) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, email, role, is_active, is_verified, patient_id, doctor_id
             FROM users
             WHERE role = 'admin' AND is_active = 1
             ORDER BY email
             LIMIT 1",
            [],
            user_row_from_rusqlite,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

pub fn set_user_active(conn: &Connection, id: &Uuid, active: bool) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE users SET is_active = ?2 WHERE id = ?1",
        params![id.to_string(), active as i32],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn query_single_user(
    conn: &Connection,
    predicate: &str,
    value: &str,
) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT id, email, role, is_active, is_verified, patient_id, doctor_id
                 FROM users WHERE {predicate}"
            ),
            params![value],
            user_row_from_rusqlite,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

type UserRow = (String, String, String, i32, i32, Option<String>, Option<String>);

fn user_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<UserRow, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    let (id, email, role, is_active, is_verified, patient_id, doctor_id) = row;
    Ok(User {
        id: parse_uuid(&id)?,
        email,
        role: Role::from_str(&role)?,
        is_active: is_active != 0,
        is_verified: is_verified != 0,
        patient_id: patient_id.as_deref().map(parse_uuid).transpose()?,
        doctor_id: doctor_id.as_deref().map(parse_uuid).transpose()?,
    })
}
