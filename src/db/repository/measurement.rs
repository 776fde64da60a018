use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::{format_datetime, parse_datetime, parse_uuid, DatabaseError};
use crate::models::{Measurement, Vitals};

/// Insert a measurement row. Callers are expected to have validated the vitals.
pub fn insert_measurement(conn: &Connection, m: &Measurement) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO measurements (id, patient_id, glucose, systolic_bp, diastolic_bp, pulse, weight, measured_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            m.id.to_string(),
            m.patient_id.to_string(),
            m.vitals.glucose,
            m.vitals.systolic_bp,
            m.vitals.diastolic_bp,
            m.vitals.pulse,
            m.vitals.weight,
            format_datetime(&m.measured_at),
        ],
    )?;
    Ok(())
}

pub fn get_measurement(conn: &Connection, id: &Uuid) -> Result<Option<Measurement>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, glucose, systolic_bp, diastolic_bp, pulse, weight, measured_at
         FROM measurements WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map(params![id.to_string()], measurement_row_from_rusqlite)?;
    match rows.next() {
        Some(row) => Ok(Some(measurement_from_row(row?)?)),
        None => Ok(None),
    }
}

/// Most recent measurements for a patient, newest first.
pub fn get_recent_measurements(
    conn: &Connection,
    patient_id: &Uuid,
    limit: u32,
) -> Result<Vec<Measurement>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, glucose, systolic_bp, diastolic_bp, pulse, weight, measured_at
         FROM measurements
         WHERE patient_id = ?1
         ORDER BY measured_at DESC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(
        params![patient_id.to_string(), limit],
        measurement_row_from_rusqlite,
    )?;

    let mut measurements = Vec::new();
    for row in rows {
        measurements.push(measurement_from_row(row?)?);
    }
    Ok(measurements)
}

pub fn count_measurements(conn: &Connection, patient_id: &Uuid) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM measurements WHERE patient_id = ?1",
        params![patient_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub(crate) type MeasurementRow = (String, String, f64, f64, f64, f64, f64, String);

pub(crate) fn measurement_row_from_rusqlite(
    row: &rusqlite::Row<'_>,
) -> Result<MeasurementRow, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

pub(crate) fn measurement_from_row(row: MeasurementRow) -> Result<Measurement, DatabaseError> {
    let (id, patient_id, glucose, systolic_bp, diastolic_bp, pulse, weight, measured_at) = row;
    Ok(Measurement {
        id: parse_uuid(&id)?,
        patient_id: parse_uuid(&patient_id)?,
        vitals: Vitals {
            glucose,
            systolic_bp,
            diastolic_bp,
            pulse,
            weight,
        },
        measured_at: parse_datetime(&measured_at)?,
    })
}
