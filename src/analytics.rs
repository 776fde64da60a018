//! Read-only statistics recomputed from measurements and complaints on demand.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, measurement_from_row, measurement_row_from_rusqlite, parse_uuid, MeasurementRow};
use crate::error::ClinicError;
use crate::models::Measurement;
use crate::prescriptions;
use crate::vitals::{critical_findings, critical_predicate_sql, CriticalFinding};

/// Complaints weigh 10 points each.
pub const COMPLAINT_WEIGHT: u32 = 10;
/// Each reading with systolic pressure above the threshold weighs 5 points.
pub const HYPERTENSIVE_WEIGHT: u32 = 5;
pub const HYPERTENSIVE_SYSTOLIC_THRESHOLD: f64 = 160.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementAverages {
    pub patient_id: Uuid,
    pub avg_glucose: f64,
    pub avg_systolic_bp: f64,
    pub avg_diastolic_bp: f64,
    pub avg_pulse: f64,
    pub avg_weight: f64,
    pub measurement_count: u32,
}

/// A stored reading inside the critical range, with the patient's name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalMeasurement {
    #[serde(flatten)]
    pub measurement: Measurement,
    pub surname: String,
    pub name: String,
    pub findings: Vec<CriticalFinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskScore {
    pub patient_id: Uuid,
    pub surname: String,
    pub name: String,
    pub complaint_count: u32,
    pub hypertensive_count: u32,
    pub score: u32,
}

impl RiskScore {
    fn new(patient_id: Uuid, surname: String, name: String, complaints: u32, hypertensive: u32) -> Self {
        Self {
            patient_id,
            surname,
            name,
            complaint_count: complaints,
            hypertensive_count: hypertensive,
            score: COMPLAINT_WEIGHT * complaints + HYPERTENSIVE_WEIGHT * hypertensive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientSummary {
    pub patient_id: Uuid,
    pub averages: Option<MeasurementAverages>,
    pub critical_count: u32,
    pub risk: RiskScore,
    pub compliance_rate: f64,
}

const AVERAGES_SELECT: &str = "SELECT patient_id, AVG(glucose), AVG(systolic_bp), AVG(diastolic_bp),
     AVG(pulse), AVG(weight), COUNT(*) FROM measurements";

/// Averages across all of the patient's readings; `None` when there are none.
pub fn patient_averages(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Option<MeasurementAverages>, ClinicError> {
    let row = conn
        .query_row(
            &format!("{AVERAGES_SELECT} WHERE patient_id = ?1 GROUP BY patient_id"),
            params![patient_id.to_string()],
            averages_row,
        )
        .optional()?;
    Ok(row.map(averages_from_row).transpose()?)
}

/// Averages for every patient with at least one reading.
pub fn all_patient_averages(conn: &Connection) -> Result<Vec<MeasurementAverages>, ClinicError> {
    let mut stmt = conn.prepare(&format!(
        "{AVERAGES_SELECT} GROUP BY patient_id ORDER BY patient_id"
    ))?;
    let rows = stmt.query_map([], averages_row)?;

    let mut averages = Vec::new();
    for row in rows {
        averages.push(averages_from_row(row?)?);
    }
    tracing::debug!(patients = averages.len(), "Computed measurement averages");
    Ok(averages)
}

/// Stored readings inside the critical range, newest first. Restricted to
/// one patient when `patient_id` is given.
pub fn critical_measurements(
    conn: &Connection,
    patient_id: Option<&Uuid>,
) -> Result<Vec<CriticalMeasurement>, ClinicError> {
    let mut sql = format!(
        "SELECT m.id, m.patient_id, m.glucose, m.systolic_bp, m.diastolic_bp, m.pulse, m.weight,
         m.measured_at, p.surname, p.name
         FROM measurements m
         JOIN patients p ON p.id = m.patient_id
         WHERE {}",
        critical_predicate_sql("m")
    );
    if patient_id.is_some() {
        sql.push_str(" AND m.patient_id = ?1");
    }
    sql.push_str(" ORDER BY m.measured_at DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = match patient_id {
        Some(id) => stmt
            .query_map(params![id.to_string()], critical_row)?
            .collect::<Result<Vec<_>, _>>()?,
        None => stmt
            .query_map([], critical_row)?
            .collect::<Result<Vec<_>, _>>()?,
    };

    let mut critical = Vec::with_capacity(rows.len());
    for (row, surname, name) in rows {
        let measurement = measurement_from_row(row)?;
        let findings = critical_findings(&measurement.vitals);
        critical.push(CriticalMeasurement {
            measurement,
            surname,
            name,
            findings,
        });
    }
    Ok(critical)
}

/// Number of one patient's stored readings inside the critical range.
pub fn critical_count(conn: &Connection, patient_id: &Uuid) -> Result<u32, ClinicError> {
    let count = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM measurements m WHERE m.patient_id = ?1 AND {}",
            critical_predicate_sql("m")
        ),
        params![patient_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Risk score for one patient. Complaints and hypertensive readings are
/// counted independently of each other.
pub fn risk_score(conn: &Connection, patient_id: &Uuid) -> Result<RiskScore, ClinicError> {
    conn.query_row(
        &format!("{RISK_SELECT} WHERE p.id = ?2"),
        params![HYPERTENSIVE_SYSTOLIC_THRESHOLD, patient_id.to_string()],
        risk_row,
    )
    .optional()?
    .map(risk_from_row)
    .transpose()?
    .ok_or_else(|| ClinicError::not_found("patient", patient_id))
}

/// Risk scores for every patient, highest first.
pub fn risk_scores(conn: &Connection) -> Result<Vec<RiskScore>, ClinicError> {
    let mut stmt = conn.prepare(&format!("{RISK_SELECT} ORDER BY p.surname, p.name"))?;
    let rows = stmt.query_map(params![HYPERTENSIVE_SYSTOLIC_THRESHOLD], risk_row)?;

    let mut scores = Vec::new();
    for row in rows {
        scores.push(risk_from_row(row?)?);
    }
    // Stable, so equal scores stay in name order.
    scores.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(scores)
}

/// Averages, critical count, risk and compliance for one patient.
pub fn patient_summary(conn: &Connection, patient_id: &Uuid) -> Result<PatientSummary, ClinicError> {
    let risk = risk_score(conn, patient_id)?;
    let summary = PatientSummary {
        patient_id: *patient_id,
        averages: patient_averages(conn, patient_id)?,
        critical_count: critical_count(conn, patient_id)?,
        compliance_rate: prescriptions::compliance_rate(conn, patient_id)?,
        risk,
    };
    tracing::debug!(
        patient_id = %patient_id,
        critical_count = summary.critical_count,
        risk_score = summary.risk.score,
        "Built patient summary"
    );
    Ok(summary)
}

fn critical_row(
    row: &rusqlite::Row<'_>,
) -> Result<(MeasurementRow, String, String), rusqlite::Error> {
    Ok((measurement_row_from_rusqlite(row)?, row.get(8)?, row.get(9)?))
}

type AveragesRow = (String, f64, f64, f64, f64, f64, u32);

fn averages_row(row: &rusqlite::Row<'_>) -> Result<AveragesRow, rusqlite::Error> {
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

fn averages_from_row(row: AveragesRow) -> Result<MeasurementAverages, db::DatabaseError> {
    let (patient_id, glucose, systolic, diastolic, pulse, weight, count) = row;
    Ok(MeasurementAverages {
        patient_id: parse_uuid(&patient_id)?,
        avg_glucose: glucose,
        avg_systolic_bp: systolic,
        avg_diastolic_bp: diastolic,
        avg_pulse: pulse,
        avg_weight: weight,
        measurement_count: count,
    })
}

// ?1 is the hypertensive systolic threshold.
const RISK_SELECT: &str = "SELECT p.id, p.surname, p.name,
     (SELECT COUNT(*) FROM complaints c WHERE c.patient_id = p.id),
     (SELECT COUNT(*) FROM measurements m WHERE m.patient_id = p.id AND m.systolic_bp > ?1)
     FROM patients p";

type RiskRow = (String, String, String, u32, u32);

fn risk_row(row: &rusqlite::Row<'_>) -> Result<RiskRow, rusqlite::Error> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn risk_from_row(row: RiskRow) -> Result<RiskScore, db::DatabaseError> {
    let (id, surname, name, complaints, hypertensive) = row;
    Ok(RiskScore::new(parse_uuid(&id)?, surname, name, complaints, hypertensive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Vitals;
    use crate::test_support::*;

    fn store(conn: &Connection, patient: &crate::models::Patient, vitals: Vitals) {
        db::insert_measurement(conn, &make_measurement(patient, vitals)).unwrap();
    }

    fn with_systolic(systolic: f64) -> Vitals {
        Vitals {
            systolic_bp: systolic,
            ..normal_vitals()
        }
    }

    #[test]
    fn averages_over_all_readings() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        store(&conn, &patient, with_systolic(110.0));
        store(&conn, &patient, with_systolic(130.0));

        let avg = patient_averages(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(avg.avg_systolic_bp, 120.0);
        assert_eq!(avg.avg_glucose, 5.0);
        assert_eq!(avg.measurement_count, 2);
    }

    #[test]
    fn averages_absent_without_readings() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        assert!(patient_averages(&conn, &patient.id).unwrap().is_none());
        assert!(all_patient_averages(&conn).unwrap().is_empty());
    }

    #[test]
    fn all_averages_one_row_per_patient() {
        let conn = test_db();
        let first = make_patient(&conn, "Ivanova");
        let second = make_patient(&conn, "Petrova");
        store(&conn, &first, normal_vitals());
        store(&conn, &first, normal_vitals());
        store(&conn, &second, normal_vitals());

        let all = all_patient_averages(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().map(|a| a.measurement_count).sum::<u32>(), 3);
    }

    #[test]
    fn critical_listing_matches_critical_range() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        let other = make_patient(&conn, "Petrova");
        store(&conn, &patient, normal_vitals());
        store(&conn, &patient, with_systolic(190.0));
        store(&conn, &other, Vitals { pulse: 35.0, ..normal_vitals() });

        let all = critical_measurements(&conn, None).unwrap();
        assert_eq!(all.len(), 2);

        let mine = critical_measurements(&conn, Some(&patient.id)).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].surname, "Ivanova");
        assert_eq!(mine[0].name, patient.name);
        assert_eq!(mine[0].measurement.vitals.systolic_bp, 190.0);
        assert_eq!(mine[0].findings.len(), 1);
    }

    #[test]
    fn critical_count_agrees_with_listing() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        let other = make_patient(&conn, "Petrova");
        assert_eq!(critical_count(&conn, &patient.id).unwrap(), 0);

        store(&conn, &patient, normal_vitals());
        store(&conn, &patient, with_systolic(190.0));
        store(&conn, &patient, Vitals { glucose: 2.0, ..normal_vitals() });
        store(&conn, &other, with_systolic(190.0));

        assert_eq!(critical_count(&conn, &patient.id).unwrap(), 2);
        assert_eq!(
            critical_measurements(&conn, Some(&patient.id)).unwrap().len(),
            2
        );
    }

    #[test]
    fn risk_score_counts_independently() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        let symptom = make_symptom(&conn, "Headache");
        make_complaint(&conn, &patient, &symptom);
        make_complaint(&conn, &patient, &symptom);
        store(&conn, &patient, with_systolic(170.0));
        store(&conn, &patient, with_systolic(165.0));
        store(&conn, &patient, with_systolic(175.0));
        store(&conn, &patient, with_systolic(160.0));

        // 2 complaints x 10 + 3 readings above 160 x 5, without join fan-out
        let risk = risk_score(&conn, &patient.id).unwrap();
        assert_eq!(risk.complaint_count, 2);
        assert_eq!(risk.hypertensive_count, 3);
        assert_eq!(risk.score, 35);
    }

    #[test]
    fn risk_scores_cover_every_patient() {
        let conn = test_db();
        let calm = make_patient(&conn, "Ivanova");
        let anxious = make_patient(&conn, "Petrova");
        let symptom = make_symptom(&conn, "Palpitations");
        make_complaint(&conn, &anxious, &symptom);

        let scores = risk_scores(&conn).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].patient_id, anxious.id);
        assert_eq!(scores[0].score, 10);
        assert_eq!(scores[1].patient_id, calm.id);
        assert_eq!(scores[1].score, 0);
    }

    #[test]
    fn risk_score_unknown_patient_is_not_found() {
        let conn = test_db();
        assert!(matches!(
            risk_score(&conn, &Uuid::new_v4()),
            Err(ClinicError::NotFound { .. })
        ));
    }

    #[test]
    fn summary_bundles_every_statistic() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        let doctor = make_doctor(&conn, "Sidorov");
        store(&conn, &patient, with_systolic(190.0));
        db::insert_prescription(&conn, &make_prescription(&patient, &doctor)).unwrap();

        let summary = patient_summary(&conn, &patient.id).unwrap();
        assert_eq!(summary.critical_count, 1);
        assert_eq!(summary.risk.score, 5);
        assert_eq!(summary.compliance_rate, 100.0);
        assert_eq!(summary.averages.unwrap().measurement_count, 1);
    }
}
