//! Caller-scoped entry point over one database connection.
//!
//! Every operation takes the authenticated [`Caller`], checks its access
//! rule, and runs mutations in a single unit of work. A unit of work that
//! fails on lock contention is retried once; a second failure surfaces as
//! `ClinicError::Conflict`.

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::analytics::{self, CriticalMeasurement, MeasurementAverages, PatientSummary, RiskScore};
use crate::authorization::{
    check_clinic_wide, check_consultation, check_patient_access, check_prescribe,
    check_prescription_update, Caller, IdentityGate, UserDirectory,
};
use crate::config::ClinicConfig;
use crate::db::{self, with_unit_of_work, UnitOfWork};
use crate::error::{ClinicError, ValidationError, Violation};
use crate::measurements::{self, RecordedMeasurement};
use crate::models::*;
use crate::notifications::{self, CareTeam, ConsultingCareTeam};
use crate::prescriptions;

/// Readings shown on a patient card.
pub const CARD_RECENT_MEASUREMENTS: u32 = 10;

/// Overview of one patient for the care team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientCard {
    pub patient: Patient,
    pub recent_measurements: Vec<Measurement>,
    pub active_prescriptions: Vec<Prescription>,
    pub complaints: Vec<Complaint>,
    pub diagnoses: Vec<PatientDiagnosis>,
}

pub struct Clinic {
    conn: Connection,
    gate: Box<dyn IdentityGate>,
    care_team: Box<dyn CareTeam>,
}

impl Clinic {
    /// Open the configured database file, creating the schema when needed.
    pub fn open(config: &ClinicConfig) -> Result<Self, ClinicError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ClinicError::Database(db::DatabaseError::ConstraintViolation(format!(
                        "Cannot create data directory: {e}"
                    )))
                })?;
            }
        }
        let conn = db::open_database(&config.db_path, config.busy_timeout())?;
        tracing::info!(busy_timeout_ms = config.busy_timeout_ms, "Clinic database opened");
        Ok(Self::with_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, ClinicError> {
        Ok(Self::with_connection(db::open_memory_database()?))
    }

    /// Wrap an already-migrated connection with the default identity gate
    /// and care team.
    pub fn with_connection(conn: Connection) -> Self {
        Self {
            conn,
            gate: Box::new(UserDirectory),
            care_team: Box::new(ConsultingCareTeam),
        }
    }

    pub fn with_identity_gate(mut self, gate: impl IdentityGate + 'static) -> Self {
        self.gate = Box::new(gate);
        self
    }

    pub fn with_care_team(mut self, care_team: impl CareTeam + 'static) -> Self {
        self.care_team = Box::new(care_team);
        self
    }

    /// Direct access for administration and reference-data maintenance.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn authenticate(&self, user_id: &Uuid) -> Result<Caller, ClinicError> {
        self.gate.resolve(&self.conn, user_id)
    }

    // ── Measurements ────────────────────────────────────────

    pub fn record_measurement(
        &self,
        caller: &Caller,
        input: NewMeasurement,
    ) -> Result<RecordedMeasurement, ClinicError> {
        self.write(|uow| {
            check_patient_access(uow, caller, &input.patient_id)?
                .require(caller, "record measurements for this patient")?;
            measurements::record(uow, self.care_team.as_ref(), input.clone())
        })
    }

    pub fn recent_measurements(
        &self,
        caller: &Caller,
        patient_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<Measurement>, ClinicError> {
        check_patient_access(&self.conn, caller, patient_id)?
            .require(caller, "read this patient's measurements")?;
        Ok(db::get_recent_measurements(&self.conn, patient_id, limit)?)
    }

    // ── Prescriptions ───────────────────────────────────────

    pub fn create_prescription(
        &self,
        caller: &Caller,
        input: NewPrescription,
    ) -> Result<Prescription, ClinicError> {
        self.write(|uow| {
            check_prescribe(uow, caller, &input.patient_id, &input.doctor_id)?
                .require(caller, "prescribe for this patient")?;
            prescriptions::create(uow, input.clone())
        })
    }

    pub fn update_prescription(
        &self,
        caller: &Caller,
        id: &Uuid,
        patch: PrescriptionPatch,
    ) -> Result<Prescription, ClinicError> {
        self.write(|uow| {
            let current = prescriptions::get(uow, id)?;
            check_prescription_update(caller, &current).require(caller, "change this prescription")?;
            prescriptions::update(uow, id, patch.clone())
        })
    }

    pub fn complete_prescription(&self, caller: &Caller, id: &Uuid) -> Result<Prescription, ClinicError> {
        self.update_prescription(caller, id, PrescriptionPatch::status(PrescriptionStatus::Completed))
    }

    pub fn prescription_history(
        &self,
        caller: &Caller,
        id: &Uuid,
    ) -> Result<Vec<PrescriptionHistory>, ClinicError> {
        let current = prescriptions::get(&self.conn, id)?;
        check_patient_access(&self.conn, caller, &current.patient_id)?
            .require(caller, "read this prescription's history")?;
        prescriptions::history(&self.conn, id)
    }

    pub fn prescriptions_for_patient(
        &self,
        caller: &Caller,
        patient_id: &Uuid,
    ) -> Result<Vec<Prescription>, ClinicError> {
        check_patient_access(&self.conn, caller, patient_id)?
            .require(caller, "read this patient's prescriptions")?;
        prescriptions::list_for_patient(&self.conn, patient_id)
    }

    pub fn compliance_rate(&self, caller: &Caller, patient_id: &Uuid) -> Result<f64, ClinicError> {
        check_patient_access(&self.conn, caller, patient_id)?
            .require(caller, "read this patient's compliance")?;
        prescriptions::compliance_rate(&self.conn, patient_id)
    }

    // ── Complaints and consultations ────────────────────────

    pub fn record_complaint(&self, caller: &Caller, input: NewComplaint) -> Result<Complaint, ClinicError> {
        self.write(|uow| {
            check_patient_access(uow, caller, &input.patient_id)?
                .require(caller, "record complaints for this patient")?;
            record_complaint(uow, input.clone())
        })
    }

    pub fn record_consultation(
        &self,
        caller: &Caller,
        input: NewConsultation,
    ) -> Result<Consultation, ClinicError> {
        self.write(|uow| {
            check_consultation(caller, &input.doctor_id).require(caller, "record this consultation")?;
            record_consultation(uow, input.clone())
        })
    }

    /// Patients the calling doctor has consulted.
    pub fn my_patients(&self, caller: &Caller) -> Result<Vec<Patient>, ClinicError> {
        match caller.doctor_id {
            Some(doctor_id) if caller.role == Role::Doctor => {
                Ok(db::list_patients_for_doctor(&self.conn, &doctor_id)?)
            }
            _ => Err(ClinicError::Authorization(format!("{} has no patient list", caller.role))),
        }
    }

    pub fn patient_card(&self, caller: &Caller, patient_id: &Uuid) -> Result<PatientCard, ClinicError> {
        check_patient_access(&self.conn, caller, patient_id)?
            .require(caller, "open this patient's card")?;
        let patient = db::get_patient(&self.conn, patient_id)?
            .ok_or_else(|| ClinicError::not_found("patient", patient_id))?;
        Ok(PatientCard {
            recent_measurements: db::get_recent_measurements(
                &self.conn,
                patient_id,
                CARD_RECENT_MEASUREMENTS,
            )?,
            active_prescriptions: db::get_active_prescriptions(&self.conn, patient_id)?,
            complaints: db::get_patient_complaints(&self.conn, patient_id)?,
            diagnoses: db::get_patient_diagnoses(&self.conn, patient_id)?,
            patient,
        })
    }

    // ── Statistics ──────────────────────────────────────────

    pub fn patient_averages(
        &self,
        caller: &Caller,
        patient_id: &Uuid,
    ) -> Result<Option<MeasurementAverages>, ClinicError> {
        check_patient_access(&self.conn, caller, patient_id)?
            .require(caller, "read this patient's statistics")?;
        analytics::patient_averages(&self.conn, patient_id)
    }

    pub fn all_patient_averages(&self, caller: &Caller) -> Result<Vec<MeasurementAverages>, ClinicError> {
        check_clinic_wide(caller).require(caller, "read clinic-wide statistics")?;
        analytics::all_patient_averages(&self.conn)
    }

    /// Critical readings for one patient, or clinic-wide when `patient_id` is `None`.
    pub fn critical_measurements(
        &self,
        caller: &Caller,
        patient_id: Option<&Uuid>,
    ) -> Result<Vec<CriticalMeasurement>, ClinicError> {
        match patient_id {
            Some(id) => check_patient_access(&self.conn, caller, id)?
                .require(caller, "read this patient's critical readings")?,
            None => check_clinic_wide(caller).require(caller, "read clinic-wide critical readings")?,
        }
        analytics::critical_measurements(&self.conn, patient_id)
    }

    pub fn risk_score(&self, caller: &Caller, patient_id: &Uuid) -> Result<RiskScore, ClinicError> {
        check_patient_access(&self.conn, caller, patient_id)?
            .require(caller, "read this patient's risk score")?;
        analytics::risk_score(&self.conn, patient_id)
    }

    pub fn risk_scores(&self, caller: &Caller) -> Result<Vec<RiskScore>, ClinicError> {
        check_clinic_wide(caller).require(caller, "read clinic-wide risk scores")?;
        analytics::risk_scores(&self.conn)
    }

    pub fn patient_summary(&self, caller: &Caller, patient_id: &Uuid) -> Result<PatientSummary, ClinicError> {
        check_patient_access(&self.conn, caller, patient_id)?
            .require(caller, "read this patient's summary")?;
        analytics::patient_summary(&self.conn, patient_id)
    }

    // ── Notifications ───────────────────────────────────────

    pub fn notifications(&self, caller: &Caller, unread_only: bool) -> Result<Vec<Notification>, ClinicError> {
        Ok(notifications::list_for_user(&self.conn, &caller.user_id, unread_only)?)
    }

    pub fn unread_notifications(&self, caller: &Caller) -> Result<u32, ClinicError> {
        Ok(notifications::unread_count(&self.conn, &caller.user_id)?)
    }

    /// Alerts that no care team member or administrator could be found for.
    pub fn unassigned_notifications(&self, caller: &Caller) -> Result<Vec<Notification>, ClinicError> {
        check_clinic_wide(caller).require(caller, "read unassigned notifications")?;
        Ok(notifications::list_for_user(
            &self.conn,
            &notifications::UNASSIGNED_RECIPIENT,
            false,
        )?)
    }

    pub fn mark_notification_read(&self, caller: &Caller, notification_id: &Uuid) -> Result<(), ClinicError> {
        self.write(|uow| Ok(notifications::mark_read(uow, &caller.user_id, notification_id)?))
    }

    pub fn mark_all_notifications_read(&self, caller: &Caller) -> Result<usize, ClinicError> {
        self.write(|uow| Ok(notifications::mark_all_read(uow, &caller.user_id)?))
    }

    // ── Unit of work ────────────────────────────────────────

    fn write<T>(
        &self,
        op: impl Fn(&UnitOfWork<'_>) -> Result<T, ClinicError>,
    ) -> Result<T, ClinicError> {
        match with_unit_of_work(&self.conn, &op) {
            Err(e) if e.is_conflict() => {
                tracing::warn!(error = %e, "Write conflicted; retrying once");
                match with_unit_of_work(&self.conn, &op) {
                    Err(e) if e.is_conflict() => Err(ClinicError::Conflict(e.to_string())),
                    other => other,
                }
            }
            other => other,
        }
    }
}

fn record_complaint(uow: &UnitOfWork<'_>, input: NewComplaint) -> Result<Complaint, ClinicError> {
    if !db::patient_exists(uow, &input.patient_id)? {
        return Err(ClinicError::not_found("patient", input.patient_id));
    }
    let mut violations = Vec::new();
    if db::get_symptom(uow, &input.symptom_id)?.is_none() {
        violations.push(Violation::new("symptom_id", "no such symptom"));
    }
    if input.severity.trim().is_empty() {
        violations.push(Violation::new("severity", "must not be empty"));
    }
    ValidationError::check(violations)?;

    let complaint = Complaint {
        id: Uuid::new_v4(),
        patient_id: input.patient_id,
        symptom_id: input.symptom_id,
        complaint_date: input.complaint_date.unwrap_or_else(db::now),
        severity: input.severity,
        description: input.description,
    };
    db::insert_complaint(uow, &complaint)?;
    tracing::info!(
        patient_id = %complaint.patient_id,
        complaint_id = %complaint.id,
        "Complaint recorded"
    );
    Ok(complaint)
}

fn record_consultation(
    uow: &UnitOfWork<'_>,
    input: NewConsultation,
) -> Result<Consultation, ClinicError> {
    if !db::patient_exists(uow, &input.patient_id)? {
        return Err(ClinicError::not_found("patient", input.patient_id));
    }
    if !db::doctor_exists(uow, &input.doctor_id)? {
        return Err(ClinicError::not_found("doctor", input.doctor_id));
    }

    let consultation = Consultation {
        id: Uuid::new_v4(),
        patient_id: input.patient_id,
        doctor_id: input.doctor_id,
        consultation_date: input.consultation_date.unwrap_or_else(db::now),
        notes: input.notes,
    };
    db::insert_consultation(uow, &consultation)?;
    tracing::info!(
        patient_id = %consultation.patient_id,
        doctor_id = %consultation.doctor_id,
        "Consultation recorded"
    );
    Ok(consultation)
}
