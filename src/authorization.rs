//! Identity resolution and record-scoped access checks.
//!
//! Every check is a default-deny cascade evaluated in order:
//! 1. Admin → ALLOW
//! 2. Own record (patient account linked to the target patient) → ALLOW
//! 3. Care relationship (doctor with a consultation for the patient) → ALLOW
//! 4. Issuing doctor (prescription updates only) → ALLOW
//! 5. Default → DENY
//!
//! Rules that do not apply to an operation are skipped: a patient never
//! issues prescriptions, and only the issuing doctor changes one.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db;
use crate::error::ClinicError;
use crate::models::{Prescription, Role, User};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// An authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
    /// Set for patient accounts.
    pub patient_id: Option<Uuid>,
    /// Set for doctor accounts.
    pub doctor_id: Option<Uuid>,
}

impl Caller {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            patient_id: user.patient_id,
            doctor_id: user.doctor_id,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Why access was granted (or denied), for the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    Admin,
    OwnRecord,
    CareRelationship,
    IssuingDoctor,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn allow(reason: AccessReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny() -> Self {
        Self {
            allowed: false,
            reason: AccessReason::Denied,
        }
    }

    /// Turn a denial into `ClinicError::Authorization`.
    pub fn require(self, caller: &Caller, action: &str) -> Result<(), ClinicError> {
        if self.allowed {
            tracing::debug!(user_id = %caller.user_id, action, reason = ?self.reason, "Access granted");
            Ok(())
        } else {
            tracing::warn!(user_id = %caller.user_id, role = %caller.role, action, "Access denied");
            Err(ClinicError::Authorization(format!(
                "{} may not {action}",
                caller.role
            )))
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Identity gate
// ═══════════════════════════════════════════════════════════

/// Maps an authenticated credential to a [`Caller`].
pub trait IdentityGate {
    fn resolve(&self, conn: &Connection, user_id: &Uuid) -> Result<Caller, ClinicError>;
}

/// Resolves already-authenticated user ids against the `users` table.
/// Unknown and deactivated accounts are refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserDirectory;

impl IdentityGate for UserDirectory {
    fn resolve(&self, conn: &Connection, user_id: &Uuid) -> Result<Caller, ClinicError> {
        let user = db::get_user(conn, user_id)?.ok_or_else(|| {
            tracing::warn!(user_id = %user_id, "Unknown user");
            ClinicError::Authorization("unknown user".into())
        })?;
        if !user.is_active {
            tracing::warn!(user_id = %user_id, "Inactive user refused");
            return Err(ClinicError::Authorization("account is inactive".into()));
        }
        Ok(Caller::from_user(&user))
    }
}

// ═══════════════════════════════════════════════════════════
// Access checks
// ═══════════════════════════════════════════════════════════

/// Read or write records owned by a patient (measurements, complaints,
/// history, statistics).
pub fn check_patient_access(
    conn: &Connection,
    caller: &Caller,
    patient_id: &Uuid,
) -> Result<AccessDecision, ClinicError> {
    // Rule 1: Admin
    if caller.is_admin() {
        return Ok(AccessDecision::allow(AccessReason::Admin));
    }

    // Rule 2: Own record
    if caller.role == Role::Patient && caller.patient_id.as_ref() == Some(patient_id) {
        return Ok(AccessDecision::allow(AccessReason::OwnRecord));
    }

    // Rule 3: Care relationship
    if is_treating_doctor(conn, caller, patient_id)? {
        return Ok(AccessDecision::allow(AccessReason::CareRelationship));
    }

    // Rule 5: Default deny
    Ok(AccessDecision::deny())
}

/// Issue a prescription for `patient_id` under `doctor_id`. Doctors issue
/// only under their own id and only for patients in their care.
pub fn check_prescribe(
    conn: &Connection,
    caller: &Caller,
    patient_id: &Uuid,
    doctor_id: &Uuid,
) -> Result<AccessDecision, ClinicError> {
    if caller.is_admin() {
        return Ok(AccessDecision::allow(AccessReason::Admin));
    }

    if caller.doctor_id.as_ref() == Some(doctor_id) && is_treating_doctor(conn, caller, patient_id)? {
        return Ok(AccessDecision::allow(AccessReason::CareRelationship));
    }

    Ok(AccessDecision::deny())
}

/// Change an existing prescription: admins, or the doctor who issued it.
pub fn check_prescription_update(caller: &Caller, prescription: &Prescription) -> AccessDecision {
    if caller.is_admin() {
        return AccessDecision::allow(AccessReason::Admin);
    }

    if caller.role == Role::Doctor && caller.doctor_id == Some(prescription.doctor_id) {
        return AccessDecision::allow(AccessReason::IssuingDoctor);
    }

    AccessDecision::deny()
}

/// Record a consultation as `doctor_id`: admins, or that doctor.
pub fn check_consultation(caller: &Caller, doctor_id: &Uuid) -> AccessDecision {
    if caller.is_admin() {
        return AccessDecision::allow(AccessReason::Admin);
    }

    if caller.role == Role::Doctor && caller.doctor_id.as_ref() == Some(doctor_id) {
        return AccessDecision::allow(AccessReason::OwnRecord);
    }

    AccessDecision::deny()
}

/// Clinic-wide listings are admin-only.
pub fn check_clinic_wide(caller: &Caller) -> AccessDecision {
    if caller.is_admin() {
        AccessDecision::allow(AccessReason::Admin)
    } else {
        AccessDecision::deny()
    }
}

fn is_treating_doctor(
    conn: &Connection,
    caller: &Caller,
    patient_id: &Uuid,
) -> Result<bool, ClinicError> {
    match (caller.role, caller.doctor_id) {
        (Role::Doctor, Some(doctor_id)) => Ok(db::has_consultation(conn, &doctor_id, patient_id)?),
        _ => Ok(false),
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
