//! Notification emitter and recipient resolution.
//!
//! `emit` is best-effort: a failed insert is rolled back to its own savepoint
//! and logged, and the enclosing clinical write carries on.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{Notification, NotificationType};

const EMIT_SAVEPOINT: &str = "emit_notification";

/// Inbox for alerts that no account could be resolved for. Administrators
/// read it through `Clinic::unassigned_notifications`.
pub const UNASSIGNED_RECIPIENT: Uuid = Uuid::nil();

/// Resolves the account that is told about events concerning a patient.
pub trait CareTeam {
    fn primary_recipient(
        &self,
        conn: &Connection,
        patient_id: &Uuid,
    ) -> Result<Option<Uuid>, DatabaseError>;
}

/// The doctor who consulted the patient most recently, or the patient's own
/// account when no doctor with an account has seen them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsultingCareTeam;

impl CareTeam for ConsultingCareTeam {
    fn primary_recipient(
        &self,
        conn: &Connection,
        patient_id: &Uuid,
    ) -> Result<Option<Uuid>, DatabaseError> {
        if let Some(user) = db::get_attending_doctor_user(conn, patient_id)? {
            return Ok(Some(user.id));
        }
        Ok(db::get_user_for_patient(conn, patient_id)?.map(|user| user.id))
    }
}

/// Address for an alert about `patient_id`: the care team's choice, then the
/// first active administrator, then [`UNASSIGNED_RECIPIENT`].
pub fn alert_recipient(
    conn: &Connection,
    care_team: &dyn CareTeam,
    patient_id: &Uuid,
) -> Result<Uuid, DatabaseError> {
    if let Some(user_id) = care_team.primary_recipient(conn, patient_id)? {
        return Ok(user_id);
    }
    if let Some(admin) = db::get_first_active_admin(conn)? {
        tracing::debug!(patient_id = %patient_id, "No care team account; alerting administrator");
        return Ok(admin.id);
    }
    tracing::warn!(patient_id = %patient_id, "No account to alert; using unassigned inbox");
    Ok(UNASSIGNED_RECIPIENT)
}

/// Create a notification for `user_id`. Never fails: when the row cannot be
/// stored the in-memory notification is still returned.
pub fn emit(
    conn: &Connection,
    user_id: &Uuid,
    kind: NotificationType,
    message: &str,
) -> Notification {
    let notification = Notification {
        id: Uuid::new_v4(),
        user_id: *user_id,
        notification_type: kind,
        message: message.to_string(),
        created_at: db::now(),
        is_read: false,
    };

    match insert_in_savepoint(conn, &notification) {
        Ok(()) => tracing::debug!(
            user_id = %user_id,
            notification_id = %notification.id,
            notification_type = %kind,
            "Notification stored"
        ),
        Err(e) => tracing::warn!(
            user_id = %user_id,
            notification_type = %kind,
            error = %e,
            "Notification could not be stored; continuing"
        ),
    }

    notification
}

fn insert_in_savepoint(conn: &Connection, notification: &Notification) -> Result<(), DatabaseError> {
    conn.execute_batch(&format!("SAVEPOINT {EMIT_SAVEPOINT}"))?;
    match db::insert_notification(conn, notification) {
        Ok(()) => {
            conn.execute_batch(&format!("RELEASE {EMIT_SAVEPOINT}"))?;
            Ok(())
        }
        Err(e) => {
            if let Err(rollback) = conn.execute_batch(&format!(
                "ROLLBACK TO {EMIT_SAVEPOINT}; RELEASE {EMIT_SAVEPOINT}"
            )) {
                tracing::warn!(error = %rollback, "Savepoint rollback failed");
            }
            Err(e)
        }
    }
}

/// Notifications for a user, newest first.
pub fn list_for_user(
    conn: &Connection,
    user_id: &Uuid,
    unread_only: bool,
) -> Result<Vec<Notification>, DatabaseError> {
    db::get_user_notifications(conn, user_id, unread_only)
}

pub fn unread_count(conn: &Connection, user_id: &Uuid) -> Result<u32, DatabaseError> {
    db::count_unread_notifications(conn, user_id)
}

/// Mark one of the caller's own notifications read.
pub fn mark_read(
    conn: &Connection,
    user_id: &Uuid,
    notification_id: &Uuid,
) -> Result<(), DatabaseError> {
    db::mark_notification_read(conn, user_id, notification_id)?;
    tracing::debug!(user_id = %user_id, notification_id = %notification_id, "Notification read");
    Ok(())
}

pub fn mark_all_read(conn: &Connection, user_id: &Uuid) -> Result<usize, DatabaseError> {
    let updated = db::mark_all_notifications_read(conn, user_id)?;
    tracing::debug!(user_id = %user_id, updated, "Notifications marked read");
    Ok(updated)
}
