//! Accepting vital-sign readings.

use uuid::Uuid;

use crate::db::{self, UnitOfWork};
use crate::error::ClinicError;
use crate::models::{Measurement, NewMeasurement, Notification, NotificationType};
use crate::notifications::{self, CareTeam};
use crate::vitals::{critical_findings, critical_message, validate_measurement};

/// An accepted reading and the critical notification it produced, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMeasurement {
    pub measurement: Measurement,
    pub notification: Option<Notification>,
}

impl RecordedMeasurement {
    pub fn is_critical(&self) -> bool {
        self.notification.is_some()
    }
}

/// Validate, store, and flag a reading inside the caller's unit of work.
///
/// A rejected reading writes nothing. An accepted reading in a critical
/// range produces exactly one `critical` notification, addressed through
/// [`notifications::alert_recipient`].
pub fn record(
    uow: &UnitOfWork<'_>,
    care_team: &dyn CareTeam,
    input: NewMeasurement,
) -> Result<RecordedMeasurement, ClinicError> {
    if let Err(e) = validate_measurement(&input) {
        tracing::warn!(
            patient_id = %input.patient_id,
            fields = ?e.fields(),
            "Measurement rejected"
        );
        return Err(e.into());
    }

    if !db::patient_exists(uow, &input.patient_id)? {
        return Err(ClinicError::not_found("patient", input.patient_id));
    }

    let measurement = Measurement {
        id: Uuid::new_v4(),
        patient_id: input.patient_id,
        vitals: input.vitals,
        measured_at: input.measured_at.unwrap_or_else(db::now),
    };
    db::insert_measurement(uow, &measurement)?;

    let findings = critical_findings(&measurement.vitals);
    if findings.is_empty() {
        tracing::info!(
            patient_id = %measurement.patient_id,
            measurement_id = %measurement.id,
            "Measurement recorded"
        );
        return Ok(RecordedMeasurement {
            measurement,
            notification: None,
        });
    }

    let recipient = notifications::alert_recipient(uow, care_team, &measurement.patient_id)?;
    let notification = notifications::emit(
        uow,
        &recipient,
        NotificationType::Critical,
        &critical_message(&findings),
    );
    tracing::info!(
        patient_id = %measurement.patient_id,
        measurement_id = %measurement.id,
        recipient = %recipient,
        findings = findings.len(),
        "Critical measurement recorded"
    );

    Ok(RecordedMeasurement {
        measurement,
        notification: Some(notification),
    })
}
