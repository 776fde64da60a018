//! Caller-facing error kinds for clinical operations.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::db::DatabaseError;

/// One failed constraint: which field, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Rejected input. Carries every violated constraint, never an empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            violations: vec![Violation::new(field, message)],
        }
    }

    /// `Ok(())` when nothing was collected, otherwise the collected violations.
    pub fn check(violations: Vec<Violation>) -> Result<(), Self> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self { violations })
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.field).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reasons: Vec<String> = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect();
        write!(f, "{}", reasons.join("; "))
    }
}

impl std::error::Error for ValidationError {}

#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Access denied: {0}")]
    Authorization(String),

    #[error("Conflicting concurrent write: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl ClinicError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        ClinicError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Storage lock contention that a retry may resolve.
    pub fn is_conflict(&self) -> bool {
        match self {
            ClinicError::Conflict(_) => true,
            ClinicError::Database(e) => e.is_conflict(),
            _ => false,
        }
    }
}

impl From<DatabaseError> for ClinicError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => ClinicError::NotFound {
                entity: entity_type,
                id,
            },
            other => ClinicError::Database(other),
        }
    }
}

impl From<rusqlite::Error> for ClinicError {
    fn from(err: rusqlite::Error) -> Self {
        ClinicError::Database(DatabaseError::Sqlite(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_lists_every_violation() {
        let err = ValidationError {
            violations: vec![
                Violation::new("glucose", "must not be negative"),
                Violation::new("pulse", "outside 20-250 bpm"),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("glucose: must not be negative"));
        assert!(text.contains("pulse: outside 20-250 bpm"));
    }

    #[test]
    fn check_with_no_violations_is_ok() {
        assert!(ValidationError::check(Vec::new()).is_ok());
        let err = ValidationError::check(vec![Violation::new("weight", "too low")]).unwrap_err();
        assert_eq!(err.fields(), vec!["weight"]);
    }

    #[test]
    fn database_not_found_maps_to_not_found() {
        let err: ClinicError = DatabaseError::NotFound {
            entity_type: "prescription".into(),
            id: "abc".into(),
        }
        .into();
        assert!(matches!(err, ClinicError::NotFound { ref entity, .. } if entity == "prescription"));
    }

    #[test]
    fn busy_database_error_is_conflict() {
        let err: ClinicError = DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            None,
        ))
        .into();
        assert!(err.is_conflict());
        assert!(!ClinicError::Authorization("no".into()).is_conflict());
    }
}
