use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Gender {
    Male => "male",
    Female => "female",
});

str_enum!(Role {
    Patient => "patient",
    Doctor => "doctor",
    Admin => "admin",
});

str_enum!(PrescriptionStatus {
    Active => "active",
    Completed => "completed",
});

str_enum!(NotificationType {
    Critical => "critical",
    Warning => "warning",
    Info => "info",
    Recommendation => "recommendation",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn prescription_status_round_trip() {
        for (variant, s) in [
            (PrescriptionStatus::Active, "active"),
            (PrescriptionStatus::Completed, "completed"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(PrescriptionStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn notification_type_round_trip() {
        for (variant, s) in [
            (NotificationType::Critical, "critical"),
            (NotificationType::Warning, "warning"),
            (NotificationType::Info, "info"),
            (NotificationType::Recommendation, "recommendation"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(NotificationType::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn serde_uses_storage_strings() {
        let json = serde_json::to_string(&NotificationType::Recommendation).unwrap();
        assert_eq!(json, "\"recommendation\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(Role::from_str("nurse").is_err());
        assert!(PrescriptionStatus::from_str("активно").is_err());
        assert!(Gender::from_str("").is_err());
    }
}
