use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The five vital-sign values captured in one reading.
///
/// Units: glucose mmol/L, blood pressure mmHg, pulse bpm, weight kg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub glucose: f64,
    pub systolic_bp: f64,
    pub diastolic_bp: f64,
    pub pulse: f64,
    pub weight: f64,
}

/// A reading submitted for acceptance. `measured_at` defaults to now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMeasurement {
    pub patient_id: Uuid,
    #[serde(flatten)]
    pub vitals: Vitals,
    pub measured_at: Option<NaiveDateTime>,
}

/// A persisted, immutable reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: Uuid,
    pub patient_id: Uuid,
    #[serde(flatten)]
    pub vitals: Vitals,
    pub measured_at: NaiveDateTime,
}

/// One of the five measured quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalSign {
    Glucose,
    SystolicBp,
    DiastolicBp,
    Pulse,
    Weight,
}

impl VitalSign {
    /// Column and field name.
    pub fn field(self) -> &'static str {
        match self {
            Self::Glucose => "glucose",
            Self::SystolicBp => "systolic_bp",
            Self::DiastolicBp => "diastolic_bp",
            Self::Pulse => "pulse",
            Self::Weight => "weight",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Glucose => "mmol/L",
            Self::SystolicBp | Self::DiastolicBp => "mmHg",
            Self::Pulse => "bpm",
            Self::Weight => "kg",
        }
    }
}

impl Vitals {
    pub fn get(&self, sign: VitalSign) -> f64 {
        match sign {
            VitalSign::Glucose => self.glucose,
            VitalSign::SystolicBp => self.systolic_bp,
            VitalSign::DiastolicBp => self.diastolic_bp,
            VitalSign::Pulse => self.pulse,
            VitalSign::Weight => self.weight,
        }
    }
}
