use crate::error::{ValidationError, Violation};
use crate::models::{NewMeasurement, VitalSign, Vitals};

/// Inclusive acceptance range for one vital sign.
struct Bound {
    sign: VitalSign,
    low: f64,
    high: f64,
}

const BOUNDS: [Bound; 4] = [
    Bound { sign: VitalSign::SystolicBp, low: 50.0, high: 300.0 },
    Bound { sign: VitalSign::DiastolicBp, low: 30.0, high: 200.0 },
    Bound { sign: VitalSign::Pulse, low: 20.0, high: 250.0 },
    Bound { sign: VitalSign::Weight, low: 10.0, high: 500.0 },
];

/// Check a submitted reading against the acceptance rules.
pub fn validate_measurement(input: &NewMeasurement) -> Result<(), ValidationError> {
    validate_vitals(&input.vitals)
}

/// Every violated rule is reported, not just the first one.
/// NaN and infinite values fail their bound.
pub fn validate_vitals(vitals: &Vitals) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    // NaN compares false here; the bounds below catch it.
    if vitals.systolic_bp < vitals.diastolic_bp {
        violations.push(Violation::new(
            "systolic_bp",
            format!(
                "systolic pressure {} is below diastolic pressure {}",
                vitals.systolic_bp, vitals.diastolic_bp
            ),
        ));
    }

    if !vitals.glucose.is_finite() {
        violations.push(Violation::new("glucose", "must be a finite number"));
    } else if vitals.glucose < 0.0 {
        violations.push(Violation::new(
            "glucose",
            format!("{} mmol/L is negative", vitals.glucose),
        ));
    }

    for bound in &BOUNDS {
        let value = vitals.get(bound.sign);
        if !value.is_finite() || value < bound.low || value > bound.high {
            violations.push(Violation::new(
                bound.sign.field(),
                format!(
                    "{value} {} outside [{}, {}]",
                    bound.sign.unit(),
                    bound.low,
                    bound.high
                ),
            ));
        }
    }

    ValidationError::check(violations)
}
