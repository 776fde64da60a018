use std::fmt;

use serde::Serialize;

use crate::models::{VitalSign, Vitals};

/// Values strictly outside `(low, high)` are critical.
struct CriticalBand {
    sign: VitalSign,
    low: f64,
    high: f64,
}

const CRITICAL_BANDS: [CriticalBand; 4] = [
    CriticalBand { sign: VitalSign::SystolicBp, low: 90.0, high: 180.0 },
    CriticalBand { sign: VitalSign::DiastolicBp, low: 60.0, high: 120.0 },
    CriticalBand { sign: VitalSign::Glucose, low: 2.5, high: 20.0 },
    CriticalBand { sign: VitalSign::Pulse, low: 40.0, high: 130.0 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Above,
    Below,
}

/// One vital sign outside its critical band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalFinding {
    pub sign: VitalSign,
    pub value: f64,
    pub direction: Direction,
    pub threshold: f64,
}

impl fmt::Display for CriticalFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.direction {
            Direction::Above => "above",
            Direction::Below => "below",
        };
        write!(
            f,
            "{} {} {} ({side} {})",
            self.sign.field(),
            self.value,
            self.sign.unit(),
            self.threshold
        )
    }
}

/// Findings for an accepted reading, in band order. Empty when nothing is critical.
pub fn critical_findings(vitals: &Vitals) -> Vec<CriticalFinding> {
    CRITICAL_BANDS
        .iter()
        .filter_map(|band| {
            let value = vitals.get(band.sign);
            if value > band.high {
                Some(CriticalFinding {
                    sign: band.sign,
                    value,
                    direction: Direction::Above,
                    threshold: band.high,
                })
            } else if value < band.low {
                Some(CriticalFinding {
                    sign: band.sign,
                    value,
                    direction: Direction::Below,
                    threshold: band.low,
                })
            } else {
                None
            }
        })
        .collect()
}

pub fn is_critical(vitals: &Vitals) -> bool {
    !critical_findings(vitals).is_empty()
}

/// Notification text covering every finding of one reading.
pub fn critical_message(findings: &[CriticalFinding]) -> String {
    let parts: Vec<String> = findings.iter().map(ToString::to_string).collect();
    format!("Critical vital signs recorded: {}", parts.join("; "))
}

/// SQL boolean expression matching the same critical range over a
/// `measurements` row aliased as `alias`.
pub(crate) fn critical_predicate_sql(alias: &str) -> String {
    let clauses: Vec<String> = CRITICAL_BANDS
        .iter()
        .map(|band| {
            let column = format!("{alias}.{}", band.sign.field());
            format!("{column} > {:.1} OR {column} < {:.1}", band.high, band.low)
        })
        .collect();
    format!("({})", clauses.join(" OR "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals(glucose: f64, systolic: f64, diastolic: f64, pulse: f64) -> Vitals {
        Vitals {
            glucose,
            systolic_bp: systolic,
            diastolic_bp: diastolic,
            pulse,
            weight: 70.0,
        }
    }

    #[test]
    fn hypertensive_crisis_is_critical() {
        let findings = critical_findings(&vitals(5.0, 190.0, 100.0, 80.0));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].sign, VitalSign::SystolicBp);
        assert_eq!(findings[0].direction, Direction::Above);
        assert_eq!(findings[0].threshold, 180.0);
    }

    #[test]
    fn normal_reading_has_no_findings() {
        assert!(!is_critical(&vitals(5.0, 120.0, 80.0, 70.0)));
    }

    #[test]
    fn thresholds_are_exclusive() {
        assert!(!is_critical(&vitals(20.0, 180.0, 120.0, 130.0)));
        assert!(!is_critical(&vitals(2.5, 90.0, 60.0, 40.0)));
    }

    #[test]
    fn low_values_are_critical() {
        let findings = critical_findings(&vitals(2.0, 85.0, 55.0, 35.0));
        assert_eq!(findings.len(), 4);
        assert!(findings.iter().all(|f| f.direction == Direction::Below));
    }

    #[test]
    fn message_lists_every_finding() {
        let findings = critical_findings(&vitals(25.0, 190.0, 100.0, 140.0));
        let message = critical_message(&findings);
        assert!(message.contains("systolic_bp 190 mmHg (above 180)"));
        assert!(message.contains("glucose 25 mmol/L (above 20)"));
        assert!(message.contains("pulse 140 bpm (above 130)"));
    }

    #[test]
    fn predicate_names_each_band() {
        let sql = critical_predicate_sql("m");
        assert!(sql.contains("m.systolic_bp > 180.0 OR m.systolic_bp < 90.0"));
        assert!(sql.contains("m.glucose > 20.0 OR m.glucose < 2.5"));
        assert!(sql.starts_with('(') && sql.ends_with(')'));
    }

    #[test]
    fn findings_serialize_snake_case() {
        let findings = critical_findings(&vitals(5.0, 190.0, 100.0, 80.0));
        let json = serde_json::to_value(&findings[0]).unwrap();
        assert_eq!(json["sign"], "systolic_bp");
        assert_eq!(json["direction"], "above");
    }
}
