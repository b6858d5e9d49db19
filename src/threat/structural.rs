//! Structural-integrity scorer: tiered vibration plus temperature stress.

use crate::config::ThreatConfig;
use crate::model::SensorSnapshot;
use super::{Severity, ThreatKind, ThreatPredictor, ThreatVerdict, signal};

#[derive(Debug, Clone)]
pub struct StructuralModel {
    critical: f64,
    elevated: f64,
    temp: f64,
    threat_score: f64,
}

impl Default for StructuralModel {
    fn default() -> Self {
        Self::new(&ThreatConfig::default())
    }
}

impl StructuralModel {
    pub fn new(config: &ThreatConfig) -> Self {
        Self {
            critical: config.vibration_critical,
            elevated: config.vibration_elevated,
            temp: config.structural_temp,
            threat_score: config.structural_score,
        }
    }
}

impl ThreatPredictor for StructuralModel {
    fn kind(&self) -> ThreatKind {
        ThreatKind::Structural
    }

    fn predict(&self, snapshot: &SensorSnapshot, _history: &[SensorSnapshot]) -> ThreatVerdict {
        let Some(vibration) = signal(snapshot.vibration) else {
            return ThreatVerdict::inactive(ThreatKind::Structural, "No vibration data");
        };

        let mut score = 0.0;
        let mut indicators = Vec::new();
        if vibration > self.critical {
            score = 90.0;
            indicators.push(format!("Critical vibration: {vibration}"));
        } else if vibration > self.elevated {
            score = 50.0 + (vibration - self.elevated) / (self.critical - self.elevated) * 40.0;
            indicators.push(format!("Elevated vibration: {vibration}"));
        }
        if let Some(t) = signal(snapshot.temp).filter(|t| *t > self.temp) {
            score += 10.0;
            indicators.push(format!("High temperature: {t}°C"));
        }

        let threat = score > self.threat_score;
        ThreatVerdict {
            kind: ThreatKind::Structural,
            active: threat,
            probability: score,
            confidence: score.min(95.0),
            severity: if threat {
                Severity::Critical
            } else if score > 40.0 {
                Severity::Warning
            } else {
                Severity::Info
            },
            indicators,
            risk_factors: Vec::new(),
            reason: if threat { "Structural threat detected".into() } else { "Structure stable".into() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predict(snapshot: SensorSnapshot) -> ThreatVerdict {
        StructuralModel::default().predict(&snapshot, &[])
    }

    #[test]
    fn test_tiers() {
        assert_eq!(predict(SensorSnapshot::new().with_vibration(6.0)).probability, 90.0);
        let elevated = predict(SensorSnapshot::new().with_vibration(4.0));
        assert_eq!(elevated.probability, 70.0);
        assert!(elevated.active);
        let mild = predict(SensorSnapshot::new().with_vibration(3.2));
        assert!(!mild.active);
        assert_eq!(mild.severity, Severity::Warning);
    }

    #[test]
    fn test_no_vibration() {
        assert!(!predict(SensorSnapshot::new().with_temp(90.0)).active);
        assert!(!predict(SensorSnapshot::new().with_vibration(0.0)).active);
    }

    #[test]
    fn test_heat_pushes_over_threshold() {
        let verdict = predict(SensorSnapshot::new().with_vibration(3.5).with_temp(45.0));
        assert_eq!(verdict.probability, 70.0);
        assert!(verdict.active);
    }
}
