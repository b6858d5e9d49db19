//! Gas-leak scorer: tiered gas level plus a small temperature contribution.

use crate::config::ThreatConfig;
use crate::model::SensorSnapshot;
use super::{Severity, ThreatKind, ThreatPredictor, ThreatVerdict, signal};

#[derive(Debug, Clone)]
pub struct GasLeakModel {
    critical: f64,
    elevated: f64,
    temp: f64,
    leak_score: f64,
}

impl Default for GasLeakModel {
    fn default() -> Self {
        Self::new(&ThreatConfig::default())
    }
}

impl GasLeakModel {
    pub fn new(config: &ThreatConfig) -> Self {
        Self {
            critical: config.gas_critical,
            elevated: config.gas_elevated,
            temp: config.gas_temp,
            leak_score: config.gas_leak_score,
        }
    }
}

impl ThreatPredictor for GasLeakModel {
    fn kind(&self) -> ThreatKind {
        ThreatKind::GasLeak
    }

    fn predict(&self, snapshot: &SensorSnapshot, _history: &[SensorSnapshot]) -> ThreatVerdict {
        let Some(gas) = signal(snapshot.gas) else {
            return ThreatVerdict::inactive(ThreatKind::GasLeak, "No gas sensor data");
        };

        let mut score = 0.0;
        let mut indicators = Vec::new();
        if gas > self.critical {
            score = 90.0;
            indicators.push(format!("Critical gas level: {gas}ppm"));
        } else if gas > self.elevated {
            score = 60.0 + (gas - self.elevated) / (self.critical - self.elevated) * 30.0;
            indicators.push(format!("Elevated gas level: {gas}ppm"));
        }
        if let Some(t) = signal(snapshot.temp).filter(|t| *t > self.temp) {
            score += 10.0;
            indicators.push(format!("Temperature rise: {t}°C"));
        }

        let leak = score > self.leak_score;
        ThreatVerdict {
            kind: ThreatKind::GasLeak,
            active: leak,
            probability: score,
            confidence: score.min(95.0),
            severity: if leak {
                Severity::Critical
            } else if score > 50.0 {
                Severity::Warning
            } else {
                Severity::Info
            },
            indicators,
            risk_factors: Vec::new(),
            reason: if leak { "Gas leak detected".into() } else { "Gas within normal range".into() },
        }
    }
}
