//! Fire scorer.
//!
//! Accumulates a score from weighted temperature, gas and flame readings plus
//! trend patterns over the recent history. A direct flame reading above the
//! threshold short-circuits the confidence to 98.

use crate::config::FireConfig;
use crate::model::SensorSnapshot;
use super::{Severity, ThreatKind, ThreatPredictor, ThreatVerdict, signal};

const COMBINED_TEMP: f64 = 45.0;
const COMBINED_GAS: f64 = 250.0;
const COMBINED_FLAME: f64 = 50.0;

#[derive(Debug, Clone, Default)]
pub struct FireModel {
    config: FireConfig,
}

impl FireModel {
    pub fn new(config: FireConfig) -> Self {
        Self { config }
    }
}

impl ThreatPredictor for FireModel {
    fn kind(&self) -> ThreatKind {
        ThreatKind::Fire
    }

    fn predict(&self, snapshot: &SensorSnapshot, history: &[SensorSnapshot]) -> ThreatVerdict {
        let c = &self.config;
        let temp = signal(snapshot.temp);
        let gas = signal(snapshot.gas);
        let flame = snapshot.flame.filter(|v| !v.is_nan());

        let mut score = 0.0;
        let mut confidence: f64 = 0.0;
        let mut indicators = Vec::new();
        let mut risk_factors = Vec::new();

        // Rapid temperature rise over the last five samples
        if let Some(t) = temp
            && history.len() >= 2
        {
            let recent: Vec<f64> = history[history.len().saturating_sub(5)..]
                .iter()
                .filter_map(|h| h.temp)
                .collect();
            if recent.len() >= 2 {
                let rise = t - recent[0];
                if rise > c.rapid_rise {
                    score += 40.0;
                    risk_factors.push(format!("Rapid temperature rise: +{rise:.1}°C in 5min"));
                }
            }
        }

        if let Some(t) = temp.filter(|t| *t > c.temp_threshold) {
            score += (((t - c.temp_threshold) / 15.0) * 100.0).min(100.0) * c.temp_weight;
            indicators.push(format!("High temperature: {t:.1}°C"));
            if t > c.critical_temp {
                score += 30.0;
                risk_factors.push(format!("Critical temperature: {t:.1}°C"));
            }
        }

        if let Some(g) = gas.filter(|g| *g > c.gas_threshold) {
            score += (((g - c.gas_threshold) / 150.0) * 100.0).min(100.0) * c.gas_weight;
            indicators.push(format!("Elevated gas levels: {g}ppm"));
            if history.len() >= 2 {
                let recent: Vec<f64> = history[history.len().saturating_sub(3)..]
                    .iter()
                    .filter_map(|h| h.gas)
                    .collect();
                if recent.len() >= 2 && g - recent[0] > c.gas_spike {
                    score += 25.0;
                    risk_factors.push(format!("Gas spike detected: +{:.0}ppm", g - recent[0]));
                }
            }
        }

        let direct_flame = flame.is_some_and(|f| f > c.flame_threshold);
        if let Some(f) = flame {
            if direct_flame {
                score += 100.0 * c.flame_weight;
                indicators.push(format!("Flame detected: {f}"));
                confidence = 98.0;
                risk_factors.push("DIRECT FLAME DETECTION".to_string());
            } else if f > 0.0 {
                score += (f / c.flame_threshold) * 60.0 * c.flame_weight;
                indicators.push(format!("Low flame reading: {f}"));
            }
        }

        if let (Some(t), Some(g), Some(f)) = (temp, gas, signal(flame))
            && t > COMBINED_TEMP
            && g > COMBINED_GAS
            && f > COMBINED_FLAME
        {
            score += 50.0;
            risk_factors.push("Multiple threat indicators active".to_string());
        }

        if let Some(h) = snapshot.humidity.filter(|h| !h.is_nan()) {
            if h < 25.0 {
                score += 15.0;
                indicators.push(format!("Very low humidity: {h}% (increases fire risk)"));
            } else if h < 30.0 {
                score += 8.0;
                indicators.push(format!("Low humidity: {h}%"));
            }
        }

        if confidence == 0.0 {
            confidence = score.min(95.0);
            if indicators.len() >= 3 {
                confidence = (confidence + 10.0).min(98.0);
            }
            if !risk_factors.is_empty() {
                confidence = (confidence + risk_factors.len() as f64 * 5.0).min(98.0);
            }
        }

        let is_fire = score > c.fire_score || direct_flame || risk_factors.len() >= 2;
        let severity = if is_fire {
            Severity::Critical
        } else if score > 55.0 {
            Severity::Warning
        } else if score > 40.0 {
            Severity::Info
        } else {
            Severity::Normal
        };

        ThreatVerdict {
            kind: ThreatKind::Fire,
            active: is_fire,
            probability: score.min(100.0),
            confidence: confidence.round(),
            severity,
            reason: if is_fire { "Fire detected".into() } else { "No fire indicators".into() },
            indicators,
            risk_factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predict(snapshot: SensorSnapshot, history: &[SensorSnapshot]) -> ThreatVerdict {
        FireModel::default().predict(&snapshot, history)
    }

    #[test]
    fn test_direct_flame() {
        let verdict = predict(SensorSnapshot::new().with_flame(150.0), &[]);
        assert!(verdict.active);
        assert!(verdict.confidence >= 95.0);
        assert_eq!(verdict.severity, Severity::Critical);

        // other fields do not matter
        let verdict = predict(
            SensorSnapshot::new().with_flame(150.0).with_temp(20.0).with_humidity(80.0).with_gas(10.0),
            &[],
        );
        assert!(verdict.active);
        assert_eq!(verdict.confidence, 98.0);
    }

    #[test]
    fn test_quiet_snapshot() {
        let verdict = predict(SensorSnapshot::new().with_temp(22.0).with_humidity(45.0).with_gas(80.0), &[]);
        assert!(!verdict.active);
        assert_eq!(verdict.probability, 0.0);
        assert_eq!(verdict.severity, Severity::Normal);
    }

    #[test]
    fn test_critical_temperature_and_rapid_rise() {
        let history: Vec<SensorSnapshot> =
            [30.0, 35.0, 45.0, 62.0].iter().map(|t| SensorSnapshot::new().with_temp(*t)).collect();
        let verdict = predict(SensorSnapshot::new().with_temp(62.0), &history);
        // two risk factors: rapid rise and critical temperature
        assert_eq!(verdict.risk_factors.len(), 2);
        assert!(verdict.active);
    }

    #[test]
    fn test_low_humidity_alone_is_not_fire() {
        let verdict = predict(SensorSnapshot::new().with_humidity(20.0), &[]);
        assert!(!verdict.active);
        assert_eq!(verdict.probability, 15.0);
        assert_eq!(verdict.confidence, 15.0);
    }

    #[test]
    fn test_steady_zero_temperature_raises_nothing() {
        let history = vec![SensorSnapshot::new().with_temp(0.0); 5];
        let verdict = predict(SensorSnapshot::new().with_temp(0.0), &history);
        assert!(verdict.risk_factors.is_empty());
    }
}
