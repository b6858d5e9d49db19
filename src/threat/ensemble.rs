//! Ensemble aggregation of the five threat models.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{LayoutConfig, ThreatConfig};
use crate::model::{Hazard, SensorSnapshot};
use super::{
    AnomalyDetector, FireModel, GasLeakModel, HazardPlacement, IntrusionModel, Severity,
    StructuralModel, ThreatKind, ThreatModel, ThreatPredictor, ThreatVerdict,
};

/// One active threat as reported to collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatReport {
    #[serde(rename = "type")]
    pub kind: ThreatKind,
    pub severity: Severity,
    pub confidence: f64,
    pub message: String,
}

/// Aggregated verdict for one floor snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatSummary {
    pub floor: u32,
    pub timestamp: DateTime<Utc>,
    pub overall_threat_level: Severity,
    /// Highest confidence among reported threats, 0..=100.
    pub overall_confidence: f64,
    pub threats: Vec<ThreatReport>,
    /// Raw output of every model, active or not.
    pub predictions: Vec<ThreatVerdict>,
    pub recommendation: String,
}

impl ThreatSummary {
    pub fn has_threat(&self, kind: ThreatKind) -> bool {
        self.threats.iter().any(|t| t.kind == kind)
    }
}

/// The five models plus the shared snapshot history.
#[derive(Debug, Clone)]
pub struct ThreatEnsemble {
    models: Vec<ThreatModel>,
    history: VecDeque<SensorSnapshot>,
    max_history: usize,
    fire_history: usize,
    report_threshold: f64,
}

impl Default for ThreatEnsemble {
    fn default() -> Self {
        Self::new(&ThreatConfig::default())
    }
}

impl ThreatEnsemble {
    pub fn new(config: &ThreatConfig) -> Self {
        Self {
            models: vec![
                ThreatModel::Anomaly(AnomalyDetector::new(config.anomaly.clone())),
                ThreatModel::Fire(FireModel::new(config.fire.clone())),
                ThreatModel::GasLeak(GasLeakModel::new(config)),
                ThreatModel::Intrusion(IntrusionModel),
                ThreatModel::Structural(StructuralModel::new(config)),
            ],
            history: VecDeque::new(),
            max_history: config.anomaly.max_history,
            fire_history: config.fire_history,
            report_threshold: config.anomaly.report_threshold,
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Bulk-load historical snapshots, oldest first, into the shared history
    /// without scoring them. Returns the number of snapshots loaded; only the
    /// most recent `max_history` are retained.
    pub fn train(&mut self, snapshots: &[SensorSnapshot]) -> usize {
        self.history.extend(snapshots.iter().cloned());
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
        tracing::info!(loaded = snapshots.len(), retained = self.history.len(), "threat history trained");
        snapshots.len()
    }

    /// Append `snapshot` to the history, then run every model on it.
    pub fn predict(&mut self, floor: u32, snapshot: &SensorSnapshot) -> ThreatSummary {
        self.history.push_back(snapshot.clone());
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }

        let history: &[SensorSnapshot] = self.history.make_contiguous();
        let recent = &history[history.len().saturating_sub(self.fire_history)..];

        let predictions: Vec<ThreatVerdict> = self
            .models
            .iter()
            .map(|model| match model.kind() {
                ThreatKind::Fire => model.predict(snapshot, recent),
                _ => model.predict(snapshot, history),
            })
            .collect();

        let threats: Vec<ThreatReport> = predictions
            .iter()
            .filter(|v| v.active)
            .filter(|v| v.kind != ThreatKind::Anomaly || v.confidence > self.report_threshold)
            .map(|v| ThreatReport {
                kind: v.kind,
                severity: v.severity,
                confidence: v.confidence,
                message: message(v),
            })
            .collect();

        let overall = threats.iter().map(|t| t.severity).fold(Severity::Info, Severity::max);
        let confidence = threats.iter().map(|t| t.confidence).fold(0.0, f64::max);

        if overall >= Severity::Warning {
            tracing::info!(floor, level = %overall, threats = threats.len(), "threats detected");
        }

        ThreatSummary {
            floor,
            timestamp: Utc::now(),
            overall_threat_level: overall,
            overall_confidence: confidence,
            recommendation: overall.recommendation().to_string(),
            threats,
            predictions,
        }
    }

    /// Project the physical threats of a summary onto point hazards.
    pub fn to_hazards(
        summary: &ThreatSummary,
        placement: &mut dyn HazardPlacement,
        layout: &LayoutConfig,
    ) -> Vec<Hazard> {
        summary
            .threats
            .iter()
            .filter_map(|threat| {
                let kind = threat.kind.hazard_kind()?;
                let level = threat.severity.hazard_level();
                if level == 0 {
                    return None;
                }
                let (x, y) = placement.place(summary.floor, threat.kind, layout);
                Some(Hazard::new(x, y, level, kind))
            })
            .collect()
    }
}

fn message(verdict: &ThreatVerdict) -> String {
    let indicators = verdict.indicators.join(", ");
    match verdict.kind {
        ThreatKind::Fire => format!("Fire detected: {indicators}"),
        ThreatKind::GasLeak => format!("Gas leak detected: {indicators}"),
        ThreatKind::Structural => format!("Structural threat: {indicators}"),
        ThreatKind::Intrusion | ThreatKind::Anomaly => verdict.reason.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HazardKind;
    use crate::threat::{FixedPoint, FixturePlacement};

    #[test]
    fn test_quiet_floor() {
        let mut ensemble = ThreatEnsemble::default();
        let summary = ensemble.predict(1, &SensorSnapshot::new().with_temp(22.0).with_humidity(45.0));
        assert!(summary.threats.is_empty());
        assert_eq!(summary.overall_threat_level, Severity::Info);
        assert_eq!(summary.overall_confidence, 0.0);
        assert_eq!(summary.recommendation, "Normal operation - Continue monitoring");
        assert_eq!(summary.predictions.len(), 5);
    }

    #[test]
    fn test_fire_is_critical() {
        let mut ensemble = ThreatEnsemble::default();
        let summary = ensemble.predict(2, &SensorSnapshot::new().with_flame(150.0));
        assert!(summary.has_threat(ThreatKind::Fire));
        assert_eq!(summary.overall_threat_level, Severity::Critical);
        assert_eq!(summary.overall_confidence, 98.0);
        assert_eq!(summary.recommendation, "IMMEDIATE EVACUATION REQUIRED - Contact emergency services");
    }

    #[test]
    fn test_intrusion_raises_to_warning() {
        let mut ensemble = ThreatEnsemble::default();
        let summary = ensemble.predict(3, &SensorSnapshot::new().with_motion(true));
        assert_eq!(summary.overall_threat_level, Severity::Warning);
        assert_eq!(summary.threats[0].message, "Unknown person detected");
    }

    #[test]
    fn test_history_is_bounded() {
        let mut config = ThreatConfig::default();
        config.anomaly.max_history = 30;
        let mut ensemble = ThreatEnsemble::new(&config);
        for _ in 0..50 {
            ensemble.predict(1, &SensorSnapshot::new().with_temp(25.0));
        }
        assert_eq!(ensemble.history_len(), 30);
    }

    #[test]
    fn test_anomaly_reported_after_warmup() {
        let mut ensemble = ThreatEnsemble::default();
        for i in 0..50 {
            let temp = if i % 2 == 0 { 24.0 } else { 26.0 };
            let summary = ensemble.predict(1, &SensorSnapshot::new().with_temp(temp));
            assert!(!summary.has_threat(ThreatKind::Anomaly));
        }
        let summary = ensemble.predict(1, &SensorSnapshot::new().with_temp(30.0));
        assert!(summary.has_threat(ThreatKind::Anomaly));
        assert_eq!(summary.overall_threat_level, Severity::Warning);
    }

    #[test]
    fn test_trained_history_enables_anomaly_detection() {
        let spike = SensorSnapshot::new().with_temp(30.0);
        let cold = ThreatEnsemble::default().predict(1, &spike);
        assert!(!cold.has_threat(ThreatKind::Anomaly));

        let history: Vec<SensorSnapshot> = (0..50)
            .map(|i| SensorSnapshot::new().with_temp(if i % 2 == 0 { 24.0 } else { 26.0 }))
            .collect();
        let mut ensemble = ThreatEnsemble::default();
        assert_eq!(ensemble.train(&history), 50);
        assert_eq!(ensemble.history_len(), 50);

        let summary = ensemble.predict(1, &spike);
        assert!(summary.has_threat(ThreatKind::Anomaly));
    }

    #[test]
    fn test_training_respects_history_bound() {
        let mut config = ThreatConfig::default();
        config.anomaly.max_history = 30;
        let mut ensemble = ThreatEnsemble::new(&config);
        let history = vec![SensorSnapshot::new().with_temp(25.0); 45];
        assert_eq!(ensemble.train(&history), 45);
        assert_eq!(ensemble.history_len(), 30);
    }

    #[test]
    fn test_hazards_from_physical_threats_only() {
        let mut ensemble = ThreatEnsemble::default();
        let snapshot = SensorSnapshot::new().with_flame(150.0).with_motion(true).with_gas(650.0);
        let summary = ensemble.predict(2, &snapshot);
        let layout = LayoutConfig::default();

        let hazards = ThreatEnsemble::to_hazards(&summary, &mut FixturePlacement, &layout);
        assert_eq!(hazards.len(), 2);
        assert!(hazards.iter().all(|h| h.level == 10 && h.x == 8.0 && h.y == 7.0));
        assert!(hazards.iter().any(|h| h.kind == HazardKind::GasLeak));

        let hazards = ThreatEnsemble::to_hazards(&summary, &mut FixedPoint::new(2.0, 3.0), &layout);
        assert!(hazards.iter().all(|h| (h.x, h.y) == (2.0, 3.0)));
    }
}
