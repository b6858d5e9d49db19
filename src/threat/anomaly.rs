//! Statistical anomaly detector.
//!
//! Each numeric feature present in the snapshot is tested three ways against
//! the history: Z-score, IQR fence and deviation from a moving average. The
//! three votes are weighted into a 0..=100 score per feature.

use serde::{Deserialize, Serialize};

use crate::config::AnomalyConfig;
use crate::model::{Feature, SensorSnapshot};
use super::{Severity, ThreatKind, ThreatPredictor, ThreatVerdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyStatus {
    /// Fewer history points than the detector needs.
    InsufficientData,
    Normal,
    Anomalous,
}

/// One feature that crossed the ensemble threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAnomaly {
    pub feature: Feature,
    pub value: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub z_score: f64,
    pub iqr_outlier: bool,
    pub moving_avg_deviation: f64,
    pub score: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    pub status: AnomalyStatus,
    /// Mean confidence of the flagged features, 0..=100.
    pub confidence: f64,
    pub anomalies: Vec<FeatureAnomaly>,
    pub reason: String,
}

impl AnomalyReport {
    pub fn is_anomaly(&self) -> bool {
        self.status == AnomalyStatus::Anomalous
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Evaluate `snapshot` against `history` (oldest first).
    pub fn detect(&self, snapshot: &SensorSnapshot, history: &[SensorSnapshot]) -> AnomalyReport {
        if history.len() < self.config.min_history {
            return AnomalyReport {
                status: AnomalyStatus::InsufficientData,
                confidence: 0.0,
                anomalies: Vec::new(),
                reason: "Insufficient data for accurate detection".into(),
            };
        }

        let anomalies: Vec<FeatureAnomaly> = Feature::ALL
            .iter()
            .filter_map(|&feature| {
                let value = snapshot.feature(feature)?;
                let values: Vec<f64> = history.iter().filter_map(|h| h.feature(feature)).collect();
                if values.len() < self.config.min_feature_samples {
                    return None;
                }
                self.score_feature(feature, value, &values)
            })
            .collect();

        let confidence = if anomalies.is_empty() {
            0.0
        } else {
            anomalies.iter().map(|a| a.confidence).sum::<f64>() / anomalies.len() as f64
        };
        let anomalous = !anomalies.is_empty() && confidence > self.config.overall_threshold;

        AnomalyReport {
            status: if anomalous { AnomalyStatus::Anomalous } else { AnomalyStatus::Normal },
            confidence: confidence.min(100.0),
            reason: if anomalous {
                format!("Detected {} anomalous features using ensemble methods", anomalies.len())
            } else {
                "Normal operation".into()
            },
            anomalies,
        }
    }

    fn score_feature(&self, feature: Feature, value: f64, values: &[f64]) -> Option<FeatureAnomaly> {
        let c = &self.config;
        let (mean, std_dev) = mean_std(values);

        let z_score = if std_dev == 0.0 { 0.0 } else { ((value - mean) / std_dev).abs() };

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let q1 = sorted[sorted.len() / 4];
        let q3 = sorted[sorted.len() * 3 / 4];
        let iqr = q3 - q1;
        let iqr_outlier = value < q1 - c.iqr_multiplier * iqr || value > q3 + c.iqr_multiplier * iqr;

        let recent = &values[values.len().saturating_sub(c.moving_window)..];
        let (moving_avg, moving_std) = mean_std(recent);
        let spread = if moving_std == 0.0 { 1.0 } else { moving_std };
        let moving_avg_deviation = (value - moving_avg).abs() / spread;

        let mut score = 0.0;
        if z_score > c.z_threshold {
            score += c.weight_z;
        }
        if iqr_outlier {
            score += c.weight_iqr;
        }
        if moving_avg_deviation > c.moving_sigma {
            score += c.weight_moving;
        }
        score *= 100.0;

        (score > c.feature_threshold).then(|| FeatureAnomaly {
            feature,
            value,
            mean,
            std_dev,
            z_score,
            iqr_outlier,
            moving_avg_deviation,
            score,
            confidence: (score + z_score * 10.0).min(100.0),
        })
    }
}

/// Population mean and standard deviation.
fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

impl ThreatPredictor for AnomalyDetector {
    fn kind(&self) -> ThreatKind {
        ThreatKind::Anomaly
    }

    fn predict(&self, snapshot: &SensorSnapshot, history: &[SensorSnapshot]) -> ThreatVerdict {
        let report = self.detect(snapshot, history);
        let active = report.is_anomaly();
        ThreatVerdict {
            kind: ThreatKind::Anomaly,
            active,
            probability: report.anomalies.iter().map(|a| a.score).fold(0.0, f64::max),
            confidence: report.confidence,
            severity: if active { Severity::Warning } else { Severity::Normal },
            indicators: report
                .anomalies
                .iter()
                .map(|a| format!("{}: {} (mean {:.1}, z {:.1})", a.feature.as_str(), a.value, a.mean, a.z_score))
                .collect(),
            risk_factors: Vec::new(),
            reason: report.reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stable_history(n: usize) -> Vec<SensorSnapshot> {
        (0..n)
            .map(|i| SensorSnapshot::new().with_temp(if i % 2 == 0 { 24.0 } else { 26.0 }))
            .collect()
    }

    #[test]
    fn test_insufficient_history() {
        let detector = AnomalyDetector::default();
        let history = stable_history(19);
        let report = detector.detect(&SensorSnapshot::new().with_temp(90.0), &history);
        assert_eq!(report.status, AnomalyStatus::InsufficientData);
        assert_eq!(report.confidence, 0.0);
    }

    #[test]
    fn test_flags_five_sigma_spike() {
        let detector = AnomalyDetector::default();
        let spike = SensorSnapshot::new().with_temp(30.0);
        let mut history = stable_history(50);
        history.push(spike.clone());

        let report = detector.detect(&spike, &history);
        assert!(report.is_anomaly());
        assert_eq!(report.anomalies.len(), 1);
        let temp = &report.anomalies[0];
        assert_eq!(temp.feature, Feature::Temp);
        assert!(temp.iqr_outlier);
        assert!(temp.z_score > 2.5);
        assert_eq!(temp.score, 100.0);
        assert!(report.confidence > 80.0);
    }

    #[test]
    fn test_in_range_value_is_normal() {
        let detector = AnomalyDetector::default();
        let reading = SensorSnapshot::new().with_temp(25.0);
        let mut history = stable_history(50);
        history.push(reading.clone());
        let report = detector.detect(&reading, &history);
        assert_eq!(report.status, AnomalyStatus::Normal);
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn test_absent_feature_is_not_scored() {
        let detector = AnomalyDetector::default();
        let history = stable_history(50);
        // gas has no history and is absent from the snapshot
        let report = detector.detect(&SensorSnapshot::new(), &history);
        assert_eq!(report.status, AnomalyStatus::Normal);
    }

    #[test]
    fn test_sparse_feature_needs_samples() {
        let detector = AnomalyDetector::default();
        let mut history = stable_history(30);
        for snapshot in history.iter_mut().take(9) {
            snapshot.gas = Some(100.0);
        }
        let report = detector.detect(&SensorSnapshot::new().with_gas(900.0), &history);
        assert!(report.anomalies.is_empty());
    }
}
