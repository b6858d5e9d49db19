//! # Threat Ensemble
//!
//! Five independent scorers read a [`SensorSnapshot`] and return a
//! [`ThreatVerdict`]; the [`ThreatEnsemble`] aggregates them into a
//! [`ThreatSummary`] and converts physical threats into point hazards.
//!
//! | Model | Module | Active when |
//! |-------|--------|-------------|
//! | Anomaly | `anomaly` | flagged features with mean confidence > 65 |
//! | Fire | `fire` | score > 65, direct flame, or ≥ 2 risk factors |
//! | Gas leak | `gas` | score > 70 |
//! | Intrusion | `intrusion` | motion without a recognized identity |
//! | Structural | `structural` | score > 60 |
//!
//! The per-node [`ThreatNetwork`] is separate: it scores individual route
//! nodes for the planner and does not take part in the ensemble vote.

pub mod anomaly;
pub mod fire;
pub mod gas;
pub mod intrusion;
pub mod structural;
pub mod ensemble;
pub mod network;
pub mod placement;

use serde::{Deserialize, Serialize};

use crate::model::{HazardKind, SensorSnapshot};

pub use anomaly::{AnomalyDetector, AnomalyReport, AnomalyStatus, FeatureAnomaly};
pub use fire::FireModel;
pub use gas::GasLeakModel;
pub use intrusion::IntrusionModel;
pub use structural::StructuralModel;
pub use ensemble::{ThreatEnsemble, ThreatReport, ThreatSummary};
pub use network::{NetworkInput, ThreatNetwork};
pub use placement::{FixedPoint, FixturePlacement, HazardPlacement, RandomPlacement};

// ============================================================================
// Verdicts
// ============================================================================

/// Severity classification, ordered from harmless to critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    /// Fixed operator recommendation for an overall severity.
    pub fn recommendation(&self) -> &'static str {
        match self {
            Severity::Critical => "IMMEDIATE EVACUATION REQUIRED - Contact emergency services",
            Severity::Warning => "Investigate immediately - Monitor closely",
            _ => "Normal operation - Continue monitoring",
        }
    }

    /// Hazard level a threat of this severity is projected to.
    pub fn hazard_level(&self) -> u8 {
        match self {
            Severity::Critical => 10,
            Severity::Warning => 6,
            Severity::Info => 3,
            Severity::Normal => 0,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threat category reported by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatKind {
    Anomaly,
    Fire,
    GasLeak,
    Intrusion,
    Structural,
}

impl ThreatKind {
    /// Hazard category for physical threats; `None` for the rest.
    pub fn hazard_kind(&self) -> Option<HazardKind> {
        match self {
            ThreatKind::Fire => Some(HazardKind::Fire),
            ThreatKind::GasLeak => Some(HazardKind::GasLeak),
            ThreatKind::Structural => Some(HazardKind::Structural),
            ThreatKind::Anomaly | ThreatKind::Intrusion => None,
        }
    }
}

/// Output of one model for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatVerdict {
    #[serde(rename = "type")]
    pub kind: ThreatKind,
    /// The model considers the threat present.
    pub active: bool,
    /// Raw model score, 0..=100 for the scoring models.
    pub probability: f64,
    /// 0..=100.
    pub confidence: f64,
    pub severity: Severity,
    pub indicators: Vec<String>,
    pub risk_factors: Vec<String>,
    pub reason: String,
}

impl ThreatVerdict {
    /// Verdict of a model that had nothing to score.
    pub fn inactive(kind: ThreatKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            active: false,
            probability: 0.0,
            confidence: 0.0,
            severity: Severity::Normal,
            indicators: Vec::new(),
            risk_factors: Vec::new(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Model interface
// ============================================================================

/// One scorer of the ensemble.
pub trait ThreatPredictor {
    fn kind(&self) -> ThreatKind;

    /// Score `snapshot`. `history` is oldest first and already contains
    /// `snapshot` as its last element when called from the ensemble.
    fn predict(&self, snapshot: &SensorSnapshot, history: &[SensorSnapshot]) -> ThreatVerdict;
}

/// Closed set of ensemble members.
#[derive(Debug, Clone)]
pub enum ThreatModel {
    Anomaly(AnomalyDetector),
    Fire(FireModel),
    GasLeak(GasLeakModel),
    Intrusion(IntrusionModel),
    Structural(StructuralModel),
}

impl ThreatPredictor for ThreatModel {
    fn kind(&self) -> ThreatKind {
        match self {
            ThreatModel::Anomaly(m) => m.kind(),
            ThreatModel::Fire(m) => m.kind(),
            ThreatModel::GasLeak(m) => m.kind(),
            ThreatModel::Intrusion(m) => m.kind(),
            ThreatModel::Structural(m) => m.kind(),
        }
    }

    fn predict(&self, snapshot: &SensorSnapshot, history: &[SensorSnapshot]) -> ThreatVerdict {
        match self {
            ThreatModel::Anomaly(m) => m.predict(snapshot, history),
            ThreatModel::Fire(m) => m.predict(snapshot, history),
            ThreatModel::GasLeak(m) => m.predict(snapshot, history),
            ThreatModel::Intrusion(m) => m.predict(snapshot, history),
            ThreatModel::Structural(m) => m.predict(snapshot, history),
        }
    }
}

/// Reading that carries a signal: present and a number. Zero is a reading.
pub(crate) fn signal(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}
