//! Intrusion scorer: motion without a recognized identity.

use crate::model::SensorSnapshot;
use super::{Severity, ThreatKind, ThreatPredictor, ThreatVerdict};

/// Identities reported by face recognition for unrecognized people.
const UNRECOGNIZED: [&str; 2] = ["Intruder", "Unknown"];

#[derive(Debug, Clone, Copy, Default)]
pub struct IntrusionModel;

impl ThreatPredictor for IntrusionModel {
    fn kind(&self) -> ThreatKind {
        ThreatKind::Intrusion
    }

    fn predict(&self, snapshot: &SensorSnapshot, _history: &[SensorSnapshot]) -> ThreatVerdict {
        if snapshot.motion != Some(true) {
            return ThreatVerdict::inactive(ThreatKind::Intrusion, "No motion detected");
        }

        match snapshot.name.as_deref() {
            Some(name) if !name.is_empty() && !UNRECOGNIZED.contains(&name) => ThreatVerdict {
                confidence: 85.0,
                severity: Severity::Info,
                ..ThreatVerdict::inactive(ThreatKind::Intrusion, format!("Known person: {name}"))
            },
            _ => ThreatVerdict {
                active: true,
                confidence: 75.0,
                severity: Severity::Warning,
                ..ThreatVerdict::inactive(ThreatKind::Intrusion, "Unknown person detected")
            },
        }
    }
}
