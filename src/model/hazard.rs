//! Point-located hazard report.

use serde::{Deserialize, Serialize};

/// Category of a hazard. Unknown categories deserialize as [`HazardKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    Fire,
    GasLeak,
    Structural,
    #[serde(untagged)]
    Other(String),
}

impl std::fmt::Display for HazardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HazardKind::Fire => f.write_str("fire"),
            HazardKind::GasLeak => f.write_str("gas_leak"),
            HazardKind::Structural => f.write_str("structural"),
            HazardKind::Other(s) => f.write_str(s),
        }
    }
}

/// Transient hazard input. Applied into node state, then discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub x: f64,
    pub y: f64,
    /// Severity 0..=10.
    pub level: u8,
    #[serde(rename = "type")]
    pub kind: HazardKind,
}

impl Hazard {
    pub fn new(x: f64, y: f64, level: u8, kind: HazardKind) -> Self {
        Self { x, y, level: level.min(10), kind }
    }

    pub fn fire(x: f64, y: f64, level: u8) -> Self {
        Self::new(x, y, level, HazardKind::Fire)
    }

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }
}
