//! Evacuation outcome records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::NodeId;

/// Outcome reported by a collaborator after an evacuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvacuationOutcome {
    /// External node ids along the route, start first.
    pub route: Vec<String>,
    pub success: bool,
    /// Seconds.
    pub time_taken: f64,
    pub occupancy: u32,
}

impl EvacuationOutcome {
    pub fn new(route: Vec<String>, success: bool, time_taken: f64, occupancy: u32) -> Self {
        Self { route, success, time_taken, occupancy }
    }
}

/// Outcome as retained in the bounded history, with ids resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub route: Vec<NodeId>,
    pub success: bool,
    pub time_taken: f64,
    pub occupancy: u32,
    pub recorded_at: DateTime<Utc>,
}
