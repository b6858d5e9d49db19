//! Route artifacts produced by the planner.
//!
//! Created fresh per query and never mutated afterwards.

use serde::{Deserialize, Serialize};
use super::{Node, NodeKind};

/// One hop of a route as exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
    pub floor: u32,
}

impl From<&Node> for RouteStep {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            kind: node.kind,
            x: node.x,
            y: node.y,
            floor: node.floor,
        }
    }
}

/// Per-node threat estimate along a route, each component in (0, 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeThreat {
    pub fire_threat: f64,
    pub gas_threat: f64,
    pub structural_threat: f64,
    pub overall_threat: f64,
}

/// Multi-objective score breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub total_score: f64,
    pub time_score: f64,
    pub safety_score: f64,
    pub capacity_score: f64,
}

/// A candidate evacuation route toward one egress node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub path: Vec<RouteStep>,
    /// `None` when the egress is unreachable.
    pub distance: Option<f64>,
    pub steps: usize,
    pub evacuation_node_id: String,
    pub threats: Vec<NodeThreat>,
    pub avg_threat: f64,
    pub score: ScoreBreakdown,
    pub rl_recommended: bool,
    /// Seconds, `None` when unreachable.
    pub estimated_time: Option<f64>,
}

impl Route {
    pub fn is_reachable(&self) -> bool {
        self.distance.is_some() && !self.path.is_empty()
    }
}

/// Summary of the analysis behind the chosen route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub confidence: f64,
    pub overall_threat: f64,
    pub multi_objective_score: f64,
}

/// Full answer to a route request. Always produced, possibly with no route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub best_route: Option<Route>,
    pub all_routes: Vec<Route>,
    pub top_alternatives: Vec<Route>,
    pub ai_analysis: AiAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RouteResult {
    /// Result carrying no route and an explanation.
    pub fn no_route(reason: impl Into<String>) -> Self {
        Self {
            best_route: None,
            all_routes: Vec::new(),
            top_alternatives: Vec::new(),
            ai_analysis: AiAnalysis::default(),
            error: Some(reason.into()),
        }
    }

    pub fn found(&self) -> bool {
        self.best_route.as_ref().is_some_and(Route::is_reachable)
    }
}
