//! # Path Search
//!
//! Three interchangeable shortest-path algorithms over a [`BuildingGrid`]:
//!
//! | Algorithm | Module | Edge cost | Incremental |
//! |-----------|--------|-----------|-------------|
//! | Dijkstra | `dijkstra` | structural weight | no |
//! | A* | `astar` | weight × learned node weight | no |
//! | D*-Lite | `dstar_lite` | weight × learned node weight | yes (`update_path`) |
//!
//! None of them fail: invalid or unreachable endpoints produce a
//! [`PathResult`] with no distance and an empty path.

pub mod dijkstra;
pub mod astar;
pub mod dstar_lite;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::grid::BuildingGrid;
use crate::model::{Node, NodeId};

pub use dijkstra::Dijkstra;
pub use astar::AStar;
pub use dstar_lite::DStarLite;

// ============================================================================
// Result
// ============================================================================

/// Why a search produced no path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathError {
    InvalidNode,
    Unreachable,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::InvalidNode => f.write_str("Invalid node IDs"),
            PathError::Unreachable => f.write_str("No path found"),
        }
    }
}

/// Outcome of one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    /// Start first, target last. Empty when no path exists.
    pub path: Vec<NodeId>,
    /// Accumulated cost; `None` when no path exists.
    pub distance: Option<f64>,
    pub error: Option<PathError>,
}

impl PathResult {
    pub fn found(path: Vec<NodeId>, distance: f64) -> Self {
        Self { path, distance: Some(distance), error: None }
    }

    pub fn invalid() -> Self {
        Self { path: Vec::new(), distance: None, error: Some(PathError::InvalidNode) }
    }

    pub fn unreachable() -> Self {
        Self { path: Vec::new(), distance: None, error: Some(PathError::Unreachable) }
    }

    pub fn steps(&self) -> usize {
        self.path.len()
    }

    pub fn is_found(&self) -> bool {
        self.distance.is_some()
    }

    /// Distance with `+∞` standing for "no path".
    pub fn cost(&self) -> f64 {
        self.distance.unwrap_or(f64::INFINITY)
    }
}

// ============================================================================
// Seams
// ============================================================================

/// Per-node multiplier applied to edge costs by the weighted searches.
pub trait NodeWeights {
    fn optimized_weight(&self, node: &Node) -> f64;
}

/// Every node weighs 1.0: weighted searches degrade to structural costs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformWeights;

impl NodeWeights for UniformWeights {
    fn optimized_weight(&self, _node: &Node) -> f64 {
        1.0
    }
}

/// Common interface of the three algorithms.
pub trait PathFinder {
    fn algorithm(&self) -> Algorithm;

    fn find_path(
        &mut self,
        grid: &BuildingGrid,
        weights: &dyn NodeWeights,
        start: NodeId,
        target: NodeId,
    ) -> PathResult;
}

/// Algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Dijkstra,
    AStar,
    DStarLite,
}

impl Algorithm {
    /// Fresh finder for this algorithm.
    pub fn finder(&self, max_expansions: usize) -> Box<dyn PathFinder> {
        match self {
            Algorithm::Dijkstra => Box::new(Dijkstra),
            Algorithm::AStar => Box::new(AStar),
            Algorithm::DStarLite => Box::new(DStarLite::new(max_expansions)),
        }
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Totally ordered cost for priority queues. `+∞` sorts last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Cost(pub f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Cost of traversing `edge_weight` into `target` under learned weights.
pub(crate) fn weighted_cost(edge_weight: f64, target: &Node, weights: &dyn NodeWeights) -> f64 {
    if target.blocked || !edge_weight.is_finite() {
        return f64::INFINITY;
    }
    edge_weight * weights.optimized_weight(target)
}

/// Manhattan-plus-floors heuristic, scaled to stay consistent.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Heuristic {
    scale: f64,
    floor_height: f64,
}

impl Heuristic {
    /// Calibrate against the current edge costs.
    ///
    /// The raw estimate overshoots discounted and vertical edges. The scale is
    /// the largest `s ≤ 1` with `s · h(u, v) ≤ cost(u, v)` on every finite edge,
    /// which keeps `s · h` consistent and the searches exact.
    pub fn calibrate(grid: &BuildingGrid, weights: &dyn NodeWeights) -> Self {
        let floor_height = grid.layout().floor_height;
        let mut scale: f64 = 1.0;
        for node in grid.nodes() {
            for edge in grid.edges(node.index) {
                let target = grid.node(edge.target);
                let cost = weighted_cost(edge.weight, target, weights);
                let estimate = node.manhattan(target, floor_height);
                if cost.is_finite() && estimate > 0.0 {
                    scale = scale.min(cost / estimate);
                }
            }
        }
        Self { scale: scale.max(0.0), floor_height }
    }

    pub fn estimate(&self, from: &Node, to: &Node) -> f64 {
        self.scale * from.manhattan(to, self.floor_height)
    }

    #[cfg(test)]
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

/// Sum of weighted costs along a path, for cross-checking results.
pub fn path_cost(grid: &BuildingGrid, weights: &dyn NodeWeights, path: &[NodeId]) -> f64 {
    path.windows(2)
        .map(|pair| {
            let weight = grid.edge_weight(pair[0], pair[1]).unwrap_or(f64::INFINITY);
            weighted_cost(weight, grid.node(pair[1]), weights)
        })
        .sum()
}
