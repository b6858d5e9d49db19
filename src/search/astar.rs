//! A* over learned edge costs.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::grid::BuildingGrid;
use crate::model::NodeId;
use super::dijkstra::walk_back;
use super::{Algorithm, Cost, Heuristic, NodeWeights, PathFinder, PathResult, weighted_cost};

/// A* guided by the calibrated Manhattan-plus-floors heuristic.
///
/// Each edge costs `weight × optimized_weight(target)`. Closed nodes are
/// re-opened when a cheaper route to them turns up.
#[derive(Debug, Clone, Copy, Default)]
pub struct AStar;

impl AStar {
    pub fn search(
        grid: &BuildingGrid,
        weights: &dyn NodeWeights,
        start: NodeId,
        target: NodeId,
    ) -> PathResult {
        if !grid.contains(start) || !grid.contains(target) {
            return PathResult::invalid();
        }

        let heuristic = Heuristic::calibrate(grid, weights);
        let goal = grid.node(target);
        let n = grid.len();
        let mut g_score = vec![f64::INFINITY; n];
        let mut came_from: Vec<Option<NodeId>> = vec![None; n];
        let mut closed = vec![false; n];
        let mut open = BinaryHeap::new();

        g_score[start.0] = 0.0;
        open.push(Reverse((Cost(heuristic.estimate(grid.node(start), goal)), start)));

        while let Some(Reverse((Cost(f), current))) = open.pop() {
            if closed[current.0] {
                continue;
            }
            // Outdated entry for a node that was improved after being queued.
            let h = heuristic.estimate(grid.node(current), goal);
            if f > g_score[current.0] + h {
                continue;
            }
            if current == target {
                return PathResult::found(walk_back(&came_from, target), g_score[target.0]);
            }
            closed[current.0] = true;

            for edge in grid.edges(current) {
                let neighbor = grid.node(edge.target);
                if neighbor.blocked {
                    continue;
                }
                let tentative = g_score[current.0] + weighted_cost(edge.weight, neighbor, weights);
                if tentative < g_score[neighbor.index.0] {
                    g_score[neighbor.index.0] = tentative;
                    came_from[neighbor.index.0] = Some(current);
                    closed[neighbor.index.0] = false;
                    let f = tentative + heuristic.estimate(neighbor, goal);
                    open.push(Reverse((Cost(f), neighbor.index)));
                }
            }
        }

        tracing::debug!(start = %grid.node(start).id, target = %goal.id, "A*: no path");
        PathResult::unreachable()
    }
}

impl PathFinder for AStar {
    fn algorithm(&self) -> Algorithm {
        Algorithm::AStar
    }

    fn find_path(
        &mut self,
        grid: &BuildingGrid,
        weights: &dyn NodeWeights,
        start: NodeId,
        target: NodeId,
    ) -> PathResult {
        Self::search(grid, weights, start, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HazardConfig, LayoutConfig};
    use crate::model::{Hazard, Node};
    use crate::search::{Dijkstra, UniformWeights, path_cost};

    fn grid() -> BuildingGrid {
        BuildingGrid::new(LayoutConfig::default(), HazardConfig::default())
    }

    /// Doubles the cost of entering one node.
    struct Penalize(NodeId);

    impl NodeWeights for Penalize {
        fn optimized_weight(&self, node: &Node) -> f64 {
            if node.index == self.0 { 2.0 } else { 1.0 }
        }
    }

    #[test]
    fn test_matches_dijkstra_without_learning() {
        let g = grid();
        let start = g.lookup("node-3-3-1-1").unwrap();
        for stair in g.staircases(1) {
            let a = AStar::search(&g, &UniformWeights, start, stair);
            let d = Dijkstra::shortest_path(&g, start, stair);
            assert!((a.cost() - d.cost()).abs() < 1e-9, "{} vs {}", a.cost(), d.cost());
        }
    }

    #[test]
    fn test_distance_equals_path_cost() {
        let g = grid();
        let start = g.lookup("node-2-1-0-2").unwrap();
        let target = g.lookup("exit-2-1").unwrap();
        let result = AStar::search(&g, &UniformWeights, start, target);
        let cost = path_cost(&g, &UniformWeights, &result.path);
        assert!((result.cost() - cost).abs() < 1e-9);
    }

    #[test]
    fn test_learned_weight_changes_cost() {
        let g = grid();
        let start = g.lookup("node-1-0-0-0").unwrap();
        let target = g.lookup("node-1-0-0-1").unwrap();
        let plain = AStar::search(&g, &UniformWeights, start, target);
        let penalized = AStar::search(&g, &Penalize(target), start, target);
        assert!(penalized.cost() > plain.cost());
    }

    #[test]
    fn test_never_routes_through_blocked() {
        let mut g = grid();
        g.apply_hazards(2, &[Hazard::fire(8.0, 7.0, 10)]);
        let start = g.lookup("node-2-0-0-0").unwrap();
        let target = g.lookup("node-2-1-1-2").unwrap();
        let result = AStar::search(&g, &UniformWeights, start, target);
        assert!(result.is_found());
        assert!(result.path.iter().all(|&id| !g.node(id).blocked));
    }
}
