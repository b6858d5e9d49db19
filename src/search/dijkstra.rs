//! Baseline shortest path over structural edge weights.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::grid::BuildingGrid;
use crate::model::NodeId;
use super::{Algorithm, Cost, NodeWeights, PathFinder, PathResult};

/// Classic Dijkstra. Ignores learned weights; skips blocked neighbors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dijkstra;

impl Dijkstra {
    pub fn shortest_path(grid: &BuildingGrid, start: NodeId, target: NodeId) -> PathResult {
        if !grid.contains(start) || !grid.contains(target) {
            return PathResult::invalid();
        }

        let n = grid.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut previous: Vec<Option<NodeId>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut queue = BinaryHeap::new();

        dist[start.0] = 0.0;
        queue.push(Reverse((Cost(0.0), start)));

        while let Some(Reverse((Cost(d), current))) = queue.pop() {
            if visited[current.0] {
                continue;
            }
            visited[current.0] = true;
            if current == target {
                break;
            }

            for edge in grid.edges(current) {
                let next = edge.target;
                if visited[next.0] || grid.node(next).blocked {
                    continue;
                }
                let alt = d + edge.weight;
                if alt < dist[next.0] {
                    dist[next.0] = alt;
                    previous[next.0] = Some(current);
                    queue.push(Reverse((Cost(alt), next)));
                }
            }
        }

        if !dist[target.0].is_finite() {
            return PathResult::unreachable();
        }
        PathResult::found(walk_back(&previous, target), dist[target.0])
    }
}

/// Rebuild a path from predecessor links, start first.
pub(crate) fn walk_back(previous: &[Option<NodeId>], target: NodeId) -> Vec<NodeId> {
    let mut path = vec![target];
    let mut current = target;
    while let Some(prev) = previous[current.0] {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

impl PathFinder for Dijkstra {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Dijkstra
    }

    fn find_path(
        &mut self,
        grid: &BuildingGrid,
        _weights: &dyn NodeWeights,
        start: NodeId,
        target: NodeId,
    ) -> PathResult {
        Self::shortest_path(grid, start, target)
    }
}
