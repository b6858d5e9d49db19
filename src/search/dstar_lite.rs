//! D*-Lite: incremental re-planning seeded from the target.
//!
//! `g` is the settled cost-to-target of a node, `rhs` its one-step lookahead
//! `min(cost(u, v) + g(v))`. A node is locally inconsistent when `g ≠ rhs` and
//! sits in the open queue keyed by
//! `(min(g, rhs) + h(start, u) + km, min(g, rhs))`, compared lexicographically.
//!
//! After edge costs change, [`DStarLite::update_path`] repairs only the
//! affected vertices instead of searching from scratch. Every edge into a node
//! costs its structural length times that node's entry factor (learned weight,
//! hazard level, blocked flag), so the planner keeps the factors it last
//! planned with and re-updates every node whose factor has since moved.
//!
//! Predecessors are read from the outgoing edge lists: the building graph
//! links every pair in both directions (weights may differ per direction).

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use hashbrown::HashMap;

use crate::grid::BuildingGrid;
use crate::model::NodeId;
use super::{Algorithm, Cost, Heuristic, NodeWeights, PathFinder, PathResult, weighted_cost};

/// Priority key, compared lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Key(Cost, Cost);

impl Key {
    const INFINITE: Key = Key(Cost(f64::INFINITY), Cost(f64::INFINITY));
}

/// Planner state. Reusable across `find_path` / `update_path` calls.
#[derive(Debug, Clone)]
pub struct DStarLite {
    max_expansions: usize,
    g: Vec<f64>,
    rhs: Vec<f64>,
    /// Current key of each open node; queue entries disagreeing with it are stale.
    open: HashMap<NodeId, Key>,
    queue: BinaryHeap<Reverse<(Key, NodeId)>>,
    km: f64,
    start: Option<NodeId>,
    target: Option<NodeId>,
    heuristic: Option<Heuristic>,
    /// Entry factor of every node as of the last plan or repair.
    entry: Vec<f64>,
    expansions: usize,
}

impl Default for DStarLite {
    fn default() -> Self {
        Self::new(100_000)
    }
}

impl DStarLite {
    pub fn new(max_expansions: usize) -> Self {
        Self {
            max_expansions,
            g: Vec::new(),
            rhs: Vec::new(),
            open: HashMap::new(),
            queue: BinaryHeap::new(),
            km: 0.0,
            start: None,
            target: None,
            heuristic: None,
            entry: Vec::new(),
            expansions: 0,
        }
    }

    pub fn start(&self) -> Option<NodeId> {
        self.start
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn key_modifier(&self) -> f64 {
        self.km
    }

    /// Vertex expansions performed by the last shortest-path computation.
    pub fn last_expansions(&self) -> usize {
        self.expansions
    }

    /// Settled cost-to-target of a node (`+∞` if unknown).
    pub fn g(&self, id: NodeId) -> f64 {
        self.g.get(id.0).copied().unwrap_or(f64::INFINITY)
    }

    pub fn rhs(&self, id: NodeId) -> f64 {
        self.rhs.get(id.0).copied().unwrap_or(f64::INFINITY)
    }

    // ========================================================================
    // Public operations
    // ========================================================================

    /// Plan from scratch.
    pub fn find_path(
        &mut self,
        grid: &BuildingGrid,
        weights: &dyn NodeWeights,
        start: NodeId,
        target: NodeId,
    ) -> PathResult {
        if !grid.contains(start) || !grid.contains(target) {
            return PathResult::invalid();
        }

        let n = grid.len();
        self.g = vec![f64::INFINITY; n];
        self.rhs = vec![f64::INFINITY; n];
        self.open.clear();
        self.queue.clear();
        self.km = 0.0;
        self.start = Some(start);
        self.target = Some(target);
        self.heuristic = Some(Heuristic::calibrate(grid, weights));
        self.entry = entry_factors(grid, weights);

        self.rhs[target.0] = 0.0;
        let key = self.calculate_key(grid, target);
        self.push(target, key);

        self.compute_shortest_path(grid, weights);
        self.extract_path(grid, weights)
    }

    /// Re-plan after edge costs moved.
    ///
    /// `changed` names nodes known to have changed (the hazard diff). Nodes
    /// whose entry factor differs from the one recorded at the last plan are
    /// added to it, which covers learned-weight, statistics and occupancy
    /// updates made since. Bumps the key modifier by the start's heuristic
    /// estimate, re-updates the changed nodes and their neighbors (the
    /// sources of every edge whose cost changed), then resumes the
    /// shortest-path loop.
    pub fn update_path(
        &mut self,
        grid: &BuildingGrid,
        weights: &dyn NodeWeights,
        changed: &[NodeId],
    ) -> PathResult {
        let (Some(start), Some(target)) = (self.start, self.target) else {
            return PathResult::invalid();
        };
        if self.g.len() != grid.len() || self.entry.len() != grid.len() {
            return self.find_path(grid, weights, start, target);
        }

        let current = entry_factors(grid, weights);
        let mut dirty: Vec<NodeId> = changed.iter().copied().filter(|id| grid.contains(*id)).collect();
        dirty.extend(
            current
                .iter()
                .zip(&self.entry)
                .enumerate()
                .filter(|(_, (now, then))| now != then)
                .map(|(index, _)| NodeId(index)),
        );
        dirty.sort_unstable();
        dirty.dedup();
        self.entry = current;

        let heuristic = Heuristic::calibrate(grid, weights);
        self.km += heuristic.estimate(grid.node(start), grid.node(target));
        self.heuristic = Some(heuristic);
        self.rekey(grid);

        for &id in &dirty {
            self.update_vertex(grid, weights, id);
            for edge in grid.edges(id) {
                self.update_vertex(grid, weights, edge.target);
            }
        }

        tracing::debug!(reported = changed.len(), dirty = dirty.len(), km = self.km, "D*-Lite: re-planning");
        self.compute_shortest_path(grid, weights);
        self.extract_path(grid, weights)
    }

    // ========================================================================
    // Core
    // ========================================================================

    fn heuristic_from_start(&self, grid: &BuildingGrid, id: NodeId) -> f64 {
        match (self.heuristic, self.start) {
            (Some(h), Some(start)) => h.estimate(grid.node(start), grid.node(id)),
            _ => 0.0,
        }
    }

    fn calculate_key(&self, grid: &BuildingGrid, id: NodeId) -> Key {
        let best = self.g[id.0].min(self.rhs[id.0]);
        Key(Cost(best + self.heuristic_from_start(grid, id) + self.km), Cost(best))
    }

    fn push(&mut self, id: NodeId, key: Key) {
        self.open.insert(id, key);
        self.queue.push(Reverse((key, id)));
    }

    /// Recompute every open key, dropping stale queue entries.
    fn rekey(&mut self, grid: &BuildingGrid) {
        let ids: Vec<NodeId> = self.open.keys().copied().collect();
        self.queue.clear();
        for id in ids {
            let key = self.calculate_key(grid, id);
            self.push(id, key);
        }
    }

    /// Smallest live queue entry.
    fn top(&mut self) -> Option<(Key, NodeId)> {
        while let Some(&Reverse((key, id))) = self.queue.peek() {
            if self.open.get(&id) == Some(&key) {
                return Some((key, id));
            }
            self.queue.pop();
        }
        None
    }

    fn update_vertex(&mut self, grid: &BuildingGrid, weights: &dyn NodeWeights, id: NodeId) {
        if Some(id) != self.target {
            self.rhs[id.0] = grid
                .edges(id)
                .iter()
                .map(|edge| weighted_cost(edge.weight, grid.node(edge.target), weights) + self.g[edge.target.0])
                .fold(f64::INFINITY, f64::min);
        }

        self.open.remove(&id);
        if self.g[id.0] != self.rhs[id.0] {
            let key = self.calculate_key(grid, id);
            self.push(id, key);
        }
    }

    fn compute_shortest_path(&mut self, grid: &BuildingGrid, weights: &dyn NodeWeights) {
        let Some(start) = self.start else { return };
        self.expansions = 0;

        while let Some((k_old, id)) = self.top() {
            let start_key = self.calculate_key(grid, start);
            if k_old >= start_key && self.rhs[start.0] == self.g[start.0] {
                break;
            }
            if self.expansions >= self.max_expansions {
                tracing::warn!(limit = self.max_expansions, "D*-Lite: expansion cap reached");
                break;
            }
            self.expansions += 1;
            self.queue.pop();

            let k_new = self.calculate_key(grid, id);
            if k_old < k_new {
                self.push(id, k_new);
            } else if self.g[id.0] > self.rhs[id.0] {
                self.g[id.0] = self.rhs[id.0];
                self.open.remove(&id);
                for edge in grid.edges(id) {
                    self.update_vertex(grid, weights, edge.target);
                }
            } else {
                self.g[id.0] = f64::INFINITY;
                self.update_vertex(grid, weights, id);
                for edge in grid.edges(id) {
                    self.update_vertex(grid, weights, edge.target);
                }
            }
        }
    }

    /// Walk forward from the start along `argmin(cost + g)`.
    fn extract_path(&self, grid: &BuildingGrid, weights: &dyn NodeWeights) -> PathResult {
        let (Some(start), Some(target)) = (self.start, self.target) else {
            return PathResult::invalid();
        };
        let distance = self.g[start.0];
        if !distance.is_finite() {
            return PathResult::unreachable();
        }

        let mut visited = vec![false; grid.len()];
        let mut path = vec![start];
        let mut current = start;
        visited[start.0] = true;

        while current != target {
            let next = grid
                .edges(current)
                .iter()
                .filter(|edge| !visited[edge.target.0] && !grid.node(edge.target).blocked)
                .map(|edge| {
                    let through = weighted_cost(edge.weight, grid.node(edge.target), weights) + self.g[edge.target.0];
                    (Cost(through), Cost(self.g[edge.target.0]), edge.target)
                })
                .min();

            match next {
                Some((Cost(through), _, id)) if through.is_finite() => {
                    visited[id.0] = true;
                    path.push(id);
                    current = id;
                }
                _ => return PathResult::unreachable(),
            }
        }

        PathResult::found(path, distance)
    }
}

/// Multiplier applied to every edge entering each node; `+∞` when blocked.
fn entry_factors(grid: &BuildingGrid, weights: &dyn NodeWeights) -> Vec<f64> {
    grid.nodes()
        .iter()
        .map(|node| {
            if node.blocked {
                f64::INFINITY
            } else {
                weights.optimized_weight(node) * (1.0 + node.hazard_level as f64)
            }
        })
        .collect()
}

impl PathFinder for DStarLite {
    fn algorithm(&self) -> Algorithm {
        Algorithm::DStarLite
    }

    fn find_path(
        &mut self,
        grid: &BuildingGrid,
        weights: &dyn NodeWeights,
        start: NodeId,
        target: NodeId,
    ) -> PathResult {
        DStarLite::find_path(self, grid, weights, start, target)
    }
}
