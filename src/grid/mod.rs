//! # Building Grid
//!
//! Arena of location nodes with derived adjacency lists.
//!
//! Nodes are created once from the layout and never removed; a [`NodeId`] is
//! the node's position in the arena. Edges are not stored independently: they
//! are recomputed by [`BuildingGrid::reconnect`] whenever hazard state changes.
//!
//! ## Connection rule
//!
//! | Pair | Weight |
//! |------|--------|
//! | same floor, distance ≤ radius | `distance × discount(target) × (1 + hazard(target))` |
//! | same stair shaft, other floor | `|Δfloor| × floor_height × vertical_cost_factor` |
//! | target blocked | `+∞` |

pub mod layout;
pub mod hazard;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::config::{HazardConfig, LayoutConfig};
use crate::model::{Edge, Node, NodeId, NodeKind};
use crate::{Error, Result};

/// Outgoing edges of one node. Interior nodes have around a dozen neighbors.
pub type Adjacency = SmallVec<[Edge; 12]>;

/// The building graph.
#[derive(Debug, Clone)]
pub struct BuildingGrid {
    layout: LayoutConfig,
    hazard: HazardConfig,
    nodes: Vec<Node>,
    adjacency: Vec<Adjacency>,
    /// external id → arena index
    index: HashMap<String, NodeId>,
    /// floor → arena indices, in creation order
    floors: HashMap<u32, Vec<NodeId>>,
}

impl BuildingGrid {
    /// Build the full topology and connect it.
    pub fn new(layout: LayoutConfig, hazard: HazardConfig) -> Self {
        let nodes = layout::place_nodes(&layout);
        let mut index = HashMap::with_capacity(nodes.len());
        let mut floors: HashMap<u32, Vec<NodeId>> = HashMap::new();
        for node in &nodes {
            index.insert(node.id.clone(), node.index);
            floors.entry(node.floor).or_default().push(node.index);
        }

        let mut grid = Self {
            layout,
            hazard,
            adjacency: vec![Adjacency::new(); nodes.len()],
            nodes,
            index,
            floors,
        };
        grid.reconnect();
        tracing::debug!(nodes = grid.nodes.len(), edges = grid.edge_count(), "building grid built");
        grid
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn hazard_config(&self) -> &HazardConfig {
        &self.hazard
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Resolve an external id.
    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    /// Resolve an external id or fail with [`Error::InvalidNode`].
    pub fn resolve(&self, id: &str) -> Result<NodeId> {
        self.lookup(id).ok_or_else(|| Error::InvalidNode(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.lookup(id).map(|i| self.node(i))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn floor_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        1..=self.layout.floors
    }

    /// Nodes on a floor in creation order. Unknown floors yield nothing.
    pub fn floor_nodes(&self, floor: u32) -> impl Iterator<Item = &Node> + '_ {
        self.floors
            .get(&floor)
            .into_iter()
            .flatten()
            .map(|&i| self.node(i))
    }

    pub fn floor_nodes_of_kind(&self, floor: u32, kind: NodeKind) -> Vec<NodeId> {
        self.floor_nodes(floor).filter(|n| n.kind == kind).map(|n| n.index).collect()
    }

    /// Egress candidates of a floor: its staircases.
    pub fn staircases(&self, floor: u32) -> Vec<NodeId> {
        self.floor_nodes_of_kind(floor, NodeKind::Staircase)
    }

    pub fn exits(&self, floor: u32) -> Vec<NodeId> {
        self.floor_nodes_of_kind(floor, NodeKind::Exit)
    }

    /// Node on `floor` closest to `(x, y)`; the first one wins ties.
    pub fn nearest_node(&self, floor: u32, x: f64, y: f64) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for node in self.floor_nodes(floor) {
            let d = node.planar_distance_to(x, y);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((node.index, d));
            }
        }
        best.map(|(id, _)| id)
    }

    // ========================================================================
    // Edges
    // ========================================================================

    pub fn edges(&self, id: NodeId) -> &[Edge] {
        &self.adjacency[id.0]
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(|a| a.len()).sum()
    }

    /// Weight of the edge `from → to`, if linked.
    pub fn edge_weight(&self, from: NodeId, to: NodeId) -> Option<f64> {
        self.edges(from).iter().find(|e| e.target == to).map(|e| e.weight)
    }

    /// Recompute every edge from current node state.
    ///
    /// O(N²) over same-floor pairs plus the stair shafts. Graph sizes are a
    /// few dozen nodes per floor, so this runs on every hazard update.
    pub fn reconnect(&mut self) {
        for list in &mut self.adjacency {
            list.clear();
        }

        for ids in self.floors.values() {
            for &a in ids {
                for &b in ids {
                    if a == b {
                        continue;
                    }
                    let (from, to) = (&self.nodes[a.0], &self.nodes[b.0]);
                    let distance = from.distance(to, self.layout.floor_height);
                    if distance <= self.layout.connection_radius {
                        let weight = self.planar_weight(distance, to);
                        self.adjacency[a.0].push(Edge::new(b, weight));
                    }
                }
            }
        }

        // Stair shafts are the only inter-floor links.
        let stairs: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| n.is_staircase() && n.stair_index.is_some())
            .map(|n| n.index)
            .collect();
        for &a in &stairs {
            for &b in &stairs {
                let (from, to) = (&self.nodes[a.0], &self.nodes[b.0]);
                if from.floor == to.floor || from.stair_index != to.stair_index {
                    continue;
                }
                let weight = if to.blocked {
                    f64::INFINITY
                } else {
                    from.floor.abs_diff(to.floor) as f64
                        * self.layout.floor_height
                        * self.layout.vertical_cost_factor
                };
                self.adjacency[a.0].push(Edge::new(b, weight));
            }
        }
    }

    fn planar_weight(&self, distance: f64, target: &Node) -> f64 {
        if target.blocked {
            return f64::INFINITY;
        }
        let mut weight = distance;
        match target.kind {
            NodeKind::Exit => weight *= self.layout.exit_discount,
            NodeKind::Staircase => weight *= self.layout.staircase_discount,
            _ => {}
        }
        if target.hazard_level > 0 {
            weight *= 1.0 + target.hazard_level as f64;
        }
        weight
    }

    // ========================================================================
    // Occupancy
    // ========================================================================

    /// Set the current occupancy of a node.
    pub fn set_occupancy(&mut self, id: &str, occupancy: u32) -> Result<()> {
        let index = self.resolve(id)?;
        self.nodes[index.0].occupancy = occupancy;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
