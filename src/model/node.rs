//! Location node in the building graph.

use serde::{Deserialize, Serialize};

/// Arena index of a node. Stable for the lifetime of a [`BuildingGrid`](crate::grid::BuildingGrid).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Category of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Normal,
    Exit,
    Staircase,
    Elevator,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Normal => "normal",
            NodeKind::Exit => "exit",
            NodeKind::Staircase => "staircase",
            NodeKind::Elevator => "elevator",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rolling statistics maintained by weight adaptation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStats {
    pub historical_usage: u64,
    /// Exponential success rate, starts at 1.0.
    pub success_rate: f64,
    /// Exponential average transit time in seconds.
    pub average_time: f64,
}

impl Default for NodeStats {
    fn default() -> Self {
        Self { historical_usage: 0, success_rate: 1.0, average_time: 0.0 }
    }
}

/// A location in the building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(skip)]
    pub index: NodeId,
    /// Stable external identifier, e.g. `"stair-2-3"`.
    pub id: String,
    pub floor: u32,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Stair shaft number for staircase nodes; shafts with equal index link across floors.
    pub stair_index: Option<u32>,
    pub base_weight: f64,
    pub capacity: u32,
    pub occupancy: u32,
    /// 0 = safe, 1..=10 = danger.
    pub hazard_level: u8,
    pub blocked: bool,
    pub stats: NodeStats,
}

impl Node {
    pub fn new(index: NodeId, id: impl Into<String>, floor: u32, x: f64, y: f64, kind: NodeKind) -> Self {
        Self {
            index,
            id: id.into(),
            floor,
            x,
            y,
            kind,
            stair_index: None,
            base_weight: 1.0,
            capacity: 50,
            occupancy: 0,
            hazard_level: 0,
            blocked: false,
            stats: NodeStats::default(),
        }
    }

    pub fn with_stair_index(mut self, index: u32) -> Self {
        self.stair_index = Some(index);
        self
    }

    pub fn is_staircase(&self) -> bool {
        self.kind == NodeKind::Staircase
    }

    /// In-plane Euclidean distance to a point.
    pub fn planar_distance_to(&self, x: f64, y: f64) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }

    /// Euclidean distance including vertical separation.
    pub fn distance(&self, other: &Node, floor_height: f64) -> f64 {
        let dz = self.floor.abs_diff(other.floor) as f64 * floor_height;
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + dz * dz).sqrt()
    }

    /// Manhattan distance in-plane plus floor separation.
    pub fn manhattan(&self, other: &Node, floor_height: f64) -> f64 {
        (self.x - other.x).abs()
            + (self.y - other.y).abs()
            + self.floor.abs_diff(other.floor) as f64 * floor_height
    }

    /// Occupancy as a fraction of capacity.
    pub fn load(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.occupancy as f64 / self.capacity as f64
    }
}
