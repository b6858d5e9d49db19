//! Directed adjacency record.

use serde::{Deserialize, Serialize};
use super::NodeId;

/// Directed edge to `target`. Derived state: rebuilt on every reconnect.
///
/// `weight` is non-negative, or `f64::INFINITY` when the target is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub target: NodeId,
    pub weight: f64,
}

impl Edge {
    pub fn new(target: NodeId, weight: f64) -> Self {
        Self { target, weight }
    }

    pub fn is_passable(&self) -> bool {
        self.weight.is_finite()
    }
}
