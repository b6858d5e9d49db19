//! Hazard layer: project hazard reports into node state.

use crate::model::{Hazard, NodeId};
use super::BuildingGrid;

impl BuildingGrid {
    /// Replace the hazard state of every node on `floor` and reconnect.
    ///
    /// Hazard level and blocked flag are recomputed from scratch, so a hazard
    /// missing from `hazards` leaves no residue.
    pub fn apply_hazards(&mut self, floor: u32, hazards: &[Hazard]) {
        let _ = self.apply_hazards_diff(floor, hazards);
    }

    /// Same as [`apply_hazards`](Self::apply_hazards), returning the nodes whose
    /// hazard level or blocked flag changed. Feeds D*-Lite re-planning.
    pub fn apply_hazards_diff(&mut self, floor: u32, hazards: &[Hazard]) -> Vec<NodeId> {
        let radius = self.hazard.radius;
        let critical = self.hazard.critical_level;
        let ids: Vec<NodeId> = self.floor_nodes(floor).map(|n| n.index).collect();
        let mut changed = Vec::new();

        for id in ids {
            let node = self.node_mut(id);
            let before = (node.hazard_level, node.blocked);
            node.hazard_level = 0;
            node.blocked = false;

            for hazard in hazards {
                if hazard.distance_to(node.x, node.y) < radius {
                    node.hazard_level = node.hazard_level.max(hazard.level);
                    if hazard.level >= critical {
                        node.blocked = true;
                    }
                }
            }

            if (node.hazard_level, node.blocked) != before {
                changed.push(id);
            }
        }

        self.reconnect();
        tracing::info!(floor, hazards = hazards.len(), changed = changed.len(), "hazards applied");
        changed
    }

    /// Clear hazard state on every floor.
    pub fn clear_hazards(&mut self) {
        for floor in 1..=self.layout().floors {
            self.apply_hazards(floor, &[]);
        }
    }

    pub fn blocked_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes().iter().filter(|n| n.blocked).map(|n| n.index)
    }
}
