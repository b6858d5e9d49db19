//! Deterministic node placement from layout parameters.

use crate::config::LayoutConfig;
use crate::model::{Node, NodeId, NodeKind};

/// Create every node of the building, floor by floor.
///
/// Per floor: the interior grid (four blocks), then exits, staircases and
/// elevators. Indices are assigned in creation order.
pub fn place_nodes(layout: &LayoutConfig) -> Vec<Node> {
    let mut nodes = Vec::new();
    let step_x = layout.depth / layout.grid_density as f64;
    let step_y = layout.width / layout.grid_density as f64;
    // Block origins split the footprint into quadrants.
    let half_x = (layout.depth / 2.0).ceil();
    let half_y = (layout.width / 2.0).ceil();

    for floor in 1..=layout.floors {
        for block in 0..4u32 {
            let origin_x = if block % 2 == 0 { 0.0 } else { half_x };
            let origin_y = if block < 2 { 0.0 } else { half_y };

            for i in 0..layout.grid_density {
                for j in 0..layout.grid_density {
                    let x = origin_x + i as f64 * step_x;
                    let y = origin_y + j as f64 * step_y;
                    if x <= layout.depth && y <= layout.width {
                        let id = format!("node-{floor}-{block}-{i}-{j}");
                        let index = NodeId(nodes.len());
                        nodes.push(Node::new(index, id, floor, x.round(), y.round(), NodeKind::Normal));
                    }
                }
            }
        }

        let has_exits = layout.exit_floors.is_empty() || layout.exit_floors.contains(&floor);
        for (n, &(x, y)) in layout.exits.iter().enumerate().filter(|_| has_exits) {
            let index = NodeId(nodes.len());
            nodes.push(Node::new(index, format!("exit-{floor}-{}", n + 1), floor, x, y, NodeKind::Exit));
        }

        for (n, &(x, y)) in layout.staircases.iter().enumerate() {
            let index = NodeId(nodes.len());
            let stair = n as u32 + 1;
            nodes.push(
                Node::new(index, format!("stair-{floor}-{stair}"), floor, x, y, NodeKind::Staircase)
                    .with_stair_index(stair),
            );
        }

        for (n, &(x, y)) in layout.elevators.iter().enumerate() {
            let index = NodeId(nodes.len());
            nodes.push(Node::new(index, format!("elevator-{floor}-{}", n + 1), floor, x, y, NodeKind::Elevator));
        }
    }

    for node in &mut nodes {
        node.capacity = layout.node_capacity;
    }
    nodes
}
