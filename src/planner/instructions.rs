//! Exit routing and human-readable instructions.
//!
//! Exit routes target the floor's exits with A*. A floor without exits is
//! evacuated through its nearest staircase and a ground-floor exit.

use serde::{Deserialize, Serialize};

use crate::grid::BuildingGrid;
use crate::learning::WeightOptimizer;
use crate::model::{Hazard, Node, NodeId, NodeKind};
use crate::search::{AStar, NodeWeights};
use crate::{Error, Result};

/// Floor whose exits lead outside.
const GROUND_FLOOR: u32 = 1;
/// Confidence assumed for a node with no success history.
const DEFAULT_NODE_CONFIDENCE: f64 = 0.8;
/// Transit time shown for a node with no timing history.
const DEFAULT_NODE_TIME: f64 = 0.5;

/// Best route from one node to an exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitRoute {
    pub start: NodeId,
    /// Start first. Via-staircase routes continue on the ground floor.
    pub path: Vec<NodeId>,
    pub distance: Option<f64>,
    pub via_staircase: bool,
}

impl ExitRoute {
    fn none(start: NodeId) -> Self {
        Self { start, path: Vec::new(), distance: None, via_staircase: false }
    }

    pub fn is_found(&self) -> bool {
        self.distance.is_some() && !self.path.is_empty()
    }

    pub fn steps(&self) -> usize {
        self.path.len()
    }
}

/// A* to every exit of `floor`, keeping the cheapest.
pub fn best_exit_route(grid: &BuildingGrid, weights: &dyn NodeWeights, start: NodeId, floor: u32) -> ExitRoute {
    let exits = grid.exits(floor);
    if exits.is_empty() {
        return via_staircase(grid, weights, start, floor);
    }

    exits
        .into_iter()
        .map(|exit| AStar::search(grid, weights, start, exit))
        .filter(|result| result.is_found())
        .min_by(|a, b| a.cost().total_cmp(&b.cost()))
        .map(|result| ExitRoute { start, distance: result.distance, path: result.path, via_staircase: false })
        .unwrap_or_else(|| ExitRoute::none(start))
}

fn via_staircase(grid: &BuildingGrid, weights: &dyn NodeWeights, start: NodeId, floor: u32) -> ExitRoute {
    let floor_height = grid.layout().floor_height;
    let origin = grid.node(start);
    let Some(stair) = grid
        .staircases(floor)
        .into_iter()
        .min_by(|a, b| {
            let da = origin.distance(grid.node(*a), floor_height);
            let db = origin.distance(grid.node(*b), floor_height);
            da.total_cmp(&db)
        })
    else {
        return ExitRoute::none(start);
    };

    let shaft = grid.node(stair).stair_index;
    let ground_stair = grid
        .floor_nodes(GROUND_FLOOR)
        .find(|n| n.is_staircase() && n.stair_index == shaft)
        .map(|n| n.index);
    let ground_exit = grid.exits(GROUND_FLOOR).first().copied();
    let (Some(ground_stair), Some(ground_exit)) = (ground_stair, ground_exit) else {
        return ExitRoute::none(start);
    };

    let upper = AStar::search(grid, weights, start, stair);
    let lower = AStar::search(grid, weights, ground_stair, ground_exit);
    match (upper.distance, lower.distance) {
        (Some(a), Some(b)) => {
            let mut path = upper.path;
            path.extend(lower.path);
            ExitRoute { start, path, distance: Some(a + b), via_staircase: true }
        }
        _ => ExitRoute::none(start),
    }
}

/// Apply `hazards` to `floor`, then route every non-exit node of it.
pub fn floor_evacuation_routes(
    grid: &mut BuildingGrid,
    weights: &dyn NodeWeights,
    floor: u32,
    hazards: &[Hazard],
) -> Vec<ExitRoute> {
    grid.apply_hazards(floor, hazards);
    let starts: Vec<NodeId> = grid
        .floor_nodes(floor)
        .filter(|n| n.kind != NodeKind::Exit)
        .map(|n| n.index)
        .collect();
    starts
        .into_iter()
        .map(|start| best_exit_route(grid, weights, start, floor))
        .collect()
}

// ============================================================================
// Instructions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub floor: u32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionStep {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub floor: u32,
    pub x: f64,
    pub y: f64,
    pub instructions: String,
    pub ml_confidence: f64,
    pub estimated_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvacuationInstructions {
    pub current_location: Location,
    pub nearest_node: String,
    pub route: Vec<InstructionStep>,
    pub distance: Option<f64>,
    /// Predicted walking time, seconds.
    pub estimated_time: f64,
    pub steps: usize,
    /// Mean node success rate along the route, 0..=100.
    pub confidence: f64,
}

/// Text shown to an evacuee arriving at `node`.
pub fn node_instruction(node: &Node) -> String {
    match node.kind {
        NodeKind::Exit => format!("Exit through {}", node.id),
        NodeKind::Staircase => match node.stair_index {
            Some(n) => format!("Use staircase {n}"),
            None => format!("Use staircase {}", node.id),
        },
        NodeKind::Elevator => "Use elevator (if safe)".to_string(),
        NodeKind::Normal => format!("Move to {}", node.id),
    }
}

fn node_confidence(node: &Node) -> f64 {
    if node.stats.success_rate > 0.0 { node.stats.success_rate } else { DEFAULT_NODE_CONFIDENCE }
}

/// Mean node confidence along a path, as a percentage. Empty paths score 0.
pub fn route_confidence(grid: &BuildingGrid, path: &[NodeId]) -> f64 {
    if path.is_empty() {
        return 0.0;
    }
    path.iter().map(|&id| node_confidence(grid.node(id))).sum::<f64>() / path.len() as f64 * 100.0
}

/// Step-by-step instructions from the node nearest to `(x, y)` on `floor`.
pub fn evacuation_instructions(
    grid: &BuildingGrid,
    optimizer: &WeightOptimizer,
    floor: u32,
    x: f64,
    y: f64,
) -> Result<EvacuationInstructions> {
    let nearest = grid.nearest_node(floor, x, y).ok_or(Error::InvalidFloor(floor))?;
    let route = best_exit_route(grid, optimizer, nearest, floor);

    let steps = route
        .path
        .iter()
        .map(|&id| {
            let node = grid.node(id);
            InstructionStep {
                id: node.id.clone(),
                kind: node.kind,
                floor: node.floor,
                x: node.x,
                y: node.y,
                instructions: node_instruction(node),
                ml_confidence: node_confidence(node),
                estimated_time: if node.stats.average_time > 0.0 {
                    node.stats.average_time
                } else {
                    DEFAULT_NODE_TIME
                },
            }
        })
        .collect();

    Ok(EvacuationInstructions {
        current_location: Location { floor, x, y },
        nearest_node: grid.node(nearest).id.clone(),
        route: steps,
        distance: route.distance,
        estimated_time: optimizer.predict_evacuation_time(grid, &route.path),
        steps: route.steps(),
        confidence: route_confidence(grid, &route.path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HazardConfig, LayoutConfig};
    use crate::search::UniformWeights;

    fn grid() -> BuildingGrid {
        BuildingGrid::new(LayoutConfig::default(), HazardConfig::default())
    }

    #[test]
    fn test_exit_route_ends_at_exit() {
        let g = grid();
        let start = g.lookup("node-3-3-1-1").unwrap();
        let route = best_exit_route(&g, &UniformWeights, start, 3);
        assert!(route.is_found());
        assert!(!route.via_staircase);
        assert_eq!(g.node(*route.path.last().unwrap()).kind, NodeKind::Exit);
    }

    #[test]
    fn test_floor_without_exits_goes_via_staircase() {
        let layout = LayoutConfig { exit_floors: vec![1], ..LayoutConfig::default() };
        let g = BuildingGrid::new(layout, HazardConfig::default());
        assert!(g.exits(3).is_empty());

        // (15,13) is nearest to stair 4 at (13,11)
        let start = g.lookup("node-3-3-1-1").unwrap();
        let route = best_exit_route(&g, &UniformWeights, start, 3);
        assert!(route.is_found());
        assert!(route.via_staircase);
        let ids: Vec<&str> = route.path.iter().map(|&id| g.node(id).id.as_str()).collect();
        assert!(ids.contains(&"stair-3-4"));
        assert!(ids.contains(&"stair-1-4"));
        assert_eq!(ids.last(), Some(&"exit-1-1"));
    }

    #[test]
    fn test_blocked_exit_is_unreachable() {
        let layout = LayoutConfig { exits: vec![(0.0, 0.0)], ..LayoutConfig::default() };
        let mut g = BuildingGrid::new(layout, HazardConfig::default());
        g.apply_hazards(3, &[Hazard::fire(0.0, 0.0, 10)]);
        let start = g.lookup("node-3-3-1-1").unwrap();
        assert!(!best_exit_route(&g, &UniformWeights, start, 3).is_found());
    }

    #[test]
    fn test_floor_routes_skip_exits() {
        let mut g = grid();
        let routes = floor_evacuation_routes(&mut g, &UniformWeights, 2, &[Hazard::fire(8.0, 7.0, 10)]);
        assert_eq!(routes.len(), g.floor_nodes(2).filter(|n| n.kind != NodeKind::Exit).count());
        // people caught inside the hazard still get a way out
        assert!(routes.iter().all(ExitRoute::is_found));
        for route in &routes {
            assert!(route.path[1..].iter().all(|&id| !g.node(id).blocked));
        }
    }

    #[test]
    fn test_instructions() {
        let g = grid();
        let opt = WeightOptimizer::default();
        let plan = evacuation_instructions(&g, &opt, 2, 12.6, 4.2).unwrap();
        assert_eq!(plan.nearest_node, "stair-2-3");
        assert_eq!(plan.route[0].instructions, "Use staircase 3");
        assert!(plan.route.last().unwrap().instructions.starts_with("Exit through exit-2-"));
        assert_eq!(plan.confidence, 100.0);
        assert!(plan.estimated_time > 0.0);
        assert!(matches!(evacuation_instructions(&g, &opt, 9, 0.0, 0.0), Err(Error::InvalidFloor(9))));
    }
}
