//! # Route Planner
//!
//! Ties the layers together for one routing request:
//!
//! ```text
//! hazards ──► grid.apply_hazards ──► D*-Lite per staircase ──► ThreatNetwork per node
//!                                                                    │
//!        RouteResult ◄── rank ◄── multi-objective score ◄────────────┘
//! ```
//!
//! The planner never fails: bad input produces [`RouteResult::no_route`].
//! After choosing, it rewards the Q-learning agent and records the chosen
//! route as a simulated successful evacuation.

pub mod scoring;
pub mod instructions;

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, ScoringConfig};
use crate::grid::BuildingGrid;
use crate::learning::{RouteAgent, WeightOptimizer};
use crate::model::{AiAnalysis, Hazard, NodeId, NodeThreat, Route, RouteResult, RouteStep, SensorSnapshot};
use crate::search::{DStarLite, NodeWeights, PathResult};
use crate::threat::{NetworkInput, ThreatNetwork};

pub use instructions::{
    EvacuationInstructions, ExitRoute, InstructionStep, Location, best_exit_route,
    evacuation_instructions, floor_evacuation_routes,
};
pub use scoring::{mean_threat, rank, score_route};

/// Confidence reported when the agent voted for the chosen route.
const RECOMMENDED_CONFIDENCE: f64 = 0.9;
const DEFAULT_CONFIDENCE: f64 = 0.7;

/// Labelled evacuation used to train the agent and the threat network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingEpisode {
    /// External node ids, start first.
    pub route: Vec<String>,
    pub success: bool,
    pub time_taken: f64,
    /// Readings taken along the route, aligned with `route`.
    #[serde(default)]
    pub sensor_readings: Vec<SensorSnapshot>,
    #[serde(default)]
    pub was_fire: bool,
    #[serde(default)]
    pub was_gas_leak: bool,
    #[serde(default)]
    pub was_structural: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiTrainingReport {
    pub rl_episodes: u64,
    pub rl_exploration_rate: f64,
    pub network_samples: usize,
}

/// Per-request orchestration state: the incremental planner, the agent and
/// the per-node threat network.
#[derive(Debug, Clone)]
pub struct RoutePlanner {
    scoring: ScoringConfig,
    dstar: DStarLite,
    agent: RouteAgent,
    network: ThreatNetwork,
}

impl RoutePlanner {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            scoring: config.scoring.clone(),
            dstar: DStarLite::new(config.search.max_expansions),
            agent: RouteAgent::new(config.learning.agent.clone(), config.seed),
            network: ThreatNetwork::new(config.seed.wrapping_add(1)),
        }
    }

    pub fn agent(&self) -> &RouteAgent {
        &self.agent
    }

    pub fn network(&self) -> &ThreatNetwork {
        &self.network
    }

    pub fn dstar(&self) -> &DStarLite {
        &self.dstar
    }

    /// Best staircase route from `start` on `floor` under the given readings
    /// and hazards, plus every candidate and the top alternatives.
    pub fn find_optimal_evacuation_path(
        &mut self,
        grid: &mut BuildingGrid,
        optimizer: &mut WeightOptimizer,
        start: &str,
        floor: u32,
        sensors: &SensorSnapshot,
        hazards: &[Hazard],
    ) -> RouteResult {
        let Some(start_id) = grid.lookup(start) else {
            tracing::warn!(node = start, "route request for unknown start node");
            return RouteResult::no_route("Invalid start node");
        };
        let candidates = grid.staircases(floor);
        if candidates.is_empty() {
            tracing::warn!(floor, "no evacuation nodes on floor");
            return RouteResult::no_route("No evacuation nodes found for this floor");
        }

        grid.apply_hazards(floor, hazards);

        let occupancy = grid.node(start_id).occupancy;
        let state = RouteAgent::state_key(start, hazards.len(), occupancy);
        let actions: Vec<String> = candidates.iter().map(|&id| grid.node(id).id.clone()).collect();
        let recommended = self.agent.choose_action(&state, &actions).map(str::to_string);

        let mut routes = Vec::with_capacity(candidates.len());
        for &target in &candidates {
            let result = self.dstar.find_path(grid, &*optimizer, start_id, target);
            routes.push(self.candidate_route(grid, result, target, occupancy, sensors, hazards, recommended.as_deref()));
        }
        scoring::rank(&mut routes);

        let Some(best) = routes.first().filter(|r| r.is_reachable()).cloned() else {
            tracing::warn!(node = start, floor, "no reachable staircase");
            return RouteResult {
                best_route: None,
                top_alternatives: Vec::new(),
                ai_analysis: AiAnalysis::default(),
                error: Some("No path found".into()),
                all_routes: routes,
            };
        };

        let distance = best.distance.unwrap_or(0.0);
        let target = grid.node(grid.lookup(&best.evacuation_node_id).unwrap_or(start_id));
        let reward = self.agent.reward(target, distance, hazards, true);
        let next_state = RouteAgent::state_key(&best.evacuation_node_id, 0, 0);
        self.agent.update_q(&state, &best.evacuation_node_id, reward, Some(&next_state), &[]);

        let path: Vec<NodeId> = best.path.iter().filter_map(|step| grid.lookup(&step.id)).collect();
        let seconds = distance * grid.layout().seconds_per_unit;
        optimizer.record_route(grid, path, true, seconds, occupancy);

        tracing::info!(
            node = start,
            floor,
            egress = %best.evacuation_node_id,
            distance,
            score = best.score.total_score,
            "evacuation route selected"
        );

        RouteResult {
            ai_analysis: AiAnalysis {
                confidence: if best.rl_recommended { RECOMMENDED_CONFIDENCE } else { DEFAULT_CONFIDENCE },
                overall_threat: best.avg_threat,
                multi_objective_score: best.score.total_score,
            },
            top_alternatives: routes.iter().take(self.scoring.alternatives).cloned().collect(),
            best_route: Some(best),
            all_routes: routes,
            error: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn candidate_route(
        &self,
        grid: &BuildingGrid,
        result: PathResult,
        target: NodeId,
        occupancy: u32,
        sensors: &SensorSnapshot,
        hazards: &[Hazard],
        recommended: Option<&str>,
    ) -> Route {
        let egress = &grid.node(target).id;
        let threats: Vec<NodeThreat> = result
            .path
            .iter()
            .map(|&id| self.network.predict_threat(grid.node(id), sensors, hazards))
            .collect();
        let score = scoring::score_route(result.distance, &threats, occupancy, &self.scoring);

        Route {
            path: result.path.iter().map(|&id| RouteStep::from(grid.node(id))).collect(),
            distance: result.distance,
            steps: result.steps(),
            evacuation_node_id: egress.clone(),
            avg_threat: scoring::mean_threat(&threats),
            threats,
            score,
            rl_recommended: recommended == Some(egress.as_str()),
            estimated_time: result.distance.map(|d| d * grid.layout().seconds_per_unit),
        }
    }

    /// Re-plan `start → target` after the hazard state of `changed` moved.
    ///
    /// Reuses the incremental state when the last D*-Lite plan had the same
    /// endpoints, otherwise plans from scratch.
    pub fn update_path_for_changes(
        &mut self,
        grid: &BuildingGrid,
        weights: &dyn NodeWeights,
        changed: &[NodeId],
        start: NodeId,
        target: NodeId,
    ) -> PathResult {
        if self.dstar.start() == Some(start) && self.dstar.target() == Some(target) {
            self.dstar.update_path(grid, weights, changed)
        } else {
            self.dstar.find_path(grid, weights, start, target)
        }
    }

    /// Train the agent and the threat network on labelled episodes.
    pub fn train_models(&mut self, grid: &BuildingGrid, episodes: &[TrainingEpisode]) -> AiTrainingReport {
        for episode in episodes {
            self.agent.train_on_evacuation(&episode.route, episode.success, episode.time_taken);
        }

        for episode in episodes {
            let expected = NodeThreat {
                fire_threat: label(episode.was_fire),
                gas_threat: label(episode.was_gas_leak),
                structural_threat: label(episode.was_structural),
                overall_threat: label(!episode.success),
            };
            for (reading, node_id) in episode.sensor_readings.iter().zip(&episode.route) {
                let Some(node) = grid.get(node_id) else { continue };
                self.network.train(NetworkInput::for_node(node, reading, &[]), expected);
            }
        }

        let report = AiTrainingReport {
            rl_episodes: self.agent.episodes(),
            rl_exploration_rate: self.agent.exploration_rate(),
            network_samples: self.network.training_samples(),
        };
        tracing::info!(episodes = episodes.len(), samples = report.network_samples, "route models trained");
        report
    }
}

fn label(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn setup() -> (BuildingGrid, WeightOptimizer, RoutePlanner) {
        let config = EngineConfig::default();
        let grid = BuildingGrid::new(config.layout.clone(), config.hazard.clone());
        let optimizer = WeightOptimizer::new(config.learning.clone());
        (grid, optimizer, RoutePlanner::new(&config))
    }

    #[test]
    fn test_unknown_start() {
        let (mut g, mut opt, mut planner) = setup();
        let result = planner.find_optimal_evacuation_path(&mut g, &mut opt, "node-9-9", 1, &SensorSnapshot::new(), &[]);
        assert!(!result.found());
        assert_eq!(result.error.as_deref(), Some("Invalid start node"));
    }

    #[test]
    fn test_unknown_floor() {
        let (mut g, mut opt, mut planner) = setup();
        let result =
            planner.find_optimal_evacuation_path(&mut g, &mut opt, "node-1-0-0-0", 7, &SensorSnapshot::new(), &[]);
        assert_eq!(result.error.as_deref(), Some("No evacuation nodes found for this floor"));
    }

    #[test]
    fn test_route_without_hazards() {
        let (mut g, mut opt, mut planner) = setup();
        let result =
            planner.find_optimal_evacuation_path(&mut g, &mut opt, "node-1-0-0-0", 1, &SensorSnapshot::new(), &[]);
        assert!(result.found());
        assert_eq!(result.all_routes.len(), 4);
        assert_eq!(result.top_alternatives.len(), 3);

        let best = result.best_route.unwrap();
        assert_eq!(best.path.first().unwrap().id, "node-1-0-0-0");
        assert_eq!(best.path.last().unwrap().id, best.evacuation_node_id);
        assert!(best.evacuation_node_id.starts_with("stair-1-"));
        assert_eq!(best.steps, best.path.len());
        for pair in result.all_routes.windows(2) {
            assert!(pair[0].score.total_score >= pair[1].score.total_score);
        }
        assert!(result.ai_analysis.confidence == 0.9 || result.ai_analysis.confidence == 0.7);

        // chosen route recorded as a simulated success
        assert_eq!(opt.history_len(), 1);
        assert_eq!(planner.agent().states(), 1);
    }

    #[test]
    fn test_crowded_start_is_a_separate_agent_state() {
        let (mut g, mut opt, mut planner) = setup();
        let quiet = SensorSnapshot::new();
        planner.find_optimal_evacuation_path(&mut g, &mut opt, "node-1-0-0-0", 1, &quiet, &[]);
        planner.find_optimal_evacuation_path(&mut g, &mut opt, "node-1-0-0-0", 1, &quiet, &[]);
        assert_eq!(planner.agent().states(), 1);

        g.set_occupancy("node-1-0-0-0", 37).unwrap();
        planner.find_optimal_evacuation_path(&mut g, &mut opt, "node-1-0-0-0", 1, &quiet, &[]);
        assert_eq!(planner.agent().states(), 2);
    }

    #[test]
    fn test_update_path_for_changes_reuses_plan() {
        let (mut g, opt, mut planner) = setup();
        let start = g.lookup("node-2-0-0-0").unwrap();
        let target = g.lookup("stair-2-4").unwrap();
        let first = planner.update_path_for_changes(&g, &opt, &[], start, target);
        assert!(first.is_found());

        let changed = g.apply_hazards_diff(2, &[Hazard::fire(8.0, 7.0, 10)]);
        let replanned = planner.update_path_for_changes(&g, &opt, &changed, start, target);
        assert!(planner.dstar().key_modifier() > 0.0);
        let fresh = crate::search::AStar::search(&g, &opt, start, target);
        assert!((replanned.cost() - fresh.cost()).abs() < 1e-9);
    }

    #[test]
    fn test_update_after_routing_sees_recorded_route() {
        let (mut g, mut opt, mut planner) = setup();
        let start = g.lookup("node-2-0-0-0").unwrap();
        let last_stair = *g.staircases(2).last().unwrap();
        planner.find_optimal_evacuation_path(&mut g, &mut opt, "node-2-0-0-0", 2, &SensorSnapshot::new(), &[]);
        assert_eq!(planner.dstar().target(), Some(last_stair));

        // routing fed its chosen route back into the weights after planning
        let replanned = planner.update_path_for_changes(&g, &opt, &[], start, last_stair);
        let fresh = crate::search::AStar::search(&g, &opt, start, last_stair);
        assert!((replanned.cost() - fresh.cost()).abs() < 1e-9);
    }

    #[test]
    fn test_train_models() {
        let (g, _, mut planner) = setup();
        let episode = TrainingEpisode {
            route: vec!["node-1-0-0-0".into(), "stair-1-1".into()],
            success: false,
            time_taken: 4.0,
            sensor_readings: vec![SensorSnapshot::new().with_temp(70.0), SensorSnapshot::new()],
            was_fire: true,
            was_gas_leak: false,
            was_structural: false,
        };
        let report = planner.train_models(&g, &[episode.clone(), episode]);
        assert_eq!(report.rl_episodes, 2);
        assert_eq!(report.network_samples, 4);
        assert!(report.rl_exploration_rate < 0.2);
    }
}
