//! # evac-rs — Dynamic Evacuation Routing
//!
//! A multi-floor building graph with hazard-aware path search, online weight
//! adaptation and an ensemble of threat detectors feeding hazards back into
//! the graph.
//!
//! ## Design Principles
//!
//! 1. **Arena graph**: nodes live in one `Vec`, addressed by [`NodeId`]; no back-references
//! 2. **Explicit ownership**: the engine owns every piece of mutable state behind one lock
//! 3. **Never fail a route request**: bad input yields a [`RouteResult`] with no route
//! 4. **Closed model set**: threat scorers are variants of one [`ThreatModel`] enum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use evac_rs::{EvacuationEngine, Hazard, SensorSnapshot};
//!
//! let engine = EvacuationEngine::new();
//! let hazards = [Hazard::fire(8.0, 7.0, 10)];
//! let result = engine.find_optimal_evacuation_path(
//!     "node-2-0-2-2",
//!     2,
//!     &SensorSnapshot::new().with_temp(68.0),
//!     &hazards,
//! );
//!
//! if let Some(best) = &result.best_route {
//!     println!("evacuate via {} ({} steps)", best.evacuation_node_id, best.steps);
//! }
//! ```
//!
//! ## Layers
//!
//! | Layer | Module | Description |
//! |-------|--------|-------------|
//! | Grid | `grid` | Node arena, adjacency, hazard application |
//! | Search | `search` | Dijkstra, A*, incremental D*-Lite |
//! | Learning | `learning` | Adaptive node weights, Q-learning agent, scenarios |
//! | Threat | `threat` | Anomaly, fire, gas, intrusion, structural models |
//! | Planner | `planner` | Multi-objective route selection, instructions |
//! | Service | `service` | Single-writer queue (feature `service`) |

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod model;
pub mod grid;
pub mod search;
pub mod learning;
pub mod threat;
pub mod planner;

#[cfg(feature = "service")]
pub mod service;

use parking_lot::Mutex;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::EngineConfig;
pub use grid::BuildingGrid;
pub use model::{
    EvacuationOutcome, Hazard, HazardKind, Node, NodeId, NodeKind, NodeThreat, Route,
    RouteResult, RouteStep, SensorSnapshot,
};
pub use search::{Algorithm, NodeWeights, PathError, PathResult};
pub use learning::{RouteAgent, ScenarioGenerator, ScenarioReport, TrainingReport, WeightOptimizer};
pub use threat::{
    FixedPoint, FixturePlacement, HazardPlacement, RandomPlacement, Severity, ThreatEnsemble,
    ThreatKind, ThreatModel, ThreatSummary,
};
pub use planner::{
    AiTrainingReport, EvacuationInstructions, ExitRoute, RoutePlanner, TrainingEpisode,
};

// ============================================================================
// Engine
// ============================================================================

/// Everything the engine mutates, guarded by one lock.
struct EngineState {
    grid: BuildingGrid,
    optimizer: WeightOptimizer,
    ensemble: ThreatEnsemble,
    planner: RoutePlanner,
    scenarios: ScenarioGenerator,
    placement: Box<dyn HazardPlacement + Send>,
}

/// Result of [`EvacuationEngine::assess_and_route`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessedRoute {
    pub threats: ThreatSummary,
    pub hazards: Vec<Hazard>,
    pub route: RouteResult,
}

/// The primary entry point. Owns the building grid, learned weights, threat
/// history and planners.
///
/// Every operation takes the internal lock exactly once, so a hazard update,
/// the reconnect it triggers and the following search form one atomic phase.
pub struct EvacuationEngine {
    config: EngineConfig,
    state: Mutex<EngineState>,
}

impl Default for EvacuationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EvacuationEngine {
    /// Engine over the default four-floor layout.
    pub fn new() -> Self {
        Self::build(EngineConfig::default())
    }

    /// Engine over a custom configuration, validated first.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        let grid = BuildingGrid::new(config.layout.clone(), config.hazard.clone());
        tracing::info!(
            floors = config.layout.floors,
            nodes = grid.len(),
            edges = grid.edge_count(),
            "evacuation engine initialised"
        );
        let state = EngineState {
            optimizer: WeightOptimizer::new(config.learning.clone()),
            ensemble: ThreatEnsemble::new(&config.threat),
            planner: RoutePlanner::new(&config),
            scenarios: ScenarioGenerator::new(config.seed.wrapping_add(2)),
            placement: Box::new(FixturePlacement),
            grid,
        };
        Self { config, state: Mutex::new(state) }
    }

    /// Replace the policy that turns floor-level threats into point hazards.
    pub fn with_placement(self, placement: impl HazardPlacement + Send + 'static) -> Self {
        self.state.lock().placement = Box::new(placement);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Routing
    // ========================================================================

    /// Apply `hazards` to `floor` and pick the best staircase route from `start`.
    pub fn find_optimal_evacuation_path(
        &self,
        start: &str,
        floor: u32,
        sensors: &SensorSnapshot,
        hazards: &[Hazard],
    ) -> RouteResult {
        let mut state = self.state.lock();
        let EngineState { grid, optimizer, planner, .. } = &mut *state;
        planner.find_optimal_evacuation_path(grid, optimizer, start, floor, sensors, hazards)
    }

    /// Run the threat ensemble on `snapshot`, convert physical threats into
    /// hazards with the placement policy, then route from `start`.
    pub fn assess_and_route(&self, start: &str, floor: u32, snapshot: &SensorSnapshot) -> AssessedRoute {
        let mut state = self.state.lock();
        let EngineState { grid, optimizer, ensemble, planner, placement, .. } = &mut *state;

        let threats = ensemble.predict(floor, snapshot);
        let hazards = ThreatEnsemble::to_hazards(&threats, placement.as_mut(), &self.config.layout);
        let route = planner.find_optimal_evacuation_path(grid, optimizer, start, floor, snapshot, &hazards);
        AssessedRoute { threats, hazards, route }
    }

    /// Single search between two nodes with the chosen algorithm, weighted by
    /// the learned node weights. Unknown ids produce an invalid result.
    pub fn find_path(&self, algorithm: Algorithm, start: &str, target: &str) -> PathResult {
        let state = self.state.lock();
        let (Some(from), Some(to)) = (state.grid.lookup(start), state.grid.lookup(target)) else {
            return PathResult::invalid();
        };
        let mut finder = algorithm.finder(self.config.search.max_expansions);
        finder.find_path(&state.grid, &state.optimizer, from, to)
    }

    /// Re-plan `start → target` after the given nodes changed, reusing the
    /// engine's D*-Lite state when the endpoints match the last plan.
    pub fn update_path_for_changes(&self, changed: &[String], start: &str, target: &str) -> PathResult {
        let mut state = self.state.lock();
        let EngineState { grid, optimizer, planner, .. } = &mut *state;
        let (Some(from), Some(to)) = (grid.lookup(start), grid.lookup(target)) else {
            return PathResult::invalid();
        };
        let changed: Vec<NodeId> = changed.iter().filter_map(|id| grid.lookup(id)).collect();
        planner.update_path_for_changes(grid, &*optimizer, &changed, from, to)
    }

    /// Step-by-step instructions from the node nearest to `(x, y)`.
    pub fn evacuation_instructions(&self, floor: u32, x: f64, y: f64) -> Result<EvacuationInstructions> {
        let state = self.state.lock();
        planner::evacuation_instructions(&state.grid, &state.optimizer, floor, x, y)
    }

    /// Apply `hazards`, then route every non-exit node of `floor` to an exit.
    pub fn floor_evacuation_routes(&self, floor: u32, hazards: &[Hazard]) -> Vec<ExitRoute> {
        let mut state = self.state.lock();
        let EngineState { grid, optimizer, .. } = &mut *state;
        planner::floor_evacuation_routes(grid, &*optimizer, floor, hazards)
    }

    // ========================================================================
    // Hazards & occupancy
    // ========================================================================

    /// Replace the hazard state of `floor`. Returns the ids of nodes whose
    /// hazard level or blocked flag changed.
    pub fn apply_hazards(&self, floor: u32, hazards: &[Hazard]) -> Vec<String> {
        let mut state = self.state.lock();
        let changed = state.grid.apply_hazards_diff(floor, hazards);
        changed.into_iter().map(|id| state.grid.node(id).id.clone()).collect()
    }

    pub fn clear_hazards(&self) {
        self.state.lock().grid.clear_hazards();
    }

    pub fn set_occupancy(&self, node: &str, occupancy: u32) -> Result<()> {
        self.state.lock().grid.set_occupancy(node, occupancy)
    }

    // ========================================================================
    // Learning
    // ========================================================================

    /// Feed a reported outcome into the weight optimizer. Returns the number
    /// of route nodes that resolved.
    pub fn record_outcome(&self, outcome: &EvacuationOutcome) -> usize {
        let mut state = self.state.lock();
        let EngineState { grid, optimizer, .. } = &mut *state;
        optimizer.record_outcome(grid, outcome)
    }

    /// Batch retrain node weights from the recent outcome history.
    pub fn train_model(&self) -> Result<TrainingReport> {
        self.state.lock().optimizer.train_model()
    }

    /// Predicted walking time along `route`; unknown ids are skipped.
    pub fn predict_evacuation_time(&self, route: &[String]) -> f64 {
        let state = self.state.lock();
        let ids: Vec<NodeId> = route.iter().filter_map(|id| state.grid.lookup(id)).collect();
        state.optimizer.predict_evacuation_time(&state.grid, &ids)
    }

    /// Simulate the canned scenarios on every floor and record the
    /// outcomes as training data.
    pub fn generate_training_data(&self) -> ScenarioReport {
        let mut state = self.state.lock();
        let EngineState { grid, optimizer, scenarios, .. } = &mut *state;
        scenarios.generate(grid, optimizer)
    }

    /// Train the route agent and the per-node threat network.
    pub fn train_ai_models(&self, episodes: &[TrainingEpisode]) -> AiTrainingReport {
        let mut state = self.state.lock();
        let EngineState { grid, planner, .. } = &mut *state;
        planner.train_models(grid, episodes)
    }

    // ========================================================================
    // Threats
    // ========================================================================

    /// Run the ensemble on one floor snapshot. The snapshot joins the history.
    pub fn predict_threats(&self, floor: u32, snapshot: &SensorSnapshot) -> ThreatSummary {
        self.state.lock().ensemble.predict(floor, snapshot)
    }

    /// Seed the threat history with stored readings, oldest first. Returns
    /// the number of readings loaded.
    pub fn train_threat_models(&self, snapshots: &[SensorSnapshot]) -> usize {
        self.state.lock().ensemble.train(snapshots)
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Snapshot of a node's current state.
    pub fn node(&self, id: &str) -> Option<Node> {
        self.state.lock().grid.get(id).cloned()
    }

    pub fn blocked_nodes(&self) -> Vec<String> {
        let state = self.state.lock();
        state.grid.blocked_nodes().map(|id| state.grid.node(id).id.clone()).collect()
    }

    pub fn learned_weight(&self, id: &str) -> Option<f64> {
        let state = self.state.lock();
        state.grid.lookup(id).and_then(|index| state.optimizer.learned_weight(index))
    }

    pub fn outcome_history_len(&self) -> usize {
        self.state.lock().optimizer.history_len()
    }

    pub fn threat_history_len(&self) -> usize {
        self.state.lock().ensemble.history_len()
    }

    pub fn node_count(&self) -> usize {
        self.state.lock().grid.len()
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("Invalid floor: {0}")]
    InvalidFloor(u32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Insufficient data: need {needed} samples, have {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("Engine service closed")]
    ServiceClosed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
