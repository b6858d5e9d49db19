//! Synthetic training data: canned hazard scenarios simulated on every floor.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::grid::BuildingGrid;
use crate::model::{Hazard, HazardKind, NodeId};
use crate::planner::floor_evacuation_routes;
use super::WeightOptimizer;

const BASE_SUCCESS: f64 = 0.9;
const LONG_ROUTE: f64 = 20.0;
const LONG_ROUTE_PENALTY: f64 = 0.2;
/// Path nodes closer than this to a hazard cost `EXPOSURE_PENALTY` each.
const EXPOSURE_RADIUS: f64 = 3.0;
const EXPOSURE_PENALTY: f64 = 0.3;
const CROWDED: u32 = 40;
const CROWD_PENALTY: f64 = 0.1;
const MIN_SUCCESS: f64 = 0.1;
const MAX_SUCCESS: f64 = 0.95;
/// Occupancy at which walking time grows by half.
const CROWD_SLOWDOWN_SCALE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

/// One canned situation on one floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub name: String,
    pub floor: u32,
    pub hazards: Vec<Hazard>,
    pub occupancy: u32,
    pub time_of_day: TimeOfDay,
}

/// Outcome of routing one node out under a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedEvacuation {
    pub start: NodeId,
    pub route: Vec<NodeId>,
    pub distance: f64,
    pub success_probability: f64,
    pub success: bool,
    pub time_taken: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub scenarios: usize,
    pub training_samples: usize,
    pub successes: usize,
}

/// Generates and replays the scenario set with a seeded generator, so two
/// generators with the same seed record identical outcomes.
#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    rng: ChaCha20Rng,
}

impl ScenarioGenerator {
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha20Rng::seed_from_u64(seed) }
    }

    /// The five canned scenarios for `floor`.
    pub fn scenarios(floor: u32) -> Vec<Scenario> {
        let fire = |x, y, level| Hazard::fire(x, y, level);
        let scenario = |name: &str, hazards, occupancy, time_of_day| Scenario {
            name: name.to_string(),
            floor,
            hazards,
            occupancy,
            time_of_day,
        };
        vec![
            scenario("no_hazard", Vec::new(), 20, TimeOfDay::Afternoon),
            scenario("single_hazard", vec![fire(8.0, 7.0, 7)], 30, TimeOfDay::Morning),
            scenario(
                "multiple_hazards",
                vec![fire(5.0, 5.0, 9), Hazard::new(12.0, 10.0, 6, HazardKind::GasLeak)],
                40,
                TimeOfDay::Evening,
            ),
            scenario("high_occupancy", vec![fire(8.0, 7.0, 5)], 60, TimeOfDay::Afternoon),
            scenario("critical_hazard", vec![fire(8.0, 7.0, 10)], 25, TimeOfDay::Night),
        ]
    }

    /// Route every node out under `scenario` and sample an outcome for each
    /// found route. Leaves the scenario's hazards applied.
    pub fn simulate(
        &mut self,
        grid: &mut BuildingGrid,
        weights: &WeightOptimizer,
        scenario: &Scenario,
    ) -> Vec<SimulatedEvacuation> {
        let seconds_per_unit = grid.layout().seconds_per_unit;
        let routes = floor_evacuation_routes(grid, weights, scenario.floor, &scenario.hazards);

        routes
            .into_iter()
            .filter(|route| route.is_found())
            .map(|route| {
                let distance = route.distance.unwrap_or(0.0);
                let probability = success_probability(grid, &route.path, distance, scenario);
                let success = self.rng.gen_range(0.0..1.0) < probability;
                let crowding = 1.0 + scenario.occupancy as f64 / CROWD_SLOWDOWN_SCALE * 0.5;
                SimulatedEvacuation {
                    start: route.start,
                    distance,
                    success_probability: probability,
                    success,
                    time_taken: distance * seconds_per_unit * crowding,
                    route: route.path,
                }
            })
            .collect()
    }

    /// Simulate every scenario on every floor and feed the outcomes to
    /// `optimizer`. Hazards are cleared on each floor afterwards.
    pub fn generate(&mut self, grid: &mut BuildingGrid, optimizer: &mut WeightOptimizer) -> ScenarioReport {
        let floors: Vec<u32> = grid.floor_numbers().collect();
        let mut report = ScenarioReport::default();

        for floor in floors {
            for scenario in Self::scenarios(floor) {
                let runs = self.simulate(grid, optimizer, &scenario);
                tracing::debug!(floor, scenario = %scenario.name, runs = runs.len(), "scenario simulated");
                for run in runs {
                    report.successes += usize::from(run.success);
                    report.training_samples += 1;
                    optimizer.record_route(grid, run.route, run.success, run.time_taken, scenario.occupancy);
                }
                report.scenarios += 1;
            }
            grid.apply_hazards(floor, &[]);
        }

        tracing::info!(
            scenarios = report.scenarios,
            samples = report.training_samples,
            successes = report.successes,
            "training data generated"
        );
        report
    }
}

fn success_probability(grid: &BuildingGrid, path: &[NodeId], distance: f64, scenario: &Scenario) -> f64 {
    let mut p = BASE_SUCCESS;
    if distance > LONG_ROUTE {
        p -= LONG_ROUTE_PENALTY;
    }
    for hazard in &scenario.hazards {
        for &id in path {
            let node = grid.node(id);
            if hazard.distance_to(node.x, node.y) < EXPOSURE_RADIUS {
                p -= EXPOSURE_PENALTY;
            }
        }
    }
    if scenario.occupancy > CROWDED {
        p -= CROWD_PENALTY;
    }
    p.clamp(MIN_SUCCESS, MAX_SUCCESS)
}
