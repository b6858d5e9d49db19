//! Engine configuration.
//!
//! Every tunable constant of the engine lives here. The defaults are the
//! empirically chosen values the routing behavior was calibrated against;
//! change them only together with the tests that pin that behavior.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ============================================================================
// Layout
// ============================================================================

/// Fixed building topology parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Number of floors, numbered `1..=floors`.
    pub floors: u32,
    /// Footprint along x.
    pub depth: f64,
    /// Footprint along y.
    pub width: f64,
    /// Height of one floor, used by distance and heuristic.
    pub floor_height: f64,
    /// Interior grid points per block edge.
    pub grid_density: u32,
    /// Same-floor nodes within this distance (inclusive) are linked.
    pub connection_radius: f64,
    /// Vertical stair link weight per unit of height.
    pub vertical_cost_factor: f64,
    pub exit_discount: f64,
    pub staircase_discount: f64,
    pub exits: Vec<(f64, f64)>,
    /// Floors carrying the exits; empty means every floor.
    pub exit_floors: Vec<u32>,
    pub staircases: Vec<(f64, f64)>,
    pub elevators: Vec<(f64, f64)>,
    pub node_capacity: u32,
    /// Seconds needed to cover one unit of distance.
    pub seconds_per_unit: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            floors: 4,
            depth: 17.0,
            width: 15.0,
            floor_height: 15.0,
            grid_density: 3,
            connection_radius: 6.0,
            vertical_cost_factor: 0.1,
            exit_discount: 0.5,
            staircase_discount: 0.7,
            exits: vec![(0.0, 0.0), (0.0, 15.0), (17.0, 0.0), (17.0, 15.0)],
            exit_floors: Vec::new(),
            staircases: vec![(4.0, 4.0), (4.0, 11.0), (13.0, 4.0), (13.0, 11.0)],
            elevators: vec![(8.0, 7.0), (9.0, 8.0)],
            node_capacity: 50,
            seconds_per_unit: 0.1,
        }
    }
}

// ============================================================================
// Hazards
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    /// Nodes strictly closer than this to a hazard take its level.
    pub radius: f64,
    /// Levels at or above this block the node.
    pub critical_level: u8,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self { radius: 4.0, critical_level: 8 }
    }
}

// ============================================================================
// Search
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound on D*-Lite vertex expansions per `compute_shortest_path`.
    pub max_expansions: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_expansions: 100_000 }
    }
}

// ============================================================================
// Weight adaptation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Multiplier applied to each route node after a success.
    pub success_decay: f64,
    /// Multiplier applied to each route node after a failure.
    pub failure_inflation: f64,
    pub min_weight: f64,
    /// Retention factor of the exponential moving averages.
    pub ema_retain: f64,
    pub max_history: usize,
    /// Most recent outcomes considered by batch training.
    pub training_window: usize,
    pub min_training_samples: usize,
    /// Seconds that double a node's weight in the online time penalty.
    pub time_penalty_scale: f64,
    /// Seconds that double a node's weight in the batch-trained weight.
    pub training_time_scale: f64,
    pub agent: AgentConfig,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            success_decay: 0.95,
            failure_inflation: 1.1,
            min_weight: 0.1,
            ema_retain: 0.9,
            max_history: 10_000,
            training_window: 1_000,
            min_training_samples: 10,
            time_penalty_scale: 60.0,
            training_time_scale: 120.0,
            agent: AgentConfig::default(),
        }
    }
}

/// Q-learning route agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub learning_rate: f64,
    pub discount: f64,
    pub exploration: f64,
    pub min_exploration: f64,
    /// Episodes per e-fold of exploration decay.
    pub exploration_decay: f64,
    /// Exploration stops after this many episodes.
    pub exploration_episodes: u64,
    pub distance_penalty: f64,
    pub egress_reward: f64,
    pub hazard_penalty: f64,
    pub hazard_radius: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount: 0.9,
            exploration: 0.2,
            min_exploration: 0.05,
            exploration_decay: 500.0,
            exploration_episodes: 1_000,
            distance_penalty: 0.1,
            egress_reward: 100.0,
            hazard_penalty: 50.0,
            hazard_radius: 4.0,
        }
    }
}

// ============================================================================
// Threat ensemble
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub max_history: usize,
    pub min_history: usize,
    pub min_feature_samples: usize,
    pub z_threshold: f64,
    pub iqr_multiplier: f64,
    pub moving_window: usize,
    pub moving_sigma: f64,
    pub weight_z: f64,
    pub weight_iqr: f64,
    pub weight_moving: f64,
    /// Per-feature ensemble score above which the feature is anomalous.
    pub feature_threshold: f64,
    /// Mean confidence above which the snapshot is anomalous.
    pub overall_threshold: f64,
    /// Confidence above which the ensemble reports the anomaly as a threat.
    pub report_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            max_history: 5_000,
            min_history: 20,
            min_feature_samples: 10,
            z_threshold: 2.5,
            iqr_multiplier: 1.5,
            moving_window: 20,
            moving_sigma: 2.0,
            weight_z: 0.4,
            weight_iqr: 0.3,
            weight_moving: 0.3,
            feature_threshold: 50.0,
            overall_threshold: 65.0,
            report_threshold: 80.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireConfig {
    pub temp_threshold: f64,
    pub gas_threshold: f64,
    pub flame_threshold: f64,
    pub temp_weight: f64,
    pub gas_weight: f64,
    pub flame_weight: f64,
    pub critical_temp: f64,
    pub rapid_rise: f64,
    pub gas_spike: f64,
    pub fire_score: f64,
}

impl Default for FireConfig {
    fn default() -> Self {
        Self {
            temp_threshold: 50.0,
            gas_threshold: 300.0,
            flame_threshold: 100.0,
            temp_weight: 0.25,
            gas_weight: 0.30,
            flame_weight: 0.35,
            critical_temp: 60.0,
            rapid_rise: 5.0,
            gas_spike: 100.0,
            fire_score: 65.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatConfig {
    pub anomaly: AnomalyConfig,
    pub fire: FireConfig,
    pub gas_critical: f64,
    pub gas_elevated: f64,
    pub gas_temp: f64,
    pub gas_leak_score: f64,
    pub vibration_critical: f64,
    pub vibration_elevated: f64,
    pub structural_temp: f64,
    pub structural_score: f64,
    /// Snapshots of recent history handed to the fire model.
    pub fire_history: usize,
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            anomaly: AnomalyConfig::default(),
            fire: FireConfig::default(),
            gas_critical: 500.0,
            gas_elevated: 300.0,
            gas_temp: 35.0,
            gas_leak_score: 70.0,
            vibration_critical: 5.0,
            vibration_elevated: 3.0,
            structural_temp: 40.0,
            structural_score: 60.0,
            fire_history: 10,
        }
    }
}

// ============================================================================
// Scoring
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub time_weight: f64,
    pub safety_weight: f64,
    pub capacity_weight: f64,
    pub distance_factor: f64,
    pub capacity_scale: f64,
    pub alternatives: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            time_weight: 0.4,
            safety_weight: 0.4,
            capacity_weight: 0.2,
            distance_factor: 0.1,
            capacity_scale: 50.0,
            alternatives: 3,
        }
    }
}

// ============================================================================
// EngineConfig
// ============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout: LayoutConfig,
    pub hazard: HazardConfig,
    pub search: SearchConfig,
    pub learning: LearningConfig,
    pub threat: ThreatConfig,
    pub scoring: ScoringConfig,
    /// Seed for every pseudo-random source in the engine.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            hazard: HazardConfig::default(),
            search: SearchConfig::default(),
            learning: LearningConfig::default(),
            threat: ThreatConfig::default(),
            scoring: ScoringConfig::default(),
            seed: 0x5EED_E5CA,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON document; missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if layout.floors == 0 {
            return Err(Error::Config("layout.floors must be >= 1".into()));
        }
        if layout.depth <= 0.0 || layout.width <= 0.0 || layout.floor_height <= 0.0 {
            return Err(Error::Config(format!(
                "layout dimensions must be > 0, got {} x {} x {}",
                layout.depth, layout.width, layout.floor_height
            )));
        }
        if layout.connection_radius <= 0.0 {
            return Err(Error::Config(format!(
                "layout.connection_radius must be > 0, got {}",
                layout.connection_radius
            )));
        }
        if layout.staircases.is_empty() {
            return Err(Error::Config("layout.staircases must not be empty".into()));
        }
        if layout.vertical_cost_factor < 0.0 || layout.exit_discount < 0.0 || layout.staircase_discount < 0.0 {
            return Err(Error::Config("layout cost factors must be >= 0".into()));
        }
        if self.hazard.critical_level > 10 {
            return Err(Error::Config(format!(
                "hazard.critical_level must be in [0, 10], got {}",
                self.hazard.critical_level
            )));
        }
        let learning = &self.learning;
        if learning.min_weight <= 0.0 {
            return Err(Error::Config(format!(
                "learning.min_weight must be > 0, got {}",
                learning.min_weight
            )));
        }
        if !(0.0..=1.0).contains(&learning.ema_retain) {
            return Err(Error::Config(format!(
                "learning.ema_retain must be in [0, 1], got {}",
                learning.ema_retain
            )));
        }
        if learning.max_history == 0 || learning.training_window == 0 {
            return Err(Error::Config("learning history sizes must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&learning.agent.exploration) || learning.agent.exploration_decay <= 0.0 {
            return Err(Error::Config("learning.agent exploration settings are out of range".into()));
        }
        let anomaly = &self.threat.anomaly;
        let votes = anomaly.weight_z + anomaly.weight_iqr + anomaly.weight_moving;
        if (votes - 1.0).abs() > 1e-9 {
            return Err(Error::Config(format!(
                "anomaly weights must sum to 1.0, got {votes}"
            )));
        }
        if anomaly.moving_window == 0 || anomaly.max_history < anomaly.min_history {
            return Err(Error::Config("anomaly history sizes are inconsistent".into()));
        }
        let scoring = &self.scoring;
        let objectives = scoring.time_weight + scoring.safety_weight + scoring.capacity_weight;
        if (objectives - 1.0).abs() > 1e-9 {
            return Err(Error::Config(format!(
                "scoring weights must sum to 1.0, got {objectives}"
            )));
        }
        if scoring.capacity_scale <= 0.0 {
            return Err(Error::Config("scoring.capacity_scale must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = EngineConfig::from_json(r#"{"hazard": {"radius": 5.0}, "seed": 7}"#).unwrap();
        assert_eq!(config.hazard.radius, 5.0);
        assert_eq!(config.hazard.critical_level, 8);
        assert_eq!(config.seed, 7);
        assert_eq!(config.layout, LayoutConfig::default());
    }

    #[test]
    fn test_rejects_unbalanced_objectives() {
        let mut config = EngineConfig::default();
        config.scoring.time_weight = 0.9;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(EngineConfig::from_json("{not json"), Err(Error::Serialization(_))));
    }
}
