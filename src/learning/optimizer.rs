//! Online and batch node-weight adaptation.
//!
//! The optimizer owns a map of learned multipliers keyed by node. Two
//! independent update paths write it:
//!
//! | Path | Trigger | Rule |
//! |------|---------|------|
//! | online | [`WeightOptimizer::record_outcome`] | ×0.95 on success (floor 0.1), ×1.1 on failure |
//! | batch | [`WeightOptimizer::train_model`] | `max(0.1, (1 − sr·0.5)·(1 + t̄/120))` per node |
//!
//! Rolling node statistics (usage, success rate, transit time) live on the
//! nodes themselves and are updated by the online path only.

use std::collections::VecDeque;

use chrono::Utc;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::config::LearningConfig;
use crate::grid::BuildingGrid;
use crate::model::{EvacuationOutcome, Node, NodeId, OutcomeRecord};
use crate::search::NodeWeights;
use crate::{Error, Result};

/// Summary of one batch training pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub training_samples: usize,
    /// Fraction of successful outcomes in the window.
    pub success_rate: f64,
    /// Mean time taken across the window, seconds.
    pub average_time: f64,
    /// Nodes holding a learned weight after the pass.
    pub optimized_nodes: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct NodeUsage {
    count: u32,
    successes: u32,
    total_time: f64,
}

/// Learned per-node weight multipliers plus the bounded outcome history.
#[derive(Debug, Clone)]
pub struct WeightOptimizer {
    config: LearningConfig,
    weights: HashMap<NodeId, f64>,
    history: VecDeque<OutcomeRecord>,
}

impl Default for WeightOptimizer {
    fn default() -> Self {
        Self::new(LearningConfig::default())
    }
}

impl WeightOptimizer {
    pub fn new(config: LearningConfig) -> Self {
        Self {
            weights: HashMap::new(),
            history: VecDeque::with_capacity(config.max_history.min(1024)),
            config,
        }
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Stored multiplier of a node, if any update has touched it.
    pub fn learned_weight(&self, id: NodeId) -> Option<f64> {
        self.weights.get(&id).copied()
    }

    pub fn learned_len(&self) -> usize {
        self.weights.len()
    }

    /// Retained outcomes, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &OutcomeRecord> + '_ {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // ========================================================================
    // Online updates
    // ========================================================================

    /// Record an outcome reported by a collaborator.
    ///
    /// Unknown node ids are skipped. Returns the number of route nodes that
    /// were resolved and updated.
    pub fn record_outcome(&mut self, grid: &mut BuildingGrid, outcome: &EvacuationOutcome) -> usize {
        let route: Vec<NodeId> = outcome
            .route
            .iter()
            .filter_map(|id| {
                let resolved = grid.lookup(id);
                if resolved.is_none() {
                    tracing::warn!(node = %id, "outcome references unknown node");
                }
                resolved
            })
            .collect();
        let resolved = route.len();
        self.record_route(grid, route, outcome.success, outcome.time_taken, outcome.occupancy);
        resolved
    }

    /// Record an outcome over an already resolved route.
    pub fn record_route(
        &mut self,
        grid: &mut BuildingGrid,
        route: Vec<NodeId>,
        success: bool,
        time_taken: f64,
        occupancy: u32,
    ) {
        let retain = self.config.ema_retain;
        for &id in &route {
            let node = grid.node_mut(id);
            let current = self.weights.get(&id).copied().unwrap_or(node.base_weight);
            if success {
                self.weights.insert(id, (current * self.config.success_decay).max(self.config.min_weight));
                let stats = &mut node.stats;
                stats.historical_usage += 1;
                stats.success_rate = stats.success_rate * retain + (1.0 - retain);
                stats.average_time = stats.average_time * retain + time_taken * (1.0 - retain);
            } else {
                self.weights.insert(id, current * self.config.failure_inflation);
            }
        }

        tracing::debug!(nodes = route.len(), success, time_taken, "evacuation outcome recorded");
        self.history.push_back(OutcomeRecord {
            route,
            success,
            time_taken,
            occupancy,
            recorded_at: Utc::now(),
        });
        while self.history.len() > self.config.max_history {
            self.history.pop_front();
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Combined multiplier used by the weighted searches.
    ///
    /// `stored · (2 − successRate) · (1 + avgTime/60) · (1 + occupancy/capacity)`,
    /// where the statistics factors apply only to nodes that have been used.
    pub fn optimized_weight(&self, node: &Node) -> f64 {
        let mut weight = self.weights.get(&node.index).copied().unwrap_or(node.base_weight);

        if node.stats.historical_usage > 0 {
            weight *= 2.0 - node.stats.success_rate;
            if node.stats.average_time > 0.0 {
                weight *= 1.0 + node.stats.average_time / self.config.time_penalty_scale;
            }
        }
        if node.occupancy > 0 {
            weight *= 1.0 + node.load();
        }
        weight
    }

    // ========================================================================
    // Batch training
    // ========================================================================

    /// Recompute weights from the most recent window of outcomes.
    pub fn train_model(&mut self) -> Result<TrainingReport> {
        let available = self.history.len();
        if available < self.config.min_training_samples {
            return Err(Error::InsufficientData {
                needed: self.config.min_training_samples,
                available,
            });
        }

        let window = available.min(self.config.training_window);
        let recent = self.history.range(available - window..);

        let mut successes = 0usize;
        let mut total_time = 0.0;
        let mut usage: HashMap<NodeId, NodeUsage> = HashMap::new();
        for record in recent {
            if record.success {
                successes += 1;
            }
            total_time += record.time_taken;
            for &id in &record.route {
                let entry = usage.entry(id).or_default();
                entry.count += 1;
                if record.success {
                    entry.successes += 1;
                }
                entry.total_time += record.time_taken;
            }
        }

        for (id, stats) in &usage {
            let success_rate = stats.successes as f64 / stats.count as f64;
            let average_time = stats.total_time / stats.count as f64;
            let weight = (1.0 - success_rate * 0.5) * (1.0 + average_time / self.config.training_time_scale);
            self.weights.insert(*id, weight.max(self.config.min_weight));
        }

        let report = TrainingReport {
            training_samples: window,
            success_rate: successes as f64 / window as f64,
            average_time: total_time / window as f64,
            optimized_nodes: self.weights.len(),
        };
        tracing::info!(
            samples = report.training_samples,
            success_rate = report.success_rate,
            nodes = report.optimized_nodes,
            "weight model trained"
        );
        Ok(report)
    }

    /// Predicted walking time along a route, seconds. Empty routes take forever.
    pub fn predict_evacuation_time(&self, grid: &BuildingGrid, route: &[NodeId]) -> f64 {
        if route.is_empty() {
            return f64::INFINITY;
        }
        let layout = grid.layout();
        route
            .windows(2)
            .map(|pair| {
                let (node, next) = (grid.node(pair[0]), grid.node(pair[1]));
                let base = node.distance(next, layout.floor_height) * layout.seconds_per_unit;
                let crowding = 1.0 + node.load() * 0.5;
                let learned = if node.stats.average_time > 0.0 {
                    node.stats.average_time / self.config.time_penalty_scale
                } else {
                    1.0
                };
                base * crowding * learned
            })
            .sum()
    }
}

impl NodeWeights for WeightOptimizer {
    fn optimized_weight(&self, node: &Node) -> f64 {
        WeightOptimizer::optimized_weight(self, node)
    }
}
