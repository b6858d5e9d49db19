//! Per-node threat scorer: a fixed 5→8→4 sigmoid network.
//!
//! Weights are drawn once from a seeded generator in ±0.05 and never
//! back-propagated; `train` only nudges the output biases. Outputs are a
//! heuristic threat estimate in (0, 1), not calibrated probabilities.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::model::{Hazard, Node, NodeThreat, SensorSnapshot};
use super::signal;

const INPUTS: usize = 5;
const HIDDEN: usize = 8;
const OUTPUTS: usize = 4;
const LEARNING_RATE: f64 = 0.01;
const MAX_TRAINING_LOG: usize = 1_000;
/// Hazard distance assumed when no hazard is known.
const NO_HAZARD_DISTANCE: f64 = 20.0;
/// Temperature assumed when the sensor reports nothing.
const AMBIENT_TEMP: f64 = 25.0;

/// Raw network input, before normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInput {
    pub temp: f64,
    pub gas: f64,
    pub flame: f64,
    pub vibration: f64,
    pub hazard_distance: f64,
}

impl NetworkInput {
    /// Input for `node` under the floor's readings and hazards.
    pub fn for_node(node: &Node, sensors: &SensorSnapshot, hazards: &[Hazard]) -> Self {
        let hazard_distance = hazards
            .iter()
            .map(|h| h.distance_to(node.x, node.y))
            .reduce(f64::min)
            .unwrap_or(NO_HAZARD_DISTANCE);
        Self {
            temp: signal(sensors.temp).unwrap_or(AMBIENT_TEMP),
            gas: signal(sensors.gas).unwrap_or(0.0),
            flame: signal(sensors.flame).unwrap_or(0.0),
            vibration: signal(sensors.vibration).unwrap_or(0.0),
            hazard_distance,
        }
    }

    fn normalized(&self) -> [f64; INPUTS] {
        [
            self.temp / 100.0,
            self.gas / 1000.0,
            self.flame / 200.0,
            self.vibration / 10.0,
            self.hazard_distance / 20.0,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TrainingSample {
    input: NetworkInput,
    expected: NodeThreat,
    error: f64,
}

#[derive(Debug, Clone)]
pub struct ThreatNetwork {
    input_weights: [[f64; HIDDEN]; INPUTS],
    hidden_weights: [[f64; OUTPUTS]; HIDDEN],
    hidden_bias: [f64; HIDDEN],
    output_bias: [f64; OUTPUTS],
    training: VecDeque<TrainingSample>,
}

impl ThreatNetwork {
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut draw = || (rng.gen_range(0.0..1.0) - 0.5) * 0.1;

        let mut input_weights = [[0.0; HIDDEN]; INPUTS];
        for row in &mut input_weights {
            row.iter_mut().for_each(|w| *w = draw());
        }
        let mut hidden_weights = [[0.0; OUTPUTS]; HIDDEN];
        for row in &mut hidden_weights {
            row.iter_mut().for_each(|w| *w = draw());
        }

        Self {
            input_weights,
            hidden_weights,
            hidden_bias: [0.1; HIDDEN],
            output_bias: [0.1; OUTPUTS],
            training: VecDeque::new(),
        }
    }

    pub fn training_samples(&self) -> usize {
        self.training.len()
    }

    /// Retained `(input, expected, absolute error)` triples, oldest first.
    pub fn training_log(&self) -> impl Iterator<Item = (NetworkInput, NodeThreat, f64)> + '_ {
        self.training.iter().map(|s| (s.input, s.expected, s.error))
    }

    /// Mean absolute error over the retained training log.
    pub fn mean_training_error(&self) -> Option<f64> {
        if self.training.is_empty() {
            return None;
        }
        Some(self.training.iter().map(|s| s.error).sum::<f64>() / self.training.len() as f64)
    }

    pub fn forward(&self, input: &NetworkInput) -> NodeThreat {
        let x = input.normalized();

        let mut hidden = [0.0; HIDDEN];
        for (i, h) in hidden.iter_mut().enumerate() {
            let sum: f64 = x.iter().enumerate().map(|(j, v)| v * self.input_weights[j][i]).sum();
            *h = sigmoid(sum + self.hidden_bias[i]);
        }

        let mut out = [0.0; OUTPUTS];
        for (i, o) in out.iter_mut().enumerate() {
            let sum: f64 = hidden.iter().enumerate().map(|(j, v)| v * self.hidden_weights[j][i]).sum();
            *o = sigmoid(sum + self.output_bias[i]);
        }

        NodeThreat {
            fire_threat: out[0],
            gas_threat: out[1],
            structural_threat: out[2],
            overall_threat: out[3],
        }
    }

    pub fn predict_threat(&self, node: &Node, sensors: &SensorSnapshot, hazards: &[Hazard]) -> NodeThreat {
        self.forward(&NetworkInput::for_node(node, sensors, hazards))
    }

    /// Nudge output biases toward `expected` and log the absolute error.
    pub fn train(&mut self, input: NetworkInput, expected: NodeThreat) {
        let predicted = self.forward(&input);
        let errors = [
            expected.fire_threat - predicted.fire_threat,
            expected.gas_threat - predicted.gas_threat,
            expected.structural_threat - predicted.structural_threat,
            expected.overall_threat - predicted.overall_threat,
        ];
        for (bias, err) in self.output_bias.iter_mut().zip(errors) {
            if err.abs() > 0.01 {
                *bias += LEARNING_RATE * err;
            }
        }

        self.training.push_back(TrainingSample {
            input,
            expected,
            error: errors.iter().map(|e| e.abs()).sum(),
        });
        if self.training.len() > MAX_TRAINING_LOG {
            self.training.pop_front();
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x.clamp(-500.0, 500.0)).exp())
}
