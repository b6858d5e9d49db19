//! Multi-objective route scoring.
//!
//! `total = 0.4·time + 0.4·safety + 0.2·capacity` with
//!
//! | Objective | Score |
//! |-----------|-------|
//! | time | `1 / (1 + distance·0.1)` |
//! | safety | `1 − mean(overallThreat)` |
//! | capacity | `1 / (1 + occupancy/50)` |

use std::cmp::Ordering;

use crate::config::ScoringConfig;
use crate::model::{NodeThreat, Route, ScoreBreakdown};

/// Mean overall threat along a route. A route with no scored nodes is
/// treated as maximally threatening.
pub fn mean_threat(threats: &[NodeThreat]) -> f64 {
    if threats.is_empty() {
        return 1.0;
    }
    threats.iter().map(|t| t.overall_threat).sum::<f64>() / threats.len() as f64
}

/// Score one candidate. Unreachable candidates (`distance = None`) get a zero
/// time score.
pub fn score_route(
    distance: Option<f64>,
    threats: &[NodeThreat],
    occupancy: u32,
    config: &ScoringConfig,
) -> ScoreBreakdown {
    let time_score = distance.map_or(0.0, |d| 1.0 / (1.0 + d * config.distance_factor));
    let safety_score = 1.0 - mean_threat(threats);
    let capacity_score = 1.0 / (1.0 + occupancy as f64 / config.capacity_scale);

    ScoreBreakdown {
        total_score: config.time_weight * time_score
            + config.safety_weight * safety_score
            + config.capacity_weight * capacity_score,
        time_score,
        safety_score,
        capacity_score,
    }
}

/// Reachable routes first, then by total score, best first. Stable.
pub fn rank(routes: &mut [Route]) {
    routes.sort_by(|a, b| match (a.is_reachable(), b.is_reachable()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => b.score.total_score.total_cmp(&a.score.total_score),
    });
}
