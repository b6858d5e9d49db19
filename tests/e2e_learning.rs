//! End-to-end tests for weight adaptation, scenario generation and the
//! route models.

use evac_rs::{Error, EvacuationEngine, EvacuationOutcome, SensorSnapshot, TrainingEpisode};
use pretty_assertions::assert_eq;

fn route() -> Vec<String> {
    ["node-1-0-0-0", "node-1-0-1-0", "stair-1-1"].map(String::from).to_vec()
}

// ============================================================================
// 1. Online outcomes
// ============================================================================

#[test]
fn test_success_lowers_weights() {
    let engine = EvacuationEngine::new();
    let resolved = engine.record_outcome(&EvacuationOutcome::new(route(), true, 12.0, 10));
    assert_eq!(resolved, 3);

    let weight = engine.learned_weight("stair-1-1").unwrap();
    assert!((weight - 0.95).abs() < 1e-12);

    let node = engine.node("stair-1-1").unwrap();
    assert_eq!(node.stats.historical_usage, 1);
    assert!(node.stats.success_rate > 0.0);
}

#[test]
fn test_failure_raises_weights() {
    let engine = EvacuationEngine::new();
    engine.record_outcome(&EvacuationOutcome::new(route(), false, 40.0, 10));
    let weight = engine.learned_weight("node-1-0-1-0").unwrap();
    assert!((weight - 1.1).abs() < 1e-12);
    assert_eq!(engine.node("node-1-0-1-0").unwrap().stats.historical_usage, 0);
}

#[test]
fn test_unknown_ids_are_skipped() {
    let engine = EvacuationEngine::new();
    let mut ids = route();
    ids.insert(1, "node-9-9-9-9".into());
    assert_eq!(engine.record_outcome(&EvacuationOutcome::new(ids, true, 5.0, 0)), 3);
    assert_eq!(engine.outcome_history_len(), 1);
}

#[test]
fn test_predicted_time() {
    let engine = EvacuationEngine::new();
    assert!(engine.predict_evacuation_time(&[]).is_infinite());
    let t = engine.predict_evacuation_time(&route());
    assert!(t.is_finite() && t > 0.0);
}

// ============================================================================
// 2. Batch training
// ============================================================================

#[test]
fn test_training_needs_ten_outcomes() {
    let engine = EvacuationEngine::new();
    for _ in 0..9 {
        engine.record_outcome(&EvacuationOutcome::new(route(), true, 8.0, 5));
    }
    assert!(matches!(
        engine.train_model(),
        Err(Error::InsufficientData { needed: 10, available: 9 })
    ));

    engine.record_outcome(&EvacuationOutcome::new(route(), false, 30.0, 5));
    let report = engine.train_model().unwrap();
    assert_eq!(report.training_samples, 10);
    assert!((report.success_rate - 0.9).abs() < 1e-12);
    assert_eq!(report.optimized_nodes, 3);
}

#[test]
fn test_generated_scenarios_feed_training() {
    let engine = EvacuationEngine::new();
    let report = engine.generate_training_data();
    assert_eq!(report.scenarios, 20);
    assert_eq!(engine.outcome_history_len(), report.training_samples);
    assert!(engine.blocked_nodes().is_empty());

    let trained = engine.train_model().unwrap();
    assert!(trained.training_samples >= 10);
    assert!(trained.optimized_nodes > 0);
}

#[test]
fn test_routing_records_simulated_success() {
    let engine = EvacuationEngine::new();
    let result = engine.find_optimal_evacuation_path("node-1-3-1-1", 1, &SensorSnapshot::new(), &[]);
    let best = result.best_route.unwrap();
    assert_eq!(engine.outcome_history_len(), 1);
    for step in &best.path {
        assert_eq!(engine.node(&step.id).unwrap().stats.historical_usage, 1);
    }
}

// ============================================================================
// 3. Route models
// ============================================================================

#[test]
fn test_train_ai_models() {
    let engine = EvacuationEngine::new();
    let episodes: Vec<TrainingEpisode> = (0..5)
        .map(|i| TrainingEpisode {
            route: route(),
            success: i % 2 == 0,
            time_taken: 6.0,
            sensor_readings: vec![SensorSnapshot::new().with_temp(30.0); 3],
            was_fire: i == 1,
            was_gas_leak: false,
            was_structural: false,
        })
        .collect();

    let report = engine.train_ai_models(&episodes);
    assert_eq!(report.rl_episodes, 5);
    assert_eq!(report.network_samples, 15);
    assert!(report.rl_exploration_rate >= 0.05 && report.rl_exploration_rate < 0.2);
}

#[test]
fn test_episode_json() {
    let episode: TrainingEpisode =
        serde_json::from_str(r#"{"route": ["node-1-0-0-0"], "success": true, "timeTaken": 3.5}"#).unwrap();
    assert_eq!(episode.time_taken, 3.5);
    assert!(episode.sensor_readings.is_empty());
    assert!(!episode.was_fire);
}
