//! End-to-end tests for the threat ensemble and its hazard feedback.

use evac_rs::threat::{AnomalyDetector, AnomalyStatus, FireModel, GasLeakModel, ThreatPredictor};
use evac_rs::{
    EvacuationEngine, FixedPoint, HazardKind, SensorSnapshot, Severity, ThreatEnsemble, ThreatKind,
};
use pretty_assertions::assert_eq;

fn stable_temps(n: usize) -> Vec<SensorSnapshot> {
    (0..n)
        .map(|i| SensorSnapshot::new().with_temp(if i % 2 == 0 { 24.0 } else { 26.0 }))
        .collect()
}

// ============================================================================
// 1. Anomaly detection
// ============================================================================

#[test]
fn test_five_sigma_injection_is_flagged() {
    let detector = AnomalyDetector::default();
    let spike = SensorSnapshot::new().with_temp(30.0);
    let mut history = stable_temps(50);
    history.push(spike.clone());

    let report = detector.detect(&spike, &history);
    assert_eq!(report.status, AnomalyStatus::Anomalous);
}

#[test]
fn test_short_history_is_insufficient() {
    let detector = AnomalyDetector::default();
    let report = detector.detect(&SensorSnapshot::new().with_temp(80.0), &stable_temps(10));
    assert_eq!(report.status, AnomalyStatus::InsufficientData);
    assert!(!report.is_anomaly());
}

#[test]
fn test_stored_readings_warm_up_the_engine() {
    let engine = EvacuationEngine::new();
    assert_eq!(engine.train_threat_models(&stable_temps(50)), 50);
    assert_eq!(engine.threat_history_len(), 50);

    let summary = engine.predict_threats(2, &SensorSnapshot::new().with_temp(30.0));
    assert!(summary.has_threat(ThreatKind::Anomaly));
    assert_eq!(engine.threat_history_len(), 51);
}

// ============================================================================
// 2. Individual models
// ============================================================================

#[test]
fn test_flame_alone_means_fire() {
    let model = FireModel::default();
    for snapshot in [
        SensorSnapshot::new().with_flame(150.0),
        SensorSnapshot::new().with_flame(150.0).with_temp(20.0).with_humidity(80.0),
    ] {
        let verdict = model.predict(&snapshot, &[]);
        assert!(verdict.active);
        assert!(verdict.confidence >= 95.0);
    }
}

#[test]
fn test_zero_reading_is_a_quiet_signal() {
    let mut ensemble = ThreatEnsemble::default();
    let summary = ensemble.predict(1, &SensorSnapshot::new().with_gas(0.0).with_vibration(0.0));
    assert!(summary.threats.is_empty());

    // zero gas is measured: a hot room scores, a missing gas sensor does not
    let hot = SensorSnapshot::new().with_temp(45.0);
    let measured = GasLeakModel::default().predict(&hot.clone().with_gas(0.0), &[]);
    let missing = GasLeakModel::default().predict(&hot, &[]);
    assert_eq!(measured.probability, 10.0);
    assert!(!measured.active);
    assert_eq!(missing.probability, 0.0);
}

// ============================================================================
// 3. Aggregation
// ============================================================================

#[test]
fn test_highest_severity_wins() {
    let mut ensemble = ThreatEnsemble::default();
    let summary = ensemble.predict(
        3,
        &SensorSnapshot::new().with_gas(650.0).with_vibration(6.0).with_motion(true).with_name("Unknown"),
    );

    assert!(summary.has_threat(ThreatKind::GasLeak));
    assert!(summary.has_threat(ThreatKind::Structural));
    assert!(summary.has_threat(ThreatKind::Intrusion));
    assert_eq!(summary.overall_threat_level, Severity::Critical);
    let max = summary.threats.iter().map(|t| t.confidence).fold(0.0, f64::max);
    assert_eq!(summary.overall_confidence, max);
}

#[test]
fn test_recognised_person_suppresses_intrusion() {
    let mut ensemble = ThreatEnsemble::default();
    let summary = ensemble.predict(1, &SensorSnapshot::new().with_motion(true).with_name("Alice"));
    assert!(!summary.has_threat(ThreatKind::Intrusion));
}

#[test]
fn test_summary_json_shape() {
    let mut ensemble = ThreatEnsemble::default();
    let summary = ensemble.predict(2, &SensorSnapshot::new().with_flame(150.0));
    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["overallThreatLevel"], "critical");
    assert_eq!(json["threats"][0]["type"], "fire");
    assert_eq!(json["threats"][0]["severity"], "critical");
    assert!(json["recommendation"].as_str().unwrap().starts_with("IMMEDIATE EVACUATION"));
}

#[test]
fn test_flame_reading_accepts_boolean() {
    let snapshot: SensorSnapshot = serde_json::from_str(r#"{"temp": 30, "flame": true}"#).unwrap();
    assert_eq!(snapshot.flame, Some(1.0));
    assert_eq!(snapshot.gas, None);
}

// ============================================================================
// 4. Threats become hazards
// ============================================================================

#[test]
fn test_assess_and_route_with_fixed_placement() {
    let engine = EvacuationEngine::new().with_placement(FixedPoint::new(4.0, 4.0));
    let assessed = engine.assess_and_route("node-2-3-1-1", 2, &SensorSnapshot::new().with_gas(650.0));

    assert_eq!(assessed.hazards.len(), 1);
    assert_eq!(assessed.hazards[0].kind, HazardKind::GasLeak);
    assert_eq!((assessed.hazards[0].x, assessed.hazards[0].y), (4.0, 4.0));
    assert!(engine.blocked_nodes().contains(&"stair-2-1".to_string()));

    let best = assessed.route.best_route.expect("route expected");
    assert!(best.evacuation_node_id != "stair-2-1");
}

#[test]
fn test_quiet_floor_adds_no_hazards() {
    let engine = EvacuationEngine::new();
    let assessed = engine.assess_and_route("node-1-0-1-1", 1, &SensorSnapshot::new().with_temp(22.0));
    assert!(assessed.hazards.is_empty());
    assert!(engine.blocked_nodes().is_empty());
    assert!(assessed.route.found());
}
