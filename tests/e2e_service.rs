//! Tests for the single-writer engine service.

#![cfg(feature = "service")]

use evac_rs::service::EngineService;
use evac_rs::{EvacuationEngine, EvacuationOutcome, Hazard, SensorSnapshot, Severity};

// ============================================================================
// Request / reply
// ============================================================================

#[tokio::test]
async fn test_route_through_service() {
    let (service, _worker) = EngineService::start(EvacuationEngine::new(), 16);
    let result = service
        .find_optimal_evacuation_path("node-2-0-2-2", 2, SensorSnapshot::new(), vec![Hazard::fire(8.0, 7.0, 10)])
        .await
        .unwrap();
    assert!(result.found());
}

#[tokio::test]
async fn test_concurrent_callers_are_serialized() {
    let (service, worker) = EngineService::start(EvacuationEngine::new(), 4);

    let mut tasks = Vec::new();
    for i in 0..8u32 {
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            let floor = i % 4 + 1;
            let summary = service.predict_threats(floor, SensorSnapshot::new().with_flame(150.0)).await.unwrap();
            assert_eq!(summary.overall_threat_level, Severity::Critical);
            service
                .record_outcome(EvacuationOutcome::new(vec![format!("stair-{floor}-1")], true, 2.0, 0))
                .await
                .unwrap()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), 1);
    }

    drop(service);
    let engine = worker.await.unwrap();
    assert_eq!(engine.outcome_history_len(), 8);
    assert_eq!(engine.threat_history_len(), 8);
}

#[tokio::test]
async fn test_closed_service_reports_error() {
    let (service, worker) = EngineService::start(EvacuationEngine::new(), 1);
    worker.abort();
    let _ = worker.await;
    assert!(service.is_closed());
    assert!(matches!(service.train_model().await, Err(evac_rs::Error::ServiceClosed)));
}

#[tokio::test]
async fn test_apply_hazards_then_assess() {
    let (service, _worker) = EngineService::start(EvacuationEngine::new(), 8);
    let changed = service.apply_hazards(3, vec![Hazard::fire(4.0, 4.0, 9)]).await.unwrap();
    assert!(changed.contains(&"stair-3-1".to_string()));

    let assessed = service.assess_and_route("node-3-3-1-1", 3, SensorSnapshot::new().with_temp(22.0)).await.unwrap();
    // the assessment replaces the floor's hazards with its own (none)
    assert!(assessed.hazards.is_empty());
    assert!(assessed.route.found());
}
