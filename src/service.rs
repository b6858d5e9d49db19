//! Single-writer task queue around [`EvacuationEngine`].
//!
//! One worker task owns the engine and handles requests in arrival order, so
//! concurrent callers are serialized without holding the engine lock across
//! an `.await`. Each request carries a oneshot channel for its reply.

use tokio::sync::{mpsc, oneshot};

use crate::{
    AssessedRoute, Error, EvacuationEngine, EvacuationOutcome, Hazard, Result, RouteResult,
    SensorSnapshot, ThreatSummary, TrainingReport,
};

enum Request {
    Route {
        start: String,
        floor: u32,
        sensors: SensorSnapshot,
        hazards: Vec<Hazard>,
        reply: oneshot::Sender<RouteResult>,
    },
    AssessAndRoute {
        start: String,
        floor: u32,
        snapshot: SensorSnapshot,
        reply: oneshot::Sender<AssessedRoute>,
    },
    PredictThreats {
        floor: u32,
        snapshot: SensorSnapshot,
        reply: oneshot::Sender<ThreatSummary>,
    },
    ApplyHazards {
        floor: u32,
        hazards: Vec<Hazard>,
        reply: oneshot::Sender<Vec<String>>,
    },
    RecordOutcome {
        outcome: EvacuationOutcome,
        reply: oneshot::Sender<usize>,
    },
    Train {
        reply: oneshot::Sender<Result<TrainingReport>>,
    },
}

/// Cloneable handle to the engine worker.
#[derive(Clone)]
pub struct EngineService {
    tx: mpsc::Sender<Request>,
}

impl EngineService {
    /// Move `engine` into a worker task. The handle resolves to the engine
    /// once every service handle has been dropped.
    pub fn start(engine: EvacuationEngine, buffer_size: usize) -> (Self, tokio::task::JoinHandle<EvacuationEngine>) {
        let (tx, mut rx) = mpsc::channel::<Request>(buffer_size.max(1));

        let handle = tokio::spawn(async move {
            let mut handled = 0usize;
            while let Some(request) = rx.recv().await {
                handle_request(&engine, request);
                handled += 1;
            }
            tracing::info!(handled, "engine service stopped");
            engine
        });

        (Self { tx }, handle)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub async fn find_optimal_evacuation_path(
        &self,
        start: impl Into<String>,
        floor: u32,
        sensors: SensorSnapshot,
        hazards: Vec<Hazard>,
    ) -> Result<RouteResult> {
        let start = start.into();
        self.call(|reply| Request::Route { start, floor, sensors, hazards, reply }).await
    }

    pub async fn assess_and_route(
        &self,
        start: impl Into<String>,
        floor: u32,
        snapshot: SensorSnapshot,
    ) -> Result<AssessedRoute> {
        let start = start.into();
        self.call(|reply| Request::AssessAndRoute { start, floor, snapshot, reply }).await
    }

    pub async fn predict_threats(&self, floor: u32, snapshot: SensorSnapshot) -> Result<ThreatSummary> {
        self.call(|reply| Request::PredictThreats { floor, snapshot, reply }).await
    }

    pub async fn apply_hazards(&self, floor: u32, hazards: Vec<Hazard>) -> Result<Vec<String>> {
        self.call(|reply| Request::ApplyHazards { floor, hazards, reply }).await
    }

    pub async fn record_outcome(&self, outcome: EvacuationOutcome) -> Result<usize> {
        self.call(|reply| Request::RecordOutcome { outcome, reply }).await
    }

    pub async fn train_model(&self) -> Result<TrainingReport> {
        self.call(|reply| Request::Train { reply }).await?
    }

    async fn call<T>(&self, request: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx.send(request(reply)).await.map_err(|_| Error::ServiceClosed)?;
        response.await.map_err(|_| Error::ServiceClosed)
    }
}

fn handle_request(engine: &EvacuationEngine, request: Request) {
    // A caller that stopped waiting is not an error for the worker.
    match request {
        Request::Route { start, floor, sensors, hazards, reply } => {
            let _ = reply.send(engine.find_optimal_evacuation_path(&start, floor, &sensors, &hazards));
        }
        Request::AssessAndRoute { start, floor, snapshot, reply } => {
            let _ = reply.send(engine.assess_and_route(&start, floor, &snapshot));
        }
        Request::PredictThreats { floor, snapshot, reply } => {
            let _ = reply.send(engine.predict_threats(floor, &snapshot));
        }
        Request::ApplyHazards { floor, hazards, reply } => {
            let _ = reply.send(engine.apply_hazards(floor, &hazards));
        }
        Request::RecordOutcome { outcome, reply } => {
            let _ = reply.send(engine.record_outcome(&outcome));
        }
        Request::Train { reply } => {
            let _ = reply.send(engine.train_model());
        }
    }
}
