//! # Building Model
//!
//! Plain DTOs shared by the grid, the searches, the threat ensemble and the planner.
//! This module is pure data: no I/O, no locking, no graph algorithms.

pub mod node;
pub mod edge;
pub mod hazard;
pub mod sensor;
pub mod outcome;
pub mod route;

pub use node::{Node, NodeId, NodeKind, NodeStats};
pub use edge::Edge;
pub use hazard::{Hazard, HazardKind};
pub use sensor::{Feature, SensorSnapshot};
pub use outcome::{EvacuationOutcome, OutcomeRecord};
pub use route::{AiAnalysis, NodeThreat, Route, RouteResult, RouteStep, ScoreBreakdown};
