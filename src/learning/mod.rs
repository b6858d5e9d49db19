//! # Learning
//!
//! | Component | Module | Feeds |
//! |-----------|--------|-------|
//! | [`WeightOptimizer`] | `optimizer` | learned node weights for A* / D*-Lite |
//! | [`RouteAgent`] | `agent` | egress vote, `rlRecommended` |
//! | [`ScenarioGenerator`] | `scenarios` | synthetic outcomes for the optimizer |

pub mod optimizer;
pub mod agent;
pub mod scenarios;

pub use optimizer::{TrainingReport, WeightOptimizer};
pub use agent::RouteAgent;
pub use scenarios::{Scenario, ScenarioGenerator, ScenarioReport, SimulatedEvacuation, TimeOfDay};
