//! Outcome → plan synthesis
//!
//! A plan tells the presentation layer how a round must play out so that any
//! faithful rendering ends on the committed payout. Two interchangeable forms
//! share one [`PlanGenerator`] interface and the same [`Outcome`] contract:
//!
//! - **geometric**: a corridor with obstacle rows, walls and a closure placed at
//!   the depth the payout maps to
//! - **abstract**: an ordered event list with no coordinates

pub mod events;
pub mod geometric;
pub mod reachability;

pub use events::{AbstractPlanner, EndReason, EventPlan, PlanEvent};
pub use geometric::{GeometricPlan, GeometricPlanner, Rect};
pub use reachability::ReachabilityViolation;

use crate::config::{GameConfig, PlanMode};
use crate::games::types::Outcome;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Visual resolution script for one round; never mutated after creation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum Plan {
    Geometric(GeometricPlan),
    Abstract(EventPlan),
}

impl Plan {
    pub fn mode(&self) -> PlanMode {
        match self {
            Plan::Geometric(_) => PlanMode::Geometric,
            Plan::Abstract(_) => PlanMode::Abstract,
        }
    }

    pub fn as_geometric(&self) -> Option<&GeometricPlan> {
        match self {
            Plan::Geometric(plan) => Some(plan),
            Plan::Abstract(_) => None,
        }
    }

    pub fn as_events(&self) -> Option<&EventPlan> {
        match self {
            Plan::Abstract(plan) => Some(plan),
            Plan::Geometric(_) => None,
        }
    }
}

/// Strategy turning a resolved outcome into a plan
pub trait PlanGenerator: Send + Sync {
    fn mode(&self) -> PlanMode;

    /// Pure function of the base value and its outcome. A plan that cannot be
    /// traversed to its committed end is never returned.
    fn plan(&self, base: f64, outcome: &Outcome) -> Result<Plan, ReachabilityViolation>;
}

/// Generator for the configured plan mode
pub fn generator_for(config: &GameConfig) -> Arc<dyn PlanGenerator> {
    match config.plan.mode {
        PlanMode::Geometric => Arc::new(GeometricPlanner::new(config)),
        PlanMode::Abstract => Arc::new(AbstractPlanner),
    }
}
