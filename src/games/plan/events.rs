//! Abstract event plans
//!
//! Carries no coordinates; the presentation layer owns every visual decision.

use super::{Plan, PlanGenerator, ReachabilityViolation};
use crate::config::PlanMode;
use crate::games::types::Outcome;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    Loss,
    Complete,
}

/// One step of an abstract plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanEvent {
    Collectible { count: u32 },
    Bonus { value: f64 },
    End { reason: EndReason },
}

impl PlanEvent {
    /// Numeric size of the event; `End` reports `0`
    pub fn magnitude(&self) -> f64 {
        match self {
            PlanEvent::Collectible { count } => *count as f64,
            PlanEvent::Bonus { value } => *value,
            PlanEvent::End { .. } => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventPlan {
    pub events: Vec<PlanEvent>,
}

impl EventPlan {
    pub fn end_reason(&self) -> Option<EndReason> {
        self.events.iter().rev().find_map(|event| match event {
            PlanEvent::End { reason } => Some(*reason),
            _ => None,
        })
    }
}

/// Emits `collectible`, `bonus` and the terminating `end` event
#[derive(Debug, Default, Clone, Copy)]
pub struct AbstractPlanner;

impl AbstractPlanner {
    pub fn events(outcome: &Outcome) -> EventPlan {
        let mut events = Vec::with_capacity(3);

        let count = outcome.modifier_count();
        if count > 0 {
            events.push(PlanEvent::Collectible { count });
        }
        if outcome.bonus_triggered() {
            events.push(PlanEvent::Bonus { value: outcome.bonus_multiplier() });
        }

        let reason = if outcome.is_loss { EndReason::Loss } else { EndReason::Complete };
        events.push(PlanEvent::End { reason });

        EventPlan { events }
    }
}

impl PlanGenerator for AbstractPlanner {
    fn mode(&self) -> PlanMode {
        PlanMode::Abstract
    }

    fn plan(&self, _base: f64, outcome: &Outcome) -> Result<Plan, ReachabilityViolation> {
        Ok(Plan::Abstract(Self::events(outcome)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::{CollectibleHit, ModifierLayer, Resolution};

    fn outcome(resolution: Resolution) -> Outcome {
        let is_loss = matches!(resolution, Resolution::Loss);
        Outcome {
            resolution,
            final_multiplier: 0.0,
            payout: 0,
            is_loss,
        }
    }

    #[test]
    fn test_loss_emits_only_end() {
        let plan = AbstractPlanner::events(&outcome(Resolution::Loss));
        assert_eq!(plan.events, vec![PlanEvent::End { reason: EndReason::Loss }]);
        assert_eq!(plan.end_reason(), Some(EndReason::Loss));
    }

    #[test]
    fn test_bonus_win_emits_ordered_events() {
        let modifiers = ModifierLayer {
            hits: vec![
                CollectibleHit { kind: "coin_small".into(), value_multiplier: 0.02 },
                CollectibleHit { kind: "power_up".into(), value_multiplier: 0.25 },
            ],
        };
        let plan = AbstractPlanner::events(&outcome(Resolution::BonusWin {
            primary_multiplier: 1.3,
            modifiers,
            bonus_multiplier: 5.0,
        }));

        assert_eq!(
            plan.events,
            vec![
                PlanEvent::Collectible { count: 2 },
                PlanEvent::Bonus { value: 5.0 },
                PlanEvent::End { reason: EndReason::Complete },
            ]
        );
        assert_eq!(plan.events[1].magnitude(), 5.0);
    }

    #[test]
    fn test_plain_win_without_collectibles() {
        let plan = AbstractPlanner::events(&outcome(Resolution::Win {
            primary_multiplier: 0.8,
            modifiers: ModifierLayer::default(),
        }));
        assert_eq!(plan.events, vec![PlanEvent::End { reason: EndReason::Complete }]);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(PlanEvent::Collectible { count: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "collectible", "count": 3}));
    }
}
