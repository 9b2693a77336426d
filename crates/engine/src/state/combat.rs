//! Combat bookkeeping: mode, round counter, initiative order, turn budget.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatState {
    pub mode: CombatMode,
    pub round: u32,
    pub active_entity_id: Option<String>,
    pub initiative_order: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_budget: Option<TurnBudget>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatMode {
    Exploration,
    Combat,
}

/// Per-turn usage counters; each is 0 or 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnBudget {
    pub movement_used: u8,
    pub action_used: u8,
    pub bonus_action_used: u8,
}

impl CombatState {
    pub fn exploration() -> Self {
        Self {
            mode: CombatMode::Exploration,
            round: 0,
            active_entity_id: None,
            initiative_order: Vec::new(),
            turn_budget: None,
        }
    }

    pub fn in_combat(&self) -> bool {
        self.mode == CombatMode::Combat
    }

    pub fn is_active(&self, entity_id: &str) -> bool {
        self.active_entity_id.as_deref() == Some(entity_id)
    }

    /// Leaves combat and resets all combat-only fields.
    pub fn end_combat(&mut self) {
        self.mode = CombatMode::Exploration;
        self.round = 0;
        self.active_entity_id = None;
        self.initiative_order.clear();
    }
}
