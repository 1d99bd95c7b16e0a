//! Slot-level and character-level scaling of dice formulas.
//!
//! Scaling folds extra dice into a base formula via
//! [`combine_dice_terms`]: once per slot above the entity's base level,
//! then once per level-scaling step the character has reached. Slot
//! scaling is applied strictly before level scaling; the order is
//! semantic when both target the same dice.

use crate::dice::combine_dice_terms;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extra dice per spell slot above the base slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotScaling {
    pub base_slot: u32,
    pub add_dice_per_slot: String,
}

/// One character-level step of a level-scaling table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStep {
    pub level: u32,
    pub add_dice: String,
}

/// Cumulative extra dice by character level.
///
/// Every step with `level <= character level` applies, sorted ascending
/// by level regardless of storage order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelScaling {
    #[serde(default)]
    pub steps: Vec<LevelStep>,
}

impl LevelScaling {
    /// Build from stored JSON. An unparsable steps table degrades to an
    /// empty step list rather than failing.
    pub fn from_json(value: &Value) -> LevelScaling {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

/// Compute the effective dice formula for a cast.
///
/// `slots_above = max(0, selected_slot - base_entity_level)` when
/// `base_entity_level >= 1`, else 0; each slot above folds in
/// `add_dice_per_slot`, then every reached level step folds in its
/// `add_dice`, ascending by level.
pub fn apply_scaling(
    base_dice: &str,
    selected_slot: u32,
    base_entity_level: u32,
    slot_scaling: Option<&SlotScaling>,
    level_scaling: Option<&LevelScaling>,
    character_level: u32,
) -> String {
    let mut formula = base_dice.to_string();

    if let Some(slot) = slot_scaling {
        let slots_above = if base_entity_level >= 1 {
            selected_slot.saturating_sub(base_entity_level)
        } else {
            0
        };
        for _ in 0..slots_above {
            formula = combine_dice_terms(&formula, &slot.add_dice_per_slot);
        }
    }

    if let Some(levels) = level_scaling {
        let mut reached: Vec<&LevelStep> = levels
            .steps
            .iter()
            .filter(|step| step.level <= character_level)
            .collect();
        reached.sort_by_key(|step| step.level);
        for step in reached {
            formula = combine_dice_terms(&formula, &step.add_dice);
        }
    }

    formula
}
