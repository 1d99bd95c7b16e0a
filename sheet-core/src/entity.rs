//! Items and spells: the template-bearing entities that own effects.
//!
//! A `TemplateEntity` is the JSON-shaped unit the surrounding
//! application stores and edits. The engine never holds one between
//! calls; every operation takes its full working set as parameters.

use crate::cast::{self, AbilityModifiers, CastOutcome};
use crate::charges::{ChargesFormula, ChargesValue};
use crate::effects::{Effect, EffectError, EffectList};
use crate::scaling::{LevelScaling, SlotScaling};
use crate::template;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// How a spell resolves when cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastType {
    #[default]
    Passive,
    Utility,
    AttackRoll,
    SaveThrow,
}

fn default_quantity() -> u32 {
    1
}

/// Item- or spell-specific fields of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    Item {
        #[serde(default = "default_quantity")]
        quantity: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        charges: Option<ChargesFormula>,
    },
    Spell {
        #[serde(default)]
        level: u32,
        #[serde(default)]
        is_passive: bool,
        #[serde(default)]
        cast_type: CastType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slot_scaling: Option<SlotScaling>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level_scaling: Option<LevelScaling>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        charges: Option<ChargesFormula>,
    },
}

/// An item or spell with a template and an ordered effect list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateEntity {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub effects: EffectList,
    #[serde(flatten)]
    pub kind: EntityKind,
}

impl TemplateEntity {
    /// Create an item with a generated id and a `{{name}}` starter
    /// template.
    pub fn item(name: impl Into<String>) -> TemplateEntity {
        TemplateEntity {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            template: "{{name}}".to_string(),
            effects: EffectList::new(),
            kind: EntityKind::Item {
                quantity: 1,
                charges: None,
            },
        }
    }

    /// Create a spell of the given base level.
    pub fn spell(name: impl Into<String>, level: u32) -> TemplateEntity {
        TemplateEntity {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            template: "{{name}}".to_string(),
            effects: EffectList::new(),
            kind: EntityKind::Spell {
                level,
                is_passive: false,
                cast_type: CastType::Passive,
                slot_scaling: None,
                level_scaling: None,
                charges: None,
            },
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> TemplateEntity {
        self.template = template.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> TemplateEntity {
        self.description = Some(description.into());
        self
    }

    pub fn with_cast_type(mut self, value: CastType) -> TemplateEntity {
        if let EntityKind::Spell { cast_type, .. } = &mut self.kind {
            *cast_type = value;
        }
        self
    }

    pub fn with_slot_scaling(mut self, value: SlotScaling) -> TemplateEntity {
        if let EntityKind::Spell { slot_scaling, .. } = &mut self.kind {
            *slot_scaling = Some(value);
        }
        self
    }

    pub fn with_level_scaling(mut self, value: LevelScaling) -> TemplateEntity {
        if let EntityKind::Spell { level_scaling, .. } = &mut self.kind {
            *level_scaling = Some(value);
        }
        self
    }

    pub fn with_charges(mut self, formula: ChargesFormula) -> TemplateEntity {
        match &mut self.kind {
            EntityKind::Item { charges, .. } => *charges = Some(formula),
            EntityKind::Spell { charges, .. } => *charges = Some(formula),
        }
        self
    }

    /// The cast behavior of this entity. Items and passive spells
    /// resolve as text only.
    pub fn cast_type(&self) -> CastType {
        match &self.kind {
            EntityKind::Item { .. } => CastType::Passive,
            EntityKind::Spell {
                is_passive,
                cast_type,
                ..
            } => {
                if *is_passive {
                    CastType::Passive
                } else {
                    *cast_type
                }
            }
        }
    }

    /// Base slot level for scaling; items have none.
    pub fn base_level(&self) -> u32 {
        match &self.kind {
            EntityKind::Item { .. } => 0,
            EntityKind::Spell { level, .. } => *level,
        }
    }

    pub fn slot_scaling(&self) -> Option<&SlotScaling> {
        match &self.kind {
            EntityKind::Spell { slot_scaling, .. } => slot_scaling.as_ref(),
            EntityKind::Item { .. } => None,
        }
    }

    pub fn level_scaling(&self) -> Option<&LevelScaling> {
        match &self.kind {
            EntityKind::Spell { level_scaling, .. } => level_scaling.as_ref(),
            EntityKind::Item { .. } => None,
        }
    }

    pub fn charges(&self) -> Option<&ChargesFormula> {
        match &self.kind {
            EntityKind::Item { charges, .. } => charges.as_ref(),
            EntityKind::Spell { charges, .. } => charges.as_ref(),
        }
    }

    /// Maximum charges for a character, if this entity has a formula.
    pub fn max_charges(
        &self,
        character_level: u32,
        modifiers: &AbilityModifiers,
        proficiency_bonus: i32,
    ) -> Option<ChargesValue> {
        self.charges()
            .map(|f| f.evaluate(character_level, modifiers, proficiency_bonus))
    }

    /// Add an effect, auto-wiring a placeholder for non-system effects.
    pub fn add_effect(&mut self, effect: Effect) {
        self.template = template::ensure_placeholder(&self.template, &effect);
        self.effects.insert(effect);
    }

    /// Remove an effect and strip its placeholder from the template.
    pub fn remove_effect(&mut self, id: &str) -> Option<Effect> {
        let removed = self.effects.remove(id);
        if removed.is_some() {
            self.template = template::strip_placeholder(&self.template, id);
        }
        removed
    }

    /// Reorder effects and remap template placeholders to match.
    ///
    /// Fails (leaving both list and template untouched) unless the
    /// sequence lists every effect exactly once.
    pub fn reorder_effects<S: AsRef<str>>(&mut self, sequence: &[S]) -> Result<(), EffectError> {
        self.effects.reorder(sequence)?;
        self.template = template::remap_placeholders(&self.template, &self.effects);
        Ok(())
    }

    /// Tagged preview of the template (see [`template::render_rich`]).
    pub fn render_preview(&self) -> String {
        template::render_rich(&self.template, &self.effects, &self.name)
    }

    /// Plain transcript text.
    pub fn render_text(&self) -> String {
        template::render_plain(&self.template, &self.effects, &self.name)
    }

    /// Transcript text with live roll results substituted.
    pub fn render_chat(&self, rolls: &HashMap<String, String>) -> String {
        template::render_chat_with_overrides(&self.template, &self.effects, &self.name, rolls)
    }

    /// Resolve a cast of this entity (see [`cast::resolve_cast`]).
    pub fn resolve_cast(
        &self,
        selected_slot: u32,
        character_level: u32,
        modifiers: &AbilityModifiers,
        proficiency_bonus: i32,
    ) -> CastOutcome {
        cast::resolve_cast(self, selected_slot, character_level, modifiers, proficiency_bonus)
    }

    /// Resolve a cast with a specific RNG (useful for testing).
    pub fn resolve_cast_with_rng<R: Rng>(
        &self,
        selected_slot: u32,
        character_level: u32,
        modifiers: &AbilityModifiers,
        proficiency_bonus: i32,
        rng: &mut R,
    ) -> CastOutcome {
        cast::resolve_cast_with_rng(
            self,
            selected_slot,
            character_level,
            modifiers,
            proficiency_bonus,
            rng,
        )
    }
}
