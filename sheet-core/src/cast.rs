//! Cast resolution: attack rolls, saves, and damage.
//!
//! Assembles a full cast outcome from an entity's effects and the
//! character's modifiers: the to-hit roll, per-damage-effect rolls with
//! scaling applied, and a narrative plus a machine-usable roll event for
//! the collaborator's history log.

use crate::dice::{self, DiceTerm};
use crate::effects::{Ability, EffectKind};
use crate::entity::{CastType, EntityKind, TemplateEntity};
use crate::scaling::apply_scaling;
use crate::template;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The six ability modifiers, derived externally from scores
/// (`floor((score - 10) / 2)`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityModifiers {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl AbilityModifiers {
    pub fn new(str: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn get(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }
}

/// Machine-usable record of a resolved cast for history logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

/// Everything a cast produced.
#[derive(Debug, Clone, Serialize)]
pub struct CastOutcome {
    /// Human-readable composition of announcement, attack breakdown,
    /// and per-damage breakdowns.
    pub narrative: String,
    pub event: RollEvent,
    /// Live roll text per effect id, for
    /// [`template::render_chat_with_overrides`].
    pub rolls: HashMap<String, String>,
}

/// Resolve a cast with the process RNG.
pub fn resolve_cast(
    entity: &TemplateEntity,
    selected_slot: u32,
    character_level: u32,
    modifiers: &AbilityModifiers,
    proficiency_bonus: i32,
) -> CastOutcome {
    resolve_cast_with_rng(
        entity,
        selected_slot,
        character_level,
        modifiers,
        proficiency_bonus,
        &mut rand::thread_rng(),
    )
}

/// Resolve a cast with a specific RNG (useful for testing).
pub fn resolve_cast_with_rng<R: Rng>(
    entity: &TemplateEntity,
    selected_slot: u32,
    character_level: u32,
    modifiers: &AbilityModifiers,
    proficiency_bonus: i32,
    rng: &mut R,
) -> CastOutcome {
    match entity.cast_type() {
        CastType::Passive => text_outcome(entity, "cast"),
        CastType::Utility => text_outcome(entity, "utility"),
        CastType::AttackRoll => {
            let mut rolls = HashMap::new();
            let mut sections = vec![announcement(entity, selected_slot)];
            sections.push(attack_section(entity, modifiers, proficiency_bonus, &mut rolls, rng));
            if let Some(damage) = damage_section(entity, selected_slot, character_level, &mut rolls, rng)
            {
                sections.push(damage);
            }
            outcome(sections, "attack_roll", rolls)
        }
        CastType::SaveThrow => {
            let mut rolls = HashMap::new();
            let mut sections = vec![announcement(entity, selected_slot)];
            if let Some(save) = save_section(entity) {
                sections.push(save);
            }
            if let Some(damage) = damage_section(entity, selected_slot, character_level, &mut rolls, rng)
            {
                sections.push(damage);
            }
            outcome(sections, "save_throw", rolls)
        }
    }
}

fn text_outcome(entity: &TemplateEntity, kind: &str) -> CastOutcome {
    let narrative = template::render_plain(&entity.template, &entity.effects, &entity.name);
    CastOutcome {
        event: RollEvent {
            kind: kind.to_string(),
            description: narrative.clone(),
        },
        narrative,
        rolls: HashMap::new(),
    }
}

fn outcome(sections: Vec<String>, kind: &str, rolls: HashMap<String, String>) -> CastOutcome {
    let narrative = format!("{}.", sections.join("; "));
    CastOutcome {
        event: RollEvent {
            kind: kind.to_string(),
            description: narrative.clone(),
        },
        narrative,
        rolls,
    }
}

fn announcement(entity: &TemplateEntity, selected_slot: u32) -> String {
    match &entity.kind {
        EntityKind::Item { .. } => format!("Uses {}", entity.name),
        EntityKind::Spell { level, .. } => {
            if *level >= 1 && selected_slot >= 1 {
                format!("Casts {} at slot {}", entity.name, selected_slot)
            } else {
                format!("Casts {}", entity.name)
            }
        }
    }
}

fn attack_section<R: Rng>(
    entity: &TemplateEntity,
    modifiers: &AbilityModifiers,
    proficiency_bonus: i32,
    rolls: &mut HashMap<String, String>,
    rng: &mut R,
) -> String {
    // Effect-declared d20 notation, default 1d20.
    let mut d20_id = None;
    let mut notation = "1d20".to_string();
    for effect in entity.effects.iter() {
        if let EffectKind::D20Roll {
            notation: declared, ..
        } = &effect.kind
        {
            d20_id = Some(effect.id.clone());
            if let Some(declared) = declared {
                notation = declared.clone();
            }
            break;
        }
    }

    let d20 = dice::roll_with_rng(&notation, rng);
    let mut parts = vec![format!("d20 {}", d20.breakdown)];
    let mut to_hit = d20.total;

    let has_proficiency = entity
        .effects
        .iter()
        .any(|e| matches!(e.kind, EffectKind::Proficiency));
    if has_proficiency {
        to_hit += proficiency_bonus;
        parts.push(format!("prof {:+}", proficiency_bonus));
    }

    if let Some(ability) = entity.effects.iter().find_map(|e| match e.kind {
        EffectKind::AttackStat { ability } => Some(ability),
        _ => None,
    }) {
        let modifier = modifiers.get(ability);
        to_hit += modifier;
        parts.push(format!("{} {:+}", ability.abbreviation(), modifier));
    }

    if let Some(bonus) = entity.effects.iter().find_map(|e| match e.kind {
        EffectKind::MagicBonus { bonus } => Some(bonus),
        _ => None,
    }) {
        to_hit += bonus;
        parts.push(format!("magic {:+}", bonus));
    }

    let mut section = format!("{} to hit ({})", to_hit, parts.join(", "));

    // Natural 20/1 only applies to a plain single d20.
    if let Some(term) = DiceTerm::parse(&notation) {
        if term.count == 1 && term.sides == 20 {
            let raw = d20.total - term.modifier;
            if raw == 20 {
                section.push_str(", natural 20");
            } else if raw == 1 {
                section.push_str(", natural 1");
            }
        }
    }

    if let Some(id) = d20_id {
        rolls.insert(id, format!("{} to hit", to_hit));
    }

    section
}

fn damage_section<R: Rng>(
    entity: &TemplateEntity,
    selected_slot: u32,
    character_level: u32,
    rolls: &mut HashMap<String, String>,
    rng: &mut R,
) -> Option<String> {
    let mut breakdowns = Vec::new();
    for effect in entity.effects.sorted() {
        let (dice_notation, damage_type) = match &effect.kind {
            EffectKind::Damage { dice, damage_type } => (dice, *damage_type),
            _ => continue,
        };
        let scaled = apply_scaling(
            dice_notation,
            selected_slot,
            entity.base_level(),
            entity.slot_scaling(),
            entity.level_scaling(),
            character_level,
        );
        let rolled = dice::roll_with_rng(&scaled, rng);
        breakdowns.push(format!(
            "{} {} damage ({} = {})",
            rolled.total,
            damage_type.name(),
            scaled,
            rolled.breakdown
        ));
        rolls.insert(
            effect.id.clone(),
            format!("{} {} ({})", rolled.total, damage_type.name(), rolled.breakdown),
        );
    }
    if breakdowns.is_empty() {
        None
    } else {
        Some(breakdowns.join(", "))
    }
}

fn save_section(entity: &TemplateEntity) -> Option<String> {
    entity.effects.iter().find_map(|e| match e.kind {
        EffectKind::SaveThrow { ability, dc } => {
            Some(format!("DC {} {} save", dc, ability.abbreviation()))
        }
        _ => None,
    })
}
