//! Effect instances and the ordered per-entity effect list.
//!
//! An effect is one typed unit of game mechanics attached to an item or
//! spell. Combat effects render into template output; system effects
//! only influence mechanics and never appear in rendered text.

use crate::catalog::{self, EffectType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Errors from effect construction and list operations.
#[derive(Debug, Error)]
pub enum EffectError {
    #[error("Missing required field `{key}` for {effect_type:?}")]
    MissingField {
        effect_type: EffectType,
        key: &'static str,
    },
    #[error("Reorder sequence must list every effect exactly once")]
    IncompleteReorder,
}

// ============================================================================
// Abilities & damage types
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }

    /// Parse a full name or abbreviation, case-insensitive.
    pub fn from_name(s: &str) -> Option<Ability> {
        Ability::all()
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s) || a.abbreviation().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Common damage types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Slashing,
    Piercing,
    Bludgeoning,
    Fire,
    Cold,
    Lightning,
    Thunder,
    Acid,
    Poison,
    Necrotic,
    Radiant,
    Force,
    Psychic,
}

impl DamageType {
    pub fn name(&self) -> &'static str {
        match self {
            DamageType::Slashing => "slashing",
            DamageType::Piercing => "piercing",
            DamageType::Bludgeoning => "bludgeoning",
            DamageType::Fire => "fire",
            DamageType::Cold => "cold",
            DamageType::Lightning => "lightning",
            DamageType::Thunder => "thunder",
            DamageType::Acid => "acid",
            DamageType::Poison => "poison",
            DamageType::Necrotic => "necrotic",
            DamageType::Radiant => "radiant",
            DamageType::Force => "force",
            DamageType::Psychic => "psychic",
        }
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Effect kinds
// ============================================================================

/// Typed payload of an effect, one variant per effect type.
///
/// Serializes in the wire shape `{"type": "DAMAGE", "properties": {...}}`.
/// Unrecognized type strings from legacy data deserialize to `Unknown`,
/// which the catalog maps to a safe fallback definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "properties", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectKind {
    /// The d20 rolled when attacking with this entity.
    D20Roll {
        #[serde(default)]
        notation: Option<String>,
    },
    /// Adds the character's proficiency bonus to attack rolls.
    Proficiency,
    /// Which ability modifier the attack roll uses.
    AttackStat { ability: Ability },
    /// A damage roll with its damage type.
    Damage { dice: String, damage_type: DamageType },
    /// Forces a saving throw against a DC.
    SaveThrow { ability: Ability, dc: i32 },
    /// Flat magical bonus to attack rolls.
    MagicBonus { bonus: i32 },
    /// A healing roll.
    Healing { dice: String },
    /// Sets armor class while equipped.
    ArmorClass { value: i32 },
    /// Attack rolls crit at or above this number.
    CritThreshold { threshold: u32 },
    /// Reroll 1s and 2s on two-handed weapon damage dice.
    GreatWeaponFighting,
    /// Treat 1s as 2s on damage dice of the chosen element.
    ElementalAdept { damage_type: DamageType },
    #[serde(other)]
    Unknown,
}

impl EffectKind {
    /// The catalog key for this kind.
    pub fn effect_type(&self) -> EffectType {
        match self {
            EffectKind::D20Roll { .. } => EffectType::D20Roll,
            EffectKind::Proficiency => EffectType::Proficiency,
            EffectKind::AttackStat { .. } => EffectType::AttackStat,
            EffectKind::Damage { .. } => EffectType::Damage,
            EffectKind::SaveThrow { .. } => EffectType::SaveThrow,
            EffectKind::MagicBonus { .. } => EffectType::MagicBonus,
            EffectKind::Healing { .. } => EffectType::Healing,
            EffectKind::ArmorClass { .. } => EffectType::ArmorClass,
            EffectKind::CritThreshold { .. } => EffectType::CritThreshold,
            EffectKind::GreatWeaponFighting => EffectType::GreatWeaponFighting,
            EffectKind::ElementalAdept { .. } => EffectType::ElementalAdept,
            EffectKind::Unknown => EffectType::Unknown,
        }
    }

    /// Value of one catalog-declared field, as display text.
    ///
    /// This is the lookup behind the catalog's output patterns: a
    /// `{key}` in a pattern substitutes `field(key)`.
    pub fn field(&self, key: &str) -> Option<String> {
        match (self, key) {
            (EffectKind::D20Roll { notation }, "notation") => {
                Some(notation.clone().unwrap_or_else(|| "1d20".to_string()))
            }
            (EffectKind::AttackStat { ability }, "ability") => {
                Some(ability.abbreviation().to_string())
            }
            (EffectKind::Damage { dice, .. }, "dice") => Some(dice.clone()),
            (EffectKind::Damage { damage_type, .. }, "damage_type") => {
                Some(damage_type.name().to_string())
            }
            (EffectKind::SaveThrow { ability, .. }, "ability") => {
                Some(ability.abbreviation().to_string())
            }
            (EffectKind::SaveThrow { dc, .. }, "dc") => Some(dc.to_string()),
            (EffectKind::MagicBonus { bonus }, "bonus") => Some(bonus.to_string()),
            (EffectKind::Healing { dice }, "dice") => Some(dice.clone()),
            (EffectKind::ArmorClass { value }, "value") => Some(value.to_string()),
            (EffectKind::CritThreshold { threshold }, "threshold") => Some(threshold.to_string()),
            (EffectKind::ElementalAdept { damage_type }, "damage_type") => {
                Some(damage_type.name().to_string())
            }
            _ => None,
        }
    }
}

// ============================================================================
// Effect instances
// ============================================================================

/// One typed, ordered unit of game mechanics attached to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Unique within the owning entity.
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: EffectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Position among siblings; assigned by [`EffectList::insert`].
    #[serde(default)]
    pub order: u32,
}

impl Effect {
    /// Create an effect with a generated id, named after its catalog entry.
    pub fn new(kind: EffectKind) -> Effect {
        let name = catalog::definition(kind.effect_type()).name.to_string();
        Effect {
            id: Uuid::new_v4().to_string(),
            name,
            kind,
            description: None,
            order: 0,
        }
    }

    pub fn d20_roll(notation: Option<String>) -> Effect {
        Effect::new(EffectKind::D20Roll { notation })
    }

    pub fn proficiency() -> Effect {
        Effect::new(EffectKind::Proficiency)
    }

    pub fn attack_stat(ability: Ability) -> Effect {
        Effect::new(EffectKind::AttackStat { ability })
    }

    pub fn damage(dice: impl Into<String>, damage_type: DamageType) -> Effect {
        Effect::new(EffectKind::Damage {
            dice: dice.into(),
            damage_type,
        })
    }

    pub fn save_throw(ability: Ability, dc: i32) -> Effect {
        Effect::new(EffectKind::SaveThrow { ability, dc })
    }

    pub fn magic_bonus(bonus: i32) -> Effect {
        Effect::new(EffectKind::MagicBonus { bonus })
    }

    pub fn healing(dice: impl Into<String>) -> Effect {
        Effect::new(EffectKind::Healing { dice: dice.into() })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Effect {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Effect {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Effect {
        self.description = Some(description.into());
        self
    }

    /// Whether this effect is mechanical-only (never rendered).
    pub fn is_system(&self) -> bool {
        catalog::definition(self.kind.effect_type()).is_system
    }

    /// Check required catalog fields against this effect's values.
    ///
    /// Soft contract: required fields must be present and non-empty.
    pub fn validate(&self) -> Result<(), EffectError> {
        let effect_type = self.kind.effect_type();
        let def = catalog::definition(effect_type);
        for field in def.fields {
            if !field.required {
                continue;
            }
            match self.kind.field(field.key) {
                Some(value) if !value.trim().is_empty() => {}
                _ => {
                    return Err(EffectError::MissingField {
                        effect_type,
                        key: field.key,
                    })
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Ordered effect list
// ============================================================================

/// The ordered collection of effects owned by one entity.
///
/// Display order is always by `order` ascending, ties broken by
/// insertion sequence (stable sort).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectList {
    effects: Vec<Effect>,
}

impl EffectList {
    pub fn new() -> EffectList {
        EffectList::default()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Iterate in insertion sequence.
    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    /// Append an effect, assigning `order = max(existing) + 1`.
    pub fn insert(&mut self, mut effect: Effect) {
        let next = self.effects.iter().map(|e| e.order).max().unwrap_or(0) + 1;
        effect.order = next;
        self.effects.push(effect);
    }

    /// Remove an effect by id, returning it if present.
    pub fn remove(&mut self, id: &str) -> Option<Effect> {
        let index = self.effects.iter().position(|e| e.id == id)?;
        Some(self.effects.remove(index))
    }

    pub fn find(&self, id: &str) -> Option<&Effect> {
        self.effects.iter().find(|e| e.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Effect> {
        self.effects.iter_mut().find(|e| e.id == id)
    }

    /// Effects in display order: by `order`, stable on insertion sequence.
    pub fn sorted(&self) -> Vec<&Effect> {
        let mut effects: Vec<&Effect> = self.effects.iter().collect();
        effects.sort_by_key(|e| e.order);
        effects
    }

    /// Reassign `order` as the 1-based position in `sequence`.
    ///
    /// Every effect must appear exactly once; otherwise the call fails
    /// and the list is left untouched (no partial reassignment).
    pub fn reorder<S: AsRef<str>>(&mut self, sequence: &[S]) -> Result<(), EffectError> {
        if sequence.len() != self.effects.len() {
            return Err(EffectError::IncompleteReorder);
        }
        let mut seen = HashSet::new();
        for id in sequence {
            let id = id.as_ref();
            if !seen.insert(id) || self.find(id).is_none() {
                return Err(EffectError::IncompleteReorder);
            }
        }
        for (position, id) in sequence.iter().enumerate() {
            if let Some(effect) = self.find_mut(id.as_ref()) {
                effect.order = position as u32 + 1;
            }
        }
        Ok(())
    }
}

impl FromIterator<Effect> for EffectList {
    fn from_iter<I: IntoIterator<Item = Effect>>(iter: I) -> EffectList {
        let mut list = EffectList::new();
        for effect in iter {
            list.insert(effect);
        }
        list
    }
}
