//! Static effect catalog.
//!
//! The process-wide, read-only registry mapping every effect type to its
//! definition: display name, editor field specs, output pattern, and
//! whether the effect is a system effect (mechanical only, never
//! rendered). Initialized once at startup and never mutated.
//!
//! Output formatting is data, not code: each definition carries a
//! pattern string where `{key}` substitutes the effect's field with that
//! key, interpreted by the single [`format_output`] function.

use crate::effects::EffectKind;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Closed set of effect types.
///
/// `Unknown` absorbs unrecognized/legacy type strings so downstream
/// rendering never fails on old data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectType {
    D20Roll,
    Proficiency,
    AttackStat,
    Damage,
    SaveThrow,
    MagicBonus,
    Healing,
    ArmorClass,
    CritThreshold,
    GreatWeaponFighting,
    ElementalAdept,
    Unknown,
}

impl EffectType {
    /// The wire name of this type.
    pub fn tag(&self) -> &'static str {
        match self {
            EffectType::D20Roll => "D20_ROLL",
            EffectType::Proficiency => "PROFICIENCY",
            EffectType::AttackStat => "ATTACK_STAT",
            EffectType::Damage => "DAMAGE",
            EffectType::SaveThrow => "SAVE_THROW",
            EffectType::MagicBonus => "MAGIC_BONUS",
            EffectType::Healing => "HEALING",
            EffectType::ArmorClass => "ARMOR_CLASS",
            EffectType::CritThreshold => "CRIT_THRESHOLD",
            EffectType::GreatWeaponFighting => "GREAT_WEAPON_FIGHTING",
            EffectType::ElementalAdept => "ELEMENTAL_ADEPT",
            EffectType::Unknown => "UNKNOWN",
        }
    }

    /// Parse a wire name; anything unrecognized is `Unknown`.
    pub fn from_tag(tag: &str) -> EffectType {
        match tag {
            "D20_ROLL" => EffectType::D20Roll,
            "PROFICIENCY" => EffectType::Proficiency,
            "ATTACK_STAT" => EffectType::AttackStat,
            "DAMAGE" => EffectType::Damage,
            "SAVE_THROW" => EffectType::SaveThrow,
            "MAGIC_BONUS" => EffectType::MagicBonus,
            "HEALING" => EffectType::Healing,
            "ARMOR_CLASS" => EffectType::ArmorClass,
            "CRIT_THRESHOLD" => EffectType::CritThreshold,
            "GREAT_WEAPON_FIGHTING" => EffectType::GreatWeaponFighting,
            "ELEMENTAL_ADEPT" => EffectType::ElementalAdept,
            _ => EffectType::Unknown,
        }
    }
}

impl Serialize for EffectType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for EffectType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(EffectType::from_tag(&tag))
    }
}

/// Input kind for an editor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Select,
    Checkbox,
}

/// One editor field declared by an effect definition.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub options: &'static [&'static str],
    pub required: bool,
    pub placeholder: Option<&'static str>,
}

/// Immutable definition of one effect type.
#[derive(Debug, Clone, Serialize)]
pub struct EffectDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldSpec],
    /// Output pattern; `{key}` substitutes the field with that key.
    /// Empty for system effects.
    pub output: &'static str,
    pub is_system: bool,
}

const ABILITY_OPTIONS: &[&str] = &[
    "Strength",
    "Dexterity",
    "Constitution",
    "Intelligence",
    "Wisdom",
    "Charisma",
];

const DAMAGE_TYPE_OPTIONS: &[&str] = &[
    "slashing",
    "piercing",
    "bludgeoning",
    "fire",
    "cold",
    "lightning",
    "thunder",
    "acid",
    "poison",
    "necrotic",
    "radiant",
    "force",
    "psychic",
];

const D20_ROLL_FIELDS: &[FieldSpec] = &[FieldSpec {
    key: "notation",
    label: "Roll",
    kind: FieldKind::Text,
    options: &[],
    required: false,
    placeholder: Some("1d20"),
}];

const ATTACK_STAT_FIELDS: &[FieldSpec] = &[FieldSpec {
    key: "ability",
    label: "Ability",
    kind: FieldKind::Select,
    options: ABILITY_OPTIONS,
    required: true,
    placeholder: None,
}];

const DAMAGE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "dice",
        label: "Damage dice",
        kind: FieldKind::Text,
        options: &[],
        required: true,
        placeholder: Some("2d6"),
    },
    FieldSpec {
        key: "damage_type",
        label: "Damage type",
        kind: FieldKind::Select,
        options: DAMAGE_TYPE_OPTIONS,
        required: true,
        placeholder: None,
    },
];

const SAVE_THROW_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "ability",
        label: "Save ability",
        kind: FieldKind::Select,
        options: ABILITY_OPTIONS,
        required: true,
        placeholder: None,
    },
    FieldSpec {
        key: "dc",
        label: "DC",
        kind: FieldKind::Number,
        options: &[],
        required: true,
        placeholder: Some("13"),
    },
];

const MAGIC_BONUS_FIELDS: &[FieldSpec] = &[FieldSpec {
    key: "bonus",
    label: "Bonus",
    kind: FieldKind::Number,
    options: &[],
    required: true,
    placeholder: Some("1"),
}];

const HEALING_FIELDS: &[FieldSpec] = &[FieldSpec {
    key: "dice",
    label: "Healing dice",
    kind: FieldKind::Text,
    options: &[],
    required: true,
    placeholder: Some("2d4+2"),
}];

const ARMOR_CLASS_FIELDS: &[FieldSpec] = &[FieldSpec {
    key: "value",
    label: "Armor class",
    kind: FieldKind::Number,
    options: &[],
    required: true,
    placeholder: Some("14"),
}];

const CRIT_THRESHOLD_FIELDS: &[FieldSpec] = &[FieldSpec {
    key: "threshold",
    label: "Crit threshold",
    kind: FieldKind::Number,
    options: &[],
    required: true,
    placeholder: Some("19"),
}];

const ELEMENTAL_ADEPT_FIELDS: &[FieldSpec] = &[FieldSpec {
    key: "damage_type",
    label: "Element",
    kind: FieldKind::Select,
    options: DAMAGE_TYPE_OPTIONS,
    required: true,
    placeholder: None,
}];

/// Declaration order for the listing functions.
const ALL_TYPES: [EffectType; 11] = [
    EffectType::D20Roll,
    EffectType::Proficiency,
    EffectType::AttackStat,
    EffectType::Damage,
    EffectType::SaveThrow,
    EffectType::MagicBonus,
    EffectType::Healing,
    EffectType::ArmorClass,
    EffectType::CritThreshold,
    EffectType::GreatWeaponFighting,
    EffectType::ElementalAdept,
];

lazy_static! {
    static ref CATALOG: HashMap<EffectType, EffectDefinition> = {
        let mut map = HashMap::new();
        map.insert(
            EffectType::D20Roll,
            EffectDefinition {
                name: "Attack Roll",
                description: "The d20 rolled when attacking with this item or spell.",
                fields: D20_ROLL_FIELDS,
                output: "{notation}",
                is_system: false,
            },
        );
        map.insert(
            EffectType::Proficiency,
            EffectDefinition {
                name: "Proficiency",
                description: "Adds the character's proficiency bonus to attack rolls.",
                fields: &[],
                output: "proficiency",
                is_system: false,
            },
        );
        map.insert(
            EffectType::AttackStat,
            EffectDefinition {
                name: "Attack Stat",
                description: "Which ability modifier the attack roll uses.",
                fields: ATTACK_STAT_FIELDS,
                output: "{ability}",
                is_system: false,
            },
        );
        map.insert(
            EffectType::Damage,
            EffectDefinition {
                name: "Damage",
                description: "A damage roll with its damage type.",
                fields: DAMAGE_FIELDS,
                output: "{dice} {damage_type}",
                is_system: false,
            },
        );
        map.insert(
            EffectType::SaveThrow,
            EffectDefinition {
                name: "Saving Throw",
                description: "Targets must make a saving throw against the listed DC.",
                fields: SAVE_THROW_FIELDS,
                output: "DC {dc} {ability} save",
                is_system: false,
            },
        );
        map.insert(
            EffectType::MagicBonus,
            EffectDefinition {
                name: "Magic Bonus",
                description: "Flat magical bonus added to attack rolls.",
                fields: MAGIC_BONUS_FIELDS,
                output: "+{bonus}",
                is_system: false,
            },
        );
        map.insert(
            EffectType::Healing,
            EffectDefinition {
                name: "Healing",
                description: "Restores hit points.",
                fields: HEALING_FIELDS,
                output: "{dice} healing",
                is_system: false,
            },
        );
        map.insert(
            EffectType::ArmorClass,
            EffectDefinition {
                name: "Armor Class",
                description: "Sets the wearer's armor class while equipped.",
                fields: ARMOR_CLASS_FIELDS,
                output: "",
                is_system: true,
            },
        );
        map.insert(
            EffectType::CritThreshold,
            EffectDefinition {
                name: "Crit Threshold",
                description: "Attack rolls score a critical hit at or above this number.",
                fields: CRIT_THRESHOLD_FIELDS,
                output: "",
                is_system: true,
            },
        );
        map.insert(
            EffectType::GreatWeaponFighting,
            EffectDefinition {
                name: "Great Weapon Fighting",
                description: "Reroll 1s and 2s on damage dice of two-handed melee weapons.",
                fields: &[],
                output: "",
                is_system: true,
            },
        );
        map.insert(
            EffectType::ElementalAdept,
            EffectDefinition {
                name: "Elemental Adept",
                description: "Damage rolls of the chosen element treat 1s as 2s.",
                fields: ELEMENTAL_ADEPT_FIELDS,
                output: "",
                is_system: true,
            },
        );
        map
    };

    /// Safe definition for unrecognized/legacy types.
    static ref FALLBACK: EffectDefinition = EffectDefinition {
        name: "Unknown",
        description: "Unrecognized effect type.",
        fields: &[],
        output: "",
        is_system: true,
    };

    static ref PATTERN_KEY_RE: Regex = Regex::new(r"\{([a-z][a-z0-9_]*)\}").unwrap();
}

/// Look up the definition for an effect type.
///
/// Unknown types get the safe fallback (no fields, empty output,
/// system-only) so rendering never fails on unrecognized data.
pub fn definition(effect_type: EffectType) -> &'static EffectDefinition {
    CATALOG.get(&effect_type).unwrap_or(&FALLBACK)
}

/// Every known effect type, in declaration order.
pub fn all() -> Vec<EffectType> {
    ALL_TYPES.to_vec()
}

/// Effect types that render visibly in templates.
pub fn combat() -> Vec<EffectType> {
    ALL_TYPES
        .into_iter()
        .filter(|t| !definition(*t).is_system)
        .collect()
}

/// Effect types that only influence mechanics.
pub fn system() -> Vec<EffectType> {
    ALL_TYPES
        .into_iter()
        .filter(|t| definition(*t).is_system)
        .collect()
}

/// Render an effect's display output from its type's pattern.
///
/// Pure function of the effect's fields: no I/O, no randomness. Keys
/// with no value substitute as empty.
pub fn format_output(kind: &EffectKind) -> String {
    let def = definition(kind.effect_type());
    PATTERN_KEY_RE
        .replace_all(def.output, |caps: &Captures| {
            kind.field(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Ability, DamageType};

    #[test]
    fn test_definition_known() {
        let def = definition(EffectType::Damage);
        assert_eq!(def.name, "Damage");
        assert!(!def.is_system);
        assert_eq!(def.fields.len(), 2);
    }

    #[test]
    fn test_definition_unknown_falls_back() {
        let def = definition(EffectType::Unknown);
        assert_eq!(def.name, "Unknown");
        assert!(def.is_system);
        assert!(def.fields.is_empty());
        assert!(def.output.is_empty());
    }

    #[test]
    fn test_listings_partition_catalog() {
        let combat = combat();
        let system = system();
        assert_eq!(combat.len() + system.len(), all().len());
        assert!(combat.contains(&EffectType::Damage));
        assert!(system.contains(&EffectType::ArmorClass));
        assert!(!combat.contains(&EffectType::GreatWeaponFighting));
    }

    #[test]
    fn test_format_damage() {
        let kind = EffectKind::Damage {
            dice: "1d8".to_string(),
            damage_type: DamageType::Slashing,
        };
        assert_eq!(format_output(&kind), "1d8 slashing");
    }

    #[test]
    fn test_format_save_throw() {
        let kind = EffectKind::SaveThrow {
            ability: Ability::Dexterity,
            dc: 15,
        };
        assert_eq!(format_output(&kind), "DC 15 DEX save");
    }

    #[test]
    fn test_format_d20_default_notation() {
        assert_eq!(format_output(&EffectKind::D20Roll { notation: None }), "1d20");
        assert_eq!(
            format_output(&EffectKind::D20Roll {
                notation: Some("1d20+1".to_string())
            }),
            "1d20+1"
        );
    }

    #[test]
    fn test_format_system_effect_is_empty() {
        assert_eq!(format_output(&EffectKind::ArmorClass { value: 15 }), "");
        assert_eq!(format_output(&EffectKind::Unknown), "");
    }

    #[test]
    fn test_output_pattern_keys_are_declared_fields() {
        // Soft contract from the data model: every {key} in a pattern
        // must be declared in the definition's field list.
        for effect_type in all() {
            let def = definition(effect_type);
            for caps in PATTERN_KEY_RE.captures_iter(def.output) {
                let key = &caps[1];
                assert!(
                    def.fields.iter().any(|f| f.key == key),
                    "pattern key {{{key}}} of {effect_type:?} not declared in fields"
                );
            }
        }
    }

    #[test]
    fn test_effect_type_wire_names() {
        let json = serde_json::to_string(&EffectType::D20Roll).unwrap();
        assert_eq!(json, "\"D20_ROLL\"");
        let parsed: EffectType = serde_json::from_str("\"GREAT_WEAPON_FIGHTING\"").unwrap();
        assert_eq!(parsed, EffectType::GreatWeaponFighting);
        let legacy: EffectType = serde_json::from_str("\"SPELL_SLOT_REGAIN\"").unwrap();
        assert_eq!(legacy, EffectType::Unknown);
    }
}
