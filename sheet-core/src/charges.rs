//! Charges: maximum-resource formulas for items and spells.
//!
//! A charges formula computes the maximum of a numeric resource pool
//! (wand charges, uses per day) from one of six modes. Evaluation never
//! fails: malformed numerics coerce to zero or the nearest integer, and
//! unrecognized modes evaluate to zero charges.

use crate::cast::AbilityModifiers;
use crate::effects::Ability;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A computed resource maximum: a finite count or unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargesValue {
    Limited(i32),
    Unlimited,
}

impl ChargesValue {
    /// Build from loose JSON: the string sentinel `"unlimited"` or any
    /// value coercible to an integer.
    pub fn from_json(value: &Value) -> ChargesValue {
        match value {
            Value::String(s) if s.eq_ignore_ascii_case("unlimited") => ChargesValue::Unlimited,
            other => ChargesValue::Limited(coerce_int(Some(other))),
        }
    }
}

impl fmt::Display for ChargesValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChargesValue::Limited(n) => write!(f, "{}", n),
            ChargesValue::Unlimited => write!(f, "unlimited"),
        }
    }
}

impl Serialize for ChargesValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChargesValue::Limited(n) => serializer.serialize_i32(*n),
            ChargesValue::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl<'de> Deserialize<'de> for ChargesValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(ChargesValue::from_json(&value))
    }
}

/// One step of a charges table: `max` applies from `level` upward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeStep {
    pub level: u32,
    pub max: ChargesValue,
}

/// How a resource maximum is computed from character stats.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ChargesFormula {
    /// A constant maximum.
    Fixed { value: i32 },
    /// `base + per_level * (level - 1)`, optionally capped.
    Linear {
        base: i32,
        per_level: i32,
        cap: Option<i32>,
    },
    /// `multiplier * level`, optionally capped.
    Multiplier { multiplier: i32, cap: Option<i32> },
    /// Piecewise by level; the last step at or below the level wins.
    Table { steps: Vec<ChargeStep> },
    /// An ability modifier, floored at `minimum`, optionally capped.
    AbilityMod {
        ability: Ability,
        minimum: i32,
        cap: Option<i32>,
    },
    /// `base + multiplier * proficiency bonus`.
    Proficiency { base: i32, multiplier: i32 },
    /// Unrecognized mode; evaluates to zero.
    Unknown,
}

impl ChargesFormula {
    /// Build from loosely-typed stored JSON. Never fails: malformed
    /// numerics coerce, unrecognized modes become [`Unknown`].
    ///
    /// [`Unknown`]: ChargesFormula::Unknown
    pub fn from_json(value: &Value) -> ChargesFormula {
        let mode = value.get("mode").and_then(Value::as_str).unwrap_or("");
        match mode {
            "fixed" => ChargesFormula::Fixed {
                value: coerce_int(value.get("value")),
            },
            "linear" => ChargesFormula::Linear {
                base: coerce_int(value.get("base")),
                per_level: coerce_int(value.get("per_level")),
                cap: opt_int(value.get("cap")),
            },
            "multiplier" => ChargesFormula::Multiplier {
                multiplier: coerce_int(value.get("multiplier")),
                cap: opt_int(value.get("cap")),
            },
            "table" => {
                let steps = value
                    .get("steps")
                    .and_then(Value::as_array)
                    .map(|steps| {
                        steps
                            .iter()
                            .map(|step| ChargeStep {
                                level: coerce_int(step.get("level")).max(0) as u32,
                                max: ChargesValue::from_json(step.get("max").unwrap_or(&Value::Null)),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                ChargesFormula::Table { steps }
            }
            "ability_mod" => {
                let ability = value
                    .get("ability")
                    .and_then(Value::as_str)
                    .and_then(Ability::from_name);
                match ability {
                    Some(ability) => ChargesFormula::AbilityMod {
                        ability,
                        minimum: coerce_int(value.get("minimum")),
                        cap: opt_int(value.get("cap")),
                    },
                    None => ChargesFormula::Unknown,
                }
            }
            "proficiency" => ChargesFormula::Proficiency {
                base: coerce_int(value.get("base")),
                multiplier: match value.get("multiplier") {
                    None => 1,
                    some => coerce_int(some),
                },
            },
            _ => ChargesFormula::Unknown,
        }
    }

    /// Compute the resource maximum for a character.
    pub fn evaluate(
        &self,
        level: u32,
        modifiers: &AbilityModifiers,
        proficiency_bonus: i32,
    ) -> ChargesValue {
        match self {
            ChargesFormula::Fixed { value } => ChargesValue::Limited(*value),
            ChargesFormula::Linear {
                base,
                per_level,
                cap,
            } => {
                let value = base + per_level * level.saturating_sub(1) as i32;
                ChargesValue::Limited(apply_cap(value, *cap))
            }
            ChargesFormula::Multiplier { multiplier, cap } => {
                ChargesValue::Limited(apply_cap(multiplier * level as i32, *cap))
            }
            ChargesFormula::Table { steps } => {
                let mut sorted: Vec<&ChargeStep> = steps.iter().collect();
                sorted.sort_by_key(|step| step.level);
                let mut result = ChargesValue::Limited(0);
                for step in sorted {
                    if step.level <= level {
                        result = step.max;
                    }
                }
                result
            }
            ChargesFormula::AbilityMod {
                ability,
                minimum,
                cap,
            } => {
                let value = modifiers.get(*ability).max(*minimum);
                ChargesValue::Limited(apply_cap(value, *cap))
            }
            ChargesFormula::Proficiency { base, multiplier } => {
                ChargesValue::Limited(base + multiplier * proficiency_bonus)
            }
            ChargesFormula::Unknown => ChargesValue::Limited(0),
        }
    }
}

impl<'de> Deserialize<'de> for ChargesFormula {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(ChargesFormula::from_json(&value))
    }
}

fn apply_cap(value: i32, cap: Option<i32>) -> i32 {
    match cap {
        Some(cap) => value.min(cap),
        None => value,
    }
}

/// Coerce loose JSON to an integer: numbers round to nearest, numeric
/// strings parse, everything else is zero.
fn coerce_int(value: Option<&Value>) -> i32 {
    match value {
        Some(Value::Number(n)) => n.as_f64().map(|f| f.round() as i32).unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(|f| f.round() as i32).unwrap_or(0),
        Some(Value::Bool(b)) => *b as i32,
        _ => 0,
    }
}

fn opt_int(value: Option<&Value>) -> Option<i32> {
    match value {
        None | Some(Value::Null) => None,
        some => Some(coerce_int(some)),
    }
}
