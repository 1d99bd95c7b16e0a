//! Dice notation parsing and rolling.
//!
//! Supports the `NdM` grammar with an optional signed modifier
//! (`2d6`, `1d20+5`, `3d8-2`). Rolling never fails hard: a bare integer
//! rolls as itself, and anything else degrades to a zero-total literal
//! whose breakdown is the raw text.

use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

lazy_static! {
    static ref DICE_RE: Regex = Regex::new(r"^(\d+)[dD](\d+)(?:([+-])(\d+))?$").unwrap();
}

/// Error type for strict dice parsing (`FromStr`).
///
/// The rolling entry points below never surface this; they degrade
/// instead. It exists for callers that want to validate editor input.
#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
}

/// A parsed `NdM` term with a signed flat modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceTerm {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceTerm {
    /// Parse a notation string. Returns `None` for anything outside the
    /// `NdM(+K|-K)?` grammar, including zero-sided dice.
    pub fn parse(notation: &str) -> Option<DiceTerm> {
        let caps = DICE_RE.captures(notation.trim())?;
        let count: u32 = caps[1].parse().ok()?;
        let sides: u32 = caps[2].parse().ok()?;
        if sides == 0 {
            return None;
        }
        let modifier = match (caps.get(3), caps.get(4)) {
            (Some(sign), Some(value)) => {
                let v: i32 = value.as_str().parse().ok()?;
                if sign.as_str() == "-" {
                    -v
                } else {
                    v
                }
            }
            _ => 0,
        };
        Some(DiceTerm {
            count,
            sides,
            modifier,
        })
    }

    /// Roll this term with the process RNG.
    pub fn roll(&self) -> RollResult {
        self.roll_with_rng(&mut rand::thread_rng())
    }

    /// Roll with a specific RNG (useful for testing).
    pub fn roll_with_rng<R: Rng>(&self, rng: &mut R) -> RollResult {
        // Guard against hand-built zero-sided terms; parse() never allows them.
        let sides = self.sides.max(1);
        let rolls: Vec<u32> = (0..self.count)
            .map(|_| rng.gen_range(1..=sides))
            .collect();
        let total = rolls.iter().sum::<u32>() as i32 + self.modifier;

        let mut breakdown = rolls
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("+");
        if self.modifier != 0 {
            if breakdown.is_empty() {
                breakdown = self.modifier.to_string();
            } else if self.modifier > 0 {
                breakdown.push_str(&format!("+{}", self.modifier));
            } else {
                breakdown.push_str(&self.modifier.to_string());
            }
        }
        if breakdown.is_empty() {
            breakdown.push('0');
        }

        RollResult { total, breakdown }
    }
}

impl FromStr for DiceTerm {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceTerm::parse(s).ok_or_else(|| DiceError::InvalidNotation(s.to_string()))
    }
}

impl fmt::Display for DiceTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        if self.modifier > 0 {
            write!(f, "+{}", self.modifier)?;
        } else if self.modifier < 0 {
            write!(f, "{}", self.modifier)?;
        }
        Ok(())
    }
}

/// Outcome of rolling one notation string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub total: i32,
    pub breakdown: String,
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.breakdown, self.total)
    }
}

/// Roll a notation string with the process RNG.
///
/// Never fails: valid `NdM±K` rolls normally, a bare integer yields
/// itself, and any other input yields `{total: 0, breakdown: input}`.
pub fn roll(notation: &str) -> RollResult {
    roll_with_rng(notation, &mut rand::thread_rng())
}

/// Roll with a specific RNG (useful for testing).
pub fn roll_with_rng<R: Rng>(notation: &str, rng: &mut R) -> RollResult {
    if let Some(term) = DiceTerm::parse(notation) {
        return term.roll_with_rng(rng);
    }
    if let Ok(value) = notation.trim().parse::<i32>() {
        return RollResult {
            total: value,
            breakdown: value.to_string(),
        };
    }
    RollResult {
        total: 0,
        breakdown: notation.to_string(),
    }
}

/// Whether a string is dice-shaped (as opposed to a literal or keyword).
pub fn is_dice_notation(value: &str) -> bool {
    DICE_RE.is_match(value.trim())
}

/// Merge two dice terms of the same die size into one
/// (`2d6` + `1d6+1` = `3d6+1`). Terms of different sizes, or sides that
/// do not parse, concatenate textually as `"a + b"`.
pub fn combine_dice_terms(a: &str, b: &str) -> String {
    match (DiceTerm::parse(a), DiceTerm::parse(b)) {
        (Some(x), Some(y)) if x.sides == y.sides => DiceTerm {
            count: x.count + y.count,
            sides: x.sides,
            modifier: x.modifier + y.modifier,
        }
        .to_string(),
        _ => format!("{} + {}", a, b),
    }
}
