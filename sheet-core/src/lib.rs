//! Effect & template resolution engine for a tabletop-RPG
//! character-sheet companion.
//!
//! This crate provides:
//! - A typed, ordered effect model for items and spells
//! - A static catalog mapping effect types to fields and output patterns
//! - Placeholder-template rendering (tagged preview or plain transcript)
//! - Dice notation parsing and rolling with breakdown traces
//! - Slot/level scaling and full cast resolution
//! - Charges (resource maximum) formulas
//!
//! The surrounding application (forms, dialogs, routing, storage, AI
//! chat) is an external collaborator: it hands the engine JSON-shaped
//! entities and character numbers, and persists whatever strings come
//! back. The engine is synchronous and holds no state across calls.
//!
//! # Quick Start
//!
//! ```
//! use sheet_core::effects::DamageType;
//! use sheet_core::{Effect, TemplateEntity};
//!
//! let mut sword = TemplateEntity::item("Sword")
//!     .with_template("{{name}} strikes for {{dmg}}.");
//! sword.effects.insert(Effect::damage("1d8", DamageType::Slashing).with_id("dmg"));
//!
//! assert_eq!(sword.render_text(), "Sword strikes for 1d8 slashing.");
//! ```

pub mod cast;
pub mod catalog;
pub mod charges;
pub mod dice;
pub mod effects;
pub mod entity;
pub mod scaling;
pub mod template;

// Primary public API
pub use cast::{resolve_cast, AbilityModifiers, CastOutcome, RollEvent};
pub use catalog::{EffectDefinition, EffectType, FieldKind, FieldSpec};
pub use charges::{ChargesFormula, ChargesValue};
pub use dice::{combine_dice_terms, is_dice_notation, roll, DiceTerm, RollResult};
pub use effects::{Ability, DamageType, Effect, EffectError, EffectKind, EffectList};
pub use entity::{CastType, EntityKind, TemplateEntity};
pub use template::{render_plain, render_rich, Segment};
