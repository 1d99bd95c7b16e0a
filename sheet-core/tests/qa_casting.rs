//! QA tests for cast resolution: scaling, attack and save flows, dice
//! properties, and charges formulas.

use rand::rngs::StdRng;
use rand::SeedableRng;
use sheet_core::cast::AbilityModifiers;
use sheet_core::charges::{ChargesFormula, ChargesValue};
use sheet_core::effects::{Ability, DamageType, Effect};
use sheet_core::entity::{CastType, TemplateEntity};
use sheet_core::scaling::{apply_scaling, LevelScaling, LevelStep, SlotScaling};
use sheet_core::{dice, template};

fn mods() -> AbilityModifiers {
    AbilityModifiers::new(3, 2, 1, 0, 1, -1)
}

// =============================================================================
// TEST 1: Dice roll bounds
// =============================================================================

#[test]
fn test_roll_totals_stay_in_bounds() {
    for count in [0u32, 1, 2, 5, 20] {
        for sides in [4u32, 6, 8, 10, 12, 20] {
            for modifier in [-10i32, -1, 0, 1, 10] {
                let sign = if modifier >= 0 { "+" } else { "" };
                let notation = if modifier == 0 {
                    format!("{}d{}", count, sides)
                } else {
                    format!("{}d{}{}{}", count, sides, sign, modifier)
                };
                let result = dice::roll(&notation);
                let low = count as i32 + modifier;
                let high = (count * sides) as i32 + modifier;
                assert!(
                    result.total >= low && result.total <= high,
                    "{notation} rolled {} outside [{low}, {high}]",
                    result.total
                );
                if count == 0 {
                    assert_eq!(result.total, modifier);
                }
            }
        }
    }
}

// =============================================================================
// TEST 2: Scaling formulas
// =============================================================================

#[test]
fn test_slot_scaling_example() {
    let slot = SlotScaling {
        base_slot: 1,
        add_dice_per_slot: "1d6".to_string(),
    };
    assert_eq!(apply_scaling("1d6", 3, 1, Some(&slot), None, 5), "3d6");
}

#[test]
fn test_cantrip_level_scaling() {
    let levels = LevelScaling {
        steps: vec![
            LevelStep {
                level: 17,
                add_dice: "1d10".to_string(),
            },
            LevelStep {
                level: 5,
                add_dice: "1d10".to_string(),
            },
            LevelStep {
                level: 11,
                add_dice: "1d10".to_string(),
            },
        ],
    };
    let mut bolt = TemplateEntity::spell("Fire Bolt", 0)
        .with_cast_type(CastType::AttackRoll)
        .with_level_scaling(levels);
    bolt.add_effect(Effect::damage("1d10", DamageType::Fire).with_id("dmg"));

    let outcome = bolt.resolve_cast(0, 11, &mods(), 4);
    assert!(outcome.narrative.contains("(3d10 = "));
}

// =============================================================================
// TEST 3: Full attack flow with seeded RNG
// =============================================================================

#[test]
fn test_attack_flow_deterministic() {
    let mut sword = TemplateEntity::spell("Shadow Blade", 2).with_cast_type(CastType::AttackRoll);
    sword.add_effect(Effect::proficiency().with_id("prof"));
    sword.add_effect(Effect::attack_stat(Ability::Dexterity).with_id("stat"));
    sword.add_effect(Effect::damage("2d8", DamageType::Psychic).with_id("dmg"));

    let mut rng = StdRng::seed_from_u64(99);
    let outcome = sword.resolve_cast_with_rng(2, 5, &mods(), 3, &mut rng);

    let mut rng = StdRng::seed_from_u64(99);
    let again = sword.resolve_cast_with_rng(2, 5, &mods(), 3, &mut rng);

    assert_eq!(outcome.narrative, again.narrative);
    assert_eq!(outcome.event.kind, "attack_roll");
    assert!(outcome.narrative.contains("prof +3"));
    assert!(outcome.narrative.contains("DEX +2"));
    assert!(outcome.narrative.contains("psychic damage"));
}

// =============================================================================
// TEST 4: Save flow feeds the chat renderer
// =============================================================================

#[test]
fn test_save_flow_and_chat_overrides() {
    let mut fireball = TemplateEntity::spell("Fireball", 3)
        .with_cast_type(CastType::SaveThrow)
        .with_template("{{name}} detonates: {{save}}, {{dmg}}")
        .with_slot_scaling(SlotScaling {
            base_slot: 3,
            add_dice_per_slot: "1d6".to_string(),
        });
    fireball
        .effects
        .insert(Effect::save_throw(Ability::Dexterity, 15).with_id("save"));
    fireball
        .effects
        .insert(Effect::damage("8d6", DamageType::Fire).with_id("dmg"));

    let outcome = fireball.resolve_cast(4, 7, &mods(), 3);
    assert!(outcome.narrative.contains("DC 15 DEX save"));
    assert!(outcome.narrative.contains("(9d6 = "));
    assert!(outcome.rolls.contains_key("dmg"));

    let chat = fireball.render_chat(&outcome.rolls);
    assert!(chat.starts_with("Fireball detonates: DC 15 DEX save, "));
    assert!(chat.contains("fire ("));
}

// =============================================================================
// TEST 5: Charges formulas
// =============================================================================

#[test]
fn test_charges_table_property() {
    let formula = ChargesFormula::from_json(&serde_json::json!({
        "mode": "table",
        "steps": [
            {"level": 1, "max": 2},
            {"level": 5, "max": "unlimited"}
        ]
    }));
    assert_eq!(formula.evaluate(3, &mods(), 2), ChargesValue::Limited(2));
    assert_eq!(formula.evaluate(5, &mods(), 2), ChargesValue::Unlimited);
}

#[test]
fn test_charges_on_entity() {
    let wand = TemplateEntity::item("Wand of Magic Missiles").with_charges(
        ChargesFormula::from_json(&serde_json::json!({
            "mode": "linear", "base": 3, "per_level": 1, "cap": 7
        })),
    );
    assert_eq!(
        wand.max_charges(2, &mods(), 2),
        Some(ChargesValue::Limited(4))
    );
    assert_eq!(
        wand.max_charges(20, &mods(), 6),
        Some(ChargesValue::Limited(7))
    );
}

// =============================================================================
// TEST 6: Degradation never panics a render or roll
// =============================================================================

#[test]
fn test_garbage_inputs_degrade_quietly() {
    // malformed dice
    assert_eq!(dice::roll("banana").total, 0);
    assert_eq!(dice::roll("banana").breakdown, "banana");

    // attack spell whose damage dice are garbage still resolves
    let mut cursed = TemplateEntity::spell("Cursed", 1).with_cast_type(CastType::AttackRoll);
    cursed.add_effect(Effect::damage("oops", DamageType::Poison).with_id("dmg"));
    let outcome = cursed.resolve_cast(1, 1, &mods(), 2);
    assert!(outcome.narrative.contains("0 poison damage"));

    // scaling over garbage concatenates instead of failing
    let slot = SlotScaling {
        base_slot: 1,
        add_dice_per_slot: "1d6".to_string(),
    };
    assert_eq!(apply_scaling("oops", 2, 1, Some(&slot), None, 1), "oops + 1d6");

    // templates full of nonsense still render
    let junk = TemplateEntity::item("Junk").with_template("{{}} {{name}} {{gone}}");
    let rendered = template::render_rich(&junk.template, &junk.effects, &junk.name);
    assert!(rendered.contains("Junk"));
}
