//! Placeholder-template resolution and rendering.
//!
//! A template is prose with `{{id}}` placeholders resolved against an
//! entity's effect list. The reserved placeholder `{{name}}` substitutes
//! the entity's name; every other id looks up an effect. Resolution
//! produces structured segments; renderers turn segments into either a
//! tagged preview string or plain transcript text. The engine never
//! escapes user text; trust is the boundary layer's concern.
//!
//! Tagging grammar of the rich renderer (fixed, consumed by the UI):
//!
//! - `[chip:ID]...[/chip]`: interactive effect output (click-to-edit)
//! - `[span:ID]...[/span]`: non-interactive effect output
//! - `[missing:ID]`: dangling placeholder marker
//! - `[dice]...[/dice]`: dice-shaped substring inside an output

use crate::catalog::{self, EffectType};
use crate::effects::{Effect, EffectList};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

lazy_static! {
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"\{\{([^}]+)\}\}").unwrap();
    static ref DICE_SCAN_RE: Regex = Regex::new(r"\d+d\d+([+-]\d+)?").unwrap();
}

/// The reserved placeholder id substituted with the entity name.
pub const RESERVED_NAME: &str = "name";

/// Effect types rendered as interactive chips. Everything else visible
/// renders as a plain id-tagged span.
const INTERACTIVE: [EffectType; 5] = [
    EffectType::D20Roll,
    EffectType::Proficiency,
    EffectType::AttackStat,
    EffectType::Damage,
    EffectType::SaveThrow,
];

fn is_interactive(effect_type: EffectType) -> bool {
    INTERACTIVE.contains(&effect_type)
}

/// One resolved piece of a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// Literal prose (including the substituted entity name).
    Text { content: String },
    /// A combat effect's rendered output.
    Chip {
        effect_id: String,
        content: String,
        interactive: bool,
    },
    /// A placeholder whose id matches no effect.
    Missing { id: String },
}

enum Part {
    Text(String),
    Placeholder(String),
}

fn parse_parts(template: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut last = 0;
    for found in PLACEHOLDER_RE.find_iter(template) {
        if found.start() > last {
            parts.push(Part::Text(template[last..found.start()].to_string()));
        }
        // Strip the fixed two-character delimiters, trim the inner id.
        let inner = template[found.start() + 2..found.end() - 2].trim();
        parts.push(Part::Placeholder(inner.to_string()));
        last = found.end();
    }
    if last < template.len() {
        parts.push(Part::Text(template[last..].to_string()));
    }
    parts
}

fn resolve_inner(
    template: &str,
    effects: &EffectList,
    name: &str,
    overrides: Option<&HashMap<String, String>>,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    for part in parse_parts(template) {
        match part {
            Part::Text(content) => segments.push(Segment::Text { content }),
            Part::Placeholder(id) => {
                if id == RESERVED_NAME {
                    segments.push(Segment::Text {
                        content: name.to_string(),
                    });
                    continue;
                }
                match effects.find(&id) {
                    None => segments.push(Segment::Missing { id }),
                    // System effects are mechanical only, never visible.
                    Some(effect) if effect.is_system() => {}
                    Some(effect) => {
                        let content = overrides
                            .and_then(|rolls| rolls.get(&id).cloned())
                            .unwrap_or_else(|| catalog::format_output(&effect.kind));
                        if content.is_empty() {
                            continue;
                        }
                        let interactive = is_interactive(effect.kind.effect_type());
                        segments.push(Segment::Chip {
                            effect_id: id,
                            content,
                            interactive,
                        });
                    }
                }
            }
        }
    }
    segments
}

/// Resolve a template into structured segments.
///
/// The boundary layer decides how to escape or mark up each segment;
/// [`render_rich`] and [`render_plain`] are the two built-in renderings.
pub fn resolve(template: &str, effects: &EffectList, name: &str) -> Vec<Segment> {
    resolve_inner(template, effects, name, None)
}

/// Render the tagged preview string (see the module docs for the
/// grammar). Dice-shaped substrings inside effect output are wrapped in
/// `[dice]` tags. Never fails; dangling ids render as `[missing:ID]`.
pub fn render_rich(template: &str, effects: &EffectList, name: &str) -> String {
    let mut out = String::new();
    for segment in resolve(template, effects, name) {
        match segment {
            Segment::Text { content } => out.push_str(&content),
            Segment::Chip {
                effect_id,
                content,
                interactive,
            } => {
                let highlighted = DICE_SCAN_RE.replace_all(&content, "[dice]${0}[/dice]");
                if interactive {
                    out.push_str(&format!("[chip:{}]{}[/chip]", effect_id, highlighted));
                } else {
                    out.push_str(&format!("[span:{}]{}[/span]", effect_id, highlighted));
                }
            }
            Segment::Missing { id } => out.push_str(&format!("[missing:{}]", id)),
        }
    }
    out
}

/// Render plain transcript text: same substitution as [`render_rich`]
/// with all tagging stripped. Missing effects become empty.
pub fn render_plain(template: &str, effects: &EffectList, name: &str) -> String {
    segments_to_plain(resolve(template, effects, name))
}

/// Plain-text rendering where a live roll result substitutes verbatim
/// for its effect id instead of the static formatted output. Used for
/// chat transcripts once dice have actually been rolled for a cast.
pub fn render_chat_with_overrides(
    template: &str,
    effects: &EffectList,
    name: &str,
    rolls: &HashMap<String, String>,
) -> String {
    segments_to_plain(resolve_inner(template, effects, name, Some(rolls)))
}

fn segments_to_plain(segments: Vec<Segment>) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text { content } => out.push_str(&content),
            Segment::Chip { content, .. } => out.push_str(&content),
            Segment::Missing { .. } => {}
        }
    }
    out
}

fn placeholder_token(id: &str) -> String {
    format!("{{{{{}}}}}", id)
}

/// Remap placeholder ids to the effects' new order after a reorder.
///
/// The Nth reorderable placeholder slot (non-system, non-`name`,
/// known id) receives the id of the effect whose new order rank is N;
/// prose and non-reorderable placeholders keep their positions. This
/// preserves template prose while keeping placeholder-to-rank
/// correspondence after drag-reorder.
pub fn remap_placeholders(template: &str, effects: &EffectList) -> String {
    let parts = parse_parts(template);
    let reorderable = |id: &str| {
        id != RESERVED_NAME && effects.find(id).map(|e| !e.is_system()).unwrap_or(false)
    };

    let slot_ids: HashSet<String> = parts
        .iter()
        .filter_map(|part| match part {
            Part::Placeholder(id) if reorderable(id) => Some(id.clone()),
            _ => None,
        })
        .collect();

    // Desired slot contents: the reorderable effects that actually have
    // slots, in their new display order.
    let mut queue: VecDeque<String> = effects
        .sorted()
        .into_iter()
        .filter(|e| !e.is_system() && slot_ids.contains(&e.id))
        .map(|e| e.id.clone())
        .collect();

    let mut out = String::new();
    for part in parts {
        match part {
            Part::Text(text) => out.push_str(&text),
            Part::Placeholder(id) => {
                if reorderable(&id) {
                    let next = queue.pop_front().unwrap_or(id);
                    out.push_str(&placeholder_token(&next));
                } else {
                    out.push_str(&placeholder_token(&id));
                }
            }
        }
    }
    out
}

/// Auto-wire a newly added effect: append `" {{id}}"` when a non-system
/// effect has no placeholder yet. System effects never auto-append.
/// Idempotent.
pub fn ensure_placeholder(template: &str, effect: &Effect) -> String {
    if effect.is_system() {
        return template.to_string();
    }
    let present = parse_parts(template)
        .iter()
        .any(|p| matches!(p, Part::Placeholder(id) if id == &effect.id));
    if present {
        return template.to_string();
    }
    if template.is_empty() {
        placeholder_token(&effect.id)
    } else {
        format!("{} {}", template, placeholder_token(&effect.id))
    }
}

/// Remove an effect's placeholder from the template, collapsing the
/// spacing the auto-wiring added.
pub fn strip_placeholder(template: &str, id: &str) -> String {
    let token = placeholder_token(id);
    template
        .replace(&format!(" {}", token), "")
        .replace(&format!("{} ", token), "")
        .replace(&token, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Ability, DamageType, Effect, EffectKind};

    fn sword() -> EffectList {
        let mut effects = EffectList::new();
        effects.insert(Effect::damage("1d8", DamageType::Slashing).with_id("dmg"));
        effects
    }

    #[test]
    fn test_plain_render_end_to_end() {
        let text = render_plain("{{name}} strikes for {{dmg}}.", &sword(), "Sword");
        assert_eq!(text, "Sword strikes for 1d8 slashing.");
    }

    #[test]
    fn test_rich_render_tags_and_dice() {
        let out = render_rich("{{name}} strikes for {{dmg}}.", &sword(), "Sword");
        assert_eq!(
            out,
            "Sword strikes for [chip:dmg][dice]1d8[/dice] slashing[/chip]."
        );
    }

    #[test]
    fn test_non_interactive_renders_as_span() {
        let mut effects = EffectList::new();
        effects.insert(Effect::magic_bonus(1).with_id("magic"));
        let out = render_rich("{{magic}} blade", &effects, "x");
        assert_eq!(out, "[span:magic]+1[/span] blade");
    }

    #[test]
    fn test_missing_effect_marker() {
        let effects = EffectList::new();
        assert_eq!(
            render_rich("hits {{ghost}} hard", &effects, "x"),
            "hits [missing:ghost] hard"
        );
        // silently empty in plain mode
        assert_eq!(render_plain("hits {{ghost}} hard", &effects, "x"), "hits  hard");
    }

    #[test]
    fn test_system_effect_never_visible() {
        let mut effects = EffectList::new();
        effects.insert(Effect::new(EffectKind::ArmorClass { value: 15 }).with_id("ac"));
        // even when explicitly placeholder-referenced
        assert_eq!(render_rich("shield {{ac}} up", &effects, "x"), "shield  up");
        assert_eq!(render_plain("shield {{ac}} up", &effects, "x"), "shield  up");
    }

    #[test]
    fn test_placeholder_id_is_trimmed_and_case_sensitive() {
        let effects = sword();
        assert_eq!(render_plain("{{ dmg }}", &effects, "x"), "1d8 slashing");
        assert_eq!(render_plain("{{DMG}}", &effects, "x"), "");
    }

    #[test]
    fn test_resolve_segments() {
        let segments = resolve("{{name}}: {{dmg}} {{ghost}}", &sword(), "Sword");
        assert_eq!(
            segments,
            vec![
                Segment::Text {
                    content: "Sword".to_string()
                },
                Segment::Text {
                    content: ": ".to_string()
                },
                Segment::Chip {
                    effect_id: "dmg".to_string(),
                    content: "1d8 slashing".to_string(),
                    interactive: true,
                },
                Segment::Text {
                    content: " ".to_string()
                },
                Segment::Missing {
                    id: "ghost".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_chat_overrides_substitute_verbatim() {
        let mut rolls = HashMap::new();
        rolls.insert("dmg".to_string(), "7 slashing (4+3)".to_string());
        let out =
            render_chat_with_overrides("{{name}} strikes for {{dmg}}.", &sword(), "Sword", &rolls);
        assert_eq!(out, "Sword strikes for 7 slashing (4+3).");
    }

    #[test]
    fn test_chat_overrides_ignore_missing_and_system() {
        let mut effects = EffectList::new();
        effects.insert(Effect::new(EffectKind::ArmorClass { value: 15 }).with_id("ac"));
        let mut rolls = HashMap::new();
        rolls.insert("ac".to_string(), "15".to_string());
        rolls.insert("ghost".to_string(), "99".to_string());
        let out = render_chat_with_overrides("{{ac}}{{ghost}}", &effects, "x", &rolls);
        assert_eq!(out, "");
    }

    #[test]
    fn test_remap_follows_new_order() {
        let mut effects = EffectList::new();
        effects.insert(Effect::damage("1d6", DamageType::Fire).with_id("a"));
        effects.insert(Effect::damage("1d8", DamageType::Cold).with_id("b"));
        effects.insert(Effect::damage("1d10", DamageType::Acid).with_id("c"));

        let template = "first {{a}}, then {{b}}, finally {{c}}";
        effects.reorder(&["c", "a", "b"]).unwrap();
        let remapped = remap_placeholders(template, &effects);
        assert_eq!(remapped, "first {{c}}, then {{a}}, finally {{b}}");
    }

    #[test]
    fn test_remap_skips_name_and_system_slots() {
        let mut effects = EffectList::new();
        effects.insert(Effect::damage("1d6", DamageType::Fire).with_id("a"));
        effects.insert(Effect::new(EffectKind::ArmorClass { value: 12 }).with_id("ac"));
        effects.insert(Effect::damage("1d8", DamageType::Cold).with_id("b"));

        let template = "{{name}} {{a}} {{ac}} {{b}}";
        effects.reorder(&["b", "ac", "a"]).unwrap();
        let remapped = remap_placeholders(template, &effects);
        // name and the system slot stay put; a/b swap by new rank
        assert_eq!(remapped, "{{name}} {{b}} {{ac}} {{a}}");
    }

    #[test]
    fn test_remap_leaves_dangling_ids_alone() {
        let effects = sword();
        let template = "{{ghost}} and {{dmg}}";
        assert_eq!(remap_placeholders(template, &effects), template);
    }

    #[test]
    fn test_ensure_placeholder_appends_once() {
        let effect = Effect::damage("1d8", DamageType::Slashing).with_id("dmg");
        let once = ensure_placeholder("A blade.", &effect);
        assert_eq!(once, "A blade. {{dmg}}");
        assert_eq!(ensure_placeholder(&once, &effect), once);
        assert_eq!(ensure_placeholder("", &effect), "{{dmg}}");
    }

    #[test]
    fn test_ensure_placeholder_skips_system() {
        let effect = Effect::new(EffectKind::CritThreshold { threshold: 19 }).with_id("crit");
        assert_eq!(ensure_placeholder("A blade.", &effect), "A blade.");
    }

    #[test]
    fn test_strip_placeholder() {
        assert_eq!(strip_placeholder("A blade. {{dmg}}", "dmg"), "A blade.");
        assert_eq!(strip_placeholder("{{dmg}} first", "dmg"), "first");
        assert_eq!(strip_placeholder("a {{dmg}} b", "dmg"), "a b");
        assert_eq!(strip_placeholder("no such", "dmg"), "no such");
    }
}
