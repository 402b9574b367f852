//! Skill checks with rank-tiered dice pools.

use sw_core::{Entity, EntityKind, Item, ItemKind};

use super::{CheckKind, CheckOutcome, CheckRequest, CheckResult, label, roll_check};
use crate::config::RuleConfig;
use crate::derived::{modifiers_for, require_character, require_npc};
use crate::dice::{Bindings, DiceFormula, DiceRoller, Term};
use crate::error::{MechResult, Precondition};

/// The dice pool for a skill rank: 2d6 below rank 3, best two of 3d6 at
/// ranks 3 and 4, best two of 4d6 from rank 5.
pub fn skill_pool(rank: i32) -> &'static str {
    match rank {
        i32::MIN..=2 => "2d6",
        3 | 4 => "3d6kh2",
        _ => "4d6kh2",
    }
}

/// The full skill formula: the pool (or the configured override) plus the
/// `@skill`, `@stat`, and `@modifier` bindings.
pub fn skill_formula(rank: i32, config: &RuleConfig) -> MechResult<DiceFormula> {
    let base = config.custom_formula.as_deref().unwrap_or(skill_pool(rank));
    Ok(DiceFormula::parse(base)?
        .plus(Term::binding("skill"))
        .plus(Term::binding("stat"))
        .plus(Term::binding("modifier")))
}

/// Roll the skill named `skill` for an entity.
///
/// Characters need a matching skill item. NPCs roll 2d6 plus their flat
/// skill bonus for any skill.
pub fn resolve_skill_check(
    entity: &Entity,
    skill: &str,
    request: &CheckRequest,
    config: &RuleConfig,
    roller: &mut impl DiceRoller,
) -> MechResult<CheckResult> {
    match entity.kind {
        EntityKind::Character => {
            require_character(entity)?;
            let item = entity
                .find_item(skill)
                .filter(|i| matches!(i.kind, ItemKind::Skill(_)))
                .ok_or_else(|| Precondition::MissingSkill {
                    entity: entity.name.clone(),
                    skill: skill.to_string(),
                })?;
            resolve_skill_item(entity, item, request, config, roller)
        }
        EntityKind::Npc => resolve_npc_skill_check(entity, skill, request, roller),
        EntityKind::Faction | EntityKind::Custom(_) => Err(Precondition::UnsupportedKind {
            entity: entity.name.clone(),
            kind: entity.kind.clone(),
        }
        .into()),
    }
}

/// Roll a specific skill item owned by `entity`.
pub fn resolve_skill_item(
    entity: &Entity,
    item: &Item,
    request: &CheckRequest,
    config: &RuleConfig,
    roller: &mut impl DiceRoller,
) -> MechResult<CheckResult> {
    let Some(skill) = item.as_skill() else {
        return Err(Precondition::NotRollable {
            item: item.name.clone(),
            kind: item.kind.type_name(),
        }
        .into());
    };
    let modifiers = modifiers_for(entity)?.ok_or_else(|| Precondition::UnsupportedKind {
        entity: entity.name.clone(),
        kind: entity.kind.clone(),
    })?;

    let attribute = request.attribute.unwrap_or(skill.attribute);
    let formula = skill_formula(skill.rank, config)?;
    let bindings = Bindings::new()
        .with("skill", skill.rank)
        .with("stat", modifiers.get(attribute))
        .with("modifier", request.modifier);

    roll_check(
        CheckKind::Skill,
        label(&item.name, entity),
        &formula,
        &bindings,
        roller,
        |_| CheckOutcome::Total,
    )
}

fn resolve_npc_skill_check(
    entity: &Entity,
    skill: &str,
    request: &CheckRequest,
    roller: &mut impl DiceRoller,
) -> MechResult<CheckResult> {
    let npc = require_npc(entity)?;
    let formula = DiceFormula::parse("2d6 + @skill + @modifier")?;
    let bindings = Bindings::new()
        .with("skill", npc.skill_bonus)
        .with("modifier", request.modifier);
    roll_check(
        CheckKind::Skill,
        label(skill, entity),
        &formula,
        &bindings,
        roller,
        |_| CheckOutcome::Total,
    )
}
