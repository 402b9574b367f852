//! Weapon attacks, damage, burst fire, and trauma.
//!
//! An attack is one logical unit: ammunition precondition, ammunition
//! debit, attack roll, damage roll. Every check that can fail runs before
//! the debit, so an aborted attack rolls nothing and spends nothing.

use sw_core::item::{Ammo, AmmoType, RangeClass, WeaponData};
use sw_core::{Attribute, AttributeModifiers, Entity, EntityKind, EntityStore, ItemId, Patch};

use super::{CheckKind, CheckOutcome, CheckRequest, CheckResult, Reportable, label, roll_check};
use crate::config::{RuleConfig, TraumaRule};
use crate::derived::{modifiers_for, require_npc};
use crate::dice::{Bindings, DiceFormula, DiceRoller, Term};
use crate::error::{MechResult, Precondition};

/// Rounds a burst consumes.
pub const BURST_ROUNDS: i32 = 3;
/// Attack and damage bonus for bursting.
pub const BURST_BONUS: i32 = 2;

/// The trauma die roll for a hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraumaOutcome {
    /// The trauma die check.
    pub roll: CheckResult,
    /// Damage multiplier applied on a traumatic hit.
    pub rating: i32,
    /// Whether the hit is traumatic.
    pub traumatic: bool,
}

/// A complete weapon attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackResult {
    /// The attack roll.
    pub attack: CheckResult,
    /// The damage roll.
    pub damage: CheckResult,
    /// The trauma die, when the trauma rule applies.
    pub trauma: Option<TraumaOutcome>,
    /// Whether the attack was a burst.
    pub burst: bool,
    /// Rounds debited.
    pub ammo_spent: i32,
}

impl AttackResult {
    /// Damage dealt, after any trauma multiplier.
    pub fn damage_total(&self) -> i32 {
        match &self.trauma {
            Some(t) if t.traumatic => self.damage.total().saturating_mul(t.rating),
            _ => self.damage.total(),
        }
    }
}

impl Reportable for AttackResult {
    fn checks(&self) -> Vec<&CheckResult> {
        let mut checks = vec![&self.attack, &self.damage];
        if let Some(trauma) = &self.trauma {
            checks.push(&trauma.roll);
        }
        checks
    }
}

/// Whether the weapon can fire at all.
pub fn has_ammo(ammo: &Ammo) -> bool {
    ammo.ammo_type.is_unmetered() || ammo.value > 0
}

/// Whether the weapon can fire a burst right now.
pub fn burst_eligible(ammo: &Ammo) -> bool {
    ammo.burst
        && match &ammo.ammo_type {
            AmmoType::Infinite => true,
            AmmoType::None => false,
            AmmoType::Typed(_) => ammo.value >= BURST_ROUNDS,
        }
}

/// Attack with a weapon the entity owns.
///
/// Ammunition is debited through the store with a version check against
/// the snapshot before anything is rolled.
pub async fn resolve_weapon_attack<S, R>(
    store: &S,
    entity: &Entity,
    weapon: ItemId,
    request: &CheckRequest,
    config: &RuleConfig,
    roller: &mut R,
) -> MechResult<AttackResult>
where
    S: EntityStore + ?Sized,
    R: DiceRoller,
{
    let index = entity
        .item_index(weapon)
        .ok_or_else(|| Precondition::MissingItem {
            entity: entity.name.clone(),
            item: weapon,
        })?;
    let item = &entity.items[index];
    let data = item.as_weapon().ok_or_else(|| Precondition::NotRollable {
        item: item.name.clone(),
        kind: item.kind.type_name(),
    })?;

    if !has_ammo(&data.ammo) {
        return Err(Precondition::NoAmmo {
            weapon: item.name.clone(),
        }
        .into());
    }
    if request.burst && !burst_eligible(&data.ammo) {
        return Err(Precondition::InsufficientAmmoForBurst {
            weapon: item.name.clone(),
            remaining: data.ammo.value,
        }
        .into());
    }

    let modifiers = combat_modifiers(entity)?;
    let attribute = request
        .attribute
        .or(data.attribute)
        .unwrap_or_else(|| default_attribute(data.range));
    let skill = skill_bonus(entity, request.skill.as_deref().or(data.skill.as_deref()))?;

    let bonus = if request.burst { BURST_BONUS } else { 0 };
    let mut attack_formula = DiceFormula::parse("1d20")?
        .plus(Term::binding("stat"))
        .plus(Term::binding("skill"))
        .plus(Term::binding("modifier"))
        .plus(Term::binding("ab"));
    let attack_bindings = Bindings::new()
        .with("stat", modifiers.get(attribute))
        .with("skill", skill)
        .with("modifier", request.modifier)
        .with("ab", data.attack_bonus);

    let mut damage_formula = damage_formula(data)?;
    let damage_bindings = attribute_bindings(&modifiers).with("bonus", request.damage_bonus);
    if bonus > 0 {
        attack_formula = attack_formula.plus(Term::constant(bonus));
        damage_formula = damage_formula.plus(Term::constant(bonus));
    }
    attack_formula.check_bindings(&attack_bindings)?;
    damage_formula.check_bindings(&damage_bindings)?;

    let trauma_formula = match (&config.trauma_rule, &data.trauma) {
        (TraumaRule::On, Some(profile)) => Some((DiceFormula::parse(&profile.die)?, profile.rating)),
        _ => None,
    };

    let ammo_spent = debit_ammo(store, entity, index, data, request.burst).await?;

    let attack = roll_check(
        CheckKind::Attack,
        label(&item.name, entity),
        &attack_formula,
        &attack_bindings,
        roller,
        |_| CheckOutcome::Total,
    )?;
    let damage = roll_check(
        CheckKind::Damage,
        label(&format!("{} damage", item.name), entity),
        &damage_formula,
        &damage_bindings,
        roller,
        |_| CheckOutcome::Total,
    )?;

    let trauma = match trauma_formula {
        Some((formula, rating)) => {
            let target = request.trauma_target;
            let roll = roll_check(
                CheckKind::Trauma,
                label(&format!("{} trauma", item.name), entity),
                &formula,
                &Bindings::new(),
                roller,
                |total| CheckOutcome::against(target, total >= target),
            )?;
            let traumatic = roll.succeeded() == Some(true);
            Some(TraumaOutcome {
                roll,
                rating,
                traumatic,
            })
        }
        None => None,
    };

    Ok(AttackResult {
        attack,
        damage,
        trauma,
        burst: request.burst,
        ammo_spent,
    })
}

/// Roll a weapon's damage alone: no attack roll and no ammunition.
pub fn resolve_damage_roll(
    entity: &Entity,
    weapon: ItemId,
    damage_bonus: i32,
    roller: &mut impl DiceRoller,
) -> MechResult<CheckResult> {
    let item = entity.item(weapon).ok_or_else(|| Precondition::MissingItem {
        entity: entity.name.clone(),
        item: weapon,
    })?;
    let data = item.as_weapon().ok_or_else(|| Precondition::NotRollable {
        item: item.name.clone(),
        kind: item.kind.type_name(),
    })?;
    let modifiers = combat_modifiers(entity)?;

    roll_check(
        CheckKind::Damage,
        label(&format!("{} damage", item.name), entity),
        &damage_formula(data)?,
        &attribute_bindings(&modifiers).with("bonus", damage_bonus),
        roller,
        |_| CheckOutcome::Total,
    )
}

async fn debit_ammo<S: EntityStore + ?Sized>(
    store: &S,
    entity: &Entity,
    index: usize,
    data: &WeaponData,
    burst: bool,
) -> MechResult<i32> {
    if data.ammo.ammo_type.is_unmetered() {
        return Ok(0);
    }
    let spent = if burst { BURST_ROUNDS } else { 1 };
    let remaining = data.ammo.value - spent;

    let mut patch = Patch::new();
    patch.set(format!("items.{index}.ammo.value"), remaining);
    store
        .apply_patch(entity.id, &patch, Some(entity.version))
        .await?;

    tracing::info!(
        entity = %entity.name,
        weapon = %entity.items[index].name,
        spent,
        remaining,
        "debited ammo"
    );
    Ok(spent)
}

fn damage_formula(data: &WeaponData) -> MechResult<DiceFormula> {
    Ok(DiceFormula::parse(&data.damage)?.plus(Term::binding("bonus")))
}

fn combat_modifiers(entity: &Entity) -> MechResult<AttributeModifiers> {
    modifiers_for(entity)?.ok_or_else(|| {
        Precondition::UnsupportedKind {
            entity: entity.name.clone(),
            kind: entity.kind.clone(),
        }
        .into()
    })
}

/// `@str` .. `@cha`, so damage formulas can reference attributes.
fn attribute_bindings(modifiers: &AttributeModifiers) -> Bindings {
    Attribute::ALL
        .iter()
        .fold(Bindings::new(), |b, &a| b.with(a.key(), modifiers.get(a)))
}

fn default_attribute(range: RangeClass) -> Attribute {
    match range {
        RangeClass::Melee => Attribute::Str,
        RangeClass::Ranged | RangeClass::Thrown => Attribute::Dex,
    }
}

/// Skill rank for characters, flat skill bonus for NPCs.
fn skill_bonus(entity: &Entity, skill: Option<&str>) -> MechResult<i32> {
    if entity.kind == EntityKind::Npc {
        return Ok(require_npc(entity)?.skill_bonus);
    }
    let Some(name) = skill else {
        return Ok(0);
    };
    entity
        .find_item(name)
        .and_then(|item| item.as_skill())
        .map(|s| s.rank)
        .ok_or_else(|| {
            Precondition::MissingSkill {
                entity: entity.name.clone(),
                skill: name.to_string(),
            }
            .into()
        })
}
