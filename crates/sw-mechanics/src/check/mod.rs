//! Check resolution: skill, attribute, save, morale, weapon, and asset rolls.
//!
//! Every check is a single evaluate-and-report transaction over an entity
//! snapshot. Only weapon attacks write back to the store (ammunition).
//! Failures split into [`Precondition`]s, which [`report`] turns into
//! warnings, and everything else, which propagates.

pub mod asset;
pub mod attribute;
pub mod morale;
pub mod save;
pub mod skill;
pub mod weapon;

pub use asset::{AssetAction, AssetResult, resolve_asset_action};
pub use attribute::{resolve_attribute_check, resolve_attribute_roll_d20};
pub use morale::resolve_morale_check;
pub use save::{SaveKind, resolve_save_check};
pub use skill::{resolve_skill_check, resolve_skill_item, skill_pool};
pub use weapon::{
    AttackResult, TraumaOutcome, burst_eligible, has_ammo, resolve_damage_roll,
    resolve_weapon_attack,
};

use std::fmt;

use serde::{Deserialize, Serialize};
use sw_core::{Attribute, Entity, EntityStore, Item, ItemKind};

use crate::config::RuleConfig;
use crate::dice::{Bindings, DiceFormula, DiceRoller, RollResult};
use crate::error::{MechError, MechResult, Precondition};
use crate::sink::ResultSink;

/// Default trauma target: a trauma die at or above it is traumatic.
pub const DEFAULT_TRAUMA_TARGET: i32 = 6;

/// What kind of roll produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Skill check.
    Skill,
    /// Attribute check.
    Attribute,
    /// Saving throw.
    Save,
    /// NPC morale.
    Morale,
    /// Weapon or asset hit roll.
    Attack,
    /// Damage roll.
    Damage,
    /// Trauma die.
    Trauma,
    /// Initiative roll.
    Initiative,
}

/// How a total is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// The total stands on its own; the caller compares it to a target.
    Total,
    /// The check met its target.
    Success {
        /// The target that was met.
        target: i32,
    },
    /// The check missed its target.
    Failure {
        /// The target that was missed.
        target: i32,
    },
}

impl CheckOutcome {
    /// Success when `passed`, failure otherwise.
    pub fn against(target: i32, passed: bool) -> Self {
        if passed {
            Self::Success { target }
        } else {
            Self::Failure { target }
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Total => write!(f, "total"),
            Self::Success { target } => write!(f, "success vs {target}"),
            Self::Failure { target } => write!(f, "failure vs {target}"),
        }
    }
}

/// A resolved check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Roll kind.
    pub kind: CheckKind,
    /// Human-readable description, e.g. `Shoot (Kael)`.
    pub label: String,
    /// The evaluated formula, every die, and the total.
    pub roll: RollResult,
    /// How the total was classified.
    pub outcome: CheckOutcome,
}

impl CheckResult {
    /// The roll total.
    pub fn total(&self) -> i32 {
        self.roll.total
    }

    /// `Some(true)` on success, `Some(false)` on failure, `None` for plain
    /// totals.
    pub fn succeeded(&self) -> Option<bool> {
        match self.outcome {
            CheckOutcome::Total => None,
            CheckOutcome::Success { .. } => Some(true),
            CheckOutcome::Failure { .. } => Some(false),
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.roll)?;
        if self.outcome != CheckOutcome::Total {
            write!(f, " ({})", self.outcome)?;
        }
        Ok(())
    }
}

/// Caller-supplied parameters for a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    /// Attribute to use instead of the skill's or weapon's own.
    pub attribute: Option<Attribute>,
    /// Skill to use instead of the weapon's own.
    pub skill: Option<String>,
    /// Ad-hoc situational modifier.
    pub modifier: i32,
    /// Ad-hoc damage bonus.
    pub damage_bonus: i32,
    /// Fire a burst.
    pub burst: bool,
    /// Trauma die result needed for a traumatic hit.
    pub trauma_target: i32,
}

impl Default for CheckRequest {
    fn default() -> Self {
        Self {
            attribute: None,
            skill: None,
            modifier: 0,
            damage_bonus: 0,
            burst: false,
            trauma_target: DEFAULT_TRAUMA_TARGET,
        }
    }
}

impl CheckRequest {
    /// A request with only an ad-hoc modifier.
    pub fn with_modifier(modifier: i32) -> Self {
        Self {
            modifier,
            ..Self::default()
        }
    }

    /// Builder: fire a burst.
    pub fn burst(mut self) -> Self {
        self.burst = true;
        self
    }

    /// Builder: override the attribute.
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attribute = Some(attribute);
        self
    }

    /// Builder: override the skill.
    pub fn skill(mut self, skill: impl Into<String>) -> Self {
        self.skill = Some(skill.into());
        self
    }

    /// Builder: add a damage bonus.
    pub fn damage_bonus(mut self, bonus: i32) -> Self {
        self.damage_bonus = bonus;
        self
    }
}

/// The result of rolling an item through [`resolve_check_for`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemCheck {
    /// A skill check.
    Skill(CheckResult),
    /// A weapon attack.
    Attack(AttackResult),
    /// A faction asset action.
    Asset(AssetResult),
}

/// Anything that can be sent to a [`ResultSink`].
pub trait Reportable {
    /// Every check result it carries, in roll order.
    fn checks(&self) -> Vec<&CheckResult>;
}

impl Reportable for CheckResult {
    fn checks(&self) -> Vec<&CheckResult> {
        vec![self]
    }
}

impl Reportable for ItemCheck {
    fn checks(&self) -> Vec<&CheckResult> {
        match self {
            Self::Skill(result) => vec![result],
            Self::Attack(attack) => attack.checks(),
            Self::Asset(asset) => asset.checks(),
        }
    }
}

/// The operation boundary: record successes, turn preconditions into
/// warnings, and propagate everything else.
///
/// Returns `Ok(None)` when a warning was issued.
pub fn report<T: Reportable>(
    result: MechResult<T>,
    sink: &mut dyn ResultSink,
) -> MechResult<Option<T>> {
    match result {
        Ok(value) => {
            for check in value.checks() {
                sink.record(check);
            }
            Ok(Some(value))
        }
        Err(MechError::Precondition(warning)) => {
            tracing::warn!(%warning, "check aborted");
            sink.warn(&warning);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Roll whatever check an item supports.
///
/// Skills roll a skill check, weapons an attack, assets an asset attack.
/// Every other item kind is not rollable. `owner` is `None` for items that
/// belong to no entity.
pub async fn resolve_check_for<S, R>(
    store: &S,
    owner: Option<&Entity>,
    item: &Item,
    request: &CheckRequest,
    config: &RuleConfig,
    roller: &mut R,
) -> MechResult<ItemCheck>
where
    S: EntityStore + ?Sized,
    R: DiceRoller,
{
    let rollable = matches!(
        item.kind,
        ItemKind::Skill(_) | ItemKind::Weapon(_) | ItemKind::Asset(_)
    );
    if !rollable {
        return Err(Precondition::NotRollable {
            item: item.name.clone(),
            kind: item.kind.type_name(),
        }
        .into());
    }
    let owner = owner.ok_or_else(|| Precondition::NoActor {
        item: item.name.clone(),
    })?;

    match &item.kind {
        ItemKind::Skill(_) => {
            resolve_skill_item(owner, item, request, config, roller).map(ItemCheck::Skill)
        }
        ItemKind::Weapon(_) => {
            resolve_weapon_attack(store, owner, item.id, request, config, roller)
                .await
                .map(ItemCheck::Attack)
        }
        _ => resolve_asset_action(owner, item.id, AssetAction::Attack, roller).map(ItemCheck::Asset),
    }
}

/// Parse and evaluate a formula into a [`CheckResult`].
pub(crate) fn roll_check(
    kind: CheckKind,
    label: String,
    formula: &DiceFormula,
    bindings: &Bindings,
    roller: &mut impl DiceRoller,
    classify: impl FnOnce(i32) -> CheckOutcome,
) -> MechResult<CheckResult> {
    let roll = formula.evaluate(bindings, roller)?;
    let outcome = classify(roll.total);
    Ok(CheckResult {
        kind,
        label,
        roll,
        outcome,
    })
}

/// Label for a check made by `entity`.
pub(crate) fn label(what: &str, entity: &Entity) -> String {
    format!("{what} ({})", entity.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedRoller;
    use crate::sink::MemorySink;
    use sw_core::item::{GearData, SkillData};
    use sw_core::{AttributeSet, EntityKind, MemoryStore};
    use sw_core::component::CharacterComponent;

    fn scout() -> Entity {
        let mut entity = Entity::new(EntityKind::Character, "Scout");
        entity.components.character = Some(CharacterComponent::new(AttributeSet::default(), 1));
        entity
    }

    fn notice() -> Item {
        Item::new(
            "Notice",
            ItemKind::Skill(SkillData {
                rank: 1,
                attribute: Attribute::Wis,
            }),
        )
    }

    #[test]
    fn display_includes_outcome_only_when_classified() {
        let total = CheckResult {
            kind: CheckKind::Skill,
            label: "Notice (Scout)".to_string(),
            roll: RollResult {
                formula: "2d6 + @skill".to_string(),
                dice: Vec::new(),
                total: 8,
            },
            outcome: CheckOutcome::Total,
        };
        insta::assert_snapshot!(total.to_string(), @"Notice (Scout): 2d6 + @skill = [] = 8");

        let save = CheckResult {
            outcome: CheckOutcome::against(14, false),
            ..total
        };
        assert_eq!(save.succeeded(), Some(false));
        insta::assert_snapshot!(
            save.to_string(),
            @"Notice (Scout): 2d6 + @skill = [] = 8 (failure vs 14)"
        );
    }

    #[tokio::test]
    async fn dispatcher_rolls_skills() {
        let store = MemoryStore::new();
        let entity = scout().with_item(notice());
        let item = entity.items[0].clone();
        let mut roller = ScriptedRoller::new([3, 4]);

        let check = resolve_check_for(
            &store,
            Some(&entity),
            &item,
            &CheckRequest::default(),
            &RuleConfig::default(),
            &mut roller,
        )
        .await
        .unwrap();
        let ItemCheck::Skill(result) = check else {
            panic!("expected a skill check");
        };
        assert_eq!(result.total(), 8);
    }

    #[tokio::test]
    async fn dispatcher_rejects_unrollable_items() {
        let store = MemoryStore::new();
        let rope = Item::new("Rope", ItemKind::Gear(GearData::default()));
        let mut roller = ScriptedRoller::new([1]);
        let err = resolve_check_for(
            &store,
            Some(&scout()),
            &rope,
            &CheckRequest::default(),
            &RuleConfig::default(),
            &mut roller,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Rope (gear) cannot be rolled");
        assert_eq!(roller.rolled(), 0);
    }

    #[tokio::test]
    async fn dispatcher_needs_an_owner() {
        let store = MemoryStore::new();
        let mut roller = ScriptedRoller::new([1]);
        let result = resolve_check_for(
            &store,
            None,
            &notice(),
            &CheckRequest::default(),
            &RuleConfig::default(),
            &mut roller,
        )
        .await;

        let mut sink = MemorySink::new();
        assert_eq!(report(result, &mut sink).unwrap(), None);
        assert_eq!(sink.warning_messages(), vec!["Notice has no owner to roll for"]);
        assert!(sink.results.is_empty());
    }

    #[test]
    fn report_records_successes_and_propagates_contract_violations() {
        let mut sink = MemorySink::new();
        let entity = scout().with_item(notice());
        let mut roller = ScriptedRoller::new([2, 2]);
        let result = resolve_skill_check(
            &entity,
            "Notice",
            &CheckRequest::default(),
            &RuleConfig::default(),
            &mut roller,
        );
        let reported = report(result, &mut sink).unwrap();
        assert!(reported.is_some());
        assert_eq!(sink.results.len(), 1);

        let hollow = Entity::new(EntityKind::Character, "Hollow");
        let result = resolve_skill_check(
            &hollow,
            "Notice",
            &CheckRequest::default(),
            &RuleConfig::default(),
            &mut roller,
        );
        assert!(matches!(
            report(result, &mut sink),
            Err(MechError::ContractViolation { .. })
        ));
        assert!(sink.warnings.is_empty());
    }
}
