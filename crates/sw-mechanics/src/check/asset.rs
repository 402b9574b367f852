//! Faction asset actions: a 1d10 hit roll plus the backing rating, then
//! the asset's damage or counter formula.

use sw_core::component::FactionComponent;
use sw_core::item::AssetSource;
use sw_core::{Entity, EntityKind, ItemId};

use super::{CheckKind, CheckOutcome, CheckResult, Reportable, label, roll_check};
use crate::derived::require_faction;
use crate::dice::{Bindings, DiceFormula, DiceRoller, Term};
use crate::error::{MechResult, Precondition};

/// What the asset is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetAction {
    /// Attacking another faction's asset.
    Attack,
    /// Striking back at an attacker.
    Counter,
}

/// The rolls of one asset action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResult {
    /// The action taken.
    pub action: AssetAction,
    /// The hit roll.
    pub hit: CheckResult,
    /// The damage roll.
    pub damage: CheckResult,
}

impl Reportable for AssetResult {
    fn checks(&self) -> Vec<&CheckResult> {
        vec![&self.hit, &self.damage]
    }
}

/// The faction rating behind an attack source.
pub fn rating(faction: &FactionComponent, source: AssetSource) -> i32 {
    match source {
        AssetSource::Force => faction.force,
        AssetSource::Cunning => faction.cunning,
        AssetSource::Wealth => faction.wealth,
    }
}

/// Use an asset the faction owns.
///
/// Attacking needs both an attack source and a damage formula. Countering
/// needs a counter formula; without an attack source the hit roll gets no
/// rating bonus.
pub fn resolve_asset_action(
    faction: &Entity,
    asset: ItemId,
    action: AssetAction,
    roller: &mut impl DiceRoller,
) -> MechResult<AssetResult> {
    let item = faction.item(asset).ok_or_else(|| Precondition::MissingItem {
        entity: faction.name.clone(),
        item: asset,
    })?;
    let data = item.as_asset().ok_or_else(|| Precondition::NotRollable {
        item: item.name.clone(),
        kind: item.kind.type_name(),
    })?;
    if faction.kind != EntityKind::Faction {
        return Err(Precondition::UnsupportedKind {
            entity: faction.name.clone(),
            kind: faction.kind.clone(),
        }
        .into());
    }
    let ratings = require_faction(faction)?;

    let without_damage = || Precondition::AssetWithoutDamage {
        asset: item.name.clone(),
    };
    let (bonus, damage) = match action {
        AssetAction::Attack => {
            let source = data.attack_source.ok_or_else(|| Precondition::AssetCannotAttack {
                asset: item.name.clone(),
            })?;
            let damage = data.damage.as_deref().ok_or_else(without_damage)?;
            (rating(ratings, source), damage)
        }
        AssetAction::Counter => {
            let damage = data.counter.as_deref().ok_or_else(without_damage)?;
            (data.attack_source.map_or(0, |s| rating(ratings, s)), damage)
        }
    };

    let hit_formula = DiceFormula::parse("1d10")?.plus(Term::binding("rating"));
    let damage_formula = DiceFormula::parse(damage)?;
    let no_bindings = Bindings::new();
    damage_formula.check_bindings(&no_bindings)?;

    let hit = roll_check(
        CheckKind::Attack,
        label(&item.name, faction),
        &hit_formula,
        &Bindings::new().with("rating", bonus),
        roller,
        |_| CheckOutcome::Total,
    )?;
    let damage = roll_check(
        CheckKind::Damage,
        label(&format!("{} damage", item.name), faction),
        &damage_formula,
        &no_bindings,
        roller,
        |_| CheckOutcome::Total,
    )?;

    Ok(AssetResult {
        action,
        hit,
        damage,
    })
}
