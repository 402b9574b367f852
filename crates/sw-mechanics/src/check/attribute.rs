//! Attribute checks.
//!
//! Two call paths exist for the same concept: a 2d6 roll and a d20 roll,
//! each plus the attribute modifier. Both are kept as separate operations.

use sw_core::{Attribute, Entity};

use super::{CheckKind, CheckOutcome, CheckResult, label, roll_check};
use crate::derived::modifiers_for;
use crate::dice::{Bindings, DiceFormula, DiceRoller};
use crate::error::{MechResult, Precondition};

/// Roll 2d6 plus the attribute modifier.
pub fn resolve_attribute_check(
    entity: &Entity,
    attribute: Attribute,
    roller: &mut impl DiceRoller,
) -> MechResult<CheckResult> {
    roll_attribute(entity, attribute, "2d6 + @stat", roller)
}

/// Roll 1d20 plus the attribute modifier.
pub fn resolve_attribute_roll_d20(
    entity: &Entity,
    attribute: Attribute,
    roller: &mut impl DiceRoller,
) -> MechResult<CheckResult> {
    roll_attribute(entity, attribute, "1d20 + @stat", roller)
}

fn roll_attribute(
    entity: &Entity,
    attribute: Attribute,
    formula: &str,
    roller: &mut impl DiceRoller,
) -> MechResult<CheckResult> {
    let modifiers = modifiers_for(entity)?.ok_or_else(|| Precondition::UnsupportedKind {
        entity: entity.name.clone(),
        kind: entity.kind.clone(),
    })?;
    let bindings = Bindings::new().with("stat", modifiers.get(attribute));
    roll_check(
        CheckKind::Attribute,
        label(&attribute.to_string(), entity),
        &DiceFormula::parse(formula)?,
        &bindings,
        roller,
        |_| CheckOutcome::Total,
    )
}
