//! NPC morale: 2d6 at or under the morale score holds.

use sw_core::{Entity, EntityKind};

use super::{CheckKind, CheckOutcome, CheckResult, label, roll_check};
use crate::derived::require_npc;
use crate::dice::{Bindings, DiceFormula, DiceRoller};
use crate::error::{MechResult, Precondition};

/// Roll morale for an NPC. Success means morale holds.
pub fn resolve_morale_check(
    entity: &Entity,
    roller: &mut impl DiceRoller,
) -> MechResult<CheckResult> {
    if entity.kind != EntityKind::Npc {
        return Err(Precondition::NotAnNpc {
            entity: entity.name.clone(),
        }
        .into());
    }
    let morale = require_npc(entity)?.morale;

    roll_check(
        CheckKind::Morale,
        label("morale", entity),
        &DiceFormula::parse("2d6")?,
        &Bindings::new(),
        roller,
        |total| CheckOutcome::against(morale, total <= morale),
    )
}
