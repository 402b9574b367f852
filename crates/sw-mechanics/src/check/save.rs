//! Saving throws: 1d20 at or above the save target.

use std::fmt;

use sw_core::derived::Saves;
use sw_core::{DerivedStats, Entity, EntityKind};

use super::{CheckKind, CheckOutcome, CheckResult, label, roll_check};
use crate::config::RuleConfig;
use crate::derived::{compute_derived_stats, require_character, require_npc};
use crate::dice::{Bindings, DiceFormula, DiceRoller};
use crate::error::{MechResult, Precondition};

/// The four character saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    /// Physical save.
    Physical,
    /// Evasion save.
    Evasion,
    /// Mental save.
    Mental,
    /// Luck save.
    Luck,
}

impl SaveKind {
    /// Parse a save name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "physical" => Some(Self::Physical),
            "evasion" => Some(Self::Evasion),
            "mental" => Some(Self::Mental),
            "luck" => Some(Self::Luck),
            _ => None,
        }
    }

    /// The target for this save.
    pub fn target(self, saves: &Saves) -> i32 {
        match self {
            Self::Physical => saves.physical,
            Self::Evasion => saves.evasion,
            Self::Mental => saves.mental,
            Self::Luck => saves.luck,
        }
    }
}

impl fmt::Display for SaveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Physical => write!(f, "physical"),
            Self::Evasion => write!(f, "evasion"),
            Self::Mental => write!(f, "mental"),
            Self::Luck => write!(f, "luck"),
        }
    }
}

/// Roll the save named `save`.
///
/// Characters use their stored derived saves, or freshly computed ones if
/// the entity has never been prepared. NPCs have one save target for every
/// kind. An unknown save name or an NPC without a save is a warning.
pub fn resolve_save_check(
    entity: &Entity,
    save: &str,
    config: &RuleConfig,
    roller: &mut impl DiceRoller,
) -> MechResult<CheckResult> {
    let missing = || Precondition::MissingSave {
        entity: entity.name.clone(),
        save: save.to_string(),
    };

    let target = match entity.kind {
        EntityKind::Character => {
            let character = require_character(entity)?;
            let kind = SaveKind::parse(save).ok_or_else(missing)?;
            let saves = match &character.derived {
                Some(derived) => derived.saves,
                None => match compute_derived_stats(entity, config)? {
                    Some(DerivedStats::Character(derived)) => derived.saves,
                    _ => return Err(missing().into()),
                },
            };
            kind.target(&saves)
        }
        EntityKind::Npc => {
            let npc = require_npc(entity)?;
            SaveKind::parse(save).ok_or_else(missing)?;
            npc.save.ok_or_else(missing)?
        }
        EntityKind::Faction | EntityKind::Custom(_) => return Err(missing().into()),
    };

    roll_check(
        CheckKind::Save,
        label(&format!("{} save", save.trim().to_lowercase()), entity),
        &DiceFormula::parse("1d20")?,
        &Bindings::new(),
        roller,
        |total| CheckOutcome::against(target, total >= target),
    )
}
