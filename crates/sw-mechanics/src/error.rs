//! Error types for the rules engine.
//!
//! Three classes of failure exist. A [`MechError::ContractViolation`] means
//! the entity does not carry the data its declared kind requires; it always
//! propagates. A [`Precondition`] means a user-initiated check cannot go ahead
//! (missing skill, no ammo, ...); it is converted into a warning at the
//! operation boundary (see [`crate::check::report`]). Configuration fallbacks
//! never surface as errors at all.

use sw_core::{CoreError, EntityKind, ItemId};

use crate::dice::DiceError;

/// A recoverable reason a check could not be performed.
///
/// Every variant displays as a short warning naming what is missing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Precondition {
    /// An item-bound check was attempted on an item with no owner.
    #[error("{item} has no owner to roll for")]
    NoActor {
        /// Item name.
        item: String,
    },

    /// The named skill is not among the entity's items.
    #[error("{entity} has no skill named {skill}")]
    MissingSkill {
        /// Entity name.
        entity: String,
        /// Requested skill name.
        skill: String,
    },

    /// The named save does not exist for this entity.
    #[error("{entity} has no {save} save")]
    MissingSave {
        /// Entity name.
        entity: String,
        /// Requested save name.
        save: String,
    },

    /// The referenced item is not owned by the entity.
    #[error("{entity} does not own item {item}")]
    MissingItem {
        /// Entity name.
        entity: String,
        /// Requested item ID.
        item: ItemId,
    },

    /// The weapon is out of ammunition.
    #[error("{weapon} is out of ammo")]
    NoAmmo {
        /// Weapon name.
        weapon: String,
    },

    /// Burst fire was requested but the weapon cannot burst.
    #[error("{weapon} cannot burst fire ({remaining} rounds left)")]
    InsufficientAmmoForBurst {
        /// Weapon name.
        weapon: String,
        /// Rounds remaining.
        remaining: i32,
    },

    /// The asset has no damage formula for the requested action.
    #[error("{asset} has no damage formula")]
    AssetWithoutDamage {
        /// Asset name.
        asset: String,
    },

    /// The asset has no attack source rating.
    #[error("{asset} cannot attack")]
    AssetCannotAttack {
        /// Asset name.
        asset: String,
    },

    /// Morale checks only apply to NPCs.
    #[error("{entity} is not an NPC")]
    NotAnNpc {
        /// Entity name.
        entity: String,
    },

    /// The item kind has no roll.
    #[error("{item} ({kind}) cannot be rolled")]
    NotRollable {
        /// Item name.
        item: String,
        /// Item type name.
        kind: &'static str,
    },

    /// The operation does not apply to this kind of entity.
    #[error("{entity} ({kind}) cannot make this check")]
    UnsupportedKind {
        /// Entity name.
        entity: String,
        /// Declared entity kind.
        kind: EntityKind,
    },
}

/// Errors that can occur during rules operations.
#[derive(Debug, thiserror::Error)]
pub enum MechError {
    /// The entity lacks data its declared kind requires. Fatal.
    #[error("contract violation on {entity}: {detail}")]
    ContractViolation {
        /// Entity name.
        entity: String,
        /// What was missing or malformed.
        detail: String,
    },

    /// A check could not go ahead.
    #[error(transparent)]
    Precondition(#[from] Precondition),

    /// A dice formula failed to parse or evaluate.
    #[error("dice error: {0}")]
    Dice(#[from] DiceError),

    /// Reading or patching the entity store failed.
    #[error("store error: {0}")]
    Store(#[from] CoreError),

    /// Encounter turn tracking was used out of order.
    #[error("encounter error: {0}")]
    Encounter(String),

    /// The rule configuration could not be loaded.
    #[error("invalid rule config: {0}")]
    InvalidConfig(String),
}

impl MechError {
    /// Shorthand for a contract violation.
    pub fn contract(entity: &str, detail: impl Into<String>) -> Self {
        Self::ContractViolation {
            entity: entity.to_string(),
            detail: detail.into(),
        }
    }
}

/// Convenience result type for rules operations.
pub type MechResult<T> = Result<T, MechError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_name_what_is_missing() {
        let skill = Precondition::MissingSkill {
            entity: "Kael".to_string(),
            skill: "Pilot".to_string(),
        };
        assert_eq!(skill.to_string(), "Kael has no skill named Pilot");

        let burst = Precondition::InsufficientAmmoForBurst {
            weapon: "Laser Rifle".to_string(),
            remaining: 2,
        };
        assert_eq!(
            burst.to_string(),
            "Laser Rifle cannot burst fire (2 rounds left)"
        );
    }

    #[test]
    fn precondition_passes_through_transparently() {
        let err: MechError = Precondition::NoAmmo {
            weapon: "Spike Thrower".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Spike Thrower is out of ammo");
    }
}
