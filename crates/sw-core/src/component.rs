use serde::{Deserialize, Serialize};

use crate::attribute::AttributeSet;
use crate::derived::{CharacterDerived, FactionDerived, NpcDerived};

/// The per-kind data blocks attached to an entity.
/// The entity's declared kind decides which block must be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentSet {
    /// Player character data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<CharacterComponent>,
    /// NPC data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npc: Option<NpcComponent>,
    /// Faction data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<FactionComponent>,
}

// ---------------------------------------------------------------------------
// Equipment state
// ---------------------------------------------------------------------------

/// Resolved armor class as last written by the equipment resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorClass {
    /// Armor class (ranged AC under the split ruleset).
    pub value: i32,
    /// Melee armor class, only under the split ruleset.
    #[serde(default)]
    pub melee: Option<i32>,
    /// Name of the armor the value came from, if any.
    #[serde(default)]
    pub from_armor: Option<String>,
}

/// Persisted fields owned by the equipment resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentState {
    /// Armor class.
    #[serde(default)]
    pub ac: ArmorClass,
    /// System strain of equipped cyberware only.
    #[serde(default)]
    pub from_cyberware: i32,
}

// ---------------------------------------------------------------------------
// Character
// ---------------------------------------------------------------------------

/// Player character data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterComponent {
    /// Attribute values.
    pub attributes: AttributeSet,
    /// Character level.
    pub level: i32,
    /// Current health.
    #[serde(default)]
    pub health: i32,
    /// Current sanity.
    #[serde(default)]
    pub sanity: i32,
    /// Rolls initiative with advantage.
    #[serde(default)]
    pub advantage_initiative: bool,
    /// Fields written by the equipment resolver.
    #[serde(default)]
    pub equipment: EquipmentState,
    /// Last derived block.
    #[serde(default)]
    pub derived: Option<CharacterDerived>,
}

impl CharacterComponent {
    /// A fresh character at the given level.
    pub fn new(attributes: AttributeSet, level: i32) -> Self {
        Self {
            attributes,
            level,
            health: 0,
            sanity: 0,
            advantage_initiative: false,
            equipment: EquipmentState::default(),
            derived: None,
        }
    }
}

// ---------------------------------------------------------------------------
// NPC
// ---------------------------------------------------------------------------

/// NPC data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcComponent {
    /// Attribute values.
    pub attributes: AttributeSet,
    /// Current health.
    #[serde(default)]
    pub health: i32,
    /// GM-authored maximum health. Never overwritten by the rules.
    #[serde(default)]
    pub max_health: Option<i32>,
    /// Morale score; a 2d6 at or under it holds.
    #[serde(default)]
    pub morale: i32,
    /// Single save target used for every save kind.
    #[serde(default)]
    pub save: Option<i32>,
    /// Flat bonus the NPC adds to skill checks.
    #[serde(default)]
    pub skill_bonus: i32,
    /// Fields written by the equipment resolver.
    #[serde(default)]
    pub equipment: EquipmentState,
    /// Last derived block.
    #[serde(default)]
    pub derived: Option<NpcDerived>,
}

impl NpcComponent {
    /// A fresh NPC with the given attributes and morale.
    pub fn new(attributes: AttributeSet, morale: i32) -> Self {
        Self {
            attributes,
            health: 0,
            max_health: None,
            morale,
            save: None,
            skill_bonus: 0,
            equipment: EquipmentState::default(),
            derived: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Faction
// ---------------------------------------------------------------------------

/// Faction data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactionComponent {
    /// Force rating.
    pub force: i32,
    /// Cunning rating.
    pub cunning: i32,
    /// Wealth rating.
    pub wealth: i32,
    /// Current hit points.
    #[serde(default)]
    pub hp: i32,
    /// Last derived block.
    #[serde(default)]
    pub derived: Option<FactionDerived>,
}
