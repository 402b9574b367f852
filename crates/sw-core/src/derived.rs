//! Derived stat blocks stored on entities.
//!
//! These blocks are produced by the rules engine on every preparation pass
//! and replace the previous block wholesale. Only the `value` fields of
//! [`Pool`]s reflect user-mutated state; they are copied in from the
//! component's current values.

use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, AttributeSet};

/// Attribute modifiers computed from an [`AttributeSet`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeModifiers {
    /// Strength modifier.
    pub str: i32,
    /// Dexterity modifier.
    pub dex: i32,
    /// Constitution modifier.
    pub con: i32,
    /// Intelligence modifier.
    pub int: i32,
    /// Wisdom modifier.
    pub wis: i32,
    /// Charisma modifier.
    pub cha: i32,
}

impl AttributeModifiers {
    /// Map every value in `set` through `f`.
    pub fn from_set(set: &AttributeSet, f: impl Fn(i32) -> i32) -> Self {
        Self {
            str: f(set.str),
            dex: f(set.dex),
            con: f(set.con),
            int: f(set.int),
            wis: f(set.wis),
            cha: f(set.cha),
        }
    }

    /// Read one modifier.
    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Str => self.str,
            Attribute::Dex => self.dex,
            Attribute::Con => self.con,
            Attribute::Int => self.int,
            Attribute::Wis => self.wis,
            Attribute::Cha => self.cha,
        }
    }
}

/// A current/maximum pair such as health or sanity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Current value.
    pub value: i32,
    /// Maximum value.
    pub max: i32,
}

/// System strain capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStrain {
    /// Strain capacity left after installed cyberware.
    pub max: i32,
    /// Strain of every owned cyberware item, equipped or not.
    pub cyberware: i32,
}

/// Saving throw targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Saves {
    /// Physical save.
    pub physical: i32,
    /// Evasion save.
    pub evasion: i32,
    /// Mental save.
    pub mental: i32,
    /// Luck save.
    pub luck: i32,
}

/// Effort capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effort {
    /// Maximum effort.
    pub max: i32,
}

/// Derived block for player characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDerived {
    /// Attribute modifiers.
    pub modifiers: AttributeModifiers,
    /// Health.
    pub health: Pool,
    /// Sanity, present only while the sanity rule is enabled.
    pub sanity: Option<Pool>,
    /// System strain.
    pub system_strain: SystemStrain,
    /// Saving throws.
    pub saves: Saves,
    /// Effort.
    pub effort: Effort,
}

/// Derived block for NPCs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcDerived {
    /// Attribute modifiers.
    pub modifiers: AttributeModifiers,
    /// Health.
    pub health: Pool,
}

/// Derived block for factions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionDerived {
    /// Faction hit points.
    pub hp: Pool,
}

/// The derived block of any entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DerivedStats {
    /// Player character block.
    Character(CharacterDerived),
    /// NPC block.
    Npc(NpcDerived),
    /// Faction block.
    Faction(FactionDerived),
}

impl DerivedStats {
    /// Attribute modifiers, for kinds that have attributes.
    pub fn modifiers(&self) -> Option<&AttributeModifiers> {
        match self {
            Self::Character(c) => Some(&c.modifiers),
            Self::Npc(n) => Some(&n.modifiers),
            Self::Faction(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_from_set_maps_each_value() {
        let set = AttributeSet::uniform(10).with(Attribute::Dex, 14);
        let mods = AttributeModifiers::from_set(&set, |v| v - 10);
        assert_eq!(mods.get(Attribute::Dex), 4);
        assert_eq!(mods.get(Attribute::Str), 0);
    }

    #[test]
    fn derived_serializes_with_kind_tag() {
        let derived = DerivedStats::Faction(FactionDerived {
            hp: Pool { value: 7, max: 9 },
        });
        let json = serde_json::to_value(&derived).unwrap();
        assert_eq!(json["kind"], "faction");
        assert_eq!(json["hp"]["max"], 9);
        assert!(derived.modifiers().is_none());
    }
}
