//! Equipment effect resolution: armor class and cyberware strain from
//! equipped items.
//!
//! Resolution reads an entity snapshot plus a freshly computed derived block
//! and produces an [`EquipmentEffect`]. It never mutates the snapshot; the
//! only way the effect reaches the entity is through [`equipment_patch`].

use sw_core::component::{ArmorClass, EquipmentState};
use sw_core::item::ArmorData;
use sw_core::{DerivedStats, Entity, EntityKind, Item, ItemKind, Patch};

use crate::config::{ArmorRuleset, RuleConfig};
use crate::derived::cyberware_strain;
use crate::error::MechResult;

/// Armor class of an unarmored combatant before dexterity.
pub const BASE_AC: i32 = 10;

/// Resolved equipment values for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentEffect {
    /// Final armor class and the armor it came from.
    pub ac: ArmorClass,
    /// System strain of equipped cyberware only.
    pub from_cyberware: i32,
}

impl EquipmentEffect {
    /// The stored form of this effect.
    pub fn to_state(&self) -> EquipmentState {
        EquipmentState {
            ac: self.ac.clone(),
            from_cyberware: self.from_cyberware,
        }
    }
}

/// Resolve armor class and equipped cyberware strain.
///
/// Returns `None` for entities that are not characters or NPCs, or when the
/// derived block carries no attribute modifiers.
pub fn resolve_equipment_effects(
    entity: &Entity,
    derived: &DerivedStats,
    config: &RuleConfig,
) -> Option<EquipmentEffect> {
    if !entity.kind.is_combatant() {
        return None;
    }
    let dex = derived.modifiers()?.dex;

    let ac = match select_armor(entity) {
        Some((item, armor)) => ArmorClass {
            value: with_dex(armor.ac, armor, dex),
            melee: split(config).then(|| with_dex(armor.melee_ac.unwrap_or(armor.ac), armor, dex)),
            from_armor: Some(item.name.clone()),
        },
        None => ArmorClass {
            value: BASE_AC + dex,
            melee: split(config).then_some(BASE_AC + dex),
            from_armor: None,
        },
    };

    scan_readied_items(entity);

    let effect = EquipmentEffect {
        ac,
        from_cyberware: cyberware_strain(&entity.items, true),
    };
    tracing::debug!(entity = %entity.name, ?effect, "resolved equipment");
    Some(effect)
}

/// The equipped armor with the strictly greatest `ac`. Ties keep the first
/// one in item order.
pub fn select_armor(entity: &Entity) -> Option<(&Item, &ArmorData)> {
    let mut best: Option<(&Item, &ArmorData)> = None;
    for item in entity.equipped_items() {
        let Some(armor) = item.as_armor() else {
            continue;
        };
        if best.is_none_or(|(_, current)| armor.ac > current.ac) {
            best = Some((item, armor));
        }
    }
    best
}

fn with_dex(base: i32, armor: &ArmorData, dex: i32) -> i32 {
    if !armor.allow_dex {
        return base;
    }
    match armor.max_dex {
        Some(cap) => base + dex.min(cap),
        None => base + dex,
    }
}

fn split(config: &RuleConfig) -> bool {
    config.armor_ruleset == ArmorRuleset::SplitMeleeRanged
}

/// Equipped weapons and gear have no numeric effect yet; tag-driven effects
/// hook in here.
fn scan_readied_items(entity: &Entity) {
    for item in entity.equipped_items() {
        match &item.kind {
            ItemKind::Weapon(_) => tracing::trace!(item = %item.name, "readied weapon"),
            ItemKind::Gear(gear) => tracing::trace!(item = %item.name, tags = ?gear.tags, "readied gear"),
            _ => {}
        }
    }
}

/// The equipment state currently stored on the entity.
pub fn stored_equipment(entity: &Entity) -> Option<&EquipmentState> {
    match entity.kind {
        EntityKind::Character => entity.components.character.as_ref().map(|c| &c.equipment),
        EntityKind::Npc => entity.components.npc.as_ref().map(|n| &n.equipment),
        EntityKind::Faction | EntityKind::Custom(_) => None,
    }
}

/// Patch writing the effect into the entity's equipment state.
///
/// Empty for kinds that do not store equipment.
pub fn equipment_patch(entity: &Entity, effect: &EquipmentEffect) -> MechResult<Patch> {
    let mut patch = Patch::new();
    let path = match entity.kind {
        EntityKind::Character => "components.character.equipment",
        EntityKind::Npc => "components.npc.equipment",
        EntityKind::Faction | EntityKind::Custom(_) => return Ok(patch),
    };
    patch.set_serialized(path, &effect.to_state())?;
    Ok(patch)
}
