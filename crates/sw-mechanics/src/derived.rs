//! Derived stat computation.
//!
//! [`compute_derived_stats`] is a pure function of the entity snapshot and
//! the rule configuration. Calling it repeatedly on the same input yields
//! identical output, so preparation can run as often as the host likes.

use sw_core::component::{CharacterComponent, FactionComponent, NpcComponent};
use sw_core::derived::{
    CharacterDerived, Effort, FactionDerived, NpcDerived, Pool, Saves, SystemStrain,
};
use sw_core::{AttributeModifiers, DerivedStats, Entity, EntityKind, Item, ItemKind, Patch};

use crate::attribute::attribute_modifiers;
use crate::config::RuleConfig;
use crate::error::{MechError, MechResult};

/// Saves never drop below this target.
pub const SAVE_FLOOR: i32 = 2;

/// The character block, or a contract violation if it is missing.
pub fn require_character(entity: &Entity) -> MechResult<&CharacterComponent> {
    entity
        .components
        .character
        .as_ref()
        .ok_or_else(|| MechError::contract(&entity.name, "character without character data"))
}

/// The NPC block, or a contract violation if it is missing.
pub fn require_npc(entity: &Entity) -> MechResult<&NpcComponent> {
    entity
        .components
        .npc
        .as_ref()
        .ok_or_else(|| MechError::contract(&entity.name, "npc without npc data"))
}

/// The faction block, or a contract violation if it is missing.
pub fn require_faction(entity: &Entity) -> MechResult<&FactionComponent> {
    entity
        .components
        .faction
        .as_ref()
        .ok_or_else(|| MechError::contract(&entity.name, "faction without faction data"))
}

/// Attribute modifiers for characters and NPCs.
///
/// Returns `Ok(None)` for kinds without attributes.
pub fn modifiers_for(entity: &Entity) -> MechResult<Option<AttributeModifiers>> {
    Ok(match entity.kind {
        EntityKind::Character => Some(attribute_modifiers(&require_character(entity)?.attributes)),
        EntityKind::Npc => Some(attribute_modifiers(&require_npc(entity)?.attributes)),
        EntityKind::Faction | EntityKind::Custom(_) => None,
    })
}

/// Compute the derived block for an entity.
///
/// Returns `Ok(None)` for custom kinds, which carry no rules data.
pub fn compute_derived_stats(
    entity: &Entity,
    config: &RuleConfig,
) -> MechResult<Option<DerivedStats>> {
    let derived = match entity.kind {
        EntityKind::Character => Some(DerivedStats::Character(derive_character(
            require_character(entity)?,
            &entity.items,
            config,
        ))),
        EntityKind::Npc => Some(DerivedStats::Npc(derive_npc(require_npc(entity)?))),
        EntityKind::Faction => Some(DerivedStats::Faction(derive_faction(require_faction(
            entity,
        )?))),
        EntityKind::Custom(_) => None,
    };

    if let Some(derived) = &derived {
        tracing::debug!(entity = %entity.name, ?derived, "computed derived stats");
    }
    Ok(derived)
}

/// Derived block for a player character.
pub fn derive_character(
    character: &CharacterComponent,
    items: &[Item],
    config: &RuleConfig,
) -> CharacterDerived {
    let modifiers = attribute_modifiers(&character.attributes);
    let level = character.level;

    let health = Pool {
        value: character.health,
        max: level.saturating_mul(4).saturating_add(modifiers.con).max(1),
    };

    let sanity = config.sanity_enabled.then(|| Pool {
        value: character.sanity,
        max: (10 + modifiers.wis).max(1),
    });

    // Every owned implant counts against the cap, equipped or not.
    let cyberware = cyberware_strain(items, false);
    let system_strain = SystemStrain {
        max: (character.attributes.con.div_euclid(2))
            .saturating_sub(cyberware)
            .max(1),
        cyberware,
    };

    CharacterDerived {
        modifiers,
        health,
        sanity,
        system_strain,
        saves: saves_for(level, &modifiers),
        effort: Effort {
            max: (1 + level.div_euclid(3)).max(1),
        },
    }
}

/// Saving throw targets for a level and modifier set.
pub fn saves_for(level: i32, modifiers: &AttributeModifiers) -> Saves {
    let save = |best: i32| 15_i32.saturating_sub(level).saturating_sub(best).max(SAVE_FLOOR);
    Saves {
        physical: save(modifiers.str.max(modifiers.con)),
        evasion: save(modifiers.dex.max(modifiers.int)),
        mental: save(modifiers.wis.max(modifiers.cha)),
        luck: save(0),
    }
}

/// Derived block for an NPC. An authored `max_health` always wins.
pub fn derive_npc(npc: &NpcComponent) -> NpcDerived {
    let modifiers = attribute_modifiers(&npc.attributes);
    NpcDerived {
        modifiers,
        health: Pool {
            value: npc.health,
            max: npc.max_health.unwrap_or_else(|| (4 + modifiers.con).max(1)),
        },
    }
}

/// Derived block for a faction.
pub fn derive_faction(faction: &FactionComponent) -> FactionDerived {
    FactionDerived {
        hp: Pool {
            value: faction.hp,
            max: faction.force + faction.cunning + faction.wealth,
        },
    }
}

/// Sum of cyberware system strain, optionally over equipped items only.
pub fn cyberware_strain(items: &[Item], equipped_only: bool) -> i32 {
    items
        .iter()
        .filter(|item| item.equipped || !equipped_only)
        .filter_map(|item| match &item.kind {
            ItemKind::Cyberware(c) => Some(c.system_strain),
            _ => None,
        })
        .sum()
}

/// Patch that replaces the stored derived block wholesale.
pub fn derived_patch(derived: &DerivedStats) -> MechResult<Patch> {
    let mut patch = Patch::new();
    match derived {
        DerivedStats::Character(c) => patch.set_serialized("components.character.derived", c)?,
        DerivedStats::Npc(n) => patch.set_serialized("components.npc.derived", n)?,
        DerivedStats::Faction(f) => patch.set_serialized("components.faction.derived", f)?,
    };
    Ok(patch)
}

/// Recompute the derived block and store it on the snapshot itself.
///
/// For hosts that keep entities in memory rather than behind a store.
pub fn prepare_in_place(entity: &mut Entity, config: &RuleConfig) -> MechResult<()> {
    match compute_derived_stats(entity, config)? {
        Some(DerivedStats::Character(d)) => {
            if let Some(c) = entity.components.character.as_mut() {
                c.derived = Some(d);
            }
        }
        Some(DerivedStats::Npc(d)) => {
            if let Some(n) = entity.components.npc.as_mut() {
                n.derived = Some(d);
            }
        }
        Some(DerivedStats::Faction(d)) => {
            if let Some(f) = entity.components.faction.as_mut() {
                f.derived = Some(d);
            }
        }
        None => {}
    }
    Ok(())
}
